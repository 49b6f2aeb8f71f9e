//! Collections and singletons: listing, locale merge and validated writes.

pub mod query;
mod repository;

pub use query::{
    parse_sort, ContentPatch, ContentWithTranslations, ListQuery, NewContent, Page, StatusFilter,
    Translations,
};
pub use repository::ContentRepository;
