//! Domain types shared by the store, the repositories and the web layer.

pub mod content;
pub mod media;
pub mod user;

pub use content::{ContentItem, ContentKind, ContentStatus, ContentTranslation};
pub use media::MediaItem;
pub use user::{Action, CmsUser, NamedGrants, Resource, Role, RolePermissions, SafeUser, Setting};
