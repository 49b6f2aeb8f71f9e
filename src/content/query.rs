use crate::db::{ContentOrder, ContentSortField, Paging};
use crate::model::{ContentItem, ContentStatus};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const DEFAULT_PER_PAGE: u64 = 20;
pub const MAX_PER_PAGE: u64 = 100;
pub const DEFAULT_SORT: &str = "-createdAt";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusFilter {
    Only(ContentStatus),
    All,
}

impl StatusFilter {
    /// Reads a `status` query value. `all` disables filtering; absent or
    /// empty keeps `default`.
    pub fn parse(value: Option<&str>, default: StatusFilter) -> Result<Self, String> {
        match value.map(str::trim) {
            None | Some("") => Ok(default),
            Some("all") => Ok(StatusFilter::All),
            Some(other) => other.parse().map(StatusFilter::Only),
        }
    }

    pub fn as_status(self) -> Option<ContentStatus> {
        match self {
            StatusFilter::Only(status) => Some(status),
            StatusFilter::All => None,
        }
    }
}

/// Parameters for listing a collection.
#[derive(Clone, Debug, PartialEq)]
pub struct ListQuery {
    pub page: u64,
    pub per_page: u64,
    pub status: StatusFilter,
    pub locale: Option<String>,
    /// Signed field name; `None` uses the collection's default sort.
    pub sort: Option<String>,
    /// Case-insensitive match on `data.title`, applied after locale merge.
    pub search: Option<String>,
}

impl ListQuery {
    /// Defaults for anonymous callers: published items only.
    pub fn public() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            status: StatusFilter::Only(ContentStatus::Published),
            locale: None,
            sort: None,
            search: None,
        }
    }

    /// Defaults for authenticated callers: every status.
    pub fn admin() -> Self {
        Self {
            status: StatusFilter::All,
            ..Self::public()
        }
    }

    pub fn paging(&self) -> Paging {
        Paging {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, MAX_PER_PAGE),
        }
    }
}

/// Parses `-createdAt` style sort strings. Unknown fields sort by creation
/// time in the requested direction.
pub fn parse_sort(sort: &str) -> ContentOrder {
    let sort = sort.trim();
    let (descending, name) = match sort.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, sort),
    };
    let field = match name {
        "updatedAt" => ContentSortField::UpdatedAt,
        "publishedAt" => ContentSortField::PublishedAt,
        "sortOrder" => ContentSortField::SortOrder,
        "status" => ContentSortField::Status,
        "createdAt" => ContentSortField::CreatedAt,
        other => {
            log::debug!("Unsupported sort field `{}`, using createdAt", other);
            ContentSortField::CreatedAt
        }
    };
    ContentOrder { field, descending }
}

/// True when `data.title` contains `needle`, ignoring case.
pub fn title_matches(data: &Map<String, Value>, needle: &str) -> bool {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    data.get("title")
        .and_then(Value::as_str)
        .map(|title| title.to_lowercase().contains(&needle))
        .unwrap_or(false)
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, paging: Paging) -> Self {
        Self {
            items,
            total,
            page: paging.page,
            per_page: paging.per_page,
            total_pages: (total + paging.per_page - 1) / paging.per_page,
        }
    }
}

pub type Translations = BTreeMap<String, Map<String, Value>>;

/// A content row with every stored translation keyed by locale.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ContentWithTranslations {
    #[serde(flatten)]
    pub item: ContentItem,
    pub translations: Translations,
}

/// Body of a create request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewContent {
    pub data: Map<String, Value>,
    pub translations: Translations,
    pub status: ContentStatus,
}

/// Body of an update request. Absent parts are left unchanged.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContentPatch {
    pub data: Option<Map<String, Value>>,
    pub translations: Translations,
    pub status: Option<ContentStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_sort() {
        assert_eq!(parse_sort("-createdAt"), ContentOrder::default());
        assert_eq!(
            parse_sort("sortOrder"),
            ContentOrder {
                field: ContentSortField::SortOrder,
                descending: false
            }
        );
        assert_eq!(
            parse_sort("-title"),
            ContentOrder {
                field: ContentSortField::CreatedAt,
                descending: true
            }
        );
    }

    #[test]
    fn test_status_filter_parse() {
        let published = StatusFilter::Only(ContentStatus::Published);
        assert_eq!(StatusFilter::parse(None, published), Ok(published));
        assert_eq!(StatusFilter::parse(Some("all"), published), Ok(StatusFilter::All));
        assert_eq!(
            StatusFilter::parse(Some("draft"), StatusFilter::All),
            Ok(StatusFilter::Only(ContentStatus::Draft))
        );
        assert!(StatusFilter::parse(Some("bogus"), published).is_err());
    }

    #[test]
    fn test_paging_is_clamped() {
        let mut query = ListQuery::public();
        query.per_page = 500;
        query.page = 0;
        let paging = query.paging();
        assert_eq!(paging.per_page, MAX_PER_PAGE);
        assert_eq!(paging.page, 1);
    }

    #[test]
    fn test_title_search_is_case_insensitive() {
        let data = match json!({ "title": "Hello World" }) {
            Value::Object(m) => m,
            _ => unreachable!(),
        };
        assert!(title_matches(&data, "hello"));
        assert!(title_matches(&data, "WORLD"));
        assert!(!title_matches(&data, "bye"));
        assert!(!title_matches(&Map::new(), "hello"));
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let paging = Paging { page: 1, per_page: 20 };
        assert_eq!(Page::<()>::new(vec![], 41, paging).total_pages, 3);
        assert_eq!(Page::<()>::new(vec![], 0, paging).total_pages, 0);
    }
}
