use super::extract::AuthUser;
use crate::content::{ContentPatch, ListQuery, NewContent, StatusFilter, Translations};
use crate::context::AppState;
use crate::error::{CmsError, CmsResult};
use crate::model::{Action, ContentStatus, Resource};
use actix_web::{delete, get, post, put, web, HttpResponse};
use serde::Deserialize;
use serde_json::{json, Map, Value};

pub(super) fn configure(conf: &mut web::ServiceConfig) {
    conf.service(list_collection_names)
        .service(list_items)
        .service(create_item)
        .service(view_item)
        .service(update_item)
        .service(delete_item);
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminListParams {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub locale: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub order_by: Option<String>,
    pub order_dir: Option<String>,
}

impl AdminListParams {
    fn into_query(self) -> CmsResult<ListQuery> {
        let defaults = ListQuery::admin();
        let status = StatusFilter::parse(self.status.as_deref(), defaults.status)
            .map_err(CmsError::BadRequest)?;
        let sort = self.order_by.filter(|f| !f.is_empty()).map(|field| {
            match self.order_dir.as_deref() {
                Some("asc") => field,
                _ => format!("-{}", field),
            }
        });
        Ok(ListQuery {
            page: self.page.unwrap_or(defaults.page),
            per_page: self.per_page.unwrap_or(defaults.per_page),
            status,
            locale: self.locale.filter(|l| !l.is_empty()),
            sort,
            search: self.search.filter(|s| !s.is_empty()),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ContentBody {
    pub data: Option<Value>,
    pub translations: Option<Value>,
    pub status: Option<ContentStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LocaleParam {
    pub locale: Option<String>,
}

/// Per-locale objects from a request body. Entries that are not objects
/// are ignored.
pub(super) fn translations_from(value: Option<Value>) -> Translations {
    match value {
        Some(Value::Object(map)) => map
            .into_iter()
            .filter_map(|(locale, data)| match data {
                Value::Object(data) => Some((locale, data)),
                _ => None,
            })
            .collect(),
        _ => Translations::new(),
    }
}

pub(super) fn require_data(value: Option<Value>) -> CmsResult<Map<String, Value>> {
    match value {
        Some(Value::Object(map)) => Ok(map),
        _ => Err(CmsError::bad_request("Data is required")),
    }
}

#[get("/collections")]
async fn list_collection_names(_user: AuthUser, state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "collections": state.content.model().collection_names() }))
}

#[get("/collections/{name}")]
async fn list_items(
    user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<AdminListParams>,
) -> CmsResult<HttpResponse> {
    let name = path.into_inner();
    user.require(&state, Resource::Collections, Action::Read, Some(&name))
        .await?;

    let query = params.into_inner().into_query()?;
    let page = state.content.list_collection(&name, &query).await?;
    Ok(HttpResponse::Ok().json(json!({
        "data": page.items,
        "meta": {
            "total": page.total,
            "page": page.page,
            "perPage": page.per_page,
            "totalPages": page.total_pages,
        },
    })))
}

#[post("/collections/{name}")]
async fn create_item(
    user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<ContentBody>,
) -> CmsResult<HttpResponse> {
    let name = path.into_inner();
    let body = body.into_inner();
    let status = body.status.unwrap_or_default();

    user.require(&state, Resource::Collections, Action::Create, Some(&name))
        .await?;
    if status == ContentStatus::Published {
        user.require(&state, Resource::Collections, Action::Publish, Some(&name))
            .await?;
    }

    let input = NewContent {
        data: require_data(body.data)?,
        translations: translations_from(body.translations),
        status,
    };
    let id = state.content.create(&name, input, Some(user.id())).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "id": id })))
}

#[get("/collections/{name}/{id}")]
async fn view_item(
    user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    params: web::Query<LocaleParam>,
) -> CmsResult<HttpResponse> {
    let (name, id) = path.into_inner();
    user.require(&state, Resource::Collections, Action::Read, Some(&name))
        .await?;

    let item = state
        .content
        .get_by_id(&name, &id, params.locale.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(item))
}

#[put("/collections/{name}/{id}")]
async fn update_item(
    user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: web::Json<ContentBody>,
) -> CmsResult<HttpResponse> {
    let (name, id) = path.into_inner();
    let body = body.into_inner();

    user.require(&state, Resource::Collections, Action::Update, Some(&name))
        .await?;
    if body.status == Some(ContentStatus::Published) {
        user.require(&state, Resource::Collections, Action::Publish, Some(&name))
            .await?;
    }

    let data = match body.data {
        None | Some(Value::Null) => None,
        other => Some(require_data(other)?),
    };
    let patch = ContentPatch {
        data,
        translations: translations_from(body.translations),
        status: body.status,
    };
    state.content.update(&name, &id, patch).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[delete("/collections/{name}/{id}")]
async fn delete_item(
    user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> CmsResult<HttpResponse> {
    let (name, id) = path.into_inner();
    user.require(&state, Resource::Collections, Action::Delete, Some(&name))
        .await?;

    state.content.delete(&name, &id).await?;
    log::info!("{} deleted {} item {}", user.0.username, name, id);
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_params_build_signed_sort() {
        let query = AdminListParams {
            order_by: Some("sortOrder".into()),
            order_dir: Some("asc".into()),
            ..Default::default()
        }
        .into_query()
        .unwrap();
        assert_eq!(query.sort.as_deref(), Some("sortOrder"));
        assert_eq!(query.status, StatusFilter::All);

        let query = AdminListParams {
            order_by: Some("updatedAt".into()),
            ..Default::default()
        }
        .into_query()
        .unwrap();
        assert_eq!(query.sort.as_deref(), Some("-updatedAt"));
    }

    #[test]
    fn test_bad_status_is_rejected() {
        let params = AdminListParams {
            status: Some("deleted".into()),
            ..Default::default()
        };
        assert!(matches!(params.into_query(), Err(CmsError::BadRequest(_))));
    }

    #[test]
    fn test_translations_skip_non_objects() {
        let value = serde_json::json!({ "es": { "title": "Hola" }, "fr": "nope" });
        let translations = translations_from(Some(value));
        assert_eq!(translations.len(), 1);
        assert!(translations.contains_key("es"));
    }
}
