//! Unauthenticated read access for site frontends.

use super::collections::LocaleParam;
use crate::content::ListQuery;
use crate::context::AppState;
use crate::error::CmsResult;
use actix_web::{get, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

pub(super) fn configure(conf: &mut web::ServiceConfig) {
    conf.service(public_collection).service(public_singleton);
}

/// Query of a public listing. There is no status parameter: anonymous
/// readers only ever see published items.
#[derive(Debug, Default, Deserialize)]
pub struct PublicListParams {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub locale: Option<String>,
    pub sort: Option<String>,
    pub search: Option<String>,
}

impl PublicListParams {
    fn into_query(self) -> ListQuery {
        let defaults = ListQuery::public();
        ListQuery {
            page: self.page.unwrap_or(defaults.page),
            per_page: self.limit.unwrap_or(defaults.per_page),
            status: defaults.status,
            locale: self.locale.filter(|l| !l.is_empty()),
            sort: self.sort.filter(|s| !s.is_empty()),
            search: self.search.filter(|s| !s.is_empty()),
        }
    }
}

#[get("/public/collections/{name}")]
async fn public_collection(
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<PublicListParams>,
) -> CmsResult<HttpResponse> {
    let name = path.into_inner();
    let query = params.into_inner().into_query();
    let page = state.content.list_collection(&name, &query).await?;
    Ok(HttpResponse::Ok().json(json!({
        "items": page.items,
        "total": page.total,
        "page": page.page,
        "limit": page.per_page,
        "totalPages": page.total_pages,
    })))
}

#[get("/public/singletons/{name}")]
async fn public_singleton(
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<LocaleParam>,
) -> CmsResult<HttpResponse> {
    let name = path.into_inner();
    let body = match state
        .content
        .get_singleton(&name, params.locale.as_deref())
        .await?
    {
        Some(singleton) => json!({
            "id": singleton.item.id,
            "collection": name,
            "data": singleton.item.data,
        }),
        None => json!({ "id": null, "collection": name, "data": {} }),
    };
    Ok(HttpResponse::Ok().json(body))
}
