use super::collections::{require_data, translations_from, LocaleParam};
use super::extract::AuthUser;
use crate::context::AppState;
use crate::error::CmsResult;
use crate::model::{Action, Resource};
use actix_web::{get, put, web, HttpResponse};
use serde::Deserialize;
use serde_json::{json, Value};

pub(super) fn configure(conf: &mut web::ServiceConfig) {
    conf.service(list_singleton_names)
        .service(view_singleton)
        .service(save_singleton);
}

#[derive(Debug, Default, Deserialize)]
pub struct SingletonBody {
    pub data: Option<Value>,
    pub translations: Option<Value>,
}

#[get("/singletons")]
async fn list_singleton_names(_user: AuthUser, state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "singletons": state.content.model().singleton_names() }))
}

#[get("/singletons/{name}")]
async fn view_singleton(
    user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<LocaleParam>,
) -> CmsResult<HttpResponse> {
    let name = path.into_inner();
    user.require(&state, Resource::Singletons, Action::Read, Some(&name))
        .await?;

    match state
        .content
        .get_singleton(&name, params.locale.as_deref())
        .await?
    {
        Some(singleton) => Ok(HttpResponse::Ok().json(singleton)),
        None => Ok(HttpResponse::Ok().json(json!({
            "id": null,
            "collection": name,
            "data": {},
            "translations": {},
        }))),
    }
}

#[put("/singletons/{name}")]
async fn save_singleton(
    user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<SingletonBody>,
) -> CmsResult<HttpResponse> {
    let name = path.into_inner();
    let body = body.into_inner();
    user.require(&state, Resource::Singletons, Action::Update, Some(&name))
        .await?;

    let data = require_data(body.data)?;
    let id = state
        .content
        .upsert_singleton(&name, data, translations_from(body.translations), Some(user.id()))
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "id": id })))
}
