use super::extract::AuthUser;
use crate::accounts::{self, NewUser};
use crate::context::AppState;
use crate::error::CmsResult;
use crate::model::{Action, Resource};
use actix_web::{get, post, web, HttpResponse};
use serde_json::json;

pub(super) fn configure(conf: &mut web::ServiceConfig) {
    conf.service(list_users)
        .service(create_user)
        .service(view_user);
}

#[get("/users")]
async fn list_users(user: AuthUser, state: web::Data<AppState>) -> CmsResult<HttpResponse> {
    user.require(&state, Resource::Users, Action::Read, None).await?;

    let users = accounts::list_users(state.store.as_ref()).await?;
    Ok(HttpResponse::Ok().json(json!({ "data": users })))
}

#[post("/users")]
async fn create_user(
    user: AuthUser,
    state: web::Data<AppState>,
    body: web::Json<NewUser>,
) -> CmsResult<HttpResponse> {
    user.require(&state, Resource::Users, Action::Create, None).await?;

    let id = accounts::create_user(state.store.as_ref(), &user.0, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "id": id })))
}

#[get("/users/{id}")]
async fn view_user(
    user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> CmsResult<HttpResponse> {
    user.require(&state, Resource::Users, Action::Read, None).await?;

    let found = accounts::get_user(state.store.as_ref(), &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "data": found })))
}
