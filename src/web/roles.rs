use super::extract::AuthUser;
use crate::accounts::{self, NewRole, RolePatch};
use crate::context::AppState;
use crate::error::CmsResult;
use crate::model::{Action, Resource};
use actix_web::{delete, get, post, put, web, HttpResponse};
use serde_json::json;

pub(super) fn configure(conf: &mut web::ServiceConfig) {
    conf.service(list_roles)
        .service(create_role)
        .service(update_role)
        .service(delete_role);
}

#[get("/roles")]
async fn list_roles(user: AuthUser, state: web::Data<AppState>) -> CmsResult<HttpResponse> {
    user.require(&state, Resource::Roles, Action::Read, None).await?;

    let roles = accounts::list_roles(state.store.as_ref()).await?;
    Ok(HttpResponse::Ok().json(json!({ "data": roles })))
}

#[post("/roles")]
async fn create_role(
    user: AuthUser,
    state: web::Data<AppState>,
    body: web::Json<NewRole>,
) -> CmsResult<HttpResponse> {
    user.require(&state, Resource::Roles, Action::Create, None).await?;

    let role = accounts::create_role(state.store.as_ref(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "id": role.id, "data": role })))
}

#[put("/roles/{id}")]
async fn update_role(
    user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<RolePatch>,
) -> CmsResult<HttpResponse> {
    user.require(&state, Resource::Roles, Action::Update, None).await?;

    let role = accounts::update_role(state.store.as_ref(), &path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": role })))
}

#[delete("/roles/{id}")]
async fn delete_role(
    user: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> CmsResult<HttpResponse> {
    user.require(&state, Resource::Roles, Action::Delete, None).await?;

    accounts::delete_role(state.store.as_ref(), &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
