use super::extract::AuthUser;
use crate::context::AppState;
use crate::error::CmsResult;
use crate::model::{Action, Resource};
use crate::settings::{get_branding, put_branding};
use actix_web::{get, put, web, HttpResponse};
use serde_json::{json, Value};

pub(super) fn configure(conf: &mut web::ServiceConfig) {
    conf.service(view_branding).service(save_branding);
}

/// Public so the login screen can be branded before anyone signs in.
#[get("/settings/branding")]
async fn view_branding(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(get_branding(state.store.as_ref()).await)
}

#[put("/settings/branding")]
async fn save_branding(
    user: AuthUser,
    state: web::Data<AppState>,
    body: web::Json<Value>,
) -> CmsResult<HttpResponse> {
    user.require(&state, Resource::Settings, Action::Update, None).await?;

    put_branding(state.store.as_ref(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Branding settings saved successfully",
    })))
}
