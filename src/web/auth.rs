use super::extract::AuthUser;
use crate::context::AppState;
use crate::error::{CmsError, CmsResult};
use crate::fields::ValidationErrors;
use crate::ip::client_key;
use actix_web::{delete, get, post, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;

pub(super) fn configure(conf: &mut web::ServiceConfig) {
    conf.service(login).service(current_user).service(logout);
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.username.is_empty() {
            errors.add("username", "Username is required");
        }
        if self.password.is_empty() {
            errors.add("password", "Password is required");
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[post("/auth/login")]
async fn login(
    req: HttpRequest,
    state: web::Data<AppState>,
    form: web::Json<LoginForm>,
) -> CmsResult<HttpResponse> {
    let client = client_key(&req, state.config.server.trust_proxy);
    state.rate_limits.check_login(&client)?;
    form.check()?;

    match state.auth.login(&form.username, &form.password).await? {
        Some((user, token)) => {
            state.rate_limits.reset_login(&client);
            Ok(HttpResponse::Ok()
                .cookie(state.auth.session_cookie(&token))
                .json(json!({ "success": true, "user": user })))
        }
        None => {
            log::info!("Failed login attempt from {}", client);
            Err(CmsError::InvalidCredentials)
        }
    }
}

#[get("/auth/me")]
async fn current_user(user: AuthUser) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "user": user.0 }))
}

#[delete("/auth/sessions")]
async fn logout(user: AuthUser, state: web::Data<AppState>) -> HttpResponse {
    log::info!("{} logged out", user.0.username);
    HttpResponse::Ok()
        .cookie(state.auth.removal_cookie())
        .json(json!({
            "success": true,
            "message": "Session invalidated successfully",
            "user": { "id": user.0.id, "username": user.0.username },
        }))
}
