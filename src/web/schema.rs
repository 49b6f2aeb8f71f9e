use super::extract::AuthUser;
use crate::context::AppState;
use actix_web::{get, web, HttpResponse};

pub(super) fn configure(conf: &mut web::ServiceConfig) {
    conf.service(view_schema);
}

/// Locales, collections and singletons of the loaded content model.
#[get("/schema")]
async fn view_schema(_user: AuthUser, state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.content.model().config())
}
