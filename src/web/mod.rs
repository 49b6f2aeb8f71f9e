pub mod auth;
pub mod collections;
pub mod extract;
pub mod guard;
pub mod media;
pub mod public;
pub mod roles;
pub mod schema;
pub mod settings;
pub mod singletons;
pub mod users;

use crate::error::CmsError;
use actix_web::http::header;
use actix_web::middleware::DefaultHeaders;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};

/// Mount point of the whole API.
pub const API_PREFIX: &str = "/api/cms";

/// Configures the web app by adding services from each web file.
///
/// @see https://docs.rs/actix-web/4.0.1/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut web::ServiceConfig) {
    conf.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        CmsError::bad_request(format!("Invalid request body: {}", err)).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        CmsError::bad_request(format!("Invalid query: {}", err)).into()
    }))
    .service(
        web::scope(API_PREFIX)
            .wrap(guard::ApiRateLimit)
            // Order matters within a scope: the public routes and the
            // media file route are matched before the authenticated ones.
            .configure(public::configure)
            .configure(auth::configure)
            .configure(schema::configure)
            .configure(collections::configure)
            .configure(singletons::configure)
            .configure(media::configure)
            .configure(users::configure)
            .configure(roles::configure)
            .configure(settings::configure)
            .default_service(web::to(not_found)),
    );
}

async fn not_found(req: HttpRequest) -> HttpResponse {
    CmsError::not_found(format!("Route {}", req.path())).error_response()
}

/// Headers added to every response. Production also gets a locked down
/// content policy and HSTS.
pub fn security_headers(production: bool) -> DefaultHeaders {
    let headers = DefaultHeaders::new()
        .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
        .add((header::X_FRAME_OPTIONS, "DENY"))
        .add(("X-XSS-Protection", "1; mode=block"))
        .add(("Referrer-Policy", "strict-origin-when-cross-origin"))
        .add(("Permissions-Policy", "camera=(), microphone=(), geolocation=()"))
        .add((
            header::CACHE_CONTROL,
            "no-store, no-cache, must-revalidate, proxy-revalidate",
        ))
        .add((header::PRAGMA, "no-cache"))
        .add((header::EXPIRES, "0"));

    if production {
        headers
            .add((
                header::CONTENT_SECURITY_POLICY,
                "default-src 'none'; frame-ancestors 'none'",
            ))
            .add((header::STRICT_TRANSPORT_SECURITY, "max-age=31536000; includeSubDomains"))
    } else {
        headers
    }
}
