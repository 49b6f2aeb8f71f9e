use super::password::{verify_dummy, verify_password};
use super::roles::resolve_role;
use super::token::TokenService;
use crate::db::Store;
use crate::error::CmsResult;
use crate::model::SafeUser;
use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::http::header;
use actix_web::HttpRequest;
use chrono::Utc;
use std::sync::Arc;

pub const SESSION_COOKIE: &str = "cms_session";

/// Login and session verification against the user table.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    tokens: Arc<TokenService>,
    secure_cookies: bool,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, tokens: Arc<TokenService>, secure_cookies: bool) -> Self {
        Self {
            store,
            tokens,
            secure_cookies,
        }
    }

    /// Checks credentials and issues a token. Unknown users, inactive users
    /// and wrong passwords all return `None`.
    pub async fn login(&self, username: &str, password: &str) -> CmsResult<Option<(SafeUser, String)>> {
        let user = match self.store.find_user_by_username(username).await? {
            Some(user) if user.active => user,
            _ => {
                verify_dummy(password.to_owned()).await?;
                return Ok(None);
            }
        };
        if !verify_password(password.to_owned(), user.password_hash.clone()).await? {
            return Ok(None);
        }

        let now = Utc::now();
        self.store.record_login(&user.id, now).await?;

        let role_name = resolve_role(self.store.as_ref(), user.role_id.as_deref(), &user.role)
            .await?
            .map(|r| r.name)
            .unwrap_or_else(|| user.role.clone());
        let token = self.tokens.issue(&user.id, &user.username, &role_name)?;

        log::info!("{} logged in", user.username);
        let mut safe = SafeUser::from(user);
        safe.last_login = Some(now);
        Ok(Some((safe, token)))
    }

    /// The user behind a valid token, provided they still exist and are active.
    pub async fn verify_session(&self, token: &str) -> CmsResult<Option<SafeUser>> {
        let claims = match self.tokens.verify(token) {
            Some(claims) => claims,
            None => return Ok(None),
        };
        Ok(self
            .store
            .find_user(&claims.sub)
            .await?
            .filter(|user| user.active)
            .map(SafeUser::from))
    }

    pub fn session_cookie(&self, token: &str) -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE, token.to_owned())
            .http_only(true)
            .secure(self.secure_cookies)
            .same_site(SameSite::Strict)
            .max_age(CookieDuration::seconds(self.tokens.ttl().num_seconds()))
            .path("/")
            .finish()
    }

    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(SESSION_COOKIE, "")
            .http_only(true)
            .secure(self.secure_cookies)
            .same_site(SameSite::Strict)
            .path("/")
            .finish();
        cookie.make_removal();
        cookie
    }
}

/// Session token from the `cms_session` cookie, else from a bearer
/// `Authorization` header.
pub fn extract_token(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_owned());
        }
    }
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_owned())
        .filter(|t| !t.is_empty())
}
