use crate::auth::{extract_token, require_permission};
use crate::context::AppState;
use crate::error::{CmsError, CmsResult};
use crate::model::{Action, Resource, SafeUser};
use actix_web::dev::Payload;
use actix_web::web::Data;
use actix_web::{Error, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;

/// The signed-in user behind the request's session cookie or bearer token.
/// Extraction fails with 401 when there is none.
#[derive(Clone, Debug)]
pub struct AuthUser(pub SafeUser);

impl AuthUser {
    pub fn id(&self) -> &str {
        &self.0.id
    }

    /// Fails with 403 unless the user's role grants `action` on `resource`.
    pub async fn require(
        &self,
        state: &AppState,
        resource: Resource,
        action: Action,
        name: Option<&str>,
    ) -> CmsResult<()> {
        require_permission(state.store.as_ref(), &self.0, resource, action, name).await
    }
}

impl FromRequest for AuthUser {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let state = req.app_data::<Data<AppState>>().cloned();
        let token = extract_token(req);

        Box::pin(async move {
            let state = state.ok_or(CmsError::Uninitialized)?;
            let token = token.ok_or(CmsError::Unauthorized)?;
            match state.auth.verify_session(&token).await? {
                Some(user) => Ok(AuthUser(user)),
                None => Err(CmsError::Unauthorized.into()),
            }
        })
    }
}
