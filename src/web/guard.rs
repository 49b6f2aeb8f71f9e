use crate::context::AppState;
use crate::error::CmsError;
use crate::ip::client_key;
use actix_web::body::EitherBody;
use actix_web::dev::{self, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::web::Data;
use actix_web::{Error, ResponseError};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;

/// Applies the general API rate limit, keyed by client address, before any
/// handler runs.
#[derive(Clone, Copy, Debug, Default)]
pub struct ApiRateLimit;

impl<S: 'static, B> Transform<S, ServiceRequest> for ApiRateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = ApiRateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ApiRateLimitMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct ApiRateLimitMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for ApiRateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if let Some(state) = req.app_data::<Data<AppState>>() {
            let key = client_key(req.request(), state.config.server.trust_proxy);
            if let Err(limited) = state.rate_limits.check_api(&key) {
                log::warn!("API rate limit exceeded for {}", key);
                let response = CmsError::from(limited).error_response();
                return Box::pin(async move { Ok(req.into_response(response).map_into_right_body()) });
            }
        }

        let svc = self.service.clone();
        Box::pin(async move { Ok(svc.call(req).await?.map_into_left_body()) })
    }
}
