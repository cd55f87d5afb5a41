use std::future::{ready, Ready};
use std::rc::Rc;

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorInternalServerError, ErrorUnauthorized},
    http::header,
    web, Error, HttpMessage,
};
use futures_util::future::LocalBoxFuture;
use uuid::Uuid;

use crate::auth::jwt::{decode_token, Claims};
use crate::config::jwt::JwtSettings;
use crate::db::GymStore;
use crate::models::profile::Role;

/// Caller resolved from the token subject; read by handlers through `web::ReqData<Identity>`.
#[derive(Debug, Clone)]
pub struct Identity {
    pub profile_id: Uuid,
    pub role: Role,
    pub name: String,
}

/// Extracts and validates the bearer token, returning the decoded claims.
pub fn validate_jwt_from_request(req: &ServiceRequest) -> Result<Claims, Error> {
    let jwt_settings = req
        .app_data::<web::Data<JwtSettings>>()
        .ok_or_else(|| ErrorUnauthorized("JWT settings not found"))?;

    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ErrorUnauthorized("No authorization header"))?
        .to_str()
        .map_err(|_| ErrorUnauthorized("Invalid authorization header"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ErrorUnauthorized("Invalid authorization header format"))?;

    decode_token(jwt_settings, token).map_err(|e| {
        tracing::warn!("Failed to decode token: {:?}", e);
        ErrorUnauthorized("Invalid token")
    })
}

/// Validates the token, loads the caller's profile and attaches an [`Identity`].
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        let claims = match validate_jwt_from_request(&req) {
            Ok(claims) => claims,
            Err(e) => return Box::pin(async move { Err(e) }),
        };
        let Some(profile_id) = claims.profile_id() else {
            return Box::pin(async move { Err(ErrorUnauthorized("Invalid token subject")) });
        };
        let Some(store) = req.app_data::<web::Data<dyn GymStore>>().cloned() else {
            return Box::pin(async move { Err(ErrorInternalServerError("Store not configured")) });
        };

        Box::pin(async move {
            let identity = load_identity(store.get_ref(), profile_id).await?;
            req.extensions_mut().insert(identity);
            service.call(req).await
        })
    }
}

async fn load_identity(store: &dyn GymStore, profile_id: Uuid) -> Result<Identity, Error> {
    match store.get_profile(profile_id).await {
        Ok(Some(profile)) => Ok(Identity {
            profile_id: profile.id,
            role: profile.role,
            name: profile.name,
        }),
        Ok(None) => {
            tracing::warn!("Token subject {} has no profile", profile_id);
            Err(ErrorUnauthorized("Unknown profile"))
        }
        Err(e) => {
            tracing::error!("Failed to load profile {}: {}", profile_id, e);
            Err(ErrorInternalServerError("Failed to load profile"))
        }
    }
}
