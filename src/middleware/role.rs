use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorForbidden, ErrorUnauthorized},
    Error, HttpMessage,
};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
};

use crate::middleware::auth::Identity;
use crate::models::profile::Role;

/// Lets only callers with the given role through. Must sit inside
/// `AuthMiddleware`, which provides the [`Identity`].
pub struct RequireRole(pub Role);

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireRoleService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRoleService {
            service: Rc::new(service),
            role: self.0,
        }))
    }
}

pub struct RequireRoleService<S> {
    service: Rc<S>,
    role: Role,
}

impl<S, B> Service<ServiceRequest> for RequireRoleService<S>
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

        let caller = req
            .extensions()
            .get::<Identity>()
            .map(|identity| (identity.profile_id, identity.role));

        match caller {
            None => return Box::pin(async move { Err(ErrorUnauthorized("Not authenticated")) }),
            Some((profile_id, role)) if role != self.role => {
                tracing::warn!("Profile {} with role {} attempted {} access", profile_id, role, self.role);
                return Box::pin(async move { Err(ErrorForbidden("Insufficient privileges")) });
            }
            Some(_) => {}
        }

        Box::pin(async move { service.call(req).await })
    }
}
