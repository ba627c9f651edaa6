use actix_web::dev::Payload;
use actix_web::{web, Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;

use crate::access::require_active;
use crate::auth::token::Claims;
use crate::error::AppError;
use crate::models::User;
use crate::storage::Repository;

/// The authenticated user, freshly loaded from storage.
///
/// Reads the `Claims` that `AuthMiddleware` stored on the request, so it only works
/// behind the middleware. Missing claims or a token whose user no longer exists are
/// `Unauthorized`; a deactivated account is `Forbidden`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequest for CurrentUser {
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user_id = req
            .extensions()
            .get::<Claims>()
            .map(|claims| claims.sub)
            .ok_or_else(|| AppError::Unauthorized("Missing authentication".into()));
        let repo = req.app_data::<web::Data<dyn Repository>>().cloned();

        Box::pin(async move {
            let user_id = user_id?;
            let repo = repo.ok_or_else(|| {
                AppError::InternalServerError("Repository is not configured".into())
            })?;
            let user = match repo.get_user(user_id).await {
                Ok(user) => user,
                Err(AppError::NotFound(_)) => {
                    return Err(AppError::Unauthorized("Unknown user".into()).into());
                }
                Err(e) => return Err(e.into()),
            };
            require_active(&user)?;
            Ok::<_, ActixError>(CurrentUser(user))
        })
    }
}
