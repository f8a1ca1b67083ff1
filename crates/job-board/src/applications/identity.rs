use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::Response;

use super::domain::UserId;
use super::router::failure_response;

/// Header carrying the caller identity, set by the upstream authentication proxy.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Authenticated caller resolved from [`USER_ID_HEADER`]; requests without it get a 401.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub UserId);

#[async_trait]
impl<St> FromRequestParts<St> for AuthenticatedUser
where
    St: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
        let caller = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty());

        match caller {
            Some(id) => Ok(Self(UserId(id.to_string()))),
            None => Err(failure_response(
                StatusCode::UNAUTHORIZED,
                "User not authenticated",
            )),
        }
    }
}
