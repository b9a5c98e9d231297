//! Caller identity extractor.
//!
//! Authentication happens upstream. The authenticated user's ID arrives in
//! the `x-user-id` header and is trusted as-is.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use planetarium_core::UserId;

use crate::error::set_sentry_user;

/// Header carrying the authenticated user ID.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Extractor that requires an identified caller.
///
/// # Example
///
/// ```rust,ignore
/// async fn my_reservations(RequireUser(user): RequireUser) -> impl IntoResponse {
///     format!("Hello, user {user}!")
/// }
/// ```
pub struct RequireUser(pub UserId);

/// Error returned when the caller cannot be identified.
#[derive(Debug, PartialEq, Eq)]
pub enum UserRejection {
    /// No `x-user-id` header.
    Missing,
    /// The header is not a positive integer.
    Malformed,
}

impl IntoResponse for UserRejection {
    fn into_response(self) -> Response {
        let message = match self {
            Self::Missing => "Authentication credentials were not provided",
            Self::Malformed => "Invalid user identity",
        };
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "unauthorized", "message": message })),
        )
            .into_response()
    }
}

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = UserRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or(UserRejection::Missing)?;

        let user = raw
            .to_str()
            .ok()
            .and_then(|s| s.parse::<UserId>().ok())
            .filter(|id| id.as_i32() > 0)
            .ok_or(UserRejection::Malformed)?;

        tracing::Span::current().record("user_id", user.as_i32());
        set_sentry_user(&user);

        Ok(Self(user))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    async fn extract(value: Option<&str>) -> Result<UserId, UserRejection> {
        let mut builder = Request::builder();
        if let Some(v) = value {
            builder = builder.header(USER_ID_HEADER, v);
        }
        let (mut parts, ()) = builder.body(()).unwrap().into_parts();
        RequireUser::from_request_parts(&mut parts, &())
            .await
            .map(|RequireUser(user)| user)
    }

    #[tokio::test]
    async fn test_valid_user() {
        assert_eq!(extract(Some("42")).await.unwrap(), UserId::new(42));
        assert_eq!(extract(Some(" 7 ")).await.unwrap(), UserId::new(7));
    }

    #[tokio::test]
    async fn test_missing_user() {
        assert_eq!(extract(None).await.unwrap_err(), UserRejection::Missing);
    }

    #[tokio::test]
    async fn test_malformed_user() {
        assert_eq!(extract(Some("abc")).await.unwrap_err(), UserRejection::Malformed);
        assert_eq!(extract(Some("0")).await.unwrap_err(), UserRejection::Malformed);
        assert_eq!(extract(Some("-3")).await.unwrap_err(), UserRejection::Malformed);
    }
}
