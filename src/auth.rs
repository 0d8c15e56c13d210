use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::UserProfile;

/// Header the auth gateway sets once it has verified the session.
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub Uuid);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        Uuid::parse_str(raw.trim())
            .map(CurrentUser)
            .map_err(|_| AppError::Unauthorized)
    }
}

/// True until a profile exists with name, school and year filled in.
pub fn needs_profile_setup(profile: Option<&UserProfile>) -> bool {
    !profile.map(UserProfile::is_complete).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(header: Option<&str>) -> Result<CurrentUser, AppError> {
        let mut builder = Request::builder().uri("/api/session");
        if let Some(value) = header {
            builder = builder.header(USER_ID_HEADER, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        CurrentUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn reads_user_from_header() {
        let id = Uuid::new_v4();
        let user = extract(Some(&id.to_string())).await.unwrap();
        assert_eq!(user, CurrentUser(id));
    }

    #[tokio::test]
    async fn missing_or_garbled_header_is_unauthorized() {
        assert!(matches!(extract(None).await, Err(AppError::Unauthorized)));
        assert!(matches!(
            extract(Some("not-a-uuid")).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn missing_profile_needs_setup() {
        assert!(needs_profile_setup(None));
    }
}
