/// Authentication primitives for the HTTP layer
///
/// The API server's auth middleware validates a Bearer token, loads the
/// account, and inserts an [`AuthUser`] into request extensions. Handlers
/// extract it with Axum's `Extension` extractor and pass its fields to
/// the policy checks.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use taskdeck_shared::auth::middleware::AuthUser;
///
/// async fn handler(Extension(auth): Extension<AuthUser>) -> String {
///     format!("Hello, user {}", auth.id)
/// }
/// ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::{Role, User};

/// Authenticated caller identity, added to request extensions
///
/// Role and active flag are loaded fresh from the database on every
/// request, so a role change or deactivation takes effect immediately
/// instead of waiting for token expiry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AuthUser {
    /// Authenticated user ID
    pub id: Uuid,

    /// Current role, from the user record (not the token)
    pub role: Role,
}

impl AuthUser {
    /// Builds the auth context from a freshly loaded user record
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            role: user.role,
        }
    }

    /// Whether the caller holds the admin role
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Error type for authentication failures
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing authorization header
    #[error("Not authorized to access this route")]
    MissingCredentials,

    /// Authorization header is not a Bearer token
    #[error("Expected Bearer token")]
    InvalidFormat,

    /// Token validation failed
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Account no longer exists or has been deactivated
    #[error("User not found or inactive")]
    InactiveAccount,
}

/// Extracts the Bearer token from request headers
///
/// # Errors
///
/// Returns `MissingCredentials` when the Authorization header is absent
/// and `InvalidFormat` when it does not carry a Bearer token.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidFormat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::Utc;

    fn sample_user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Test".to_string(),
            email: "test@example.com".to_string(),
            password_hash: "hash".to_string(),
            role,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_login_at: None,
        }
    }

    #[test]
    fn test_auth_user_from_user() {
        let user = sample_user(Role::Admin);
        let auth = AuthUser::from_user(&user);

        assert_eq!(auth.id, user.id);
        assert!(auth.is_admin());

        let auth = AuthUser::from_user(&sample_user(Role::User));
        assert!(!auth.is_admin());
    }

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def.ghi"),
        );

        assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_bearer_token_missing_header() {
        let headers = HeaderMap::new();
        assert!(matches!(
            bearer_token(&headers),
            Err(AuthError::MissingCredentials)
        ));
    }

    #[test]
    fn test_bearer_token_wrong_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Basic dXNlcjpwYXNz"),
        );

        assert!(matches!(bearer_token(&headers), Err(AuthError::InvalidFormat)));
    }
}
