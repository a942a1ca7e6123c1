use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, DecodingKey, Validation};

use crate::auth::Claims;
use crate::config;
use crate::database::models::{Role, User};
use crate::database::Db;
use crate::error::ApiError;

/// Authenticated identity, extracted from the JWT and confirmed against the
/// users table. Any handler taking this as an argument is a protected route.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// Every verification failure yields the same message - no leak of which
/// check failed.
fn unauthorized() -> ApiError {
    ApiError::unauthorized("Not authorized to access this route")
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers).ok_or_else(unauthorized)?;
        let claims = validate_jwt(&token).map_err(|_| unauthorized())?;

        let pool = Db::pool()?;
        let user = User::find(claims.sub, pool)
            .await
            .map_err(ApiError::from)?
            .ok_or_else(unauthorized)?;

        Ok(CurrentUser(user))
    }
}

/// Pure set-membership role check; role failures are 403, unlike ownership
/// failures which surface as 401.
pub fn authorize(user: &User, allowed: &[Role]) -> Result<(), ApiError> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(ApiError::forbidden(format!(
            "User role {} is not authorized to access this route",
            user.role
        )))
    }
}

/// Token source precedence: Authorization bearer header first, then the
/// named cookie.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get("authorization") {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                if !token.trim().is_empty() {
                    return Some(token.to_string());
                }
            }
        }
        return None;
    }

    let jar = CookieJar::from_headers(headers);
    jar.get(&config::config().security.cookie_name)
        .map(|c| c.value().to_string())
}

fn validate_jwt(token: &str) -> Result<Claims, String> {
    let secret = &config::config().security.jwt_secret;

    if secret.is_empty() {
        return Err("JWT secret not configured".to_string());
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| format!("Invalid JWT token: {}", e))?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::Utc;
    use uuid::Uuid;

    fn user_with_role(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Tester".into(),
            email: "t@example.com".into(),
            role,
            password: "hash".into(),
            reset_password_token: None,
            reset_password_expire: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn authorize_is_set_membership() {
        let publisher = user_with_role(Role::Publisher);
        assert!(authorize(&publisher, &[Role::Publisher, Role::Admin]).is_ok());

        let err = authorize(&publisher, &[Role::Admin]).unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn bearer_header_takes_precedence_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc123"));
        headers.insert("cookie", HeaderValue::from_static("token=from-cookie"));
        assert_eq!(extract_token(&headers), Some("abc123".to_string()));
    }

    #[test]
    fn falls_back_to_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_static("token=from-cookie"));
        assert_eq!(extract_token(&headers), Some("from-cookie".to_string()));
    }

    #[test]
    fn missing_token_yields_none() {
        assert_eq!(extract_token(&HeaderMap::new()), None);
    }

    #[test]
    fn malformed_bearer_header_yields_none() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Token abc"));
        assert_eq!(extract_token(&headers), None);
    }

    #[test]
    fn expired_token_is_rejected() {
        use jsonwebtoken::{encode, EncodingKey, Header};

        let claims = Claims {
            sub: Uuid::new_v4(),
            role: Role::User,
            exp: (Utc::now() - chrono::Duration::hours(1)).timestamp(),
            iat: (Utc::now() - chrono::Duration::hours(2)).timestamp(),
        };
        let secret = &config::config().security.jwt_secret;
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();

        assert!(validate_jwt(&token).is_err());
    }
}
