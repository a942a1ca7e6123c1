// Authentication endpoints: register, login, logout, profile and the
// password flows. Token issuance answers with the JWT in the body and as an
// httpOnly cookie.
use axum::extract::{Host, Path};
use axum::http::{header::SET_COOKIE, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Json, Response};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::api::{ApiResponse, ApiResult};
use crate::auth::{self, password, Claims};
use crate::config;
use crate::database::models::{Role, User};
use crate::database::Db;
use crate::error::ApiError;
use crate::mail::{self, Mail};
use crate::middleware::CurrentUser;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDetailsRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
}

/// POST /api/v1/auth/register
pub async fn register(Json(payload): Json<RegisterRequest>) -> Result<Response, ApiError> {
    let role = payload.role.unwrap_or(Role::User);
    if role == Role::Admin {
        return Err(ApiError::bad_request("Cannot register as admin"));
    }

    let hash = password::hash_password(&payload.password)?;
    let user = User::create(&payload.name, &payload.email, role, &hash, Db::pool()?).await?;

    token_response(&user, StatusCode::CREATED)
}

/// POST /api/v1/auth/login
pub async fn login(Json(payload): Json<LoginRequest>) -> Result<Response, ApiError> {
    let (Some(email), Some(pass)) = (payload.email, payload.password) else {
        return Err(ApiError::bad_request("Please provide an email and password"));
    };

    let user = User::find_by_email(&email, Db::pool()?)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    if !password::verify_password(&pass, &user.password)? {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    token_response(&user, StatusCode::OK)
}

/// GET /api/v1/auth/logout - clear the token cookie
pub async fn logout() -> Response {
    (
        AppendHeaders([(SET_COOKIE, expired_cookie())]),
        Json(json!({ "success": true, "data": {} })),
    )
        .into_response()
}

/// GET /api/v1/auth/me
pub async fn me(CurrentUser(user): CurrentUser) -> ApiResult<User> {
    Ok(ApiResponse::success(user))
}

/// PUT /api/v1/auth/updatedetails
pub async fn update_details(
    CurrentUser(user): CurrentUser,
    Json(payload): Json<UpdateDetailsRequest>,
) -> ApiResult<User> {
    let updated = User::update_details(
        user.id,
        payload.name.as_deref(),
        payload.email.as_deref(),
        Db::pool()?,
    )
    .await?;
    Ok(ApiResponse::success(updated))
}

/// PUT /api/v1/auth/updatepassword - requires the current password
pub async fn update_password(
    CurrentUser(user): CurrentUser,
    Json(payload): Json<UpdatePasswordRequest>,
) -> Result<Response, ApiError> {
    if !password::verify_password(&payload.current_password, &user.password)? {
        return Err(ApiError::unauthorized("Password is incorrect"));
    }

    let hash = password::hash_password(&payload.new_password)?;
    let updated = User::update_password(user.id, &hash, Db::pool()?).await?;

    token_response(&updated, StatusCode::OK)
}

/// POST /api/v1/auth/forgotpassword - issue a hashed, short-lived reset
/// token and mail the raw token
pub async fn forgot_password(
    Host(host): Host,
    Json(payload): Json<ForgotPasswordRequest>,
) -> ApiResult<&'static str> {
    let pool = Db::pool()?;
    let user = User::find_by_email(&payload.email, pool)
        .await?
        .ok_or_else(|| ApiError::not_found("There is no user with that email"))?;

    let (raw_token, token_hash) = password::generate_reset_token();
    let expire = Utc::now() + Duration::minutes(config::config().security.reset_token_expiry_mins);
    User::set_reset_token(user.id, &token_hash, expire, pool).await?;

    let reset_url = format!("http://{}/api/v1/auth/resetpassword/{}", host, raw_token);
    let sent = mail::send(Mail {
        to: user.email.clone(),
        subject: "Password reset token".to_string(),
        body: format!(
            "You are receiving this email because you (or someone else) has requested the \
             reset of a password. Please make a PUT request to:\n\n{}",
            reset_url
        ),
    })
    .await;

    if let Err(e) = sent {
        // Undo the token so a failed send leaves no dangling credential
        User::clear_reset_token(user.id, pool).await?;
        return Err(e.into());
    }

    Ok(ApiResponse::success("Email sent"))
}

/// PUT /api/v1/auth/resetpassword/:resettoken
pub async fn reset_password(
    Path(reset_token): Path<String>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Response, ApiError> {
    let pool = Db::pool()?;

    let token_hash = password::hash_token(&reset_token);
    let user = User::find_by_reset_token(&token_hash, pool)
        .await?
        .ok_or_else(|| ApiError::bad_request("Invalid token"))?;

    let hash = password::hash_password(&payload.password)?;
    let updated = User::update_password(user.id, &hash, pool).await?;

    token_response(&updated, StatusCode::OK)
}

/// Issue a JWT, set it as an httpOnly cookie, and return it in the body
fn token_response(user: &User, status: StatusCode) -> Result<Response, ApiError> {
    let token = auth::generate_jwt(Claims::new(user))?;
    Ok((
        status,
        AppendHeaders([(SET_COOKIE, auth_cookie(&token))]),
        Json(json!({ "success": true, "token": token })),
    )
        .into_response())
}

fn auth_cookie(token: &str) -> String {
    let security = &config::config().security;
    let max_age_secs = security.cookie_expire_days * 24 * 60 * 60;
    let mut cookie = format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly",
        security.cookie_name, token, max_age_secs
    );
    if security.secure_cookies {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Replacement cookie that expires almost immediately
fn expired_cookie() -> String {
    let security = &config::config().security;
    let mut cookie = format!("{}=none; Max-Age=10; Path=/; HttpOnly", security.cookie_name);
    if security.secure_cookies {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_cookie_is_http_only_with_configured_lifetime() {
        let cookie = auth_cookie("abc123");
        assert!(cookie.starts_with("token=abc123;"));
        assert!(cookie.contains("HttpOnly"));
        let expected = config::config().security.cookie_expire_days * 24 * 60 * 60;
        assert!(cookie.contains(&format!("Max-Age={}", expected)));
    }

    #[test]
    fn logout_cookie_expires_quickly() {
        let cookie = expired_cookie();
        assert!(cookie.starts_with("token=none;"));
        assert!(cookie.contains("Max-Age=10"));
    }
}
