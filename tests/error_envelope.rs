// Every error leaves the API as `{"success": false, "error": "..."}` with
// the status the variant maps to.

use anyhow::Result;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use campdir::error::ApiError;

async fn envelope(err: ApiError) -> Result<(StatusCode, serde_json::Value)> {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok((status, serde_json::from_slice(&bytes)?))
}

#[tokio::test]
async fn not_found_envelope() -> Result<()> {
    let (status, body) = envelope(ApiError::not_found("Bootcamp not found with id of 123")).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], serde_json::json!(false));
    assert_eq!(body["error"], "Bootcamp not found with id of 123");
    Ok(())
}

#[tokio::test]
async fn auth_failures_use_401_and_403() -> Result<()> {
    let (status, body) = envelope(ApiError::unauthorized("Not authorized to access this route")).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Not authorized to access this route");

    let (status, _) = envelope(ApiError::forbidden(
        "User role user is not authorized to access this route",
    ))
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn missing_row_maps_to_404() -> Result<()> {
    let err: ApiError = sqlx::Error::RowNotFound.into();
    let (status, body) = envelope(err).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Resource not found");
    Ok(())
}

#[tokio::test]
async fn internal_details_are_masked() -> Result<()> {
    let err: ApiError = sqlx::Error::PoolTimedOut.into();
    let (status, body) = envelope(err).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    // The sqlx detail must not leak into the client-facing message
    let msg = body["error"].as_str().unwrap_or_default();
    assert!(!msg.to_lowercase().contains("pool"), "leaked: {}", msg);
    Ok(())
}

/// Minimal driver error carrying only a SQLSTATE code, for exercising
/// the code-based status mapping without a live database.
#[derive(Debug)]
struct PgStateError(&'static str);

impl std::fmt::Display for PgStateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SQLSTATE {}", self.0)
    }
}

impl std::error::Error for PgStateError {}

impl sqlx::error::DatabaseError for PgStateError {
    fn message(&self) -> &str {
        "database rejected the statement"
    }

    fn code(&self) -> Option<std::borrow::Cow<'_, str>> {
        Some(std::borrow::Cow::Borrowed(self.0))
    }

    fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self
    }

    fn kind(&self) -> sqlx::error::ErrorKind {
        match self.0 {
            "23505" => sqlx::error::ErrorKind::UniqueViolation,
            _ => sqlx::error::ErrorKind::Other,
        }
    }
}

fn db_error(code: &'static str) -> ApiError {
    sqlx::Error::Database(Box::new(PgStateError(code))).into()
}

#[tokio::test]
async fn unique_violation_maps_to_duplicate_400() -> Result<()> {
    let (status, body) = envelope(db_error("23505")).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Duplicate field value entered");
    Ok(())
}

#[tokio::test]
async fn type_mismatches_map_to_400() -> Result<()> {
    for code in ["22P02", "42804", "42883"] {
        let (status, body) = envelope(db_error(code)).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "code {}", code);
        assert_eq!(body["error"], "Invalid value for one or more fields");
    }
    Ok(())
}

#[tokio::test]
async fn unrecognized_database_errors_stay_masked() -> Result<()> {
    let (status, body) = envelope(db_error("57014")).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let msg = body["error"].as_str().unwrap_or_default();
    assert!(!msg.contains("57014"), "leaked: {}", msg);
    Ok(())
}

#[tokio::test]
async fn translator_errors_surface_as_400() -> Result<()> {
    let params = vec![("price[regex]".to_string(), "1".to_string())];
    let err: ApiError = campdir::query::QueryDescriptor::from_params(&params)
        .unwrap_err()
        .into();
    let (status, _) = envelope(err).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}
