pub mod auth;
pub mod bootcamps;
pub mod courses;
pub mod reviews;
pub mod users;

use uuid::Uuid;

use crate::database::models::{Role, User};
use crate::error::ApiError;

/// Malformed ids funnel into a 400 rather than a framework rejection
pub(crate) fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request(format!("Invalid id format: {}", raw)))
}

/// Ownership rule: non-admin actors may only mutate resources they own.
/// Failures surface as 401.
pub(crate) fn check_ownership(
    owner_id: Uuid,
    actor: &User,
    action: &str,
    resource: &str,
) -> Result<(), ApiError> {
    if actor.role == Role::Admin || owner_id == actor.id {
        Ok(())
    } else {
        Err(ApiError::unauthorized(format!(
            "User {} is not authorized to {} this {}",
            actor.id, action, resource
        )))
    }
}
