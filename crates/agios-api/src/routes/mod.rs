pub mod files;
pub mod health;
pub mod messages;
pub mod threads;

use crate::error::ApiError;

/// Parse a path ID, rejecting anything that is not a UUID
pub(crate) fn parse_id(raw: &str, what: &str, code: &'static str) -> Result<String, ApiError> {
    uuid::Uuid::parse_str(raw)
        .map(|id| id.to_string())
        .map_err(|_| ApiError::bad_request(format!("Invalid {what} ID format"), code))
}
