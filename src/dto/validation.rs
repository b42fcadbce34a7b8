//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::events::MAX_CLIENT_ID_LEN;

/// Rejects strings that are empty once trimmed.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("value must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Validates an event idempotency key: non-empty, at most
/// [`MAX_CLIENT_ID_LEN`] characters, no whitespace.
///
/// ```ignore
/// validate_client_id("3f2a9c")   // Ok
/// validate_client_id("")         // Err - empty
/// validate_client_id("a b")      // Err - whitespace
/// ```
pub fn validate_client_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() || id.len() > MAX_CLIENT_ID_LEN {
        let mut err = ValidationError::new("client_id_length");
        err.message = Some(
            format!(
                "client id must be 1 to {MAX_CLIENT_ID_LEN} characters (got {})",
                id.len()
            )
            .into(),
        );
        return Err(err);
    }

    if id.chars().any(char::is_whitespace) {
        let mut err = ValidationError::new("client_id_format");
        err.message = Some("client id must not contain whitespace".into());
        return Err(err);
    }

    Ok(())
}
