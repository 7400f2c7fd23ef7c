//! Display-name validation shared by every mutation path.

use drivebox_core::error::AppError;
use drivebox_core::result::AppResult;

/// Characters that may not appear in a node name.
pub const RESERVED_CHARS: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Validate a raw display name and return its trimmed form.
///
/// Rejection order: empty after trim first, then reserved characters.
pub fn validate_name(raw: &str) -> AppResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::invalid_name("Name cannot be empty"));
    }
    if let Some(bad) = name.chars().find(|c| RESERVED_CHARS.contains(c)) {
        return Err(AppError::invalid_name(format!(
            "Name contains reserved character '{bad}'"
        )));
    }
    Ok(name.to_string())
}
