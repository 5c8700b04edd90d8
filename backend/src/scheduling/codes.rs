//! Opaque exam codes attached to a date's sessions.

use chrono::NaiveDate;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::error::{SchedulingError, SchedulingResult};

/// Build a session code for `date` and `exam_ref`.
///
/// Format is `YYYYMMDD-XXXXXXXX`: the date followed by the first eight hex
/// digits (upper case) of `sha256(date | exam_ref | salt)`. The salt makes
/// regenerated codes differ so a leaked code can be rotated.
pub fn generate_session_code(date: NaiveDate, exam_ref: &str, salt: &Uuid) -> SchedulingResult<String> {
    let exam_ref = exam_ref.trim();
    if exam_ref.is_empty() {
        return Err(SchedulingError::validation("exam reference is required"));
    }

    let mut hasher = Sha256::new();
    hasher.update(date.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(exam_ref.as_bytes());
    hasher.update(b"|");
    hasher.update(salt.as_bytes());
    let digest = hex::encode(hasher.finalize());

    Ok(format!(
        "{}-{}",
        date.format("%Y%m%d"),
        digest[..8].to_uppercase()
    ))
}
