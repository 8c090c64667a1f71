use crate::error::ModelError;

/// Map an uncategorized upstream failure onto a caller-facing category.
///
/// The API reports most failures only as text, so this inspects the message.
/// Errors that are already categorized pass through unchanged.
pub fn classify_upstream(error: ModelError) -> ModelError {
    let message = match error {
        ModelError::Upstream { message } => message,
        other => return other,
    };
    let lower = message.to_lowercase();

    if message.contains("API_KEY_INVALID") || (lower.contains("invalid") && lower.contains("key"))
    {
        ModelError::InvalidCredential { details: message }
    } else if lower.contains("quota") || message.contains("429") {
        ModelError::RateLimited { details: message }
    } else if message.contains("SAFETY") {
        ModelError::ContentBlocked { details: message }
    } else {
        ModelError::Upstream { message }
    }
}
