use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConciergeError {
    #[error("Parameter extraction failed: {0}")]
    Extraction(String),

    #[error("Booking failed: {0}")]
    Booking(String),

    #[error("Routing failed: {0}")]
    Routing(String),

    #[error("Protocol violation for session {session}: {detail}")]
    ProtocolViolation { session: String, detail: String },

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Handler cancelled: {0}")]
    Cancelled(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ConciergeError {
    /// Failures that must be surfaced to the user as a degraded reply
    /// instead of propagating through the bus.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::Extraction(_) | Self::Booking(_) | Self::Timeout(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ConciergeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_classification() {
        assert!(ConciergeError::Extraction("bad input".into()).is_user_facing());
        assert!(ConciergeError::Booking("no rooms".into()).is_user_facing());
        assert!(!ConciergeError::ProtocolViolation {
            session: "s1".into(),
            detail: "late message".into(),
        }
        .is_user_facing());
        assert!(!ConciergeError::Config("bad value".into()).is_user_facing());
    }

    #[test]
    fn test_display_includes_session() {
        let err = ConciergeError::ProtocolViolation {
            session: "sess-42".into(),
            detail: "message after completion".into(),
        };
        let text = err.to_string();
        assert!(text.contains("sess-42"));
        assert!(text.contains("message after completion"));
    }
}
