use serde::{Deserialize, Serialize};
use std::fmt;

/// Exit status for local invariant violations.
pub const EXIT_INVARIANT: i32 = -1;

/// Exit status for anything that could not be classified.
pub const EXIT_UNCLASSIFIED: i32 = -100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    NotARepository,
    ExternalCall,
    PersistenceConflict,
    InvalidArtifact,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotARepository => write!(f, "NOT_A_REPOSITORY"),
            Self::ExternalCall => write!(f, "EXTERNAL_CALL"),
            Self::PersistenceConflict => write!(f, "PERSISTENCE_CONFLICT"),
            Self::InvalidArtifact => write!(f, "INVALID_ARTIFACT"),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LearnError {
    pub code: ErrorCode,
    pub message: String,
    /// Exit status reported by the failing external command, if any.
    pub status: Option<i32>,
}

impl fmt::Display for LearnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for LearnError {}

impl LearnError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
        }
    }

    pub fn external(message: impl Into<String>, status: Option<i32>) -> Self {
        Self {
            code: ErrorCode::ExternalCall,
            message: message.into(),
            status,
        }
    }

    pub fn not_a_repository(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotARepository, message)
    }

    pub fn persistence_conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PersistenceConflict, message)
    }

    pub fn invalid_artifact(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArtifact, message)
    }

    /// Process exit status for this error.
    ///
    /// External-call failures propagate the command's own status; a command
    /// killed by a signal (no status) is treated as a local failure.
    pub fn exit_code(&self) -> i32 {
        match self.code {
            ErrorCode::ExternalCall => self.status.unwrap_or(EXIT_INVARIANT),
            ErrorCode::NotARepository | ErrorCode::PersistenceConflict => EXIT_INVARIANT,
            ErrorCode::InvalidArtifact => EXIT_UNCLASSIFIED,
        }
    }
}

/// Map any error reaching the top level to `(exit status, message)`.
pub fn classify_error(e: &anyhow::Error) -> (i32, String) {
    if let Some(le) = e.downcast_ref::<LearnError>() {
        (le.exit_code(), le.message.clone())
    } else {
        (
            EXIT_UNCLASSIFIED,
            format!(
                "Sorry, something has thrown an error I don't understand. \
                 The error is below.\n\n{e:#}"
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_call_propagates_status() {
        let e = LearnError::external("git rev-list failed", Some(128));
        assert_eq!(e.exit_code(), 128);
    }

    #[test]
    fn external_call_without_status_is_invariant() {
        let e = LearnError::external("git was killed", None);
        assert_eq!(e.exit_code(), EXIT_INVARIANT);
    }

    #[test]
    fn local_conflicts_exit_minus_one() {
        assert_eq!(LearnError::not_a_repository("x").exit_code(), -1);
        assert_eq!(LearnError::persistence_conflict("x").exit_code(), -1);
    }

    #[test]
    fn classify_downcasts_learn_error() {
        let e: anyhow::Error = LearnError::persistence_conflict("stale temp").into();
        let (code, message) = classify_error(&e);
        assert_eq!(code, -1);
        assert_eq!(message, "stale temp");
    }

    #[test]
    fn classify_unknown_error_is_unclassified() {
        let e = anyhow::anyhow!("disk on fire");
        let (code, message) = classify_error(&e);
        assert_eq!(code, EXIT_UNCLASSIFIED);
        assert!(message.contains("disk on fire"));
    }

    #[test]
    fn classify_sees_through_context() {
        use anyhow::Context;
        let e = Err::<(), _>(LearnError::external("boom", Some(3)))
            .context("while listing commits")
            .unwrap_err();
        let (code, _) = classify_error(&e);
        assert_eq!(code, 3);
    }

    #[test]
    fn display_includes_code() {
        let e = LearnError::invalid_artifact("bad magic");
        assert_eq!(e.to_string(), "[INVALID_ARTIFACT] bad magic");
    }
}
