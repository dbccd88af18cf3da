//! Error types for ledger operations.

use edcred_types::{AssessmentId, CourseId, Principal, RecordId};

/// Errors produced by ledger operations.
///
/// Every variant except [`LedgerError::LockPoisoned`] is a violated
/// precondition of a mutation. Reads of missing records return `Ok(None)`,
/// not an error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("{0} not found")]
    NotFound(RecordId),

    #[error("{course} is full ({capacity} students)")]
    CourseFull { course: CourseId, capacity: u32 },

    #[error("{student} is already enrolled in {course}")]
    AlreadyEnrolled { course: CourseId, student: Principal },

    #[error("{student} is not enrolled in {course}")]
    NotEnrolled { course: CourseId, student: Principal },

    #[error("invalid score {score} for {assessment}: exceeds {total_questions} questions")]
    InvalidScore {
        assessment: AssessmentId,
        score: i64,
        total_questions: i64,
    },

    #[error("self-endorsement not allowed for {principal}")]
    SelfEndorsement { principal: Principal },

    #[error("{0} lock poisoned")]
    LockPoisoned(String),
}

impl LedgerError {
    pub(crate) fn not_found(id: impl Into<RecordId>) -> Self {
        Self::NotFound(id.into())
    }
}

/// Convenience type alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors loading a [`crate::RegistryConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
