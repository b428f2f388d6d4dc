use thiserror::Error;
use crate::types::amount::Amount;
use crate::types::ids::{ExpenseId, GroupId, ParticipantId};

#[derive(Error, Debug)]
pub enum Error {
    // Input Errors
    #[error("Invalid event: {0}")]
    InvalidEvent(InvalidEventReason),

    // Ledger Errors
    #[error("Ledger inconsistency: balances sum to {residual}, expected 0")]
    LedgerInconsistency {
        residual: Amount,
    },

    #[error("Invariant violation: {0}")]
    InvariantViolation(InvariantViolation),

    // Storage Errors
    #[error("Concurrent update conflict on {key}")]
    ConcurrentUpdateConflict {
        key: String,
    },

    #[error("Document already exists: {0}")]
    DocumentAlreadyExists(String),

    #[error("Group not found: {0}")]
    GroupNotFound(GroupId),

    #[error("Expense not found: {0}")]
    ExpenseNotFound(ExpenseId),

    #[error("Checksum mismatch for group: {group_id}")]
    ChecksumMismatch {
        group_id: GroupId,
    },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Directory error: {0}")]
    DirectoryError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn amount_overflow(participant: &ParticipantId) -> Self {
        Error::InvalidEvent(InvalidEventReason::AmountOverflow {
            participant: participant.clone(),
        })
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

/// Why an expense event was rejected. Rejection always happens before any
/// state is touched.
#[derive(Debug, Clone, PartialEq)]
pub enum InvalidEventReason {
    MismatchedSplitLengths { splitters: usize, amounts: usize },
    NegativeAmount { participant: ParticipantId, amount: Amount },
    AmountOverflow { participant: ParticipantId },
    UnknownParticipant(ParticipantId),
    WrongGroup { expected: GroupId, found: GroupId },
    DuplicateExpense(ExpenseId),
    NotApplied(ExpenseId),
}

impl std::fmt::Display for InvalidEventReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidEventReason::MismatchedSplitLengths { splitters, amounts } => write!(
                f,
                "{} splitters but {} amounts",
                splitters, amounts
            ),
            InvalidEventReason::NegativeAmount { participant, amount } => {
                write!(f, "negative amount {} for {}", amount, participant)
            }
            InvalidEventReason::AmountOverflow { participant } => {
                write!(f, "amounts for {} exceed the representable range", participant)
            }
            InvalidEventReason::UnknownParticipant(id) => write!(f, "{} is not a group member", id),
            InvalidEventReason::WrongGroup { expected, found } => {
                write!(f, "event for group {} applied to group {}", found, expected)
            }
            InvalidEventReason::DuplicateExpense(id) => write!(f, "expense {} already applied", id),
            InvalidEventReason::NotApplied(id) => write!(f, "expense {} was never applied", id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InvariantViolation {
    pub invariant: &'static str,
    pub details: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.details)
    }
}
