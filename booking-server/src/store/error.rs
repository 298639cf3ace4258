//! Store error types.

use crate::domain::{DomainError, QuotationId};

/// Errors from the relational and document stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A quotation document could not be encoded or decoded
    #[error("document encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// Insert-only: the quotation id is already taken
    #[error("quotation {0} already exists")]
    DuplicateQuotation(QuotationId),

    /// The requested change breaks a domain rule
    #[error("{0}")]
    Rejected(#[from] DomainError),

    /// A stored row could not be turned back into a domain value
    #[error("corrupt {table} row {id}: {reason}")]
    Corrupt {
        table: &'static str,
        id: String,
        reason: String,
    },
}

/// Result of a targeted update.
///
/// A missing row is reported here rather than as an error, so callers
/// decide how hard to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The row was changed.
    Updated,
    /// The row already had the requested state.
    Unchanged,
    /// No row with that id.
    NoMatch,
}

impl UpdateOutcome {
    pub fn matched(self) -> bool {
        !matches!(self, UpdateOutcome::NoMatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = StoreError::Corrupt {
            table: "bookings",
            id: "4".into(),
            reason: "bad status".into(),
        };
        assert_eq!(err.to_string(), "corrupt bookings row 4: bad status");

        let err = StoreError::from(DomainError::NoItems);
        assert_eq!(err.to_string(), "a booking must have at least one item");
    }

    #[test]
    fn outcome_matched() {
        assert!(UpdateOutcome::Updated.matched());
        assert!(UpdateOutcome::Unchanged.matched());
        assert!(!UpdateOutcome::NoMatch.matched());
    }
}
