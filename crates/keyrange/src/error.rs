use std::fmt;
use thiserror::Error as ThisError;

///
/// GenError
///
/// Structured range-generation error with a stable internal classification.
/// Not a stable API; intended for internal use and may change without notice.
///

#[derive(Debug, ThisError)]
#[error("{class}: {message}")]
pub struct GenError {
    pub class: GenErrorClass,
    pub message: String,
}

impl GenError {
    pub fn new(class: GenErrorClass, message: impl Into<String>) -> Self {
        Self {
            class,
            message: message.into(),
        }
    }

    /// Construct a contract violation: the input graph or this component's
    /// own invariants were broken. Never retried, never recovered.
    pub(crate) fn contract(message: impl Into<String>) -> Self {
        Self::new(GenErrorClass::Contract, message)
    }

    /// Construct an arena-budget exhaustion error.
    pub(crate) fn allocation(message: impl Into<String>) -> Self {
        Self::new(GenErrorClass::Allocation, message)
    }

    /// Construct a user-visible row-identifier mismatch error.
    pub(crate) fn invalid_rowid(message: impl Into<String>) -> Self {
        Self::new(GenErrorClass::InvalidRowId, message)
    }

    /// Construct a recursion-budget exhaustion error. Callers may catch this
    /// and fall back to an unconstrained range instead of failing the scan.
    pub(crate) fn stack_exhausted(message: impl Into<String>) -> Self {
        Self::new(GenErrorClass::StackExhausted, message)
    }

    #[must_use]
    pub fn is_stack_exhausted(&self) -> bool {
        self.class == GenErrorClass::StackExhausted
    }
}

///
/// GenErrorClass
/// Internal error taxonomy for runtime classification.
/// Not a stable API; may change without notice.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GenErrorClass {
    Contract,
    Allocation,
    InvalidRowId,
    StackExhausted,
}

impl fmt::Display for GenErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Contract => "contract_violation",
            Self::Allocation => "allocation_failure",
            Self::InvalidRowId => "invalid_rowid",
            Self::StackExhausted => "stack_exhausted",
        };
        write!(f, "{label}")
    }
}
