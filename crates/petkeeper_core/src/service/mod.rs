//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls into use-case level APIs.
//! - Map repository and rules outcomes onto one typed failure surface.
//!
//! # Invariants
//! - Inbound values are validated before any store round trip.
//! - Store failures are propagated unchanged and never retried.

pub mod directory_service;
pub mod ownership_service;
pub mod view;

use crate::model::owner::OwnerId;
use crate::model::pet::PetId;
use crate::model::ValidationError;
use crate::repo::RepoError;
use crate::rules::ownership::Denial;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Entity a lookup failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Owner(OwnerId),
    Pet(PetId),
}

impl Display for EntityRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Owner(id) => write!(f, "owner {id}"),
            Self::Pet(id) => write!(f, "pet {id}"),
        }
    }
}

/// Why an operation was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
    /// Ownership rules denied the link change.
    Denied(Denial),
    /// Inbound field failed validation.
    Validation(ValidationError),
}

impl Reason {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Denied(denial) => denial.code(),
            Self::Validation(_) => "validation",
        }
    }
}

impl Display for Reason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Denied(denial) => write!(f, "{denial}"),
            Self::Validation(err) => write!(f, "{err}"),
        }
    }
}

/// Service error shared by ownership and directory use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Referenced id does not resolve to a usable record.
    NotFound(EntityRef),
    /// Operation refused by rules or validation.
    InvalidOperation(Reason),
    /// Store could not complete the unit of work.
    Store(RepoError),
}

impl ServiceError {
    /// Reason code for refused operations.
    pub fn reason_code(&self) -> Option<&'static str> {
        match self {
            Self::InvalidOperation(reason) => Some(reason.code()),
            _ => None,
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(entity) => write!(f, "{entity} not found"),
            Self::InvalidOperation(reason) => {
                write!(f, "invalid operation ({}): {reason}", reason.code())
            }
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidOperation(Reason::Denied(denial)) => Some(denial),
            Self::InvalidOperation(Reason::Validation(err)) => Some(err),
            Self::Store(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::InvalidOperation(Reason::Validation(err)),
            other => Self::Store(other),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::InvalidOperation(Reason::Validation(value))
    }
}

impl From<Denial> for ServiceError {
    fn from(value: Denial) -> Self {
        Self::InvalidOperation(Reason::Denied(value))
    }
}

#[cfg(test)]
mod tests {
    use super::{Reason, ServiceError};
    use crate::model::ValidationError;
    use crate::repo::RepoError;
    use crate::rules::ownership::Denial;

    #[test]
    fn repo_validation_becomes_invalid_operation() {
        let err = ServiceError::from(RepoError::Validation(ValidationError::BlankField(
            "address.city",
        )));
        assert_eq!(err.reason_code(), Some("validation"));
    }

    #[test]
    fn conflicts_stay_store_errors() {
        let err = ServiceError::from(RepoError::Conflict("address-mismatch".to_string()));
        assert!(matches!(err, ServiceError::Store(RepoError::Conflict(_))));
        assert_eq!(err.reason_code(), None);
    }

    #[test]
    fn denial_keeps_its_code() {
        let err = ServiceError::from(Denial::NotAssigned);
        assert!(matches!(
            err,
            ServiceError::InvalidOperation(Reason::Denied(Denial::NotAssigned))
        ));
        assert_eq!(err.reason_code(), Some("not-assigned"));
    }
}
