//! Error types for registry operations.

use std::fmt;

use thiserror::Error;

/// Structured classification for storage failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorKind {
    /// `SQLite` returned busy/locked under concurrent access.
    BusyOrLocked,
    /// Constraint failure (unique/check/not-null).
    ConstraintViolation,
    /// Connection pool timed out waiting for a free connection.
    PoolTimeout,
    /// Connection pool is closed.
    PoolClosed,
    /// Filesystem or transport IO failure.
    Io,
    /// SQL protocol/driver error.
    Protocol,
    /// Unclassified database failure.
    Other,
}

impl StorageErrorKind {
    /// Classifies a sqlx error.
    #[must_use]
    pub fn from_sqlx(error: &sqlx::Error) -> Self {
        match error {
            sqlx::Error::PoolTimedOut => Self::PoolTimeout,
            sqlx::Error::PoolClosed => Self::PoolClosed,
            sqlx::Error::Io(_) => Self::Io,
            sqlx::Error::Protocol(_) => Self::Protocol,
            sqlx::Error::Database(database_error) => {
                classify_database_error(database_error.as_ref())
            }
            _ => Self::Other,
        }
    }

    /// Returns true for conditions a caller may reasonably retry.
    #[must_use]
    pub fn is_transient(self) -> bool {
        matches!(self, Self::BusyOrLocked | Self::PoolTimeout | Self::Io)
    }
}

impl fmt::Display for StorageErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::BusyOrLocked => "busy_or_locked",
            Self::ConstraintViolation => "constraint_violation",
            Self::PoolTimeout => "pool_timeout",
            Self::PoolClosed => "pool_closed",
            Self::Io => "io",
            Self::Protocol => "protocol",
            Self::Other => "other",
        };
        write!(f, "{label}")
    }
}

fn classify_database_error(
    database_error: &(dyn sqlx::error::DatabaseError + 'static),
) -> StorageErrorKind {
    database_error
        .code()
        .as_deref()
        .and_then(kind_for_code)
        .unwrap_or(StorageErrorKind::Other)
}

/// Maps the `SQLite` extended result codes the papers table can raise.
fn kind_for_code(code: &str) -> Option<StorageErrorKind> {
    match code {
        // SQLITE_BUSY, SQLITE_BUSY_SNAPSHOT (WAL readers), SQLITE_LOCKED
        "5" | "517" | "6" => Some(StorageErrorKind::BusyOrLocked),
        // UNIQUE (category, id_number), the CHECK clauses, NOT NULL columns
        "2067" | "275" | "1299" => Some(StorageErrorKind::ConstraintViolation),
        _ => None,
    }
}

/// Errors that can occur during registry operations.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// The backing store could not complete the operation. Not retried here.
    #[error(
        "registry storage unavailable ({kind}): {message}\n  Suggestion: Check that the database file is writable and not held by another process"
    )]
    StorageUnavailable {
        /// Typed classification for caller retry policy.
        kind: StorageErrorKind,
        /// Human-readable database error text.
        message: String,
    },

    /// No entry exists for the key.
    #[error(
        "registry entry not found: {key}\n  Suggestion: Record the paper first, or check the identifier spelling"
    )]
    EntryNotFound {
        /// Canonical key that was looked up.
        key: String,
    },

    /// The identity cannot be stored (empty id number).
    #[error(
        "invalid identity '{raw}': {reason}\n  Suggestion: Pass an identifier with an id number, such as 2101.00001v2"
    )]
    InvalidIdentity {
        /// Display form of the rejected identity.
        raw: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl From<sqlx::Error> for RegistryError {
    fn from(err: sqlx::Error) -> Self {
        Self::StorageUnavailable {
            kind: StorageErrorKind::from_sqlx(&err),
            message: err.to_string(),
        }
    }
}

impl RegistryError {
    /// Returns the storage error kind, when this is a storage failure.
    #[must_use]
    pub fn storage_kind(&self) -> Option<StorageErrorKind> {
        match self {
            Self::StorageUnavailable { kind, .. } => Some(*kind),
            Self::EntryNotFound { .. } | Self::InvalidIdentity { .. } => None,
        }
    }

    /// Returns true when this error is a storage failure.
    #[must_use]
    pub fn is_storage_unavailable(&self) -> bool {
        self.storage_kind().is_some()
    }
}
