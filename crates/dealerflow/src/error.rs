//! Error types for dealerflow.
//!
//! This module defines all error types used throughout the dealerflow crate,
//! along with the mapping from an error to the inline message a screen shows.

use std::path::PathBuf;
use thiserror::Error;

/// Message shown when a record cannot be found at load time.
pub const NOT_FOUND_MESSAGE: &str = "No such document!";

/// The main error type for dealerflow operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Document Errors ===
    /// The requested document does not exist.
    #[error("no document '{id}' in collection '{collection}'")]
    NotFound {
        /// Collection that was searched.
        collection: String,
        /// Identifier that was requested.
        id: String,
    },

    /// A write to the document store was rejected.
    #[error("write to {collection}/{id} failed: {message}")]
    RemoteWrite {
        /// Collection being written.
        collection: String,
        /// Identifier of the document being written.
        id: String,
        /// Description of what went wrong.
        message: String,
    },

    /// Stored checklist data does not have the shape of the template.
    #[error("stored steps do not match the checklist template: {message}")]
    StructuralMismatch {
        /// Where the stored data diverges from the template.
        message: String,
    },

    /// A step index is outside the checklist.
    #[error("no step {step} in the checklist")]
    InvalidStep {
        /// Requested step index.
        step: usize,
    },

    /// A task index is outside its step.
    #[error("no task at step {step}, task {task}")]
    InvalidPosition {
        /// Requested step index.
        step: usize,
        /// Requested task index.
        task: usize,
    },

    /// A required text field was left empty.
    #[error("{field} is required")]
    MissingField {
        /// Name of the empty field.
        field: &'static str,
    },

    /// A field was edited on a stage form that does not own it.
    #[error("{field} is not part of the {stage} form")]
    FieldNotInStage {
        /// Document key of the field.
        field: &'static str,
        /// Name of the stage.
        stage: &'static str,
    },

    /// An operation was attempted in the wrong screen state.
    #[error("cannot {action} while {state}")]
    InvalidState {
        /// What was attempted.
        action: &'static str,
        /// The state the screen was in.
        state: &'static str,
    },

    // === Auth Errors ===
    /// Sign-in or sign-up was rejected.
    #[error("authentication failed: {message}")]
    AuthFailure {
        /// Description of the failure.
        message: String,
    },

    /// No matching invitation exists for the email and code.
    #[error("Invalid invite code or email.")]
    InvalidInvite,

    /// An invitation asked for a role that cannot be granted by invitation.
    #[error("role '{role}' cannot be granted by invitation")]
    RoleNotInvitable {
        /// The requested role.
        role: String,
    },

    /// The current session's role may not open a screen.
    #[error("role '{role}' cannot open {screen}")]
    Forbidden {
        /// Role of the current session.
        role: String,
        /// Screen that was requested.
        screen: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),

    /// A failure with no further description.
    #[error("An unknown error occurred")]
    Unknown,
}

/// A specialized Result type for dealerflow operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a not-found error for a document.
    #[must_use]
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Create a rejected-write error for a document.
    #[must_use]
    pub fn remote_write(
        collection: impl Into<String>,
        id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::RemoteWrite {
            collection: collection.into(),
            id: id.into(),
            message: message.into(),
        }
    }

    /// Create an authentication failure.
    #[must_use]
    pub fn auth(message: impl Into<String>) -> Self {
        Self::AuthFailure {
            message: message.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a structural mismatch error.
    #[must_use]
    pub fn mismatch(message: impl Into<String>) -> Self {
        Self::StructuralMismatch {
            message: message.into(),
        }
    }

    /// Check if this error indicates a missing document.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error is a step or task index outside the checklist.
    #[must_use]
    pub fn is_invalid_position(&self) -> bool {
        matches!(self, Self::InvalidStep { .. } | Self::InvalidPosition { .. })
    }

    /// Check if this error is an authentication problem.
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::AuthFailure { .. } | Self::InvalidInvite)
    }

    /// The inline message a screen renders for this error.
    ///
    /// Failures with no user-facing category (internal faults and raw
    /// database errors) all render as the generic unknown-error message.
    #[must_use]
    pub fn screen_message(&self) -> String {
        match self {
            Self::NotFound { .. } => NOT_FOUND_MESSAGE.to_string(),
            Self::AuthFailure { message } | Self::RemoteWrite { message, .. } => message.clone(),
            Self::Internal(_) | Self::DatabaseQuery(_) => Self::Unknown.to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_screen_message() {
        let err = Error::not_found("cars", "car123");
        assert!(err.is_not_found());
        assert_eq!(err.screen_message(), "No such document!");
        assert!(err.to_string().contains("car123"));
        assert!(err.to_string().contains("cars"));
    }

    #[test]
    fn test_unknown_screen_message() {
        assert_eq!(Error::Unknown.screen_message(), "An unknown error occurred");
    }

    #[test]
    fn test_uncategorized_errors_render_as_unknown() {
        let err = Error::internal("database connection lock poisoned");
        assert_eq!(err.screen_message(), "An unknown error occurred");

        let err = Error::from(rusqlite::Error::InvalidQuery);
        assert_eq!(err.screen_message(), "An unknown error occurred");
        assert!(err.to_string() != err.screen_message());

        let err = Error::InvalidStep { step: 9 };
        assert_eq!(err.screen_message(), err.to_string());
    }

    #[test]
    fn test_remote_write_screen_message_is_bare() {
        let err = Error::remote_write("cars", "abc", "permission denied");
        assert_eq!(err.screen_message(), "permission denied");
        assert!(err.to_string().contains("cars/abc"));
    }

    #[test]
    fn test_auth_failure() {
        let err = Error::auth("wrong password");
        assert!(err.is_auth_failure());
        assert_eq!(err.screen_message(), "wrong password");
        assert!(Error::InvalidInvite.is_auth_failure());
        assert!(!Error::Unknown.is_auth_failure());
    }

    #[test]
    fn test_invalid_invite_display() {
        assert_eq!(
            Error::InvalidInvite.to_string(),
            "Invalid invite code or email."
        );
    }

    #[test]
    fn test_internal_error() {
        let err = Error::internal("lock poisoned");
        assert_eq!(err.to_string(), "internal error: lock poisoned");
    }

    #[test]
    fn test_invalid_position_display() {
        let err = Error::InvalidPosition { step: 1, task: 9 };
        assert_eq!(err.to_string(), "no task at step 1, task 9");
    }

    #[test]
    fn test_invalid_step_display() {
        let err = Error::InvalidStep { step: 9 };
        assert!(err.to_string().starts_with("no step 9"));
        assert!(!err.to_string().contains("task"));
    }

    #[test]
    fn test_missing_field_display() {
        let err = Error::MissingField {
            field: "vehicle name",
        };
        assert_eq!(err.to_string(), "vehicle name is required");
    }

    #[test]
    fn test_invalid_state_display() {
        let err = Error::InvalidState {
            action: "save",
            state: "loading",
        };
        assert_eq!(err.to_string(), "cannot save while loading");
    }

    #[test]
    fn test_mismatch_display() {
        let err = Error::mismatch("expected 4 steps, found 3");
        assert!(err.to_string().contains("expected 4 steps"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
