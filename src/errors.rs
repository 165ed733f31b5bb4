//! # Query Errors
//!
//! Running a DataTables query can fail in two ways:
//! - the request itself is unusable (missing paging parameters, no columns,
//!   no search descriptor, an order directive that does not resolve), which is
//!   detected before the data store is touched;
//! - a data store call fails, in which case the underlying `DbErr` is carried
//!   unchanged.
//!
//! When returned from an axum handler, parameter errors become `400 Bad Request`
//! with their message, and store errors become `500 Internal Server Error` with
//! a generic message. Store error details are logged with `tracing` and never
//! sent to the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use std::fmt;

#[derive(Debug)]
pub enum QueryError {
    /// `draw`, `start` or `length` is missing or not a usable number.
    InvalidParameters {
        message: String,
    },

    /// The filter, sort or projection could not be derived from the request.
    InvalidQuery {
        message: String,
    },

    /// A count or fetch against the data store failed.
    DataAccess {
        /// User-facing generic message
        message: String,
        /// Underlying store error (logged, not sent to user)
        internal: DbErr,
    },
}

impl QueryError {
    pub fn invalid_parameters(message: impl Into<String>) -> Self {
        Self::InvalidParameters {
            message: message.into(),
        }
    }

    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    pub fn data_access(err: DbErr) -> Self {
        Self::DataAccess {
            message: "A database error occurred".to_string(),
            internal: err,
        }
    }

    /// True for errors detected before any store call was made.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidParameters { .. } | Self::InvalidQuery { .. }
        )
    }

    /// The store error, if this error came from the data store.
    #[must_use]
    pub const fn db_error(&self) -> Option<&DbErr> {
        match self {
            Self::DataAccess { internal, .. } => Some(internal),
            _ => None,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidParameters { .. } | Self::InvalidQuery { .. } => StatusCode::BAD_REQUEST,
            Self::DataAccess { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn user_message(&self) -> String {
        match self {
            Self::InvalidParameters { message }
            | Self::InvalidQuery { message }
            | Self::DataAccess { message, .. } => message.clone(),
        }
    }

    fn log_internal(&self) {
        match self {
            Self::DataAccess { internal, .. } => {
                tracing::error!(
                    error = ?internal,
                    "Data store error while running table query"
                );
            }
            _ => {
                tracing::debug!(
                    error = %self.user_message(),
                    status = %self.status_code(),
                    "Rejected table query"
                );
            }
        }
    }
}

/// Error body sent to clients. DataTables shows the `error` field to the user.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        self.log_internal();

        let status = self.status_code();
        let body = ErrorResponse {
            error: self.user_message(),
        };

        (status, Json(body)).into_response()
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DataAccess { internal, .. } => write!(f, "data store error: {internal}"),
            _ => write!(f, "{}", self.user_message()),
        }
    }
}

impl std::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DataAccess { internal, .. } => Some(internal),
            _ => None,
        }
    }
}

impl From<DbErr> for QueryError {
    fn from(err: DbErr) -> Self {
        Self::data_access(err)
    }
}
