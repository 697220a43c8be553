//! Domain error types for the shapefile server.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.
//! Every failure renders as `{"detail": <message>}`; only the enumerated
//! validation conditions are client errors, everything else is a 500.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use std::fmt;

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Wrong HTTP method or no `shapefile` file field
    #[error("Method not allowed or file not sent")]
    InvalidRequest,

    /// The extracted archive holds no `.shp` entry
    #[error("No .shp found in the ZIP")]
    MissingShapefile,

    /// The loaded layer has zero features
    #[error("The shapefile is empty")]
    EmptyDataset,

    /// The loaded layer carries no CRS metadata
    #[error("The shapefile has no CRS defined (.prj missing)")]
    UndefinedCrs,

    /// Uploaded file exceeds the configured limit
    #[error("Uploaded file exceeds the limit of {0} bytes")]
    PayloadTooLarge(usize),

    /// Resource not found
    #[error("{0} not found")]
    NotFound(String),

    /// Any other failure, message taken from the underlying error
    #[error("{0}")]
    Processing(String),
}

impl AppError {
    /// Map an error kind to its HTTP status.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest
            | AppError::MissingShapefile
            | AppError::EmptyDataset
            | AppError::UndefinedCrs => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Processing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        AppError::status_code(self)
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::Processing(message) = self {
            tracing::error!("Processing error: {}", message);
        }

        HttpResponse::build(AppError::status_code(self)).json(ErrorResponse {
            detail: self.to_string(),
        })
    }
}

/// Error response body.
#[derive(Debug, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub detail: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.detail)
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

// Conversion implementations for common error types

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Processing(err.to_string())
    }
}

impl From<zip::result::ZipError> for AppError {
    fn from(err: zip::result::ZipError) -> Self {
        AppError::Processing(err.to_string())
    }
}

impl From<shapefile::Error> for AppError {
    fn from(err: shapefile::Error) -> Self {
        AppError::Processing(err.to_string())
    }
}

impl From<shapefile::dbase::Error> for AppError {
    fn from(err: shapefile::dbase::Error) -> Self {
        AppError::Processing(err.to_string())
    }
}

impl From<proj::ProjCreateError> for AppError {
    fn from(err: proj::ProjCreateError) -> Self {
        AppError::Processing(err.to_string())
    }
}

impl From<proj::ProjError> for AppError {
    fn from(err: proj::ProjError) -> Self {
        AppError::Processing(err.to_string())
    }
}

impl From<std::num::ParseFloatError> for AppError {
    fn from(err: std::num::ParseFloatError) -> Self {
        AppError::Processing(format!("could not convert string to float: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Processing(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Processing(format!("Processing task failed: {}", err))
    }
}
