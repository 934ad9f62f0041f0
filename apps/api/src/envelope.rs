//! Uniform `{ success, ... }` response shape returned by every service operation.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Serialize, Serializer};

use crate::errors::AppError;

/// Result of a service operation, already shaped for the caller.
///
/// `Success(T)` serializes as `{"success": true, ...fields of T}` and
/// `Failure` as `{"success": false, "message": .., "code": ..}`.
#[derive(Debug)]
pub enum Envelope<T> {
    Success(T),
    Failure(AppError),
}

impl<T> Envelope<T> {
    pub fn into_result(self) -> Result<T, AppError> {
        match self {
            Envelope::Success(payload) => Ok(payload),
            Envelope::Failure(err) => Err(err),
        }
    }
}

impl<T> From<Result<T, AppError>> for Envelope<T> {
    fn from(result: Result<T, AppError>) -> Self {
        match result {
            Ok(payload) => Envelope::Success(payload),
            Err(err) => Envelope::Failure(err),
        }
    }
}

#[derive(Serialize)]
struct SuccessBody<'a, T> {
    success: bool,
    #[serde(flatten)]
    payload: &'a T,
}

#[derive(Serialize)]
struct FailureBody {
    success: bool,
    message: String,
    code: &'static str,
}

impl<T: Serialize> Serialize for Envelope<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Envelope::Success(payload) => SuccessBody {
                success: true,
                payload,
            }
            .serialize(serializer),
            Envelope::Failure(err) => FailureBody {
                success: false,
                message: err.public_message(),
                code: err.code(),
            }
            .serialize(serializer),
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        match self {
            Envelope::Failure(err) => err.into_response(),
            success => (StatusCode::OK, Json(success)).into_response(),
        }
    }
}

/// Payload carrying only a confirmation message.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Message {
            message: message.into(),
        }
    }
}
