use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use scheduler_core::error::CoreError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Error returned by every API handler, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Core(CoreError),
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::Core(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("invalid request body: {}", rejection.body_text()))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Core(err) => match err {
                CoreError::NotFound(_) => StatusCode::NOT_FOUND,
                CoreError::Conflict(_) => StatusCode::CONFLICT,
                CoreError::InvalidTimezone(_) => StatusCode::INTERNAL_SERVER_ERROR,
                e if e.is_storage_failure() => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_REQUEST,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Core(err) if status.is_server_error() => {
                tracing::error!(error = ?err, "request failed");
                "internal server error".to_string()
            }
            ApiError::Core(err) => err.to_string(),
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(CoreError::MissingTitle, StatusCode::BAD_REQUEST)]
    #[case(CoreError::MissingId, StatusCode::BAD_REQUEST)]
    #[case(CoreError::NoRule, StatusCode::BAD_REQUEST)]
    #[case(CoreError::InvalidDate("2024".into()), StatusCode::BAD_REQUEST)]
    #[case(CoreError::UnsupportedRule("m 1".into()), StatusCode::BAD_REQUEST)]
    #[case(CoreError::NotFound("7".into()), StatusCode::NOT_FOUND)]
    #[case(CoreError::Conflict("7".into()), StatusCode::CONFLICT)]
    #[case(
        CoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full")),
        StatusCode::INTERNAL_SERVER_ERROR
    )]
    fn test_status_mapping(#[case] err: CoreError, #[case] expected: StatusCode) {
        assert_eq!(ApiError::from(err).status(), expected);
    }
}
