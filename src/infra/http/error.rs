use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::{
    application::{
        catalog::CatalogError, error::ErrorReport, invalidation::InvalidationError,
        repos::RepoError,
    },
    domain::error::DomainError,
};

pub mod codes {
    pub const UPSTREAM_ERROR: &str = "upstream_error";
    pub const UPSTREAM_TIMEOUT: &str = "upstream_timeout";
    pub const NOT_FOUND: &str = "not_found";
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const RATE_LIMITED: &str = "rate_limited";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const STORE_ERROR: &str = "store_error";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
    report: Option<ErrorReport>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message,
            hint,
            report: None,
        }
    }

    pub fn invalid_input(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::INVALID_INPUT, message, hint)
    }

    pub fn unauthorized(message: &'static str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, codes::UNAUTHORIZED, message, None)
    }

    pub fn not_found(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, hint)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    fn with_report(mut self, source: &'static str, error: &dyn std::error::Error) -> Self {
        self.report = Some(ErrorReport::from_error(source, self.status, error));
        self
    }

    pub fn rate_limited(retry_after: u64) -> Response {
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: codes::RATE_LIMITED.to_string(),
                message: "Rate limit exceeded".to_string(),
                hint: Some(format!("Retry after {retry_after} seconds")),
            },
        };
        let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
        if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
            response.headers_mut().insert(RETRY_AFTER, value);
        }
        ErrorReport::from_message(
            "infra::http::rate_limit",
            StatusCode::TOO_MANY_REQUESTS,
            format!("rate_limited: retry_after={retry_after}"),
        )
        .attach(&mut response);
        response
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let report = self.report.unwrap_or_else(|| {
            ErrorReport::from_message(
                "infra::http",
                self.status,
                format!(
                    "{}: {}",
                    self.code,
                    self.hint.as_deref().unwrap_or(self.message)
                ),
            )
        });
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        report.attach(&mut response);
        response
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match &err {
            DomainError::NotFound { .. } => {
                ApiError::not_found("Resource not found", Some(err.to_string()))
            }
            DomainError::Validation { .. } => {
                ApiError::invalid_input("Invalid request parameter", Some(err.to_string()))
            }
        }
        .with_report("infra::http::domain", &err)
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        let api = match &err {
            CatalogError::Upstream { source, .. } if source.is_timeout() => ApiError::new(
                StatusCode::GATEWAY_TIMEOUT,
                codes::UPSTREAM_TIMEOUT,
                "Upstream data provider timed out",
                Some("No cached copy is available yet; retry shortly".to_string()),
            ),
            CatalogError::Upstream { .. } => ApiError::new(
                StatusCode::BAD_GATEWAY,
                codes::UPSTREAM_ERROR,
                "Failed to fetch data from the upstream provider",
                Some("No cached copy is available yet; retry shortly".to_string()),
            ),
            CatalogError::NotFound { id } => {
                ApiError::not_found("Item not found", Some(format!("no item with id `{id}`")))
            }
            CatalogError::Validation(inner) => {
                ApiError::invalid_input("Invalid request parameter", Some(inner.to_string()))
            }
        };
        api.with_report("infra::http::catalog", &err)
    }
}

impl From<InvalidationError> for ApiError {
    fn from(err: InvalidationError) -> Self {
        let api = match &err {
            InvalidationError::InvalidTag(inner) => {
                ApiError::invalid_input("Invalid revalidation tag", Some(inner.to_string()))
            }
            InvalidationError::UnscopedTag { .. } => ApiError::invalid_input(
                "Tag does not name a cached resource",
                Some("use `<resource>:<language>` when passing a language".to_string()),
            ),
            InvalidationError::Store { .. } => ApiError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                codes::STORE_ERROR,
                "Persisted cache could not be purged",
                None,
            ),
        };
        api.with_report("infra::http::invalidation", &err)
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::STORE_ERROR,
            "Persisted store unavailable",
            None,
        )
        .with_report("infra::http::store", &err)
    }
}
