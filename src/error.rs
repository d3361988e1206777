use axum::{Json, http::StatusCode, response::IntoResponse};
use oauth2::basic::BasicErrorResponseType;
use oauth2::reqwest::Error as ReqwestClientError;
use oauth2::{HttpClientError, RequestTokenError, StandardErrorResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum LeadsError {
    #[error("{0}")]
    Auth(String),

    #[error("Failed to exchange token: {0}")]
    TokenExchange(String),

    #[error("Token endpoint unreachable: {0}")]
    TokenTransport(String),

    #[error("Failed to fetch emails ({status}): {body}")]
    Fetch { status: StatusCode, body: String },

    #[error("No valid JSON found in response")]
    Extraction,

    #[error("Malformed JSON in model response: {0}")]
    JsonSyntax(#[source] serde_json::Error),

    #[error("Inference request failed ({status}): {body}")]
    Inference { status: StatusCode, body: String },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    #[error("Ractor error: {0}")]
    Ractor(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Unsupported request")]
    UnsupportedRequest,

    #[error("Run not found: {0}")]
    RunNotFound(String),
}

impl LeadsError {
    pub fn missing_refresh_token() -> Self {
        LeadsError::Auth("No refresh token found. Please authenticate first at /auth".to_string())
    }

    /// Transient failures worth another attempt inside a step.
    pub fn is_retryable(&self) -> bool {
        match self {
            LeadsError::Reqwest(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            LeadsError::TokenTransport(_) => true,
            LeadsError::Fetch { status, .. } | LeadsError::Inference { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}

impl
    From<
        RequestTokenError<
            HttpClientError<ReqwestClientError>,
            StandardErrorResponse<BasicErrorResponseType>,
        >,
    > for LeadsError
{
    fn from(
        e: RequestTokenError<
            HttpClientError<ReqwestClientError>,
            StandardErrorResponse<BasicErrorResponseType>,
        >,
    ) -> Self {
        match e {
            RequestTokenError::ServerResponse(err) => {
                let body = serde_json::to_string(&err).unwrap_or_else(|_| err.to_string());
                LeadsError::TokenExchange(body)
            }
            RequestTokenError::Request(req_e) => LeadsError::TokenTransport(req_e.to_string()),
            RequestTokenError::Parse(_parse_err, body) => {
                LeadsError::TokenExchange(String::from_utf8_lossy(&body).into_owned())
            }
            RequestTokenError::Other(s) => LeadsError::TokenExchange(s),
        }
    }
}

impl IntoResponse for LeadsError {
    fn into_response(self) -> axum::response::Response {
        let (status, code) = match &self {
            LeadsError::MissingParameter(_) | LeadsError::UnsupportedRequest => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST")
            }
            LeadsError::RunNotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            LeadsError::Auth(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            LeadsError::TokenExchange(_)
            | LeadsError::TokenTransport(_)
            | LeadsError::Fetch { .. }
            | LeadsError::Inference { .. }
            | LeadsError::Reqwest(_) => (StatusCode::BAD_GATEWAY, "BAD_GATEWAY"),
            LeadsError::Extraction
            | LeadsError::JsonSyntax(_)
            | LeadsError::Json(_)
            | LeadsError::UrlParse(_)
            | LeadsError::Database(_)
            | LeadsError::Ractor(_)
            | LeadsError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let message = match status {
            StatusCode::INTERNAL_SERVER_ERROR => "An internal server error occurred.".to_string(),
            _ => self.to_string(),
        };

        let body = ApiErrorBody {
            code: code.to_string(),
            message,
        };
        (status, Json(ApiErrorResponse { error: body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
