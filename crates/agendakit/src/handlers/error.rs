use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use agendakit_core::validation::ValidationErrors;

use crate::config::Environment;
use crate::upstream::UpstreamError;

/// Errors returned by request handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("Missing eventId parameter")]
    MissingEventId,

    #[error("{context}: {source}")]
    Upstream {
        context: &'static str,
        event_id: String,
        source: UpstreamError,
    },

    #[error("{error}")]
    Internal {
        error: anyhow::Error,
        /// Hide `error` from the response body.
        production: bool,
    },
}

impl ApiError {
    pub fn upstream(context: &'static str, event_id: String, source: UpstreamError) -> Self {
        Self::Upstream {
            context,
            event_id,
            source,
        }
    }

    pub fn internal(error: impl Into<anyhow::Error>, environment: Environment) -> Self {
        Self::Internal {
            error: error.into(),
            production: environment.is_production(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": errors.to_string(),
                    "details": errors.details,
                })),
            )
                .into_response(),
            Self::MissingEventId => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Missing eventId parameter" })),
            )
                .into_response(),
            Self::Upstream {
                context,
                event_id,
                source,
            } => {
                let status = StatusCode::from_u16(source.status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                tracing::error!(%event_id, status = status.as_u16(), error = %source, "{context}");
                (
                    status,
                    Json(json!({
                        "error": context,
                        "message": source.to_string(),
                        "eventId": event_id,
                    })),
                )
                    .into_response()
            }
            Self::Internal { error, production } => {
                tracing::error!(error = %error, "Internal error");
                let message = if production {
                    "Something went wrong".to_string()
                } else {
                    error.to_string()
                };
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "Internal server error",
                        "message": message,
                    })),
                )
                    .into_response()
            }
        }
    }
}
