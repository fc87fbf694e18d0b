use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use macross_application::backtesting::BacktestError;
use serde_json::json;

/// Unified error type for API responses.
#[derive(Debug)]
pub enum ApiError {
    Backtest(BacktestError),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Backtest(BacktestError::InvalidParameters(_)) => StatusCode::BAD_REQUEST,
            Self::Backtest(BacktestError::DataUnavailable(_)) => StatusCode::NOT_FOUND,
            Self::Backtest(BacktestError::ProviderFailure(_)) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Backtest(err) => err.kind(),
            Self::Internal(_) => "internal",
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Backtest(err) => write!(f, "{err}"),
            Self::Internal(msg) => write!(f, "internal_error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<BacktestError> for ApiError {
    fn from(err: BacktestError) -> Self {
        Self::Backtest(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Backtest(err) => err.message().to_string(),
            Self::Internal(msg) => msg.clone(),
        };
        metrics::counter!("macross.http.errors_total", "status" => status.as_u16().to_string())
            .increment(1);
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), status = status.as_u16(), error = %message, "request failed");
        }

        let body = json!({ "error": message, "kind": self.kind() });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[test]
    fn status_codes_follow_error_kind() {
        let cases = [
            (BacktestError::InvalidParameters("x".into()), StatusCode::BAD_REQUEST),
            (BacktestError::DataUnavailable("x".into()), StatusCode::NOT_FOUND),
            (BacktestError::ProviderFailure("x".into()), StatusCode::BAD_GATEWAY),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
        assert_eq!(
            ApiError::Internal("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn response_body_carries_message_and_kind() {
        let response =
            ApiError::from(BacktestError::DataUnavailable("no 15m bars".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "no 15m bars");
        assert_eq!(body["kind"], "data_unavailable");

        let body = body_json(ApiError::Internal("join failed".into()).into_response()).await;
        assert_eq!(body["kind"], "internal");
    }
}
