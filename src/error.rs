use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("request error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("websocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("json codec error: {0}")]
    SimdJson(#[from] simd_json::Error),
    #[error("Order value (${value:.2}) is below minimum of ${minimum}")]
    OrderBelowMinimum { value: f64, minimum: f64 },
    #[error("transport closed: {0}")]
    TransportClosed(String),
    #[error("{0} timed out")]
    Timeout(&'static str),
}

impl From<tokio_tungstenite::tungstenite::Error> for AppError {
    fn from(value: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_names_the_operation() {
        assert_eq!(
            AppError::Timeout("health probe").to_string(),
            "health probe timed out"
        );
    }

    #[test]
    fn websocket_errors_are_boxed() {
        let error: AppError = tokio_tungstenite::tungstenite::Error::ConnectionClosed.into();
        assert!(matches!(error, AppError::WebSocket(_)));
        assert!(error.to_string().starts_with("websocket error"));
    }
}
