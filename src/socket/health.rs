use crate::error::AppError;
use crate::socket::pool::http_base_url;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

const HEALTH_PATH: &str = "/health";
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);
const REACHABILITY_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionTestResult {
    pub success: bool,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Checks `{endpoint}/health` for a 2xx answer. If that fails, any HTTP answer to a
/// `HEAD` of the endpoint root still counts as reachable. The reported error is the
/// health check's.
pub async fn probe_endpoint(client: &Client, endpoint: &str) -> ConnectionTestResult {
    let base = http_base_url(endpoint);
    let base = base.trim_end_matches('/');

    let health_error = match check_health(client, &format!("{base}{HEALTH_PATH}")).await {
        Ok(()) => return probe_result(endpoint, None),
        Err(error) => error,
    };
    debug!(endpoint, error = %health_error, "health check failed, probing root");

    match check_reachable(client, base).await {
        Ok(()) => probe_result(endpoint, None),
        Err(error) => {
            debug!(endpoint, %error, "endpoint unreachable");
            probe_result(endpoint, Some(health_error.to_string()))
        }
    }
}

async fn check_health(client: &Client, url: &str) -> Result<(), AppError> {
    client
        .get(url)
        .header(ACCEPT, "application/json")
        .timeout(HEALTH_TIMEOUT)
        .send()
        .await?
        .error_for_status()?;
    Ok(())
}

async fn check_reachable(client: &Client, url: &str) -> Result<(), AppError> {
    client
        .head(url)
        .timeout(REACHABILITY_TIMEOUT)
        .send()
        .await?;
    Ok(())
}

fn probe_result(endpoint: &str, error: Option<String>) -> ConnectionTestResult {
    ConnectionTestResult {
        success: error.is_none(),
        url: endpoint.to_string(),
        error,
    }
}
