//! Request execution shared by the JIRA and Tempo clients.

use reqwest::{header::RETRY_AFTER, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::{execute_with_retry, IntegrationError, Result, RetryConfig};

const MAX_ERROR_BODY: usize = 300;

/// Send the request built by `build`, retrying per `retry`, and decode JSON.
///
/// `build` is called once per attempt since a sent request cannot be reused.
pub(crate) async fn send_json<T, F>(service: &'static str, retry: &RetryConfig, build: F) -> Result<T>
where
    T: DeserializeOwned,
    F: Fn() -> RequestBuilder,
{
    let build = &build;
    execute_with_retry(retry, move || {
        async move {
            let response = build()
                .send()
                .await
                .map_err(|e| IntegrationError::from_reqwest(service, e))?;
            let response = check_status(service, response).await?;
            response
                .json::<T>()
                .await
                .map_err(|e| IntegrationError::from_reqwest(service, e))
        }
    })
    .await
}

async fn check_status(service: &'static str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    let mut message = response.text().await.unwrap_or_default();
    if message.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !message.is_char_boundary(cut) {
            cut -= 1;
        }
        message.truncate(cut);
    }
    if message.is_empty() {
        message = status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string();
    }

    Err(IntegrationError::Status {
        service,
        status: status.as_u16(),
        message,
        retry_after,
    })
}
