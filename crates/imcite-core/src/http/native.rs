//! Native HTTP client using reqwest

use super::{HttpError, HttpResponse, Transport};
use crate::config::HttpConfig;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub struct HttpClient {
    client: Client,
    user_agent: String,
}

impl HttpClient {
    pub fn new(config: &HttpConfig) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| HttpError::RequestFailed {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            user_agent: config.user_agent.clone(),
        })
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn get(&self, url: &str, accept: Option<&str>) -> Result<HttpResponse, HttpError> {
        let mut request = self.client.get(url).header("User-Agent", &self.user_agent);
        if let Some(accept) = accept {
            request = request.header("Accept", accept);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                HttpError::Timeout
            } else {
                HttpError::RequestFailed {
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(HttpError::RateLimited);
        }

        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();

        // A body cut off mid-transfer counts as a failed request
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                HttpError::Timeout
            } else {
                HttpError::RequestFailed {
                    message: e.to_string(),
                }
            }
        })?;

        Ok(HttpResponse {
            status,
            body,
            headers,
        })
    }
}
