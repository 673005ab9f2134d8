//! Client for the external document-to-text service.
//!
//! The service downloads the CV itself from the URL we hand it and answers with
//! its structured reading of the document.

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::errors::AppError;

#[derive(Debug, Serialize)]
struct ExtractRequest<'a> {
    file_path: &'a str,
    file_url: &'a str,
}

#[derive(Clone)]
pub struct DocumentParserClient {
    http: reqwest::Client,
    base_url: String,
}

impl DocumentParserClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// POST `{base}/extract-pdf`. A non-2xx answer surfaces the service's own
    /// `error` message when it sends one. So does a 2xx body whose top level
    /// carries an `error` string, which the service sends when it cannot read
    /// the file.
    pub async fn extract(&self, file_url: &str) -> Result<Value, AppError> {
        let url = format!("{}/extract-pdf", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&ExtractRequest {
                file_path: file_url,
                file_url,
            })
            .send()
            .await
            .map_err(|e| {
                warn!("Document parser request failed: {e}");
                AppError::Upstream("document parser is unreachable".to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.json::<Value>().await.unwrap_or(Value::Null);
            let message = body
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("document parser returned {status}"));
            warn!("Document parser error ({status}): {message}");
            return Err(AppError::Upstream(message));
        }

        let parsed = response.json::<Value>().await.map_err(|_| {
            AppError::Upstream("document parser returned malformed JSON".to_string())
        })?;
        if let Some(message) = parsed.get("error").and_then(Value::as_str) {
            warn!("Document parser reported failure ({status}): {message}");
            return Err(AppError::Upstream(message.to_string()));
        }
        info!("Document parser answered for {file_url}");
        Ok(parsed)
    }
}
