//! Title translation through a JSON HTTP endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::app::{Result, RillError};

#[async_trait]
pub trait Translator {
    async fn translate(&self, text: &str, target: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    text: &'a str,
    target: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    text: String,
}

/// Posts `{"text", "target"}` and expects `{"text"}` back.
#[derive(Clone)]
pub struct HttpTranslator {
    client: Client,
    endpoint: String,
}

impl HttpTranslator {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate(&self, text: &str, target: &str) -> Result<String> {
        let body = serde_json::to_vec(&TranslateRequest { text, target })
            .map_err(|e| RillError::Translation(e.to_string()))?;

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        response.error_for_status_ref()?;

        let bytes = response.bytes().await?;
        parse_response(&bytes)
    }
}

fn parse_response(bytes: &[u8]) -> Result<String> {
    let parsed: TranslateResponse =
        serde_json::from_slice(bytes).map_err(|e| RillError::Translation(e.to_string()))?;
    let text = parsed.text.trim();
    if text.is_empty() {
        return Err(RillError::Translation("empty translation".to_string()));
    }
    Ok(text.to_string())
}
