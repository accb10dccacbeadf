use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::TextGenerator;
use crate::error::GenerationError;

/// Ollama HTTP client using the non-streaming `/api/generate` endpoint.
pub struct OllamaGenerator {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaGenerator {
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Result<Self, GenerationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| GenerationError::Http(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
            timeout_secs,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl TextGenerator for OllamaGenerator {
    fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, GenerationError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                num_predict: max_tokens,
            },
        };

        log::debug!(
            "Requesting generation from {} (model {}, max {} tokens)",
            url,
            self.model,
            max_tokens
        );

        let response = self.client.post(&url).json(&body).send().map_err(|e| {
            if e.is_connect() {
                GenerationError::Connection(self.base_url.clone())
            } else if e.is_timeout() {
                GenerationError::Http(format!("Request timed out after {}s", self.timeout_secs))
            } else {
                GenerationError::Http(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| GenerationError::Response(e.to_string()))?;

        Ok(parsed.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_trailing_slash() {
        let generator = OllamaGenerator::new("http://localhost:11434/", "llama3.2", 5).unwrap();
        assert_eq!(generator.base_url(), "http://localhost:11434");
        assert_eq!(generator.model(), "llama3.2");
    }

    #[test]
    fn test_request_body_shape() {
        let body = GenerateRequest {
            model: "llama3.2",
            prompt: "hi",
            stream: false,
            options: GenerateOptions { num_predict: 200 },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["num_predict"], 200);
    }

    #[test]
    fn test_unreachable_server_is_an_error() {
        // Port 9 (discard) is not an HTTP server.
        let generator = OllamaGenerator::new("http://127.0.0.1:9", "llama3.2", 2).unwrap();
        assert!(generator.generate("hello", 5).is_err());
    }
}
