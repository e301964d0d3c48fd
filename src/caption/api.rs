//! `ApiCaptioner` — captions images through an out-of-process model server.
//!
//! The captioning model (BLIP, Florence, a small VLM, …) runs behind any
//! server that speaks the OpenAI chat-completions wire format with image
//! inputs: vLLM, llama.cpp server, Ollama, LM Studio, or a hosted API.
//! The image is sent inline as a base64 `data:` URL; the first line of the
//! reply is taken as the caption.
//!
//! All connection details come from [`CaptionConfig`]; nothing is hardcoded.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::config::CaptionConfig;
use crate::frames::Frame;

use super::engine::{CaptionEngine, CaptionError};

pub struct ApiCaptioner {
    client: reqwest::Client,
    config: CaptionConfig,
}

impl ApiCaptioner {
    /// Build an `ApiCaptioner` from application config.
    ///
    /// The HTTP client carries the per-request timeout from
    /// `config.timeout_secs`; an expired timeout surfaces as
    /// [`CaptionError::Timeout`].
    pub fn from_config(config: &CaptionConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        log::info!(
            "caption: endpoint={} model={}",
            config.base_url.trim_end_matches('/'),
            config.model
        );

        Self {
            client,
            config: config.clone(),
        }
    }

    fn request_body(&self, frame: &Frame) -> serde_json::Value {
        let data_url = format!(
            "data:image/{};base64,{}",
            frame.mime_subtype(),
            STANDARD.encode(&frame.data)
        );

        serde_json::json!({
            "model": self.config.model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": self.config.prompt },
                    { "type": "image_url", "image_url": { "url": data_url } }
                ]
            }],
            "stream": false,
            "temperature": 0.0,
            "max_tokens": self.config.max_tokens
        })
    }
}

#[async_trait]
impl CaptionEngine for ApiCaptioner {
    /// The `Authorization: Bearer …` header is attached only when an API key
    /// is configured and non-empty.
    async fn caption(&self, frame: &Frame) -> Result<String, CaptionError> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let mut req = self.client.post(&url).json(&self.request_body(frame));

        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?.error_for_status()?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CaptionError::Parse(e.to_string()))?;

        extract_caption(&json)
    }
}

/// Pull the caption out of a chat-completions response.
fn extract_caption(json: &serde_json::Value) -> Result<String, CaptionError> {
    let content = json["choices"][0]["message"]["content"]
        .as_str()
        .ok_or(CaptionError::EmptyResponse)?;

    let caption = content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or(CaptionError::EmptyResponse)?;

    Ok(caption.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::frames::frame::tests::tiny_png;

    fn make_config(api_key: Option<&str>) -> CaptionConfig {
        CaptionConfig {
            api_key: api_key.map(str::to_string),
            ..CaptionConfig::default()
        }
    }

    #[test]
    fn from_config_builds_without_panic() {
        let _captioner = ApiCaptioner::from_config(&make_config(None));
        let _captioner = ApiCaptioner::from_config(&make_config(Some("")));
        let _captioner = ApiCaptioner::from_config(&make_config(Some("sk-test")));
    }

    #[test]
    fn request_body_inlines_image_as_data_url() {
        let captioner = ApiCaptioner::from_config(&make_config(None));
        let frame = Frame::decode(tiny_png()).unwrap();
        let body = captioner.request_body(&frame);

        let url = body["messages"][0]["content"][1]["image_url"]["url"]
            .as_str()
            .unwrap();
        assert!(url.starts_with("data:image/png;base64,iVBOR"));
        assert_eq!(body["model"], CaptionConfig::default().model);
        assert_eq!(body["messages"][0]["content"][0]["text"], CaptionConfig::default().prompt);
    }

    #[test]
    fn extract_caption_takes_first_non_empty_line() {
        let json = json!({
            "choices": [{ "message": { "content": "\n  a grocery store with shelves \nsecond line" } }]
        });
        assert_eq!(extract_caption(&json).unwrap(), "a grocery store with shelves");
    }

    #[test]
    fn extract_caption_missing_content_is_empty_response() {
        let json = json!({ "choices": [] });
        assert_eq!(extract_caption(&json).unwrap_err(), CaptionError::EmptyResponse);
    }

    #[test]
    fn extract_caption_blank_content_is_empty_response() {
        let json = json!({ "choices": [{ "message": { "content": "  \n " } }] });
        assert_eq!(extract_caption(&json).unwrap_err(), CaptionError::EmptyResponse);
    }

    #[tokio::test]
    async fn unreachable_server_is_a_recoverable_error() {
        let config = CaptionConfig {
            base_url: "http://127.0.0.1:9".into(),
            timeout_secs: 2,
            ..CaptionConfig::default()
        };
        let captioner = ApiCaptioner::from_config(&config);
        let frame = Frame::decode(tiny_png()).unwrap();

        let err = captioner.caption(&frame).await.unwrap_err();
        assert!(matches!(err, CaptionError::Request(_) | CaptionError::Timeout));
    }

    #[test]
    fn captioner_is_object_safe() {
        let captioner: Box<dyn CaptionEngine> =
            Box::new(ApiCaptioner::from_config(&make_config(None)));
        drop(captioner);
    }
}
