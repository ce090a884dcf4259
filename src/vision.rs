//! Multimodal chat completion client
//!
//! Sends the consultation prompt, optionally with an image, to an
//! OpenAI-compatible `/chat/completions` endpoint and returns the raw reply text.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::consult::VisionModel;
use crate::media::EncodedImage;
use crate::{Config, Error, Result};

/// Vision client for the consultation model
pub struct VisionClient {
    client: reqwest::Client,
    api_key: SecretString,
    url: String,
    model: String,
}

/// Chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
}

/// A message in the request
#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: Vec<ContentPart<'a>>,
}

/// Content part (text or image)
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl VisionClient {
    /// Create a vision client from configuration
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.api_key(),
            url: config.endpoint("chat/completions"),
            model: config.models.vision.clone(),
        }
    }

    /// Ask the model about a prompt and optional image
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, the API answers with a non-2xx
    /// status, or the reply has no choice with content
    pub async fn complete(&self, prompt: &str, image: Option<&EncodedImage>) -> Result<String> {
        let mut content = vec![ContentPart::Text { text: prompt }];
        if let Some(image) = image {
            content.push(ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: image.data_url(),
                },
            });
        }

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content,
            }],
        };

        tracing::debug!(
            model = %self.model,
            with_image = image.is_some(),
            prompt_chars = prompt.len(),
            "sending chat completion"
        );

        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key.expose_secret()))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Vision(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "vision API error");
            return Err(Error::Vision(format!("API error {status}: {body}")));
        }

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Vision(format!("Parse error: {e}")))?;

        // No choice or null content is a failure; empty text is still a reply
        let reply = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Vision("Empty response from vision API".to_string()))?;

        tracing::info!(reply_chars = reply.len(), "chat completion received");
        Ok(reply)
    }
}

#[async_trait]
impl VisionModel for VisionClient {
    async fn complete(&self, prompt: &str, image: Option<&EncodedImage>) -> Result<String> {
        Self::complete(self, prompt, image).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::file::ConfigFile;

    fn config_for(url: &str) -> Config {
        let url = url.to_string();
        Config::resolve(ConfigFile::default(), &move |key: &str| match key {
            "DOCTOR_API_BASE_URL" => Some(url.clone()),
            "GROQ_API_KEY" => Some("test-key".to_string()),
            _ => None,
        })
    }

    #[test]
    fn text_part_serializes_with_type_tag() {
        let part = ContentPart::Text { text: "hi" };
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(json, serde_json::json!({"type": "text", "text": "hi"}));

        let part = ContentPart::ImageUrl {
            image_url: ImageUrl { url: "data:image/png;base64,AA==".to_string() },
        };
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(json["type"], "image_url");
        assert_eq!(json["image_url"]["url"], "data:image/png;base64,AA==");
    }

    #[tokio::test]
    async fn returns_first_choice_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("Authorization", "Bearer test-key")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": crate::config::DEFAULT_VISION_MODEL,
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"{\"analysis\":\"a\"}"}}]}"#)
            .create_async()
            .await;

        let client = VisionClient::new(&config_for(&server.url()));
        let reply = client.complete("prompt", None).await.unwrap();

        mock.assert_async().await;
        assert_eq!(reply, r#"{"analysis":"a"}"#);
    }

    #[tokio::test]
    async fn image_is_sent_as_data_url() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_body(mockito::Matcher::Regex(
                r#""url":"data:image/jpeg;base64,aGVsbG8=""#.to_string(),
            ))
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":"ok"}}]}"#)
            .create_async()
            .await;

        let image = EncodedImage {
            base64: "aGVsbG8=".to_string(),
            media_type: "image/jpeg",
        };
        let client = VisionClient::new(&config_for(&server.url()));
        let reply = client.complete("prompt", Some(&image)).await.unwrap();

        mock.assert_async().await;
        assert_eq!(reply, "ok");
    }

    #[tokio::test]
    async fn api_error_mentions_status() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body(r#"{"error":{"message":"Invalid API Key"}}"#)
            .create_async()
            .await;

        let client = VisionClient::new(&config_for(&server.url()));
        let err = client.complete("prompt", None).await.unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, Error::Vision(_)));
        assert!(err.to_string().contains("401"), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn no_choices_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let client = VisionClient::new(&config_for(&server.url()));
        let err = client.complete("prompt", None).await.unwrap_err();
        assert!(err.to_string().contains("Empty response"));
    }

    #[tokio::test]
    async fn null_content_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":null}}]}"#)
            .create_async()
            .await;

        let client = VisionClient::new(&config_for(&server.url()));
        let err = client.complete("prompt", None).await.unwrap_err();
        assert!(matches!(err, Error::Vision(_)));
    }

    #[tokio::test]
    async fn empty_content_is_returned_as_is() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":""}}]}"#)
            .create_async()
            .await;

        let client = VisionClient::new(&config_for(&server.url()));
        let reply = client.complete("prompt", None).await.unwrap();
        assert_eq!(reply, "");
    }

    #[tokio::test]
    async fn empty_content_reaches_the_parse_fallback() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":""}}]}"#)
            .create_async()
            .await;

        let client = VisionClient::new(&config_for(&server.url()));
        let raw = client.complete("prompt", None).await.unwrap();
        let reply = crate::normalize::normalize(&raw);
        assert_eq!(reply.analysis, crate::normalize::FALLBACK_ANALYSIS);
        assert_eq!(reply.treatment, "");
    }

    #[tokio::test]
    async fn malformed_json_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = VisionClient::new(&config_for(&server.url()));
        let err = client.complete("prompt", None).await.unwrap_err();
        assert!(err.to_string().contains("Parse error"));
    }
}
