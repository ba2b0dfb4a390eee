use reqwest::Client;
use screener_core::ScreenError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Low temperature keeps schema-constrained completions deterministic.
const TEMPERATURE: f64 = 0.1;

/// Chat-completions client pinned to strict JSON-schema responses.
///
/// One call shape: system + user message in, a single JSON payload out,
/// validated against the supplied schema server-side. Anything that does
/// not come back as parseable JSON is a `SchemaViolation`.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run one schema-constrained completion and return the parsed JSON
    /// payload.
    pub async fn chat_json(
        &self,
        system: &str,
        user: &str,
        schema_name: &str,
        schema: serde_json::Value,
    ) -> Result<serde_json::Value, ScreenError> {
        let request = ChatRequest {
            model: self.model.clone(),
            temperature: TEMPERATURE,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user.to_string(),
                },
            ],
            response_format: ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: schema_name.to_string(),
                    strict: true,
                    schema,
                },
            },
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", BASE_URL))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ScreenError::ProviderUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScreenError::ProviderUnavailable(format!(
                "Chat completions HTTP {}: {}",
                status,
                response.text().await.unwrap_or_default()
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ScreenError::ProviderUnavailable(e.to_string()))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ScreenError::SchemaViolation("Completion had no choices".to_string()))?;

        serde_json::from_str(&content).map_err(|e| {
            ScreenError::SchemaViolation(format!("Completion is not valid JSON: {}", e))
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    temperature: f64,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: JsonSchemaFormat,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat {
    name: String,
    strict: bool,
    schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_schema_envelope() {
        let request = ChatRequest {
            model: "gpt-4o-mini".to_string(),
            temperature: TEMPERATURE,
            messages: vec![ChatMessage {
                role: "user",
                content: "hi".to_string(),
            }],
            response_format: ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: "watchlist".to_string(),
                    strict: true,
                    schema: serde_json::json!({"type": "object"}),
                },
            },
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["response_format"]["type"], "json_schema");
        assert_eq!(value["response_format"]["json_schema"]["strict"], true);
        assert_eq!(value["response_format"]["json_schema"]["name"], "watchlist");
        assert!(value["temperature"].as_f64().unwrap() <= 0.2);
    }

    #[test]
    fn response_content_parses() {
        let body: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"{\"tickers\":[\"AAPL\"]}"}}]}"#,
        )
        .unwrap();
        let content = &body.choices[0].message.content;
        let value: serde_json::Value = serde_json::from_str(content).unwrap();
        assert_eq!(value["tickers"][0], "AAPL");
    }
}
