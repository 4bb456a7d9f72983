use async_trait::async_trait;
use reqwest::{
    Client,
    header::{ACCEPT, CONTENT_TYPE},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::API_KEY_VAR;
use crate::domain::summary::{SummaryPrompt, SummaryResult, TokenUsage};
use crate::error::{AppError, AppResult};
use crate::services::LanguageModelService;

pub struct GeminiClient {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Fails before any I/O when no API key is configured.
    pub fn new(api_key: Option<String>, model: String, base_url: String) -> AppResult<Self> {
        let api_key = api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or(AppError::MissingCredential(API_KEY_VAR))?;
        Ok(Self {
            http: Client::new(),
            api_key,
            model,
            base_url,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl LanguageModelService for GeminiClient {
    async fn summarize(&self, prompt: &SummaryPrompt) -> AppResult<SummaryResult> {
        let request_body = GenerateContentRequest::new(prompt);
        debug!(model = %self.model, prompt_len = prompt.text.len(), "calling Gemini");

        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|err| AppError::Transport(format!("failed to call Gemini: {err}")))?;

        // Error payloads arrive with non-2xx statuses, so the body is read either way.
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| AppError::Transport(format!("failed to read Gemini response: {err}")))?;
        let payload: Value = serde_json::from_str(&body).map_err(|err| {
            warn!(%status, "Gemini returned a non-JSON body");
            AppError::Transport(format!("Gemini responded with {status}: {err}"))
        })?;

        parse_response(payload)
    }
}

/// Extracts the first text part and usage counters from a generateContent payload.
pub fn parse_response(payload: Value) -> AppResult<SummaryResult> {
    if let Some(error) = payload.get("error") {
        return Err(AppError::Remote(error.clone()));
    }

    let response: GenerateContentResponse = serde_json::from_value(payload)
        .map_err(|err| AppError::Transport(format!("failed to parse Gemini response: {err}")))?;

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Ok(SummaryResult::empty());
    };
    let Some(content) = candidate.content else {
        return Ok(SummaryResult::empty());
    };

    match content.parts.into_iter().find_map(|part| part.text) {
        Some(text) => Ok(SummaryResult {
            text: Some(text),
            usage: response.usage_metadata.filter(|usage| !usage.is_empty()),
        }),
        None => Ok(SummaryResult::empty()),
    }
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    system_instruction: RequestContent<'a>,
    contents: RequestContent<'a>,
}

impl<'a> GenerateContentRequest<'a> {
    fn new(prompt: &'a SummaryPrompt) -> Self {
        Self {
            system_instruction: RequestContent {
                parts: RequestPart {
                    text: prompt.system_instruction,
                },
            },
            contents: RequestContent {
                parts: RequestPart { text: &prompt.text },
            },
        }
    }
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: RequestPart<'a>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<TokenUsage>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::domain::summary::SYSTEM_INSTRUCTION;

    fn client(base_url: &str) -> GeminiClient {
        GeminiClient::new(
            Some("test-key".to_string()),
            "gemini-2.0-flash".to_string(),
            base_url.to_string(),
        )
        .unwrap()
    }

    #[test]
    fn missing_key_fails_construction() {
        let result = GeminiClient::new(None, "m".to_string(), "http://unused".to_string());
        assert!(matches!(
            result,
            Err(AppError::MissingCredential("GEMINI_API_KEY"))
        ));

        let result = GeminiClient::new(Some(" ".to_string()), "m".to_string(), "x".to_string());
        assert!(matches!(result, Err(AppError::MissingCredential(_))));
    }

    #[test]
    fn builds_model_endpoint() {
        let client = client("https://example.test/v1beta/");
        assert_eq!(
            client.endpoint(),
            "https://example.test/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn error_field_is_a_remote_error() {
        let payload = json!({
            "error": { "message": "quota exceeded" },
            "candidates": [{ "content": { "parts": [{ "text": "ignored" }] } }]
        });
        match parse_response(payload) {
            Err(AppError::Remote(error)) => {
                assert_eq!(error, json!({ "message": "quota exceeded" }))
            }
            other => panic!("expected remote error, got {other:?}"),
        }
    }

    #[test]
    fn missing_or_empty_candidates_yield_no_content() {
        assert_eq!(parse_response(json!({})).unwrap(), SummaryResult::empty());
        assert_eq!(
            parse_response(json!({ "candidates": [] })).unwrap(),
            SummaryResult::empty()
        );
    }

    #[test]
    fn candidate_without_text_parts_yields_no_content() {
        assert_eq!(
            parse_response(json!({ "candidates": [{ "finishReason": "SAFETY" }] })).unwrap(),
            SummaryResult::empty()
        );
        let payload = json!({
            "candidates": [{ "content": { "parts": [{ "inlineData": {} }] } }],
            "usageMetadata": { "totalTokenCount": 3 }
        });
        assert_eq!(parse_response(payload).unwrap(), SummaryResult::empty());
    }

    #[test]
    fn returns_first_text_part_with_usage() {
        let payload = json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "functionCall": {} },
                        { "text": "# Title\nBody" },
                        { "text": "second" }
                    ]
                }
            }],
            "usageMetadata": {
                "promptTokenCount": 120,
                "candidatesTokenCount": 40,
                "totalTokenCount": 160
            }
        });
        let result = parse_response(payload).unwrap();
        assert_eq!(result.text.as_deref(), Some("# Title\nBody"));
        assert_eq!(
            result.usage,
            Some(TokenUsage {
                prompt_token_count: Some(120),
                candidates_token_count: Some(40),
                total_token_count: Some(160),
            })
        );
    }

    #[test]
    fn empty_usage_metadata_counts_as_absent() {
        let payload = json!({
            "candidates": [{ "content": { "parts": [{ "text": "hi" }] } }],
            "usageMetadata": {}
        });
        let result = parse_response(payload).unwrap();
        assert_eq!(result.text.as_deref(), Some("hi"));
        assert_eq!(result.usage, None);
    }

    #[test]
    fn usage_is_optional() {
        let payload = json!({ "candidates": [{ "content": { "parts": [{ "text": "hi" }] } }] });
        let result = parse_response(payload).unwrap();
        assert_eq!(result.text.as_deref(), Some("hi"));
        assert_eq!(result.usage, None);
    }

    #[tokio::test]
    async fn posts_prompt_and_parses_summary() {
        let server = MockServer::start().await;
        let prompt = SummaryPrompt::from_diff("+fn main() {}");

        Mock::given(method("POST"))
            .and(path("/models/gemini-2.0-flash:generateContent"))
            .and(query_param("key", "test-key"))
            .and(body_json(json!({
                "system_instruction": { "parts": { "text": SYSTEM_INSTRUCTION } },
                "contents": { "parts": { "text": "Here is the git diff:\n+fn main() {}" } }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "text": "# Title\nBody" }] } }],
                "usageMetadata": { "promptTokenCount": 7 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = client(&server.uri()).summarize(&prompt).await.unwrap();
        assert_eq!(result.text.as_deref(), Some("# Title\nBody"));
        assert_eq!(
            result.usage,
            Some(TokenUsage {
                prompt_token_count: Some(7),
                ..TokenUsage::default()
            })
        );
    }

    #[tokio::test]
    async fn error_payload_with_failure_status_is_remote_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": { "message": "quota exceeded" }
            })))
            .mount(&server)
            .await;

        let err = client(&server.uri())
            .summarize(&SummaryPrompt::from_diff(""))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error from Gemini API: {'message': 'quota exceeded'}"
        );
    }

    #[tokio::test]
    async fn non_json_body_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
            .mount(&server)
            .await;

        let err = client(&server.uri())
            .summarize(&SummaryPrompt::from_diff(""))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Transport(ref msg) if msg.contains("502")));
    }
}
