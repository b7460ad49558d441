//! Chat-completions client for job post extraction

use pipewise_core::config::OpenAiSettings;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::details::{Extraction, RawJobDetails};
use crate::error::ExtractError;
use crate::prompt::job_post_prompt;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Parse the model's JSON answer and validate it.
pub fn parse_completion(content: &str) -> Result<Extraction, ExtractError> {
    let raw: RawJobDetails = serde_json::from_str(content).map_err(ExtractError::Malformed)?;
    let extraction = raw.validate();
    if let Extraction::Incomplete { details, missing } = &extraction {
        warn!(
            ?missing,
            ?details,
            "Failed to extract necessary information from job post"
        );
    }
    Ok(extraction)
}

#[derive(Debug, Clone)]
pub struct JobPostExtractor {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl JobPostExtractor {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, ExtractError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_settings(settings: &OpenAiSettings) -> Result<Self, ExtractError> {
        let api_key = settings
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(ExtractError::MissingApiKey)?;
        Self::new(api_key, &settings.model, &settings.base_url)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Extract job post details from the page's HTML.
    pub async fn extract(&self, html: &str) -> Result<Extraction, ExtractError> {
        let prompt = job_post_prompt(html);
        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: &prompt,
            }],
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        debug!(model = %self.model, html_len = html.len(), "requesting job post extraction");

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<ChatResponse>()
            .await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(ExtractError::EmptyCompletion)?;

        parse_completion(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, routing::post, Json, Router};
    use serde_json::{json, Value};

    #[test]
    fn malformed_output_is_error() {
        assert!(matches!(
            parse_completion("not json"),
            Err(ExtractError::Malformed(_))
        ));
        assert!(matches!(
            parse_completion(r#"["Acme", "SRE"]"#),
            Err(ExtractError::Malformed(_))
        ));
    }

    #[test]
    fn loose_fields_do_not_lose_the_extraction() {
        let extraction = parse_completion(
            r#"{"company": {"name": "Acme"}, "title": "Backend Engineer",
                "location": "Berlin, Germany",
                "tools": [{"name": "Rust", "certainty": "High"}, {"name": "Kafka", "certainty": null}]}"#,
        )
        .unwrap();
        let Extraction::Complete(details) = extraction else {
            panic!("expected complete extraction");
        };
        assert_eq!(details.location, None);
        assert_eq!(details.tools.len(), 2);
    }

    #[test]
    fn missing_api_key() {
        let settings = OpenAiSettings::default();
        assert!(matches!(
            JobPostExtractor::from_settings(&settings),
            Err(ExtractError::MissingApiKey)
        ));
    }

    async fn fake_completions(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
        assert_eq!(
            headers.get("authorization").and_then(|v| v.to_str().ok()),
            Some("Bearer test-key")
        );
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["model"], "test-model");

        let content = json!({
            "company": {"name": "Acme", "url": null, "linkedin_url": null},
            "title": "Backend Engineer",
            "location": null,
            "tools": [{"name": "Postgres", "certainty": "Medium"}]
        });
        Json(json!({
            "choices": [{"message": {"role": "assistant", "content": content.to_string()}}]
        }))
    }

    #[tokio::test]
    async fn extracts_against_completion_endpoint() {
        let app = Router::new().route("/v1/chat/completions", post(fake_completions));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let extractor =
            JobPostExtractor::new("test-key", "test-model", format!("http://{addr}/v1/")).unwrap();
        let extraction = extractor.extract("<html></html>").await.unwrap();

        let Extraction::Complete(details) = extraction else {
            panic!("expected complete extraction");
        };
        assert_eq!(details.title, "Backend Engineer");
        assert_eq!(details.tools.len(), 1);
    }
}
