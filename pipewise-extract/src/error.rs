use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,

    #[error("request to the completion API failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion API returned no message content")]
    EmptyCompletion,

    #[error("model output is not a valid job post object: {0}")]
    Malformed(#[source] serde_json::Error),
}
