use thiserror::Error;

/// Failure modes of a single fetch against an external source.
///
/// None of these are fatal: the refresh layer maps every variant either to the
/// static fallback value or to the last-known-good reading. `CredentialMissing`
/// is the expected first-run state and additionally prompts a setup notice.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no API key configured for {0}")]
    CredentialMissing(&'static str),

    #[error("request to {service} failed: {source}")]
    Http {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} responded with status {status}: {body}")]
    Status {
        service: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to parse {service} response: {source}")]
    Malformed {
        service: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
