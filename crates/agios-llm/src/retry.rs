//! Call-then-parse retry for structured model output.

use crate::error::{GenerationError, RetryError};
use crate::json::extract_json_segment;
use crate::traits::{Generation, GenerationClient, GenerationRequest, TokenUsage};
use serde::de::DeserializeOwned;
use std::future::Future;

/// Attempt budget shared by transport and parse failures
pub const MAX_ATTEMPTS: usize = 2;

/// A parsed value plus the cost of obtaining it
#[derive(Debug, Clone, PartialEq)]
pub struct Structured<T> {
    pub value: T,
    /// Usage summed over every successful call, including discarded attempts
    pub usage: TokenUsage,
    pub attempts: usize,
}

/// Run `action` up to `max_attempts` times until `parse` accepts its output.
///
/// A failed call and an unparseable answer both consume an attempt. When every
/// attempt fails, the most recent transport error wins over a parse failure.
pub async fn retry_parse<T, A, Fut, P>(
    max_attempts: usize,
    mut action: A,
    mut parse: P,
) -> Result<Structured<T>, RetryError>
where
    A: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<Generation, GenerationError>>,
    P: FnMut(&str) -> Option<T>,
{
    let mut usage = TokenUsage::default();
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        match action(attempt).await {
            Ok(generation) => {
                usage += generation.usage;
                if let Some(value) = parse(&generation.text) {
                    return Ok(Structured {
                        value,
                        usage,
                        attempts: attempt,
                    });
                }
                tracing::warn!(attempt, "Model output did not parse, retrying");
            }
            Err(e) => {
                tracing::warn!(attempt, error = %e, "Generation attempt failed");
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(source) => Err(RetryError::Generation {
            attempts: max_attempts,
            source,
        }),
        None => Err(RetryError::Parse {
            attempts: max_attempts,
        }),
    }
}

/// Parse the first JSON object embedded in `raw` as `T`
pub fn parse_embedded_json<T: DeserializeOwned>(raw: &str) -> Option<T> {
    let segment = extract_json_segment(raw)?;
    serde_json::from_str(segment).ok()
}

/// Generate and deserialize a JSON object with the standard attempt budget
pub async fn generate_structured<T: DeserializeOwned>(
    client: &dyn GenerationClient,
    request: GenerationRequest,
) -> Result<Structured<T>, RetryError> {
    retry_parse(
        MAX_ATTEMPTS,
        |_| client.generate(request.clone()),
        parse_embedded_json::<T>,
    )
    .await
}

/// Generate free text with the standard attempt budget; blank answers count as failures
pub async fn generate_text(
    client: &dyn GenerationClient,
    request: GenerationRequest,
) -> Result<Structured<String>, RetryError> {
    retry_parse(
        MAX_ATTEMPTS,
        |_| client.generate(request.clone()),
        |text| {
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        },
    )
    .await
}
