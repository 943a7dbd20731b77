//! Question Extractor — pulls entry-sheet questions out of raw form HTML.
//!
//! One call to the language model on the lightweight tier, then a split on
//! the delimiter token. No retries; a failed model call propagates.

use thiserror::Error;
use tracing::debug;

use crate::generation::prompts::EXTRACTION_PROMPT_TEMPLATE;
use crate::llm_client::{LanguageModel, LlmError, ModelTier};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("html input is empty")]
    EmptyInput,

    #[error("no questions were found in the form")]
    NoQuestionsFound,

    #[error("question extraction failed: {0}")]
    LlmCall(#[source] LlmError),
}

/// Extracts the ordered question list from `html`.
///
/// Blank input fails before any network call. The model's reply is split on
/// `delimiter`, trimmed, and stripped of empty segments; an empty final
/// sequence is `NoQuestionsFound`.
pub async fn extract_questions(
    llm: &dyn LanguageModel,
    html: &str,
    delimiter: &str,
) -> Result<Vec<String>, ExtractError> {
    if html.trim().is_empty() {
        return Err(ExtractError::EmptyInput);
    }

    let prompt = EXTRACTION_PROMPT_TEMPLATE
        .replace("{delimiter}", delimiter)
        .replace("{html}", html);

    let response = llm
        .generate(ModelTier::FlashLite, &prompt)
        .await
        .map_err(ExtractError::LlmCall)?;

    let questions = split_questions(&response.text, delimiter);
    if questions.is_empty() {
        return Err(ExtractError::NoQuestionsFound);
    }

    debug!("Extracted {} questions from form HTML", questions.len());
    Ok(questions)
}

/// Splits a delimiter-separated reply into trimmed, non-empty questions.
pub fn split_questions(text: &str, delimiter: &str) -> Vec<String> {
    text.split(delimiter)
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_string)
        .collect()
}
