//! Answer Generation — orchestrates the full ES answer pipeline.
//!
//! Flow: validate → extract questions (or take the preset list) →
//!       resolve company research → fetch applicant profile →
//!       concurrent per-question generate → ordered assembly.
//!
//! Company research and profile lookups degrade without failing the run.
//! Question extraction and per-question generation follow the batch policy:
//! every question must produce an answer or the whole batch fails.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{info, warn};
use uuid::Uuid;

use crate::generation::extractor::{extract_questions, ExtractError};
use crate::generation::prompt_builder::build_answer_prompt;
use crate::generation::prompts::QUESTION_DELIMITER;
use crate::llm_client::{LanguageModel, LlmError, ModelTier};
use crate::models::profile::ApplicantProfile;
use crate::models::research::CompanyInfo;
use crate::profile::ProfileStore;
use crate::research::resolver::{CompanyResearcher, ResearchError};

/// Per-question generation budget, measured independently per worker.
const PER_QUESTION_TIMEOUT: Duration = Duration::from_secs(20);
/// Whole-run budget from validation to assembly. Expiry aborts in-flight
/// workers.
const RUN_DEADLINE: Duration = Duration::from_secs(30);

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// One ES generation request. `questions`, when present and non-empty,
/// replaces the extraction step; `html` is still required.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationRequest {
    pub html: String,
    pub company_id: String,
    pub company_name: String,
    #[serde(default)]
    pub questions: Option<Vec<String>>,
    #[serde(default)]
    pub model: Option<ModelTier>,
}

/// One answered question. Output order always matches question order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionAnswerPair {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Configuration(String),

    #[error("question extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("no questions were found in the form")]
    NoQuestionsFound,

    #[error("answer generation for \"{question}\" timed out after {seconds}s")]
    QuestionTimeout { question: String, seconds: u64 },

    #[error("answer generation for \"{question}\" failed: {reason}")]
    QuestionFailed { question: String, reason: String },

    #[error("no answers could be generated")]
    NoAnswersGenerated,

    #[error("generation exceeded the {seconds}s run deadline")]
    DeadlineExceeded { seconds: u64 },
}

/// Outcome of one per-question worker. Panics are caught inside the worker
/// so a fault in one question can never take down the run.
enum QuestionOutcome {
    Answered(String),
    Failed(LlmError),
    TimedOut,
    Panicked(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ────────────────────────────────────────────────────────────────────────────

pub struct AnswerGenerator {
    llm: Arc<dyn LanguageModel>,
    researcher: Arc<CompanyResearcher>,
    profiles: Arc<dyn ProfileStore>,
    delimiter: String,
}

impl AnswerGenerator {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        researcher: Arc<CompanyResearcher>,
        profiles: Arc<dyn ProfileStore>,
    ) -> Self {
        Self::with_delimiter(llm, researcher, profiles, QUESTION_DELIMITER)
    }

    pub fn with_delimiter(
        llm: Arc<dyn LanguageModel>,
        researcher: Arc<CompanyResearcher>,
        profiles: Arc<dyn ProfileStore>,
        delimiter: &str,
    ) -> Self {
        Self {
            llm,
            researcher,
            profiles,
            delimiter: delimiter.to_string(),
        }
    }

    /// Runs the full pipeline for one request under the run deadline.
    ///
    /// On success the result has exactly one entry per question, in
    /// question order regardless of completion order.
    pub async fn generate(
        &self,
        applicant_id: Uuid,
        request: GenerationRequest,
    ) -> Result<Vec<QuestionAnswerPair>, GenerateError> {
        validate_request(&request)?;

        match tokio::time::timeout(RUN_DEADLINE, self.run(applicant_id, request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "Generation run exceeded the {}s deadline, aborting workers",
                    RUN_DEADLINE.as_secs()
                );
                Err(GenerateError::DeadlineExceeded {
                    seconds: RUN_DEADLINE.as_secs(),
                })
            }
        }
    }

    async fn run(
        &self,
        applicant_id: Uuid,
        request: GenerationRequest,
    ) -> Result<Vec<QuestionAnswerPair>, GenerateError> {
        // Step 1: question list, preset or extracted.
        let questions = match &request.questions {
            Some(preset) if !preset.is_empty() => {
                let cleaned: Vec<String> = preset
                    .iter()
                    .map(|q| q.trim())
                    .filter(|q| !q.is_empty())
                    .map(str::to_string)
                    .collect();
                if cleaned.is_empty() {
                    return Err(GenerateError::NoQuestionsFound);
                }
                cleaned
            }
            _ => extract_questions(self.llm.as_ref(), &request.html, &self.delimiter)
                .await
                .map_err(map_extract_error)?,
        };

        info!(
            "Generating {} answers for company {}",
            questions.len(),
            request.company_name
        );

        // Step 2: company research. Facet failures degrade inside the
        // resolver; only a missing search credential aborts.
        let company_info = match self
            .researcher
            .resolve(&request.company_id, &request.company_name)
            .await
        {
            Ok(info) => info,
            Err(e @ ResearchError::MissingApiKey) => {
                return Err(GenerateError::Configuration(e.to_string()));
            }
        };

        // Step 3: applicant profile. Absent or unreadable profiles degrade
        // to prompts without a background section.
        let profile = match self.profiles.get_by_applicant(applicant_id).await {
            Ok(Some(row)) => Some(ApplicantProfile::from(row)),
            Ok(None) => {
                info!("No stored profile for applicant {applicant_id}");
                None
            }
            Err(e) => {
                warn!("Profile lookup failed, continuing without background: {e}");
                None
            }
        };

        // Step 4: fan out one worker per question, collect by index.
        let model = request.model.unwrap_or_default();
        self.generate_answers(model, &request.company_name, company_info, profile, questions)
            .await
    }

    async fn generate_answers(
        &self,
        model: ModelTier,
        company_name: &str,
        company_info: CompanyInfo,
        profile: Option<ApplicantProfile>,
        questions: Vec<String>,
    ) -> Result<Vec<QuestionAnswerPair>, GenerateError> {
        let total = questions.len();
        let company_info = Arc::new(company_info);
        let profile = Arc::new(profile);
        let company_name: Arc<str> = Arc::from(company_name);

        let mut tasks: JoinSet<(usize, String, QuestionOutcome)> = JoinSet::new();
        for (idx, question) in questions.iter().cloned().enumerate() {
            let llm = Arc::clone(&self.llm);
            let company_info = Arc::clone(&company_info);
            let profile = Arc::clone(&profile);
            let company_name = Arc::clone(&company_name);
            tasks.spawn(async move {
                let outcome = answer_question(
                    llm,
                    model,
                    &question,
                    &company_info,
                    (*profile).as_ref(),
                    &company_name,
                )
                .await;
                (idx, question, outcome)
            });
        }

        let mut answers: Vec<Option<String>> = vec![None; total];
        let mut failures: Vec<(usize, GenerateError)> = Vec::new();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, _question, QuestionOutcome::Answered(text))) => {
                    answers[idx] = Some(text);
                }
                Ok((_idx, _question, QuestionOutcome::Failed(LlmError::MissingApiKey))) => {
                    // A missing model credential fails every question the
                    // same way; surface it as configuration, immediately.
                    return Err(GenerateError::Configuration(
                        LlmError::MissingApiKey.to_string(),
                    ));
                }
                Ok((idx, question, QuestionOutcome::Failed(e))) => {
                    warn!("Answer generation failed for question \"{question}\": {e}");
                    failures.push((
                        idx,
                        GenerateError::QuestionFailed {
                            question,
                            reason: e.to_string(),
                        },
                    ));
                }
                Ok((idx, question, QuestionOutcome::TimedOut)) => {
                    warn!(
                        "Answer generation timed out for question \"{question}\" after {}s",
                        PER_QUESTION_TIMEOUT.as_secs()
                    );
                    failures.push((
                        idx,
                        GenerateError::QuestionTimeout {
                            question,
                            seconds: PER_QUESTION_TIMEOUT.as_secs(),
                        },
                    ));
                }
                Ok((idx, question, QuestionOutcome::Panicked(reason))) => {
                    warn!("Answer worker panicked for question \"{question}\": {reason}");
                    failures.push((
                        idx,
                        GenerateError::QuestionFailed { question, reason },
                    ));
                }
                Err(join_err) => {
                    // Leaves its slot unanswered; settle_batch fails the question.
                    warn!("Answer worker terminated abnormally: {join_err}");
                }
            }
        }

        let pairs = settle_batch(questions, answers, failures)?;
        info!("Generated all {total} answers");
        Ok(pairs)
    }
}

/// Batch policy: one answer per question or the whole batch fails,
/// reporting the first failure in question order. A question whose worker
/// vanished without reporting an outcome counts as failed, and a batch
/// where nothing succeeded is `NoAnswersGenerated`.
fn settle_batch(
    questions: Vec<String>,
    answers: Vec<Option<String>>,
    mut failures: Vec<(usize, GenerateError)>,
) -> Result<Vec<QuestionAnswerPair>, GenerateError> {
    let total = questions.len();

    for (idx, question) in questions.iter().enumerate() {
        let settled = answers[idx].is_some() || failures.iter().any(|(i, _)| *i == idx);
        if !settled {
            failures.push((
                idx,
                GenerateError::QuestionFailed {
                    question: question.clone(),
                    reason: "answer worker did not complete".to_string(),
                },
            ));
        }
    }

    if !failures.is_empty() {
        failures.sort_by_key(|(idx, _)| *idx);
        if failures.len() == total {
            return Err(GenerateError::NoAnswersGenerated);
        }
        if let Some((_, first)) = failures.into_iter().next() {
            return Err(first);
        }
    }

    let mut pairs = Vec::with_capacity(total);
    for (question, answer) in questions.into_iter().zip(answers) {
        match answer {
            Some(answer) => pairs.push(QuestionAnswerPair { question, answer }),
            // Unanswered slots became failures above.
            None => return Err(GenerateError::NoAnswersGenerated),
        }
    }

    Ok(pairs)
}

/// One per-question worker: build the prompt, call the model under the
/// per-question timeout, and catch panics so they become this question's
/// failure instead of tearing down the run.
async fn answer_question(
    llm: Arc<dyn LanguageModel>,
    model: ModelTier,
    question: &str,
    company_info: &CompanyInfo,
    profile: Option<&ApplicantProfile>,
    company_name: &str,
) -> QuestionOutcome {
    let generation = async {
        let prompt = build_answer_prompt(question, Some(company_info), profile, company_name);
        tokio::time::timeout(PER_QUESTION_TIMEOUT, llm.generate(model, &prompt)).await
    };

    match std::panic::AssertUnwindSafe(generation).catch_unwind().await {
        Ok(Ok(Ok(response))) => QuestionOutcome::Answered(response.text),
        Ok(Ok(Err(e))) => QuestionOutcome::Failed(e),
        Ok(Err(_elapsed)) => QuestionOutcome::TimedOut,
        Err(panic) => QuestionOutcome::Panicked(panic_message(panic)),
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn validate_request(request: &GenerationRequest) -> Result<(), GenerateError> {
    if request.company_id.trim().is_empty() {
        return Err(GenerateError::Validation("company_id is required".to_string()));
    }
    if request.company_name.trim().is_empty() {
        return Err(GenerateError::Validation(
            "company_name is required".to_string(),
        ));
    }
    if request.html.trim().is_empty() {
        return Err(GenerateError::Validation("html is required".to_string()));
    }
    Ok(())
}

fn map_extract_error(e: ExtractError) -> GenerateError {
    match e {
        ExtractError::EmptyInput => GenerateError::Validation("html is required".to_string()),
        ExtractError::NoQuestionsFound => GenerateError::NoQuestionsFound,
        ExtractError::LlmCall(LlmError::MissingApiKey) => {
            GenerateError::Configuration(LlmError::MissingApiKey.to_string())
        }
        ExtractError::LlmCall(e) => GenerateError::ExtractionFailed(e.to_string()),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
