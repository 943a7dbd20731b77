// ES Answer Generation Engine
// Implements: question extraction, prompt assembly, concurrent answer generation.
// All LLM calls go through llm_client — no direct Gemini HTTP calls here.

pub mod extractor;
pub mod handlers;
pub mod orchestrator;
pub mod prompt_builder;
pub mod prompts;
