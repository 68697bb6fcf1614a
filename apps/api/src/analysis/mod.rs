// SEO analysis pipeline.
// Implements: model selection, content fetching, lenient JSON parsing, schema
// validation and the orchestrator that sequences them for both endpoints.
// All LLM calls go through llm_client; all page fetches go through ContentFetcher.

pub mod fetcher;
pub mod handlers;
pub mod model_selector;
pub mod orchestrator;
pub mod parser;
pub mod prompts;
pub mod schema;
pub mod text_stats;
