//! Conversation orchestration for the inventory chat service.
//!
//! A request flows through a fixed pipeline:
//! 1. **Session load** - fetch or lazily create conversation state
//! 2. **Intent matching** - pick the canonical SQL for the question (`invchat_core::intents`)
//! 3. **Prompt building** (`prompt`) - system instruction, SQL note, recent turns, question
//! 4. **Completion** (`llm`, `openai`) - the only network call, never retried
//! 5. **Assembly** (`assembler`) - response with SQL, usage and latency; turn recorded
//!
//! # Safety Principle
//!
//! The model never sees real data and never chooses the SQL. It only phrases an
//! answer as if the matched query had run.

pub mod assembler;
pub mod llm;
pub mod openai;
pub mod prompt;
pub mod runtime;

pub use assembler::{ResponseAssembler, Timings, NO_MATCH_SQL};
pub use llm::{CompletionResult, CompletionStatus, LlmClient};
pub use openai::OpenAiClient;
pub use prompt::PromptBuilder;
pub use runtime::ChatRuntime;
