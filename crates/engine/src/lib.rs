//! TexDit Engine
//!
//! Text-processing tasks behind the TexDit API. Generation is delegated to an
//! OpenAI-compatible inference backend; everything else (length planning,
//! prompts, heuristics, fuzzy search) runs in-process.

pub mod generator;
pub mod pipeline;
pub mod tasks;
pub mod text;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use generator::{load_model, GenerationParams, HttpGenerator, LoadedModel, TextGenerator};
pub use pipeline::{
    run_task, ModelLoader, SingleLlmPipeline, SpecializedPipeline, TaskKind, TaskPipeline, Timed,
    RULE_BASED,
};
pub use tasks::{FuzzyMatch, Rephrasing, Summary, ToneReport};
