// Core pipeline exports
pub mod candidates;
pub mod curation;
pub mod interpreter;
pub mod pipeline;
pub mod recommender;
pub mod saved;

pub use candidates::{offline_restaurants, CandidateSource};
pub use curation::CurationCatalog;
pub use interpreter::QueryInterpreter;
pub use pipeline::{Pipeline, PipelineError, PipelineState, SearchSession, SessionRegistry, SubmitOutcome};
pub use recommender::Recommender;
pub use saved::SavedSet;
