//! Moodbite - mood-based restaurant discovery service
//!
//! This library provides the query-to-recommendation pipeline: a free-text
//! mood query is interpreted, candidates are fetched from a restaurant finder,
//! and a ranking model annotates the best matches. Every upstream call has a
//! deterministic local fallback.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{CurationCatalog, Pipeline, PipelineState, SavedSet, SearchSession, SessionRegistry, SubmitOutcome};
pub use models::{Bookmark, CurationList, RankedRestaurant, RestaurantRecord, StructuredFilter};
