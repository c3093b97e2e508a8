//! ReviewGraph Runtime: the query façade.
//!
//! Owns the loaded dataset (enriched records, triple store, retrieval
//! engine) and composes ranked search with triple queries. Reloads rebuild
//! everything and swap it in atomically.

pub mod dataset;
pub mod facade;
pub mod types;

pub use dataset::Dataset;
pub use facade::QueryFacade;
pub use types::*;
