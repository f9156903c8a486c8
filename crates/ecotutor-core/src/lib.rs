//! ecotutor-core: question bank, answer scoring, and the tutoring session.
//!
//! This crate defines the question data model, the dataset loader, the
//! similarity scorer and feedback rules, and the session loop that ties
//! them to a dialogue model and a console.

pub mod dataset;
pub mod error;
pub mod feedback;
pub mod model;
pub mod session;
pub mod similarity;
pub mod summary;
pub mod traits;
