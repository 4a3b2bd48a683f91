// EVGuard - app/mod.rs
// Application layer: state, background analysis, and narrative summaries.

pub mod analysis;
pub mod state;
pub mod summarizer;
