// EVGuard - core/mod.rs
// Core domain logic: parsing, scoring, filtering, export, and reporting.
// No UI or platform dependencies.

pub mod engine;
pub mod export;
pub mod filter;
pub mod model;
pub mod parser;
pub mod reference;
pub mod report;
