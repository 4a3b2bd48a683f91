// EVGuard - ui/panels/mod.rs
// Individual UI panels, each owning one region or dialog.

pub mod detail;
pub mod filters;
pub mod report;
pub mod summary;
pub mod vehicles;
