/// Simulation clock and billing-period boundaries.
pub mod clock;
pub mod engine;
pub mod kpi;
/// Catalog cross product and result collection.
pub mod runner;
pub mod samples;
pub mod types;
