/// Bill and telemetry export.
pub mod export;
/// PVWatts weather and utility usage readers.
pub mod ingest;
pub mod synthetic;
