/// Callback token decoding, authorization and dispatch
pub mod callback;
/// Periodic deal ingestion loop
pub mod deals;
/// Bounded tracker of already-announced deals
pub mod dedup;
/// Command and inline query handlers
pub mod handlers;
/// View builders for interactive messages
pub mod views;
