/// HTTP clients for CheapShark and the Steam web APIs
pub mod api;
/// Serde models for upstream responses
pub mod types;
