/// Telemetry ingest for the water-monitoring service.
///
/// Submodules:
/// - `validate` — boundary validation of readings before classification.
/// - `gateway` — blocking HTTP client for the device-gateway REST API.

pub mod gateway;
pub mod validate;
