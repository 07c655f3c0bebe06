/// Household water-monitoring service.
///
/// Ingests periodic flow/pressure readings per household connection,
/// classifies each as normal usage or theft/leak/blockage, records alerts,
/// and dispatches notifications to configured recipients. The classifier
/// (`analysis`) is pure and storage-free; everything around it talks to
/// collaborators through the capability traits in `households`, `notify`,
/// and `store` so it can run against in-memory fakes, the simulator, or
/// the live gateway + Postgres unchanged.

pub mod alert;
pub mod analysis;
pub mod broadcast;
pub mod config;
pub mod households;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod monitor;
pub mod notify;
pub mod simulate;
pub mod store;
