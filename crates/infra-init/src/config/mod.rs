pub mod loader;
pub mod merge;
pub mod schema;

pub use loader::{ConfigLoader, DEFAULT_CONFIG_DIR, ENVIRONMENTS_FILE};
pub use merge::{merge_settings, EffectiveSettings};
pub use schema::{BackendCatalog, EnvironmentCatalog, ResourceSpec, Service};
