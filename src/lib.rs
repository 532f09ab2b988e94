pub mod config;
pub mod errors;
pub mod properties;
pub mod resource;
pub mod rest;

// Re-export main types
pub use config::shared::SharedConf;
pub use config::{ConfSnapshot, CredentialKey, MpConf, DEFAULT_BASE_URL};
pub use errors::{MpConfError, MpConfResult};
pub use resource::{EmbeddedResources, ResourceLoader, ResourceRoots};
pub use rest::{HttpMethod, RestSpec};
