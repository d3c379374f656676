//! Infrastructure layer: directory clients, config, and the login pipeline.

pub mod config;
pub mod context;
pub mod diagnostics;
pub mod directory;
pub mod scope_publisher;

pub use config::{ConfigError, ServiceConfig};
pub use context::LoginContext;
pub use diagnostics::{DebugFlag, Diagnostics};
pub use scope_publisher::{PublishError, PublishOutcome, ScopePublisher};
