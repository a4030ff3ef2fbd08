//! # Data Models
//!
//! This module contains all the SeaORM entity models used throughout the
//! tezlik speed-test service.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod feedback;
pub mod measurement;
pub mod network_issue;
pub mod provider;
pub mod session;
pub mod user;

pub use feedback::Entity as Feedback;
pub use measurement::Entity as Measurement;
pub use network_issue::Entity as NetworkIssue;
pub use provider::Entity as Provider;
pub use session::Entity as Session;
pub use user::Entity as User;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "tezlik".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
