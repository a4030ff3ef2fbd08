//! # Repository Layer
//!
//! This module contains repository implementations that encapsulate SeaORM
//! operations for database entities, providing a clean API for data access
//! with identity-scoped methods.

pub mod feedback;
pub mod measurement;
pub mod network_issue;
pub mod provider;
pub mod session;
pub mod user;

pub use feedback::FeedbackRepository;
pub use measurement::MeasurementRepository;
pub use network_issue::NetworkIssueRepository;
pub use provider::ProviderRepository;
pub use session::SessionRepository;
pub use user::UserRepository;
