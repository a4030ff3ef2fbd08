//! Database migrations for the tezlik speed-test service.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2025_01_10_000001_create_users;
mod m2025_01_10_000002_create_sessions;
mod m2025_01_10_000003_create_providers;
mod m2025_01_10_000004_create_measurements;
mod m2025_01_10_000005_create_feedback;
mod m2025_01_10_000006_create_network_issues;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_01_10_000001_create_users::Migration),
            Box::new(m2025_01_10_000002_create_sessions::Migration),
            Box::new(m2025_01_10_000003_create_providers::Migration),
            Box::new(m2025_01_10_000004_create_measurements::Migration),
            Box::new(m2025_01_10_000005_create_feedback::Migration),
            Box::new(m2025_01_10_000006_create_network_issues::Migration),
        ]
    }
}
