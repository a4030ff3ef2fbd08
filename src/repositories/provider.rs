//! Provider registry: find-or-create of detected ISPs.
//!
//! Matching is a case-insensitive substring search on the provider name
//! with no uniqueness constraint or locking. Two concurrent requests
//! resolving the same new ISP can therefore both insert a row; that race is
//! an accepted property of the registry, inherited from its informal
//! identity model, and is deliberately left unmitigated.

use anyhow::Result;
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::geo::GeoRecord;
use crate::models::provider::{self, Entity as Provider};

/// Repository for provider database operations
pub struct ProviderRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ProviderRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the provider matching the resolved ISP, creating one on
    /// first sight.
    ///
    /// The search key is the last whitespace-delimited token of the raw ISP
    /// string, which drops a leading AS-number prefix when present.
    pub async fn find_or_create(&self, geo: &GeoRecord) -> Result<provider::Model> {
        let short_name = derive_short_name(&geo.isp);

        if let Some(existing) = self.find_by_name_fragment(&short_name).await? {
            return Ok(existing);
        }

        let created = provider::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(short_name.clone()),
            location: Set(format!("{}, {}", geo.city, geo.region)),
            ip_address: Set(geo.ip.clone()),
            is_active: Set(true),
            created_at: Set(Utc::now().into()),
        }
        .insert(self.db)
        .await?;

        tracing::info!(provider = %created.name, "Created provider");
        Ok(created)
    }

    /// Case-insensitive substring search on provider name; newest row wins.
    pub async fn find_by_name_fragment(&self, fragment: &str) -> Result<Option<provider::Model>> {
        let pattern = format!("%{}%", fragment.to_lowercase());
        let found = Provider::find()
            .filter(Expr::expr(Func::lower(Expr::col(provider::Column::Name))).like(&pattern))
            .order_by_desc(provider::Column::CreatedAt)
            .one(self.db)
            .await?;
        Ok(found)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<provider::Model>> {
        let provider = Provider::find_by_id(id).one(self.db).await?;
        Ok(provider)
    }

    pub async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<provider::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let providers = Provider::find()
            .filter(provider::Column::Id.is_in(ids.iter().copied()))
            .all(self.db)
            .await?;
        Ok(providers)
    }

    /// All active providers, newest first.
    pub async fn list_active(&self) -> Result<Vec<provider::Model>> {
        let providers = Provider::find()
            .filter(provider::Column::IsActive.eq(true))
            .order_by_desc(provider::Column::CreatedAt)
            .all(self.db)
            .await?;
        Ok(providers)
    }
}

/// Last whitespace-delimited token of the raw ISP string.
pub fn derive_short_name(isp: &str) -> String {
    isp.split_whitespace().last().unwrap_or("").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_name_is_last_token() {
        assert_eq!(derive_short_name("AS8193 UZTELECOM"), "UZTELECOM");
        assert_eq!(derive_short_name("UZTELECOM"), "UZTELECOM");
        assert_eq!(derive_short_name("Turon Telecom backbone"), "backbone");
    }

    #[test]
    fn short_name_of_empty_string_is_empty() {
        assert_eq!(derive_short_name(""), "");
        assert_eq!(derive_short_name("   "), "");
    }
}
