//! User repository for database operations.

use anyhow::Result;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::models::user::{self, Entity as User};

/// Repository for user database operations
pub struct UserRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> UserRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<user::Model>> {
        let user = User::find()
            .filter(user::Column::Username.eq(username))
            .one(self.db)
            .await?;
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>> {
        let user = User::find()
            .filter(user::Column::Email.eq(email))
            .one(self.db)
            .await?;
        Ok(user)
    }

    pub async fn create(&self, user: user::ActiveModel) -> Result<user::Model> {
        let created = user.insert(self.db).await?;
        Ok(created)
    }
}
