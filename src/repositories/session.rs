//! Session repository for database operations.

use anyhow::Result;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::models::session::{self, Entity as Session};

/// Repository for session database operations
pub struct SessionRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> SessionRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a session by its token
    pub async fn find_by_token(&self, token: Uuid) -> Result<Option<session::Model>> {
        let session = Session::find_by_id(token).one(self.db).await?;
        Ok(session)
    }

    /// Creates a new session row
    pub async fn create(&self, session: session::ActiveModel) -> Result<session::Model> {
        let created = session.insert(self.db).await?;
        Ok(created)
    }

    /// Attaches a user to an existing session (login)
    pub async fn attach_user(&self, token: Uuid, user_id: Uuid) -> Result<session::Model> {
        let existing = Session::find_by_id(token)
            .one(self.db)
            .await?
            .ok_or_else(|| anyhow::anyhow!("session '{}' not found", token))?;

        let mut active: session::ActiveModel = existing.into();
        active.user_id = Set(Some(user_id));
        let updated = active.update(self.db).await?;
        Ok(updated)
    }

    /// Deletes a session row (logout). Missing rows are not an error.
    pub async fn delete(&self, token: Uuid) -> Result<()> {
        Session::delete_many()
            .filter(session::Column::Token.eq(token))
            .exec(self.db)
            .await?;
        Ok(())
    }
}
