//! Client repository for database operations.

use std::sync::Arc;

use ledgerbook_shared::ClientId;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, QueryOrder, Set};

use crate::entities::clients;

/// Client repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    db: Arc<DatabaseConnection>,
}

impl ClientRepository {
    /// Creates a new client repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Lists all clients ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<clients::Model>, DbErr> {
        clients::Entity::find()
            .order_by_asc(clients::Column::Id)
            .all(self.db.as_ref())
            .await
    }

    /// Finds a client by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: ClientId) -> Result<Option<clients::Model>, DbErr> {
        clients::Entity::find_by_id(id.into_inner()).one(self.db.as_ref()).await
    }

    /// Creates a client. The caller is responsible for trimming `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(&self, name: &str) -> Result<clients::Model, DbErr> {
        let client = clients::ActiveModel {
            name: Set(name.to_string()),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        client.insert(self.db.as_ref()).await
    }
}
