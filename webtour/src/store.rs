//! Single-table user store backed by SQLite through sea-orm.
//!
//! Names are not unique. Lookups by name return the earliest inserted row.
//! `email` is nullable so databases written by other tools still load.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, Schema, Set,
};
use thiserror::Error;
use tracing::debug;

pub mod user {
    use sea_orm::entity::prelude::*;
    use serde::Serialize;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
    #[sea_orm(table_name = "users")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub name: String,
        pub email: Option<String>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub type User = user::Model;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to connect to {url}: {source}")]
    Connect { url: String, source: DbErr },
    #[error("database query failed: {0}")]
    Query(#[from] DbErr),
}

#[derive(Debug, Clone)]
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Connect and create the `users` table if it does not exist yet.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let db = Database::connect(url)
            .await
            .map_err(|source| StoreError::Connect {
                url: String::from(url),
                source,
            })?;
        let store = Self { db };
        store.ensure_schema().await?;
        Ok(store)
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        let backend = self.db.get_database_backend();
        let mut table = Schema::new(backend).create_table_from_entity(user::Entity);
        table.if_not_exists();
        self.db.execute(backend.build(&table)).await?;
        debug!("users table ready");
        Ok(())
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<User>, StoreError> {
        let found = user::Entity::find()
            .filter(user::Column::Name.eq(name))
            .order_by_asc(user::Column::Id)
            .one(&self.db)
            .await?;
        Ok(found)
    }

    pub async fn insert(&self, name: &str, email: &str) -> Result<User, StoreError> {
        let row = user::ActiveModel {
            name: Set(String::from(name)),
            email: Set(Some(String::from(email))),
            ..Default::default()
        };
        let inserted = row.insert(&self.db).await?;
        debug!(id = inserted.id, name = %inserted.name, "user inserted");
        Ok(inserted)
    }

    pub async fn update_email(&self, user: User, email: &str) -> Result<User, StoreError> {
        let mut row: user::ActiveModel = user.into();
        row.email = Set(Some(String::from(email)));
        let updated = row.update(&self.db).await?;
        debug!(id = updated.id, "user email updated");
        Ok(updated)
    }

    pub async fn all(&self) -> Result<Vec<User>, StoreError> {
        let users = user::Entity::find()
            .order_by_asc(user::Column::Id)
            .all(&self.db)
            .await?;
        Ok(users)
    }
}
