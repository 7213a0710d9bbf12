//! sea-orm backed slot store (`ledger_slots` table).

use chrono::Utc;
use sea_orm::{ActiveValue, sea_query::OnConflict, entity::prelude::*};

use super::{SLOT_VERSION, ScopeKey, SlotStore};
use crate::ResultEngine;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "ledger_slots")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub scope_key: String,
    pub pool: String,
    pub version: i32,
    #[sea_orm(column_type = "Text")]
    pub payload: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Slot store over a database connection.
#[derive(Clone, Debug)]
pub struct DbStore {
    database: DatabaseConnection,
}

impl DbStore {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.database
    }
}

impl SlotStore for DbStore {
    async fn read(&self, key: &ScopeKey) -> ResultEngine<Option<String>> {
        let model = Entity::find_by_id(key.to_string())
            .one(&self.database)
            .await?;
        Ok(model.map(|model| model.payload))
    }

    async fn write(&self, key: &ScopeKey, payload: String) -> ResultEngine<()> {
        let model = ActiveModel {
            scope_key: ActiveValue::Set(key.to_string()),
            pool: ActiveValue::Set(key.pool().slug().to_string()),
            version: ActiveValue::Set(SLOT_VERSION as i32),
            payload: ActiveValue::Set(payload),
            updated_at: ActiveValue::Set(Utc::now().to_rfc3339()),
        };

        Entity::insert(model)
            .on_conflict(
                OnConflict::column(Column::ScopeKey)
                    .update_columns([
                        Column::Pool,
                        Column::Version,
                        Column::Payload,
                        Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.database)
            .await?;
        Ok(())
    }

    async fn remove(&self, key: &ScopeKey) -> ResultEngine<()> {
        Entity::delete_by_id(key.to_string())
            .exec(&self.database)
            .await?;
        Ok(())
    }
}
