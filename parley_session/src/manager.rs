use async_trait::async_trait;
use parley_core::{Session, SessionStore, UserId, UserSummary};
use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, Schema, Set,
};
use tracing::{debug, info};

use crate::entity::users;

fn is_table_already_exists_error(err: &DbErr) -> bool {
    err.to_string().contains("table") && err.to_string().contains("already exists")
}

fn turn_count(model: &users::Model) -> u32 {
    u32::try_from(model.conversation_count).unwrap_or(0)
}

pub struct SessionManager {
    db: DatabaseConnection,
}

impl SessionManager {
    /// Connects to `database_url` and creates the `users` table if needed.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        info!("Connecting to database: {}", database_url);

        let db = Database::connect(database_url).await?;

        let backend = db.get_database_backend();
        let schema = Schema::new(backend);
        let stmt = schema.create_table_from_entity(users::Entity);
        match db
            .execute_unprepared(&backend.build(&stmt).to_string())
            .await
        {
            Ok(_) => {}
            Err(e) if is_table_already_exists_error(&e) => {
                info!("Table already exists, skipping creation");
            }
            Err(e) => return Err(e.into()),
        }

        info!("SessionManager initialized");
        Ok(Self { db })
    }

    async fn find(&self, user_id: UserId) -> anyhow::Result<Option<users::Model>> {
        Ok(users::Entity::find_by_id(user_id).one(&self.db).await?)
    }

    /// Sets one column of the user's row in a single `UPDATE`. A missing
    /// row is a no-op.
    async fn update_column(
        &self,
        user_id: UserId,
        column: users::Column,
        value: Expr,
    ) -> anyhow::Result<()> {
        let result = users::Entity::update_many()
            .col_expr(column, value)
            .filter(users::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            debug!("No session row for user {user_id}, update skipped");
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for SessionManager {
    async fn exists(&self, user_id: UserId) -> anyhow::Result<bool> {
        Ok(self.find(user_id).await?.is_some())
    }

    async fn create(&self, user_id: UserId) -> anyhow::Result<bool> {
        if self.exists(user_id).await? {
            return Ok(false);
        }

        users::ActiveModel {
            user_id: Set(user_id),
            conversation_count: Set(0),
            context: Set(String::new()),
        }
        .insert(&self.db)
        .await?;

        info!("Created session for user {user_id}");
        Ok(true)
    }

    async fn delete(&self, user_id: UserId) -> anyhow::Result<bool> {
        let result = users::Entity::delete_by_id(user_id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }

    async fn fetch(&self, user_id: UserId) -> anyhow::Result<Option<Session>> {
        Ok(self.find(user_id).await?.map(|model| Session {
            user_id: model.user_id,
            turn_count: turn_count(&model),
            context: model.context,
        }))
    }

    async fn list_all(&self) -> anyhow::Result<Vec<UserSummary>> {
        let models = users::Entity::find()
            .order_by_asc(users::Column::UserId)
            .all(&self.db)
            .await?;

        Ok(models
            .iter()
            .map(|model| UserSummary {
                user_id: model.user_id,
                turn_count: turn_count(model),
            })
            .collect())
    }

    async fn set_context(&self, user_id: UserId, context: &str) -> anyhow::Result<()> {
        self.update_column(user_id, users::Column::Context, Expr::value(context))
            .await
    }

    async fn increment_turn_count(&self, user_id: UserId) -> anyhow::Result<()> {
        let next = Expr::col(users::Column::ConversationCount).add(1);
        self.update_column(user_id, users::Column::ConversationCount, next)
            .await
    }

    async fn reset_turn_count(&self, user_id: UserId) -> anyhow::Result<()> {
        self.update_column(user_id, users::Column::ConversationCount, Expr::value(0))
            .await
    }
}
