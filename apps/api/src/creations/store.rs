use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::creation::{Creation, NewCreation};

/// Append-only creation storage. There is deliberately no update or delete.
#[async_trait]
pub trait CreationStore: Send + Sync {
    /// Inserts one row and returns its id.
    async fn insert(&self, creation: &NewCreation) -> Result<i64, sqlx::Error>;

    /// The user's creations, newest first.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Creation>, sqlx::Error>;

    /// Every published creation, newest first.
    async fn list_published(&self) -> Result<Vec<Creation>, sqlx::Error>;
}

#[derive(Clone)]
pub struct PgCreationStore {
    pool: PgPool,
}

impl PgCreationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CreationStore for PgCreationStore {
    async fn insert(&self, creation: &NewCreation) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO creations (user_id, prompt, content, type, publish)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&creation.user_id)
        .bind(&creation.prompt)
        .bind(&creation.content)
        .bind(creation.creation_type.as_str())
        .bind(creation.publish)
        .fetch_one(&self.pool)
        .await
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Creation>, sqlx::Error> {
        sqlx::query_as::<_, Creation>(
            "SELECT * FROM creations WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn list_published(&self) -> Result<Vec<Creation>, sqlx::Error> {
        sqlx::query_as::<_, Creation>(
            "SELECT * FROM creations WHERE publish = TRUE ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
    }
}
