use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::Result;
use crate::models::profile::{ProfileRecord, ProfileUpsert};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get(&self, uid: &str) -> Result<Option<ProfileRecord>>;

    /// Merges the given fields into the profile at `upsert.uid`. `updated_at`
    /// is always set to server time; `created_at` only when the profile is new.
    async fn upsert_merge(&self, upsert: ProfileUpsert) -> Result<()>;
}

#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn get(&self, uid: &str) -> Result<Option<ProfileRecord>> {
        let row = sqlx::query_as::<_, ProfileRecord>(
            r#"
            SELECT uid, email, display_name, role, active, created_at, updated_at
            FROM users
            WHERE uid = $1
            "#,
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn upsert_merge(&self, upsert: ProfileUpsert) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (uid, email, display_name, role, active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
            ON CONFLICT (uid) DO UPDATE SET
                email = EXCLUDED.email,
                display_name = EXCLUDED.display_name,
                role = EXCLUDED.role,
                active = EXCLUDED.active,
                updated_at = NOW()
            "#,
        )
        .bind(&upsert.uid)
        .bind(&upsert.email)
        .bind(&upsert.display_name)
        .bind(upsert.role.as_str())
        .bind(upsert.active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
