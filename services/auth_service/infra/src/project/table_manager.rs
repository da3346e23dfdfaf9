//! Tenant-table manager
//!
//! Creates and drops the dedicated `<project_id>_users` table for each
//! project. Every identifier interpolated into the DDL passes through
//! `sanitize_identifier` first.

use auth_service_core::domains::project::domain::slug::sanitize_identifier;
use shared_error::AppError;
use sqlx::PgPool;

#[derive(Clone)]
pub struct UserTableManager {
    pool: PgPool,
}

impl UserTableManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the per-project user table with its constraints, indexes and
    /// updated_at trigger
    pub async fn create_user_table(&self, table_name: &str) -> Result<(), AppError> {
        let table = sanitize_identifier(table_name);
        if table.is_empty() {
            return Err(AppError::Validation("User table name is empty".to_string()));
        }

        let ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id UUID PRIMARY KEY,
                email TEXT NOT NULL,
                email_verified BOOLEAN NOT NULL DEFAULT FALSE,
                phone TEXT,
                phone_verified BOOLEAN NOT NULL DEFAULT FALSE,
                password_hash TEXT,
                oauth_provider TEXT,
                oauth_provider_user_id TEXT,
                oauth_raw_user_data JSONB,
                display_name TEXT,
                avatar_url TEXT,
                metadata JSONB,
                status TEXT NOT NULL DEFAULT 'active'
                    CHECK (status IN ('active', 'suspended', 'deleted')),
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                last_login_at TIMESTAMPTZ,
                UNIQUE (oauth_provider, oauth_provider_user_id)
            )
            "#
        );
        sqlx::query(&ddl).execute(&self.pool).await?;

        let statements = [
            format!("CREATE INDEX IF NOT EXISTS idx_{table}_email ON {table} (email)"),
            format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_{table}_email_live \
                 ON {table} (email) WHERE status <> 'deleted'"
            ),
            format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_{table}_phone \
                 ON {table} (phone) WHERE phone IS NOT NULL"
            ),
            format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_oauth \
                 ON {table} (oauth_provider, oauth_provider_user_id) \
                 WHERE oauth_provider IS NOT NULL"
            ),
            format!("CREATE INDEX IF NOT EXISTS idx_{table}_status ON {table} (status)"),
            format!("CREATE INDEX IF NOT EXISTS idx_{table}_created_at ON {table} (created_at)"),
            format!(
                "CREATE OR REPLACE TRIGGER trg_{table}_updated_at \
                 BEFORE UPDATE ON {table} \
                 FOR EACH ROW EXECUTE FUNCTION set_updated_at()"
            ),
        ];
        for stmt in &statements {
            sqlx::query(stmt).execute(&self.pool).await?;
        }

        tracing::info!(table = %table, "Created project user table");
        Ok(())
    }

    /// Drop the per-project user table
    pub async fn drop_user_table(&self, table_name: &str) -> Result<(), AppError> {
        let table = sanitize_identifier(table_name);
        if table.is_empty() {
            return Ok(());
        }

        sqlx::query(&format!("DROP TABLE IF EXISTS {table}"))
            .execute(&self.pool)
            .await?;

        tracing::info!(table = %table, "Dropped project user table");
        Ok(())
    }
}
