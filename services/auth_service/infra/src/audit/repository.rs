use async_trait::async_trait;
use auth_service_core::domains::audit::domain::{
    model::{AuditEvent, AuditLogEntry, AuditLogPage, AuditLogQuery},
    repository::AuditLogRepository,
};
use chrono::Utc;
use shared_error::AppError;
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL implementation of AuditLogRepository
///
/// Append-only; reads are filter-and-paginate over the fixed columns,
/// newest first.
#[derive(Clone)]
pub struct PgAuditLogRepository {
    pool: PgPool,
}

impl PgAuditLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLogRepository for PgAuditLogRepository {
    async fn log(&self, event: AuditEvent) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (
                id, project_id, event_type, event_status, user_id, admin_user_id,
                ip_address, user_agent, event_data, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&event.project_id)
        .bind(&event.event_type)
        .bind(&event.event_status)
        .bind(event.user_id)
        .bind(event.admin_user_id)
        .bind(&event.ip_address)
        .bind(&event.user_agent)
        .bind(event.event_data.map(sqlx::types::Json))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn query(&self, query: AuditLogQuery) -> Result<AuditLogPage, AppError> {
        let query = query.normalized();
        let limit = query.limit.unwrap_or(50);
        let offset = query.offset.unwrap_or(0);

        const FILTER: &str = r#"
            WHERE ($1::TEXT IS NULL OR project_id = $1)
              AND ($2::TEXT IS NULL OR event_type = $2)
              AND ($3::UUID IS NULL OR user_id = $3)
              AND ($4::UUID IS NULL OR admin_user_id = $4)
              AND ($5::TIMESTAMPTZ IS NULL OR created_at >= $5)
              AND ($6::TIMESTAMPTZ IS NULL OR created_at <= $6)
        "#;

        let entries = sqlx::query_as::<_, AuditLogEntry>(&format!(
            "SELECT * FROM audit_logs {FILTER} ORDER BY created_at DESC LIMIT $7 OFFSET $8"
        ))
        .bind(&query.project_id)
        .bind(&query.event_type)
        .bind(query.user_id)
        .bind(query.admin_user_id)
        .bind(query.start_date)
        .bind(query.end_date)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: (i64,) =
            sqlx::query_as(&format!("SELECT COUNT(*) FROM audit_logs {FILTER}"))
                .bind(&query.project_id)
                .bind(&query.event_type)
                .bind(query.user_id)
                .bind(query.admin_user_id)
                .bind(query.start_date)
                .bind(query.end_date)
                .fetch_one(&self.pool)
                .await?;

        Ok(AuditLogPage {
            entries,
            total: total.0,
            limit,
            offset,
        })
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<AuditLogEntry>, AppError> {
        let entry = sqlx::query_as::<_, AuditLogEntry>("SELECT * FROM audit_logs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(entry)
    }
}
