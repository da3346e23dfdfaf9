use async_trait::async_trait;
use shared_error::AppError;

use super::model::{AuditEvent, AuditLogEntry, AuditLogPage, AuditLogQuery};

/// Write-only audit log with a filtered read surface for operators
///
/// Writes must never block or fail a parent operation; callers go through a
/// best-effort wrapper that traces and swallows errors.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    async fn log(&self, event: AuditEvent) -> Result<(), AppError>;

    /// Filter-and-paginate, sorted by created_at descending
    async fn query(&self, query: AuditLogQuery) -> Result<AuditLogPage, AppError>;

    async fn get_by_id(&self, id: uuid::Uuid) -> Result<Option<AuditLogEntry>, AppError>;
}

/// No-op repository for when auditing is disabled (tests, tooling)
pub struct NoOpAuditLogRepository;

#[async_trait]
impl AuditLogRepository for NoOpAuditLogRepository {
    async fn log(&self, _event: AuditEvent) -> Result<(), AppError> {
        Ok(())
    }

    async fn query(&self, query: AuditLogQuery) -> Result<AuditLogPage, AppError> {
        let query = query.normalized();
        Ok(AuditLogPage {
            entries: vec![],
            total: 0,
            limit: query.limit.unwrap_or(50),
            offset: query.offset.unwrap_or(0),
        })
    }

    async fn get_by_id(&self, _id: uuid::Uuid) -> Result<Option<AuditLogEntry>, AppError> {
        Ok(None)
    }
}
