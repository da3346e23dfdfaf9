pub mod repository;

pub use repository::PgAuditLogRepository;
