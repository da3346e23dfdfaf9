pub mod repository;
pub mod service;

pub use repository::{PgAdminSessionRepository, PgAdminUserRepository};
pub use service::AdminAuthServiceImpl;
