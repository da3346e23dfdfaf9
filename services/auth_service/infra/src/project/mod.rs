pub mod repository;
pub mod service;
pub mod table_manager;

pub use repository::{PgProjectRepository, PgRateLimitRuleRepository};
pub use service::ProjectServiceImpl;
pub use table_manager::UserTableManager;
