pub mod repository;
pub mod service;
pub mod transport;

pub use repository::{PgEmailProviderRepository, PgEmailTemplateRepository};
pub use service::EmailServiceImpl;
pub use transport::ProviderTransport;
