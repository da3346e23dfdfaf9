pub mod repository;
pub mod secret_box;
pub mod service;

pub use repository::PgOAuthProviderRepository;
pub use secret_box::SecretBox;
pub use service::OAuthServiceImpl;
