pub mod attempt_repository;
pub mod email_verification_service;
pub mod password;
pub mod password_reset_service;
pub mod rate_limiter;
pub mod repository;
pub mod service;
pub mod token;
pub mod token_repository;

pub use attempt_repository::PgAuthAttemptRepository;
pub use email_verification_service::EmailVerificationServiceImpl;
pub use password_reset_service::PasswordResetServiceImpl;
pub use rate_limiter::DbRateLimiter;
pub use repository::PgUserRepository;
pub use service::AuthServiceImpl;
pub use token_repository::{PgRefreshTokenRepository, PgSingleUseTokenRepository};
