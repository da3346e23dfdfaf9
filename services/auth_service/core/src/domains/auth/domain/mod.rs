pub mod model;
pub mod rate_limiter;
pub mod repository;
pub mod service;
