pub mod admin;
pub mod audit;
pub mod auth;
pub mod email;
pub mod oauth;
pub mod project;
pub mod schema;
