pub mod admin;
pub mod error;
pub mod forward_auth;
pub mod webhooks;
