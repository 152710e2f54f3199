pub mod error;
pub mod models;

pub use error::{CoreError, CoreResult};
pub use models::event_type::EventType;
pub use models::identity::Identity;
pub use models::identity_key::IdentityKey;
pub use models::user_payload::UserPayload;
pub use models::user_record::{MergeOutcome, UserRecord};
pub use models::webhook_event::WebhookEvent;

#[cfg(test)]
mod tests;
