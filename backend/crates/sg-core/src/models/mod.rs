pub mod event_type;
pub mod identity;
pub mod identity_key;
pub mod user_payload;
pub mod user_record;
pub mod webhook_event;
