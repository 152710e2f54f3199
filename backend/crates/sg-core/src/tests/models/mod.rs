mod event_type;
mod identity;
mod user_record;
mod webhook_event;
