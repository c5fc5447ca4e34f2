pub mod outbox_tasks;
pub mod roles;
pub mod users;
pub mod webauthn_credentials;
