pub mod account;
pub mod avatar;
pub mod token;
pub mod turnstile;
pub mod webauthn;
