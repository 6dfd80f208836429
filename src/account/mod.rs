pub mod billing;
pub mod payment;
pub mod preferences;
pub mod security;
