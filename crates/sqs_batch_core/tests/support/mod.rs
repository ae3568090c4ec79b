pub mod messages;
pub mod services;
