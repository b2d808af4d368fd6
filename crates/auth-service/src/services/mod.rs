pub mod credentials;
pub mod key_rotation;
pub mod token_service;
pub mod user_service;
