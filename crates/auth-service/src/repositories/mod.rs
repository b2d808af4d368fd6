pub mod jwt_keys;
pub mod users;
