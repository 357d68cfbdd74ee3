pub mod credential;
pub mod key_lock;
pub mod token;
pub mod token_cache;
pub mod token_request;
