mod auth_service_impl;
mod bcrypt_hasher;
mod retry;

pub use auth_service_impl::*;
pub use bcrypt_hasher::*;
pub use retry::*;
