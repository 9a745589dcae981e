mod error;
mod handler;
mod router;

pub use error::*;
pub use handler::{ApiResponse, LoginRequest, LoginResponse};
pub use router::routes;
