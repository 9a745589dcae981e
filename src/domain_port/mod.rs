mod identity_provider;
mod profile_store;

pub use identity_provider::*;
pub use profile_store::*;
