mod identity_provider_memory;
mod profile_store_memory;

pub use identity_provider_memory::*;
pub use profile_store_memory::*;
