mod identity_provider_gotrue;

pub use identity_provider_gotrue::*;
