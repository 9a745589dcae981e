mod profile_store_postgres;

pub use profile_store_postgres::*;
