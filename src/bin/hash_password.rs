//! Reads a password from stdin and prints its bcrypt hash, for seeding or
//! resetting a merchant/collaborator `password_hash` column.
//!
//! $ echo -n 'secret' | cargo run --bin hash_password -- --cost 10

use clap::Parser;
use concierge::application_impl::BcryptHasher;
use concierge::application_port::CredentialHasher;
use tokio::io::{self, AsyncReadExt};

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value_t = bcrypt::DEFAULT_COST)]
    cost: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut input = String::new();
    io::stdin().read_to_string(&mut input).await?;
    let password = input.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(anyhow::anyhow!("empty password on stdin"));
    }

    let hash = BcryptHasher::new(args.cost).hash_password(password).await?;
    println!("{}", hash);
    Ok(())
}
