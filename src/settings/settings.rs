use anyhow::{Result, anyhow};
use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub auth: Auth,
    pub http: Http,
    pub identity_provider: IdentityProvider,
    pub log: Log,
    pub profile_store: ProfileStore,
}

#[derive(Debug, Deserialize)]
pub struct Auth {
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

#[derive(Deserialize)]
pub struct IdentityProvider {
    pub backend: String, // "fake" or "gotrue"
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub anon_key: String,
    #[serde(default)]
    pub service_key: String,
    /// Signing key for the tokens minted by the fake backend.
    #[serde(default)]
    pub jwt_secret: String,
}

// keys stay out of the startup log
impl std::fmt::Debug for IdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityProvider")
            .field("backend", &self.backend)
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Deserialize)]
pub struct ProfileStore {
    pub backend: String, // "fake" or "postgres"
    #[serde(default)]
    pub dsn: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    pub seed_path: Option<String>,
}

impl std::fmt::Debug for ProfileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileStore")
            .field("backend", &self.backend)
            .field("max_connections", &self.max_connections)
            .field("seed_path", &self.seed_path)
            .finish_non_exhaustive()
    }
}

impl Default for Auth {
    fn default() -> Self {
        Auth {
            call_timeout_ms: default_call_timeout_ms(),
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

fn default_call_timeout_ms() -> u64 {
    5_000
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

fn default_max_connections() -> u32 {
    5
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

/// Environment overrides look like `CONCIERGE__IDENTITY_PROVIDER__SERVICE_KEY`.
const ENV_PREFIX: &str = "CONCIERGE";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}
