use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub session: SessionConfig,
    #[serde(default)]
    pub booking: BookingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Root of the REST API, e.g. `http://localhost:3000/api`.
    pub base_url: String,
    /// Per-request timeout. The HTTP client default applies when unset.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// JSON file holding the persisted auth token.
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BookingConfig {
    /// Largest passenger count selectable when booking or editing.
    #[serde(default = "default_max_passengers")]
    pub max_passengers: u32,
}

fn default_max_passengers() -> u32 {
    DEFAULT_MAX_PASSENGERS
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            max_passengers: DEFAULT_MAX_PASSENGERS,
        }
    }
}

pub const DEFAULT_MAX_PASSENGERS: u32 = 10;
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_SESSION_PATH: &str = ".volar/session.json";

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: DEFAULT_BASE_URL.to_string(),
                timeout_seconds: None,
            },
            session: SessionConfig {
                path: PathBuf::from(DEFAULT_SESSION_PATH),
            },
            booking: BookingConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .set_default("api.base_url", DEFAULT_BASE_URL)?
            .set_default("session.path", DEFAULT_SESSION_PATH)?
            .set_default("booking.max_passengers", i64::from(DEFAULT_MAX_PASSENGERS))?
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Developer overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // VOLAR__API__BASE_URL=https://... overrides api.base_url
            .add_source(config::Environment::with_prefix("VOLAR").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
