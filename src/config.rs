use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use tracing::info;

/// Runtime configuration, read from the environment with logged defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the hosted backend (PostgREST + GoTrue)
    pub backend_url: String,
    /// Anonymous API key sent with every request
    pub anon_key: String,
    /// Address the local HTTP surface binds to; port 0 picks a free one
    pub bind_addr: String,
    /// Where the auth session is persisted across restarts
    pub session_file: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        let session_file: String = try_load(
            "DB_SESSION_FILE",
            &env::temp_dir().join("dancebattle_session.json").to_string_lossy(),
        );
        Self {
            backend_url: try_load("DB_BACKEND_URL", "http://localhost:54321"),
            anon_key: try_load("DB_ANON_KEY", ""),
            bind_addr: try_load("DB_BIND_ADDR", "127.0.0.1:3000"),
            session_file: PathBuf::from(session_file),
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .unwrap_or_else(|e| panic!("Invalid {key} value: {e}"))
}
