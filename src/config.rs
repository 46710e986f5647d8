use std::env;
use std::time::Duration;

/// Environment-resolved settings, read once at process start.
///
/// Every knob has a default matching the docker-compose development setup, so
/// a bare `cargo run` works against the local containers.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Destination address for the rate table. `None` means "use the
    /// built-in service fallback" for the pipeline, and "refuse to render"
    /// for the dashboard.
    pub exchange_db_url: Option<String>,
    /// Address of the run-history store. Falls back to `exchange_db_url`.
    pub run_history_db_url: Option<String>,
    /// File path of the local sqlite favorites store.
    pub favorites_db_path: String,
    pub dashboard_username: String,
    pub dashboard_password: String,
    pub dashboard_port: u16,
    pub fetch_timeout_secs: u64,
    /// Upper bound for the startup readiness check.
    pub max_wait_secs: u64,
    pub poll_interval_secs: u64,
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            exchange_db_url: env_opt("EXCHANGE_DB_URL"),
            run_history_db_url: env_opt("RUN_HISTORY_DB_URL"),
            favorites_db_path: env::var("FAV_DB_PATH")
                .unwrap_or_else(|_| "./favorites.db".to_string()),
            dashboard_username: env::var("DASHBOARD_USERNAME")
                .unwrap_or_else(|_| "dashboard_user".to_string()),
            dashboard_password: env::var("DASHBOARD_PASSWORD")
                .unwrap_or_else(|_| "dashboard123".to_string()),
            dashboard_port: env_parsed("DASHBOARD_PORT", 8501),
            fetch_timeout_secs: env_parsed("FETCH_TIMEOUT_SECS", 15),
            max_wait_secs: env_parsed("MAX_WAIT", 60),
            poll_interval_secs: env_parsed("SLEEP_INTERVAL", 8),
        }
    }

    /// Run-history address, falling back to the exchange store.
    pub fn run_history_url(&self) -> Option<&str> {
        self.run_history_db_url
            .as_deref()
            .or(self.exchange_db_url.as_deref())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            exchange_db_url: None,
            run_history_db_url: None,
            favorites_db_path: "./favorites.db".to_string(),
            dashboard_username: "dashboard_user".to_string(),
            dashboard_password: "dashboard123".to_string(),
            dashboard_port: 8501,
            fetch_timeout_secs: 15,
            max_wait_secs: 60,
            poll_interval_secs: 8,
        }
    }
}
