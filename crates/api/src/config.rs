use satprep_core::error::CoreError;

/// Default bound on concurrent outbound email requests.
pub const DEFAULT_EMAIL_CONCURRENCY: usize = 8;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development. In production,
/// override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Shared secret for the batch job endpoints. Open when unset.
    pub cron_secret: Option<String>,
    /// Run the dispatch job in-process every N seconds. Off when unset.
    pub dispatch_interval_secs: Option<u64>,
    /// Bound on concurrent email sends within one run.
    pub email_concurrency: usize,
    /// Public app URL used in email links.
    pub app_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            cors_origins: vec!["http://localhost:5173".into()],
            request_timeout_secs: 30,
            cron_secret: None,
            dispatch_interval_secs: None,
            email_concurrency: DEFAULT_EMAIL_CONCURRENCY,
            app_url: "http://localhost:5173".into(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                 |
    /// |--------------------------|-------------------------|
    /// | `HOST`                   | `0.0.0.0`               |
    /// | `PORT`                   | `3000`                  |
    /// | `CORS_ORIGINS`           | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                    |
    /// | `CRON_SECRET`            | unset (open)            |
    /// | `DISPATCH_INTERVAL_SECS` | unset (external cron)   |
    /// | `EMAIL_CONCURRENCY`      | `8`                     |
    /// | `APP_URL`                | `http://localhost:5173` |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary lookup.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let defaults = Self::default();
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let cors_origins = match non_empty("CORS_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => defaults.cors_origins,
        };

        let email_concurrency = parse_or(
            non_empty("EMAIL_CONCURRENCY"),
            "EMAIL_CONCURRENCY",
            defaults.email_concurrency,
        )?;
        if email_concurrency == 0 {
            return Err(CoreError::Configuration(
                "EMAIL_CONCURRENCY must be at least 1".into(),
            ));
        }

        let dispatch_interval_secs = match non_empty("DISPATCH_INTERVAL_SECS") {
            Some(raw) => Some(parse::<u64>(&raw, "DISPATCH_INTERVAL_SECS")?).filter(|s| *s > 0),
            None => None,
        };

        Ok(Self {
            host: non_empty("HOST").unwrap_or(defaults.host),
            port: parse_or(non_empty("PORT"), "PORT", defaults.port)?,
            cors_origins,
            request_timeout_secs: parse_or(
                non_empty("REQUEST_TIMEOUT_SECS"),
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout_secs,
            )?,
            cron_secret: non_empty("CRON_SECRET"),
            dispatch_interval_secs,
            email_concurrency,
            app_url: non_empty("APP_URL").unwrap_or(defaults.app_url),
        })
    }
}

fn parse<T: std::str::FromStr>(raw: &str, key: &str) -> Result<T, CoreError> {
    raw.trim()
        .parse()
        .map_err(|_| CoreError::Configuration(format!("{key} has an invalid value: '{raw}'")))
}

fn parse_or<T: std::str::FromStr>(
    raw: Option<String>,
    key: &str,
    default: T,
) -> Result<T, CoreError> {
    raw.map_or(Ok(default), |r| parse(&r, key))
}
