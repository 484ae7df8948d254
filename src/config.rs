use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
    /// Window length for plan views when the request does not name one.
    pub plan_default_weeks: u32,
    pub plan_max_weeks: u32,
    /// Single allowed CORS origin; every origin is allowed when unset.
    pub cors_allowed_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let plan_max_weeks: u32 = env::var("PLAN_MAX_WEEKS")
            .unwrap_or_else(|_| "12".into())
            .parse()?;
        let plan_default_weeks: u32 = env::var("PLAN_DEFAULT_WEEKS")
            .unwrap_or_else(|_| "2".into())
            .parse()?;
        anyhow::ensure!(plan_max_weeks >= 1, "PLAN_MAX_WEEKS must be at least 1");
        anyhow::ensure!(
            (1..=plan_max_weeks).contains(&plan_default_weeks),
            "PLAN_DEFAULT_WEEKS must be between 1 and PLAN_MAX_WEEKS"
        );

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".into())
                .parse()?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
            plan_default_weeks,
            plan_max_weeks,
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN").ok().filter(|s| !s.is_empty()),
        })
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).map_err(|_| anyhow::anyhow!("Missing required env var: {}", key))
}
