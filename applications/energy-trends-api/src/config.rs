use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DbConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub tariff: TariffSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime_secs")]
    pub max_lifetime_secs: u64,
    /// Upper bound for a single sample fetch, retries included.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_retry_attempts")]
    pub attempts: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: default_retry_attempts(),
            backoff_ms: default_retry_backoff_ms(),
        }
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    0
}

fn default_acquire_timeout_secs() -> u64 {
    5
}

fn default_idle_timeout_secs() -> u64 {
    300
}

fn default_max_lifetime_secs() -> u64 {
    1800
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    200
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
        }
    }
}

fn default_api_host() -> String {
    "0.0.0.0".into()
}

fn default_api_port() -> u16 {
    8080
}

/// Tariff values applied when a request leaves them out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TariffSettings {
    #[serde(default = "default_voltage")]
    pub default_voltage: f64,
    #[serde(default = "default_power_factor")]
    pub default_power_factor: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for TariffSettings {
    fn default() -> Self {
        Self {
            default_voltage: default_voltage(),
            default_power_factor: default_power_factor(),
            currency: default_currency(),
        }
    }
}

fn default_voltage() -> f64 {
    230.0
}

fn default_power_factor() -> f64 {
    0.9
}

fn default_currency() -> String {
    "PKR".into()
}

impl Config {
    /// Load YAML from disk, substitute $(VAR)/${VAR} with env vars, then parse.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, anyhow::Error> {
        let expanded = expand_env_placeholders(raw)?;
        let mut cfg: Self = serde_yaml::from_str(&expanded)?;

        // Optional: allow DATABASE_URL env to override whatever YAML had
        if let Ok(url) = std::env::var("DATABASE_URL") {
            cfg.database.url = url;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        let pf = self.tariff.default_power_factor;
        if !(pf > 0.0 && pf <= 1.0) {
            anyhow::bail!("tariff.default_power_factor must be in (0, 1], got {}", pf);
        }
        if !(self.tariff.default_voltage.is_finite() && self.tariff.default_voltage > 0.0) {
            anyhow::bail!(
                "tariff.default_voltage must be positive, got {}",
                self.tariff.default_voltage
            );
        }
        if self.database.max_connections == 0 {
            anyhow::bail!("database.max_connections must be at least 1");
        }
        Ok(())
    }

    pub fn api_bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

/// Expand $(VAR) and ${VAR} placeholders using environment variables.
fn expand_env_placeholders(input: &str) -> Result<String, anyhow::Error> {
    use anyhow::Context;

    let mut out = String::with_capacity(input.len());
    let mut it = input.chars().peekable();

    while let Some(c) = it.next() {
        if c == '$' {
            match it.peek().copied() {
                Some('$') => {
                    // Escape "$$" -> "$"
                    it.next();
                    out.push('$');
                }
                Some(open @ ('(' | '{')) => {
                    it.next();
                    let close = if open == '(' { ')' } else { '}' };
                    let var = read_until(&mut it, close).with_context(|| {
                        format!("unterminated env placeholder: missing '{}'", close)
                    })?;
                    let val = std::env::var(&var)
                        .with_context(|| format!("missing environment variable: {}", var))?;
                    out.push_str(&val);
                }
                _ => {
                    // Not a placeholder; keep the '$' as-is
                    out.push('$');
                }
            }
        } else {
            out.push(c);
        }
    }

    Ok(out)
}

fn read_until<I>(it: &mut std::iter::Peekable<I>, end: char) -> Option<String>
where
    I: Iterator<Item = char>,
{
    let mut buf = String::new();
    for ch in it.by_ref() {
        if ch == end {
            return Some(buf);
        }
        buf.push(ch);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_expand_both_placeholder_styles() {
        std::env::set_var("TRENDS_TEST_DB_USER", "meter");
        std::env::set_var("TRENDS_TEST_DB_PASS", "s3cret");

        let out =
            expand_env_placeholders("postgres://$(TRENDS_TEST_DB_USER):${TRENDS_TEST_DB_PASS}@db")
                .unwrap();
        assert_eq!(out, "postgres://meter:s3cret@db");
    }

    #[test]
    fn test_expand_escaped_dollar_and_plain_dollar() {
        let out = expand_env_placeholders("cost $$5 and $ alone").unwrap();
        assert_eq!(out, "cost $5 and $ alone");
    }

    #[test]
    fn test_expand_missing_variable_fails() {
        let err = expand_env_placeholders("${TRENDS_TEST_SURELY_NOT_SET}").unwrap_err();
        assert!(err.to_string().contains("TRENDS_TEST_SURELY_NOT_SET"));
    }

    #[test]
    fn test_expand_unterminated_placeholder_fails() {
        assert!(expand_env_placeholders("$(OPEN").is_err());
    }

    #[test]
    fn test_minimal_yaml_uses_defaults() {
        let cfg: Config = serde_yaml::from_str("database:\n  url: postgres://localhost/meter\n")
            .unwrap();

        assert_eq!(cfg.api.port, 8080);
        assert_eq!(cfg.api.host, "0.0.0.0");
        assert_eq!(cfg.database.max_connections, 10);
        assert_eq!(cfg.database.retry.attempts, 3);
        assert_eq!(cfg.tariff.default_voltage, 230.0);
        assert_eq!(cfg.tariff.default_power_factor, 0.9);
        assert_eq!(cfg.tariff.currency, "PKR");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_invalid_default_power_factor_rejected() {
        let mut cfg: Config =
            serde_yaml::from_str("database:\n  url: postgres://localhost/meter\n").unwrap();
        cfg.tariff.default_power_factor = 0.0;
        assert!(cfg.validate().is_err());

        cfg.tariff.default_power_factor = 1.2;
        assert!(cfg.validate().is_err());
    }
}
