use std::{env, fmt::Display, str::FromStr, time::Duration};
use tracing::{info, warn};

pub const DEFAULT_UPSTREAM_URL: &str = "https://api.parcel.app/external";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub upstream_url: String,
    pub upstream_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        let upstream_url: String = load("PARCEL_API_BASE_URL", DEFAULT_UPSTREAM_URL.to_string());
        Self {
            port: load("PORT", 8080),
            upstream_url: upstream_url.trim_end_matches('/').to_string(),
            upstream_timeout: Duration::from_millis(load("PARCEL_API_TIMEOUT_MS", 10_000)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            upstream_timeout: Duration::from_secs(10),
        }
    }
}

fn load<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(err) => {
                warn!("invalid {key} value {raw:?}: {err}, using default {default}");
                default
            }
        },
        Err(_) => {
            info!("{key} not set, using default: {default}");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_parses_or_falls_back() {
        // Keys are unique to this test.
        unsafe {
            env::set_var("PARCEL_TEST_LOAD_PORT", " 9090 ");
            env::set_var("PARCEL_TEST_LOAD_BAD", "soon");
        }

        assert_eq!(load("PARCEL_TEST_LOAD_PORT", 8080u16), 9090);
        assert_eq!(load("PARCEL_TEST_LOAD_BAD", 10_000u64), 10_000);
        assert_eq!(load("PARCEL_TEST_LOAD_MISSING", 7u8), 7);
    }

    #[test]
    fn default_points_at_public_api() {
        let config = Config::default();
        assert_eq!(config.upstream_url, DEFAULT_UPSTREAM_URL);
        assert_eq!(config.upstream_timeout, Duration::from_millis(10_000));
    }
}
