use std::net::IpAddr;

use chrono::Duration;

use crate::auth::password::HashCost;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub token_lifetime: Duration,
    pub hash_cost: HashCost,
    pub host: IpAddr,
    pub port: u16,
    pub max_body_size: usize,
    pub log_level: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("jwt_secret", &"<redacted>")
            .field("token_lifetime", &self.token_lifetime)
            .field("hash_cost", &self.hash_cost)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("max_body_size", &self.max_body_size)
            .field("log_level", &self.log_level)
            .finish_non_exhaustive()
    }
}

const MIN_SECRET_LEN: usize = 32;
const MAX_LIFETIME_DAYS: i64 = 365;

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;

        let jwt_secret = env_required("JWT_SECRET")?;
        if jwt_secret.len() < MIN_SECRET_LEN {
            return Err(format!("JWT_SECRET must be at least {MIN_SECRET_LEN} bytes"));
        }

        let token_lifetime = parse_lifetime(&env_or("JWT_EXPIRES_IN", "1h"))
            .map_err(|e| format!("Invalid JWT_EXPIRES_IN: {e}"))?;

        let defaults = HashCost::default();
        let hash_cost = HashCost {
            memory_kib: env_parse("TOURBOOK_HASH_MEMORY_KIB", defaults.memory_kib)?,
            iterations: env_parse("TOURBOOK_HASH_ITERATIONS", defaults.iterations)?,
            parallelism: env_parse("TOURBOOK_HASH_PARALLELISM", defaults.parallelism)?,
        };

        let host: IpAddr = env_or("TOURBOOK_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid TOURBOOK_HOST: {e}"))?;

        let port: u16 = env_parse("PORT", 3000)?;
        let max_body_size: usize = env_parse("TOURBOOK_MAX_BODY_SIZE", 64 * 1024)?;
        let log_level = env_or("TOURBOOK_LOG_LEVEL", "info");

        Ok(Config {
            database_url,
            jwt_secret,
            token_lifetime,
            hash_cost,
            host,
            port,
            max_body_size,
            log_level,
        })
    }

    /// Cheap hashing and a fixed secret.
    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Config {
            database_url: String::new(),
            jwt_secret: "test-jwt-secret-that-is-long-enough".to_string(),
            token_lifetime: Duration::hours(1),
            hash_cost: HashCost {
                memory_kib: 1024,
                iterations: 1,
                parallelism: 1,
            },
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            max_body_size: 64 * 1024,
            log_level: "warn".to_string(),
        }
    }
}

/// Parse a token lifetime: bare seconds (`3600`) or a number with one of
/// the suffixes `s`, `m`, `h`, `d` (`15m`, `1h`, `7d`). At most a year.
pub fn parse_lifetime(value: &str) -> Result<Duration, String> {
    let value = value.trim();
    let (digits, unit) = match value.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&value[..idx], c),
        _ => (value, 's'),
    };

    let amount: i64 = digits
        .parse()
        .map_err(|_| format!("'{value}' is not a duration"))?;
    if amount <= 0 {
        return Err(format!("'{value}' must be positive"));
    }

    let lifetime = match unit {
        's' => Duration::try_seconds(amount),
        'm' => Duration::try_minutes(amount),
        'h' => Duration::try_hours(amount),
        'd' => Duration::try_days(amount),
        other => return Err(format!("unknown unit '{other}'")),
    };

    match lifetime {
        Some(lifetime) if lifetime <= Duration::days(MAX_LIFETIME_DAYS) => Ok(lifetime),
        _ => Err(format!("'{value}' exceeds {MAX_LIFETIME_DAYS} days")),
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T>(key: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e| format!("Invalid {key}: {e}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifetime_units() {
        assert_eq!(parse_lifetime("3600"), Ok(Duration::hours(1)));
        assert_eq!(parse_lifetime("90s"), Ok(Duration::seconds(90)));
        assert_eq!(parse_lifetime("15m"), Ok(Duration::minutes(15)));
        assert_eq!(parse_lifetime("1h"), Ok(Duration::hours(1)));
        assert_eq!(parse_lifetime(" 7d "), Ok(Duration::days(7)));
    }

    #[test]
    fn lifetime_rejects_garbage() {
        assert!(parse_lifetime("").is_err());
        assert!(parse_lifetime("h").is_err());
        assert!(parse_lifetime("0h").is_err());
        assert!(parse_lifetime("-5m").is_err());
        assert!(parse_lifetime("2w").is_err());
        assert!(parse_lifetime("one hour").is_err());
    }

    #[test]
    fn lifetime_is_capped_at_a_year() {
        assert_eq!(parse_lifetime("365d"), Ok(Duration::days(365)));
        assert!(parse_lifetime("366d").is_err());
        assert!(parse_lifetime("100000000d").is_err());
        assert!(parse_lifetime("999999999999999d").is_err());
        assert!(parse_lifetime("9223372036854775807s").is_err());
    }

    #[test]
    fn debug_redacts_secret() {
        let rendered = format!("{:?}", Config::for_tests());
        assert!(!rendered.contains("test-jwt-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
