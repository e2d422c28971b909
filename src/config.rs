use serde::Deserialize;

use crate::events::policy::EventPolicyKind;

pub const DEV_JWT_SECRET: &str = "some-secret-1213123";

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_hours: i64,
}

/// Argon2id work factor.
#[derive(Debug, Clone, Deserialize)]
pub struct HashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_timeout_secs: u64,
    pub db_max_connections: u32,
    pub jwt: JwtConfig,
    pub hashing: HashingConfig,
    pub event_policy: EventPolicyKind,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").unwrap_or_else(|_| DEV_JWT_SECRET.into()),
            ttl_hours: env_parse("JWT_TTL_HOURS", 72),
        };
        let hashing = HashingConfig {
            memory_kib: env_parse("ARGON2_MEMORY_KIB", argon2::Params::DEFAULT_M_COST),
            iterations: env_parse("ARGON2_ITERATIONS", argon2::Params::DEFAULT_T_COST),
            parallelism: env_parse("ARGON2_PARALLELISM", argon2::Params::DEFAULT_P_COST),
        };
        let event_policy = match std::env::var("EVENT_POLICY") {
            Ok(v) => v.parse::<EventPolicyKind>()?,
            Err(_) => EventPolicyKind::Open,
        };
        Ok(Self {
            database_url,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_parse("PORT", 8080),
            db_timeout_secs: env_parse("DB_TIMEOUT_SECS", 3),
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", 10),
            jwt,
            hashing,
            event_policy,
        })
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt.secret == DEV_JWT_SECRET
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_parse_falls_back_on_garbage() {
        std::env::set_var("EVENTHUB_TEST_NUMBER", "not-a-number");
        assert_eq!(env_parse::<u64>("EVENTHUB_TEST_NUMBER", 3), 3);
        std::env::set_var("EVENTHUB_TEST_NUMBER", "7");
        assert_eq!(env_parse::<u64>("EVENTHUB_TEST_NUMBER", 3), 7);
        std::env::remove_var("EVENTHUB_TEST_NUMBER");
    }

    #[test]
    fn env_parse_uses_default_when_unset() {
        assert_eq!(env_parse::<u16>("EVENTHUB_TEST_UNSET_PORT", 8080), 8080);
    }
}
