use crate::auth::DEFAULT_PASSWORD_ITERATIONS;
use std::{env, net::SocketAddr, path::PathBuf};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_PATH: &str = "data/state.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
}

/// Server settings, read from the environment once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    /// Account created when the data file has no users yet.
    pub admin: Option<AdminSeed>,
    /// PBKDF2 rounds for new password hashes.
    pub password_iterations: u32,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let data_path = lookup("APP_DATA_PATH")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));

        let admin = match (
            lookup("STUDY_TIME_ADMIN_USER"),
            lookup("STUDY_TIME_ADMIN_PASSWORD"),
        ) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                Some(AdminSeed { username, password })
            }
            _ => None,
        };

        let password_iterations = lookup("STUDY_TIME_PASSWORD_ITERATIONS")
            .and_then(|value| value.parse::<u32>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_PASSWORD_ITERATIONS);

        Self {
            port,
            data_path,
            admin,
            password_iterations,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = config_from(&[]);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.data_path, PathBuf::from(DEFAULT_DATA_PATH));
        assert_eq!(config.admin, None);
        assert_eq!(config.password_iterations, DEFAULT_PASSWORD_ITERATIONS);
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("PORT", "9000"),
            ("APP_DATA_PATH", "/tmp/study.json"),
            ("STUDY_TIME_ADMIN_USER", "admin@example.com"),
            ("STUDY_TIME_ADMIN_PASSWORD", "secret"),
            ("STUDY_TIME_PASSWORD_ITERATIONS", "1000"),
        ]);
        assert_eq!(config.password_iterations, 1000);
        assert_eq!(config.port, 9000);
        assert_eq!(config.addr().port(), 9000);
        assert_eq!(config.data_path, PathBuf::from("/tmp/study.json"));
        assert_eq!(config.admin.unwrap().username, "admin@example.com");
    }

    #[test]
    fn bad_port_and_partial_admin_fall_back() {
        let config = config_from(&[("PORT", "not-a-port"), ("STUDY_TIME_ADMIN_USER", "admin")]);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.admin, None);
    }
}
