use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub max_connections: u32,
    pub default_page_size: u32,
    pub max_page_size: u32,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let max_connections = parse_positive_u32(&env_map, "DB_MAX_CONNECTIONS", 5)?;
        let default_page_size = parse_positive_u32(&env_map, "DEFAULT_PAGE_SIZE", 10)?;
        let max_page_size = parse_positive_u32(&env_map, "MAX_PAGE_SIZE", 100)?;

        if default_page_size > max_page_size {
            return Err(ConfigError::InvalidValue(
                "DEFAULT_PAGE_SIZE".to_string(),
                format!("must not exceed MAX_PAGE_SIZE ({})", max_page_size),
            ));
        }

        Ok(Config {
            database_path,
            max_connections,
            default_page_size,
            max_page_size,
        })
    }

    /// Configuration for tests and tools that only need a database path.
    pub fn for_database(database_path: impl Into<String>) -> Self {
        Config {
            database_path: database_path.into(),
            max_connections: 5,
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

fn parse_positive_u32(
    env_map: &HashMap<String, String>,
    key: &str,
    default: u32,
) -> Result<u32, ConfigError> {
    match env_map.get(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|v| *v > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(key.to_string(), "must be a positive integer".to_string())
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_required_env() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("DATABASE_PATH".to_string(), "/tmp/test.db".to_string());
        map
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_env_map(setup_required_env()).unwrap();
        assert_eq!(config.database_path, "/tmp/test.db");
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.default_page_size, 10);
        assert_eq!(config.max_page_size, 100);
    }

    #[test]
    fn test_missing_database_path() {
        let mut env_map = setup_required_env();
        env_map.remove("DATABASE_PATH");
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "DATABASE_PATH"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_invalid_max_connections() {
        for bad in ["not_a_number", "0", "-3"] {
            let mut env_map = setup_required_env();
            env_map.insert("DB_MAX_CONNECTIONS".to_string(), bad.to_string());
            match Config::from_env_map(env_map) {
                Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "DB_MAX_CONNECTIONS"),
                _ => panic!("Expected InvalidValue error for {}", bad),
            }
        }
    }

    #[test]
    fn test_page_sizes_from_env() {
        let mut env_map = setup_required_env();
        env_map.insert("DEFAULT_PAGE_SIZE".to_string(), "25".to_string());
        env_map.insert("MAX_PAGE_SIZE".to_string(), "50".to_string());
        let config = Config::from_env_map(env_map).unwrap();
        assert_eq!(config.default_page_size, 25);
        assert_eq!(config.max_page_size, 50);
    }

    #[test]
    fn test_default_page_size_above_max() {
        let mut env_map = setup_required_env();
        env_map.insert("DEFAULT_PAGE_SIZE".to_string(), "200".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "DEFAULT_PAGE_SIZE"),
            _ => panic!("Expected InvalidValue error"),
        }
    }
}
