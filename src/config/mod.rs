use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub query: QueryConfig,
    pub uploads: UploadConfig,
    pub geocoder: GeocoderConfig,
    pub smtp: SmtpConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub cookie_name: String,
    pub cookie_expire_days: i64,
    pub secure_cookies: bool,
    pub reset_token_expiry_mins: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    pub default_limit: i64,
    pub max_limit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub path: String,
    pub max_file_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Environment defaults first, specific env vars override
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout_secs =
                v.parse().unwrap_or(self.database.connection_timeout_secs);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("JWT_COOKIE_EXPIRE_DAYS") {
            self.security.cookie_expire_days =
                v.parse().unwrap_or(self.security.cookie_expire_days);
        }

        // Query translator overrides
        if let Ok(v) = env::var("QUERY_DEFAULT_LIMIT") {
            self.query.default_limit = v.parse().unwrap_or(self.query.default_limit);
        }
        if let Ok(v) = env::var("QUERY_MAX_LIMIT") {
            self.query.max_limit = v.parse().unwrap_or(self.query.max_limit);
        }

        // Upload overrides
        if let Ok(v) = env::var("FILE_UPLOAD_PATH") {
            self.uploads.path = v;
        }
        if let Ok(v) = env::var("MAX_FILE_UPLOAD") {
            self.uploads.max_file_bytes = v.parse().unwrap_or(self.uploads.max_file_bytes);
        }

        // Geocoder overrides
        if let Ok(v) = env::var("GEOCODER_BASE_URL") {
            self.geocoder.base_url = v;
        }
        if let Ok(v) = env::var("GEOCODER_API_KEY") {
            self.geocoder.api_key = v;
        }

        // SMTP overrides
        if let Ok(v) = env::var("SMTP_HOST") {
            self.smtp.host = v;
        }
        if let Ok(v) = env::var("SMTP_PORT") {
            self.smtp.port = v.parse().unwrap_or(self.smtp.port);
        }
        if let Ok(v) = env::var("SMTP_USERNAME") {
            self.smtp.username = v;
        }
        if let Ok(v) = env::var("SMTP_PASSWORD") {
            self.smtp.password = v;
        }
        if let Ok(v) = env::var("FROM_EMAIL") {
            self.smtp.from_email = v;
        }
        if let Ok(v) = env::var("FROM_NAME") {
            self.smtp.from_name = v;
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 5000 },
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout_secs: 30,
            },
            security: SecurityConfig {
                jwt_secret: "dev-only-secret".to_string(),
                jwt_expiry_hours: 24 * 30,
                cookie_name: "token".to_string(),
                cookie_expire_days: 30,
                secure_cookies: false,
                reset_token_expiry_mins: 10,
            },
            query: QueryConfig {
                default_limit: 25,
                max_limit: 1000,
            },
            uploads: UploadConfig {
                path: "./public/uploads".to_string(),
                max_file_bytes: 10 * 1024 * 1024, // 10MB
            },
            geocoder: GeocoderConfig {
                base_url: "https://www.mapquestapi.com/geocoding/v1".to_string(),
                api_key: String::new(),
            },
            smtp: SmtpConfig {
                host: String::new(),
                port: 1025,
                username: String::new(),
                password: String::new(),
                from_email: "noreply@campdir.local".to_string(),
                from_name: "CampDir".to_string(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig { port: 5000 },
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout_secs: 10,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24 * 7,
                cookie_name: "token".to_string(),
                cookie_expire_days: 7,
                secure_cookies: true,
                reset_token_expiry_mins: 10,
            },
            query: QueryConfig {
                default_limit: 25,
                max_limit: 500,
            },
            uploads: UploadConfig {
                path: "./public/uploads".to_string(),
                max_file_bytes: 5 * 1024 * 1024, // 5MB
            },
            geocoder: GeocoderConfig {
                base_url: "https://www.mapquestapi.com/geocoding/v1".to_string(),
                api_key: String::new(),
            },
            smtp: SmtpConfig {
                host: String::new(),
                port: 587,
                username: String::new(),
                password: String::new(),
                from_email: "noreply@campdir.local".to_string(),
                from_name: "CampDir".to_string(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { port: 5000 },
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout_secs: 5,
            },
            security: SecurityConfig {
                // Must come from JWT_SECRET; startup refuses an empty secret
                jwt_secret: String::new(),
                jwt_expiry_hours: 24 * 30,
                cookie_name: "token".to_string(),
                cookie_expire_days: 30,
                secure_cookies: true,
                reset_token_expiry_mins: 10,
            },
            query: QueryConfig {
                default_limit: 25,
                max_limit: 100,
            },
            uploads: UploadConfig {
                path: "./public/uploads".to_string(),
                max_file_bytes: 2 * 1024 * 1024, // 2MB
            },
            geocoder: GeocoderConfig {
                base_url: "https://www.mapquestapi.com/geocoding/v1".to_string(),
                api_key: String::new(),
            },
            smtp: SmtpConfig {
                host: String::new(),
                port: 587,
                username: String::new(),
                password: String::new(),
                from_email: "noreply@campdir.local".to_string(),
                from_name: "CampDir".to_string(),
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_development {
    () => {
        matches!(
            $crate::config::CONFIG.environment,
            $crate::config::Environment::Development
        )
    };
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!(
            $crate::config::CONFIG.environment,
            $crate::config::Environment::Production
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.query.default_limit, 25);
        assert_eq!(config.query.max_limit, 1000);
        assert!(!config.security.secure_cookies);
        assert_eq!(config.security.cookie_name, "token");
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.query.max_limit, 100);
        assert!(config.security.secure_cookies);
        // Production never ships with a baked-in secret
        assert!(config.security.jwt_secret.is_empty());
    }
}
