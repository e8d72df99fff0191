use std::env;

/// Application configuration, built once at startup and carried in `AppState`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// JWT Secret Key (Required in production)
    pub jwt_secret: String,

    /// Bearer token lifetime in days (default: 30)
    pub token_expiry_days: i64,

    /// Hold period for found items in days (default: 30)
    pub hold_period_days: i64,

    /// Days added by an admin hold extension (default: 7)
    pub hold_extension_days: i64,

    /// Window for the "expiring soon" admin view in days (default: 7)
    pub expiring_soon_days: i64,

    /// Email domain allowed to register (default: "illinois.edu")
    pub allowed_email_domain: String,

    /// Verification token lifetime in hours (default: 24)
    pub verification_token_hours: i64,

    /// Base URL used in email links
    pub frontend_url: String,

    /// Notifier type: "smtp" or "log" (default: "log")
    pub notifier_type: String,

    /// SMTP relay host
    pub smtp_host: String,
    /// SMTP credentials
    pub smtp_username: String,
    pub smtp_password: String,
    /// From address for outbound mail
    pub smtp_from: String,

    /// Allowed CORS Origins (comma separated)
    pub allowed_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "secret".to_string(),
            token_expiry_days: 30,
            hold_period_days: 30,
            hold_extension_days: 7,
            expiring_soon_days: 7,
            allowed_email_domain: "illinois.edu".to_string(),
            verification_token_hours: 24,
            frontend_url: "http://localhost:5173".to_string(),
            notifier_type: "log".to_string(),
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            smtp_from: "Lost & Found <no-reply@localhost>".to_string(),
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(), // Vite default
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            jwt_secret: env::var("JWT_SECRET").unwrap_or(default.jwt_secret),

            token_expiry_days: env::var("TOKEN_EXPIRY_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.token_expiry_days),

            hold_period_days: env::var("HOLD_PERIOD_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.hold_period_days),

            hold_extension_days: env::var("HOLD_EXTENSION_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.hold_extension_days),

            expiring_soon_days: env::var("EXPIRING_SOON_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.expiring_soon_days),

            allowed_email_domain: env::var("ALLOWED_EMAIL_DOMAIN")
                .unwrap_or(default.allowed_email_domain),

            verification_token_hours: env::var("VERIFICATION_TOKEN_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.verification_token_hours),

            frontend_url: env::var("FRONTEND_URL").unwrap_or(default.frontend_url),

            notifier_type: env::var("NOTIFIER_TYPE").unwrap_or(default.notifier_type),

            smtp_host: env::var("SMTP_HOST").unwrap_or(default.smtp_host),
            smtp_username: env::var("SMTP_USERNAME").unwrap_or(default.smtp_username),
            smtp_password: env::var("SMTP_PASSWORD").unwrap_or(default.smtp_password),
            smtp_from: env::var("SMTP_FROM").unwrap_or(default.smtp_from),

            allowed_origins: env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(default.allowed_origins),
        }
    }

    /// Create config for development and tests (log-only notifier, fixed secret)
    pub fn development() -> Self {
        Self {
            notifier_type: "log".to_string(),
            ..Self::default()
        }
    }

    /// Create config for production (strict: JWT secret required)
    pub fn production() -> Self {
        Self {
            jwt_secret: env::var("JWT_SECRET").expect("CRITICAL: JWT_SECRET must be set"),
            ..Self::from_env()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.hold_period_days, 30);
        assert_eq!(config.hold_extension_days, 7);
        assert_eq!(config.token_expiry_days, 30);
        assert_eq!(config.allowed_email_domain, "illinois.edu");
    }

    #[test]
    fn test_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.notifier_type, "log");
    }

    #[test]
    fn test_from_env_cors_fallback() {
        unsafe { env::remove_var("ALLOWED_ORIGINS") };
        let config = AppConfig::from_env();
        let default_config = AppConfig::default();
        assert_eq!(config.allowed_origins, default_config.allowed_origins);
        assert!(!config.allowed_origins.contains(&"*".to_string()));
    }
}
