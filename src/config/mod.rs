use std::env;

fn env_str(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_u16(key: &str, default: u16) -> u16 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[derive(Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub xendit: XenditConfig,
    pub radius: RadiusConfig,
    pub sms: SmsConfig,
    pub smtp: SmtpConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub username: String,
    pub password: String,
    pub server: String,
    pub port: u32,
    pub database: String,
}

#[derive(Clone)]
pub struct XenditConfig {
    pub base_url: String,
    pub secret_key: String,
    pub callback_token: String,
    pub success_redirect_url: Option<String>,
}

#[derive(Clone)]
pub struct RadiusConfig {
    pub base_url: String,
    pub api_key: String,
    pub realm: String,
}

#[derive(Clone)]
pub struct SmsConfig {
    pub base_url: String,
    pub api_code: String,
    pub email: String,
    pub password: String,
    pub sender_id: String,
}

#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                host: env_str("SERVER_HOST", "0.0.0.0"),
                port: env_u16("SERVER_PORT", 8080),
            },
            database: DatabaseConfig {
                username: env_str("TABLES_USERNAME", "ispuser"),
                password: env_str("TABLES_PASSWORD", ""),
                server: env_str("TABLES_SERVER", "localhost"),
                port: env_u32("TABLES_PORT", 5432),
                database: env_str("TABLES_DATABASE", "ispserver"),
            },
            xendit: XenditConfig {
                base_url: env_str("XENDIT_BASE_URL", "https://api.xendit.co"),
                secret_key: env_str("XENDIT_SECRET_KEY", ""),
                callback_token: env_str("XENDIT_CALLBACK_TOKEN", ""),
                success_redirect_url: env::var("XENDIT_SUCCESS_REDIRECT_URL").ok(),
            },
            radius: RadiusConfig {
                base_url: env_str("RADIUS_OPS_URL", "http://localhost:9090"),
                api_key: env_str("RADIUS_API_KEY", ""),
                realm: env_str("RADIUS_REALM", "isp.local"),
            },
            sms: SmsConfig {
                base_url: env_str("ITEXMO_BASE_URL", "https://api.itexmo.com/api"),
                api_code: env_str("ITEXMO_API_CODE", ""),
                email: env_str("ITEXMO_EMAIL", ""),
                password: env_str("ITEXMO_PASSWORD", ""),
                sender_id: env_str("SMS_SENDER_ID", "ISP"),
            },
            smtp: SmtpConfig {
                host: env_str("SMTP_HOST", "localhost"),
                username: env::var("SMTP_USER").ok(),
                password: env::var("SMTP_PASS").ok(),
                from: env_str("SMTP_FROM", "noreply@isp.local"),
            },
        }
    }

    /// DATABASE_URL wins when set; otherwise the URL is assembled from the
    /// TABLES_* parts.
    pub fn database_url(&self) -> String {
        if let Ok(url) = env::var("DATABASE_URL") {
            return url;
        }
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.database.username,
            self.database.password,
            self.database.server,
            self.database.port,
            self.database.database
        )
    }
}
