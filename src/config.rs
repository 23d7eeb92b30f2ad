use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Where the bundled (encoder, model) artifact lives.
    pub artifact_path: PathBuf,
    /// Labeled CSV consumed by the admin training action.
    pub training_data_path: PathBuf,
}

/// Optional admin account seeded at startup when absent.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub model: ModelConfig,
    pub admin: Option<AdminSeed>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "churnwatch".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "churnwatch-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
        };
        let model = ModelConfig {
            artifact_path: std::env::var("MODEL_ARTIFACT_PATH")
                .unwrap_or_else(|_| "churn_model.json".into())
                .into(),
            training_data_path: std::env::var("TRAINING_DATA_PATH")
                .unwrap_or_else(|_| "Telco-Customer-Churn.csv".into())
                .into(),
        };
        let admin = match (
            std::env::var("ADMIN_USERNAME").ok(),
            std::env::var("ADMIN_PASSWORD").ok(),
        ) {
            (Some(username), Some(password)) => Some(AdminSeed { username, password }),
            _ => None,
        };
        Ok(Self {
            database_url,
            jwt,
            model,
            admin,
        })
    }
}
