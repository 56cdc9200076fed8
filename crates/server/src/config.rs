use std::{collections::HashMap, fs, path::Path};

#[derive(Debug)]
pub struct Settings {
    pub server_bind: String,
    pub database_url: String,
    /// `*` or a bare host; a host is echoed back as `https://<host>`.
    pub cors_origin: String,
    pub email_subject: String,
    pub static_dir: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8080".into(),
            database_url: "sqlite://./data/events.db".into(),
            cors_origin: "*".into(),
            email_subject: "Your Daily Newsletter".into(),
            static_dir: None,
        }
    }
}

impl Settings {
    pub fn allow_origin(&self) -> String {
        if self.cors_origin == "*" {
            "*".to_string()
        } else {
            format!("https://{}", self.cors_origin)
        }
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new("server.toml"), |key| std::env::var(key).ok())
}

/// Defaults, then `server.toml`, then environment variables.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("bind_addr") {
                settings.server_bind = v.clone();
            }
            if let Some(v) = file_cfg.get("database_url") {
                settings.database_url = v.clone();
            }
            if let Some(v) = file_cfg.get("cors_origin") {
                settings.cors_origin = v.clone();
            }
            if let Some(v) = file_cfg.get("email_subject") {
                settings.email_subject = v.clone();
            }
            if let Some(v) = file_cfg.get("static_dir") {
                settings.static_dir = Some(v.clone());
            }
        }
    }

    if let Some(v) = env("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = env("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = env("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = env("CORS_ORIGIN") {
        settings.cors_origin = v;
    }
    if let Some(v) = env("EMAIL_SUBJECT") {
        settings.email_subject = v;
    }
    if let Some(v) = env("STATIC_DIR") {
        settings.static_dir = Some(v);
    }

    settings
}

/// Plain paths become `sqlite://` URLs; the storage layer creates the parent
/// directory on open.
pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
