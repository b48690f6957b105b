use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_PROFILE: &str = "default";
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const BASE_URL_ENV: &str = "VELO_BASE_URL";
pub const CONFIG_PATH_ENV: &str = "VELO_CONFIG";

#[derive(serde::Serialize, serde::Deserialize, Default, Clone, Debug, PartialEq, Eq)]
pub struct VeloConfig {
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

#[derive(serde::Serialize, serde::Deserialize, Default, Clone, Debug, PartialEq, Eq)]
pub struct Profile {
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_cookie: Option<String>,
}

fn home_dir() -> anyhow::Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| anyhow::anyhow!("could not find home directory"))
}

/// `$VELO_CONFIG`, or `~/.velo/config.toml`.
pub fn config_path() -> anyhow::Result<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }
    Ok(home_dir()?.join(".velo").join("config.toml"))
}

/// Missing or unreadable config falls back to defaults.
pub fn load_config(path: &Path) -> VeloConfig {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => return VeloConfig::default(),
    };
    match toml::from_str(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "ignoring malformed config");
            VeloConfig::default()
        }
    }
}

pub fn save_config(path: &Path, config: &VeloConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;

    // The file holds a live session cookie.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

impl VeloConfig {
    /// `--base-url` wins over `$VELO_BASE_URL`, which wins over the profile.
    pub fn resolve_base_url(
        &self,
        profile: &str,
        flag: Option<&str>,
        env: Option<&str>,
    ) -> String {
        flag.or(env)
            .map(str::to_string)
            .or_else(|| self.profiles.get(profile).map(|p| p.base_url.clone()))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string()
    }

    /// The stored cookie, but only for the server it was issued by.
    pub fn session_cookie(&self, profile: &str, base_url: &str) -> Option<String> {
        self.profiles
            .get(profile)
            .filter(|p| p.base_url.trim_end_matches('/') == base_url)
            .and_then(|p| p.session_cookie.clone())
    }

    pub fn store_session(
        &mut self,
        profile: &str,
        base_url: &str,
        email: &str,
        session_cookie: Option<String>,
    ) {
        self.profiles.insert(
            profile.to_string(),
            Profile {
                base_url: base_url.to_string(),
                email: Some(email.to_string()),
                session_cookie,
            },
        );
    }

    /// Returns false when the profile holds no session.
    pub fn forget_session(&mut self, profile: &str) -> bool {
        match self.profiles.get_mut(profile) {
            Some(p) if p.session_cookie.is_some() => {
                p.session_cookie = None;
                true
            }
            _ => false,
        }
    }
}
