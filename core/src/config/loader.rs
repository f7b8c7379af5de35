use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use config::Config;
use config::Environment;
use config::File;
use config::FileFormat;
use nudge_protocol::ReminderDomain;
use nudge_protocol::Session;
use serde::Deserialize;
use serde::Serialize;

use crate::DomainProfile;
use crate::EngineSettings;
use crate::config::error::ConfigError;
use crate::config::error::Result;
use crate::presentation::DEFAULT_BADGE_LIMIT;
use crate::presentation::ReminderBadge;

const ENV_PREFIX: &str = "NUDGE";
const DEFAULT_FILE_STEM: &str = "nudge";

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NudgeConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub domains: DomainsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the platform API; reminder paths are appended to it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the server-sent event stream.
    #[serde(default = "default_events_path")]
    pub events_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_pending_timeout_secs")]
    pub pending_timeout_secs: u64,

    #[serde(default = "default_badge_limit")]
    pub badge_limit: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the shown-state files. Defaults to the platform
    /// data directory.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Overrides the domain's default `dueOnly` query flag.
    #[serde(default)]
    pub due_only: Option<bool>,

    /// Overrides the list endpoint path.
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainsConfig {
    #[serde(default)]
    pub rnr: DomainSettings,

    #[serde(default)]
    pub hrd: DomainSettings,

    #[serde(default)]
    pub dataflow: DomainSettings,
}

fn default_base_url() -> String {
    "http://localhost:3000/api".to_string()
}
fn default_events_path() -> String {
    "/events".to_string()
}
fn default_poll_interval_secs() -> u64 {
    300
}
fn default_pending_timeout_secs() -> u64 {
    30
}
fn default_badge_limit() -> usize {
    DEFAULT_BADGE_LIMIT
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            events_path: default_events_path(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            pending_timeout_secs: default_pending_timeout_secs(),
            badge_limit: default_badge_limit(),
        }
    }
}

impl Default for DomainSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            due_only: None,
            path: None,
        }
    }
}

impl DomainsConfig {
    pub fn get(&self, domain: ReminderDomain) -> &DomainSettings {
        match domain {
            ReminderDomain::Rnr => &self.rnr,
            ReminderDomain::Hrd => &self.hrd,
            ReminderDomain::DataFlow => &self.dataflow,
        }
    }
}

impl StorageConfig {
    pub fn resolved_dir(&self) -> Result<PathBuf> {
        match &self.dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_dir()
                .map(|dir| dir.join("nudge"))
                .ok_or_else(|| {
                    ConfigError::Validation(
                        "storage.dir is unset and no platform data directory exists".to_string(),
                    )
                }),
        }
    }
}

impl SessionConfig {
    /// The configured session, if a non-blank token is present.
    pub fn to_session(&self) -> Option<Session> {
        let token = self.token.as_deref().map(str::trim).filter(|t| !t.is_empty())?;
        Some(Session::new(
            token,
            self.user_id.clone().unwrap_or_default(),
            self.roles.clone(),
        ))
    }
}

impl NudgeConfig {
    pub fn settings(&self) -> EngineSettings {
        EngineSettings {
            poll_interval: Duration::from_secs(self.engine.poll_interval_secs),
            pending_timeout: Duration::from_secs(self.engine.pending_timeout_secs),
        }
    }

    pub fn badge(&self) -> ReminderBadge {
        ReminderBadge::new(self.engine.badge_limit)
    }

    /// The domain profile with any configured overrides applied.
    pub fn profile(&self, domain: ReminderDomain) -> DomainProfile {
        let settings = self.domains.get(domain);
        let mut profile = DomainProfile::for_domain(domain);
        if let Some(path) = &settings.path {
            profile = profile.with_path(path.clone());
        }
        if settings.due_only.is_some() {
            profile = profile.with_due_only(settings.due_only);
        }
        profile
    }

    pub fn enabled_profiles(&self) -> Vec<DomainProfile> {
        ReminderDomain::ALL
            .into_iter()
            .filter(|domain| self.domains.get(*domain).enabled)
            .map(|domain| self.profile(domain))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.server.base_url).map_err(|err| {
            ConfigError::Validation(format!(
                "server.base_url {:?} is not a URL: {err}",
                self.server.base_url
            ))
        })?;
        if !self.server.events_path.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "server.events_path must start with '/', got {:?}",
                self.server.events_path
            )));
        }
        for (key, value) in [
            ("engine.poll_interval_secs", self.engine.poll_interval_secs),
            ("engine.pending_timeout_secs", self.engine.pending_timeout_secs),
            ("engine.badge_limit", self.engine.badge_limit as u64),
        ] {
            if value == 0 {
                return Err(ConfigError::Validation(format!("{key} must be > 0")));
            }
        }
        Ok(())
    }
}

/// Configuration loader with layered merging.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Uses `path` instead of looking for `./nudge.toml`. The file must exist.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn load(&self) -> Result<NudgeConfig> {
        let mut builder = Config::builder();

        let defaults = serde_json::to_string(&NudgeConfig::default())?;
        builder = builder.add_source(File::from_str(&defaults, FileFormat::Json));

        builder = match &self.config_path {
            Some(path) if path.exists() => builder.add_source(File::from(path.as_path())),
            Some(path) => {
                return Err(ConfigError::Load(format!(
                    "configuration file not found: {}",
                    path.display()
                )));
            }
            None => builder.add_source(File::with_name(DEFAULT_FILE_STEM).required(false)),
        };

        // e.g. NUDGE_SERVER__BASE_URL, NUDGE_SESSION__ROLES=Recruiter,Processing
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("session.roles"),
        );

        let config: NudgeConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        tracing::debug!(path = ?self.config_path, "loaded configuration");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_are_valid() {
        let config = NudgeConfig::default();
        config.validate().unwrap();
        assert_eq!(config.settings(), EngineSettings::default());
        assert_eq!(config.badge().limit(), 8);
        assert_eq!(config.enabled_profiles().len(), 3);
        assert_eq!(config.session.to_session(), None);
    }

    #[test]
    fn file_overrides_defaults() {
        let file = write_config(
            r#"
[server]
base_url = "https://ops.example.com/api"

[engine]
poll_interval_secs = 60

[storage]
dir = "/tmp/nudge-test"

[session]
token = "tok"
user_id = "u-9"
roles = ["Senior Recruiter"]

[domains.hrd]
due_only = false

[domains.dataflow]
enabled = false
"#,
        );

        let config = ConfigLoader::new().with_file(file.path()).load().unwrap();

        assert_eq!(config.server.base_url, "https://ops.example.com/api");
        assert_eq!(config.server.events_path, "/events");
        assert_eq!(config.settings().poll_interval, Duration::from_secs(60));
        assert_eq!(config.settings().pending_timeout, Duration::from_secs(30));
        assert_eq!(
            config.storage.resolved_dir().unwrap(),
            PathBuf::from("/tmp/nudge-test")
        );
        assert_eq!(config.profile(ReminderDomain::Hrd).due_only, Some(false));

        let enabled: Vec<ReminderDomain> =
            config.enabled_profiles().iter().map(|p| p.domain).collect();
        assert_eq!(enabled, vec![ReminderDomain::Rnr, ReminderDomain::Hrd]);

        let session = config.session.to_session().unwrap();
        assert_eq!(session.user_id, "u-9");
        assert!(session.grants("recruiter"));
    }

    #[test]
    fn unset_override_keeps_domain_default() {
        let config = NudgeConfig::default();
        assert_eq!(config.profile(ReminderDomain::Hrd).due_only, Some(true));
        assert_eq!(config.profile(ReminderDomain::Rnr).path, "/reminders/rnr");
    }

    #[test]
    fn rejects_bad_values() {
        let file = write_config("[server]\nbase_url = \"not a url\"\n");
        let err = ConfigLoader::new().with_file(file.path()).load().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)), "{err}");

        let file = write_config("[engine]\npoll_interval_secs = 0\n");
        let err = ConfigLoader::new().with_file(file.path()).load().unwrap_err();
        assert!(err.to_string().contains("poll_interval_secs"), "{err}");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigLoader::new()
            .with_file(dir.path().join("absent.toml"))
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }

    #[test]
    fn blank_token_is_no_session() {
        let session = SessionConfig {
            token: Some("   ".to_string()),
            user_id: None,
            roles: vec!["Recruiter".to_string()],
        };
        assert_eq!(session.to_session(), None);
    }
}
