use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const ENV_TPCONFIRM_CONFIG: &str = "TPCONFIRM_CONFIG";

const DEFAULT_ENABLED: bool = true;
const DEFAULT_AUTO_DENY_ON_CLOSE: bool = true;
const DEFAULT_CLOSE_ON_CLICK: bool = true;
const DEFAULT_PLAY_FEEDBACK: bool = true;
const DEFAULT_INCLUDE_SENDER_IN_COMMAND: bool = true;
const DEFAULT_AUTO_OPEN_ON_REQUEST: bool = false;
const DEFAULT_BYPASS_WINDOW_MS: u64 = 1000;
const DEFAULT_DISPATCH_DELAY_MS: u64 = 50;
const DEFAULT_STALE_REQUEST_SECS: u64 = 120;
const DEFAULT_ACCEPT_VERBS: &[&str] = &["tpaccept", "tpyes"];
const DEFAULT_DENY_VERBS: &[&str] = &["tpdeny", "tpdecline", "tpno"];
const DEFAULT_ACCEPT_COMMAND: &str = "tpaccept";
const DEFAULT_DENY_COMMAND: &str = "tpdeny";
const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
const DEFAULT_MAX_ATTEMPTS: u32 = 20;
const DEFAULT_CACHE_TTL_SECS: u64 = 30;
const DEFAULT_LOADING_TEXT: &str = "Loading...";
const DEFAULT_REGION_FALLBACK: &str = "Offline";
const DEFAULT_DIMENSION_FALLBACK: &str = "Unknown";
const DEFAULT_NO_PENDING_REQUEST: &str = "You have no pending teleport requests.";
const DEFAULT_NO_REQUEST_FROM_SENDER: &str = "You have no pending teleport request from %sender%.";
const DEFAULT_DISPATCH_FAILED: &str = "Something went wrong while handling that teleport request.";
const DEFAULT_TITLE_DIRECT: &str = "%sender% wants to teleport to you";
const DEFAULT_TITLE_TO_SENDER: &str = "%sender% wants you to teleport to them";
const DEFAULT_SURFACE_ROWS: usize = 3;
const MAX_SURFACE_ROWS: usize = 6;
const DEFAULT_OVERWORLD_MATERIAL: &str = "GRASS_BLOCK";
const DEFAULT_NETHER_MATERIAL: &str = "NETHERRACK";
const DEFAULT_END_MATERIAL: &str = "END_STONE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0}")]
    Message(String),
}

impl ConfigError {
    fn configuration(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TpConfirmConfig {
    #[serde(default)]
    pub confirmation: ConfirmationConfigToml,
    #[serde(default)]
    pub commands: CommandsConfigToml,
    #[serde(default)]
    pub enrichment: EnrichmentConfigToml,
    #[serde(default)]
    pub messages: MessagesConfigToml,
    #[serde(default)]
    pub surface: SurfaceConfigToml,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfirmationConfigToml {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_auto_deny_on_close")]
    pub auto_deny_on_close: bool,
    #[serde(default = "default_close_on_click")]
    pub close_on_click: bool,
    #[serde(default = "default_play_feedback")]
    pub play_feedback: bool,
    #[serde(default = "default_include_sender_in_command")]
    pub include_sender_in_command: bool,
    #[serde(default = "default_auto_open_on_request")]
    pub auto_open_on_request: bool,
    #[serde(default = "default_bypass_window_ms")]
    pub bypass_window_ms: u64,
    #[serde(default = "default_dispatch_delay_ms")]
    pub dispatch_delay_ms: u64,
    #[serde(default = "default_stale_request_secs")]
    pub stale_request_secs: u64,
}

impl Default for ConfirmationConfigToml {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            auto_deny_on_close: default_auto_deny_on_close(),
            close_on_click: default_close_on_click(),
            play_feedback: default_play_feedback(),
            include_sender_in_command: default_include_sender_in_command(),
            auto_open_on_request: default_auto_open_on_request(),
            bypass_window_ms: default_bypass_window_ms(),
            dispatch_delay_ms: default_dispatch_delay_ms(),
            stale_request_secs: default_stale_request_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandsConfigToml {
    #[serde(default = "default_accept_verbs")]
    pub accept_verbs: Vec<String>,
    #[serde(default = "default_deny_verbs")]
    pub deny_verbs: Vec<String>,
    #[serde(default = "default_accept_command")]
    pub accept_command: String,
    #[serde(default = "default_deny_command")]
    pub deny_command: String,
}

impl Default for CommandsConfigToml {
    fn default() -> Self {
        Self {
            accept_verbs: default_accept_verbs(),
            deny_verbs: default_deny_verbs(),
            accept_command: default_accept_command(),
            deny_command: default_deny_command(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnrichmentConfigToml {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_loading_text")]
    pub loading_text: String,
    #[serde(default = "default_region_fallback")]
    pub region_fallback: String,
    #[serde(default = "default_dimension_fallback")]
    pub dimension_fallback: String,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for EnrichmentConfigToml {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            max_attempts: default_max_attempts(),
            loading_text: default_loading_text(),
            region_fallback: default_region_fallback(),
            dimension_fallback: default_dimension_fallback(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessagesConfigToml {
    #[serde(default = "default_no_pending_request")]
    pub no_pending_request: String,
    #[serde(default = "default_no_request_from_sender")]
    pub no_request_from_sender: String,
    #[serde(default = "default_dispatch_failed")]
    pub dispatch_failed: String,
}

impl Default for MessagesConfigToml {
    fn default() -> Self {
        Self {
            no_pending_request: default_no_pending_request(),
            no_request_from_sender: default_no_request_from_sender(),
            dispatch_failed: default_dispatch_failed(),
        }
    }
}

/// One entry of the declarative surface template.
///
/// `slot` is signed so that a mistyped negative address survives parsing and
/// is skipped at render time instead of rejecting the whole file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegionConfigToml {
    pub slot: i64,
    pub role: String,
    #[serde(default)]
    pub material: String,
    #[serde(default)]
    pub text: Vec<String>,
    #[serde(default)]
    pub requires_remote_data: bool,
}

impl RegionConfigToml {
    fn new(slot: i64, role: &str, material: &str, text: &[&str], requires_remote_data: bool) -> Self {
        Self {
            slot,
            role: role.to_owned(),
            material: material.to_owned(),
            text: text.iter().map(|line| (*line).to_owned()).collect(),
            requires_remote_data,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DimensionMaterialsToml {
    #[serde(default = "default_overworld_material")]
    pub overworld: String,
    #[serde(default = "default_nether_material")]
    pub nether: String,
    #[serde(default = "default_end_material")]
    pub end: String,
}

impl Default for DimensionMaterialsToml {
    fn default() -> Self {
        Self {
            overworld: default_overworld_material(),
            nether: default_nether_material(),
            end: default_end_material(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SurfaceConfigToml {
    #[serde(default = "default_title_direct")]
    pub title_direct: String,
    #[serde(default = "default_title_to_sender")]
    pub title_to_sender: String,
    #[serde(default = "default_surface_rows")]
    pub rows: usize,
    #[serde(default)]
    pub dimension_materials: DimensionMaterialsToml,
    #[serde(default = "default_surface_regions")]
    pub regions: Vec<RegionConfigToml>,
}

impl Default for SurfaceConfigToml {
    fn default() -> Self {
        Self {
            title_direct: default_title_direct(),
            title_to_sender: default_title_to_sender(),
            rows: default_surface_rows(),
            dimension_materials: DimensionMaterialsToml::default(),
            regions: default_surface_regions(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationSettings {
    pub enabled: bool,
    pub auto_deny_on_close: bool,
    pub close_on_click: bool,
    pub play_feedback: bool,
    pub include_sender_in_command: bool,
    pub auto_open_on_request: bool,
    pub bypass_window: Duration,
    pub dispatch_delay: Duration,
    pub stale_request_after: Option<Duration>,
    pub accept_verbs: Vec<String>,
    pub deny_verbs: Vec<String>,
    pub accept_command: String,
    pub deny_command: String,
    pub no_pending_request_message: String,
    pub no_request_from_sender_message: String,
    pub dispatch_failed_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentSettings {
    pub poll_interval: Duration,
    pub max_attempts: u32,
    pub loading_text: String,
    pub region_fallback: String,
    pub dimension_fallback: String,
    /// How long a remote answer is served before it is fetched again.
    pub cache_ttl: Duration,
}

impl TpConfirmConfig {
    pub fn confirmation_settings(&self) -> ConfirmationSettings {
        ConfirmationSettings {
            enabled: self.confirmation.enabled,
            auto_deny_on_close: self.confirmation.auto_deny_on_close,
            close_on_click: self.confirmation.close_on_click,
            play_feedback: self.confirmation.play_feedback,
            include_sender_in_command: self.confirmation.include_sender_in_command,
            auto_open_on_request: self.confirmation.auto_open_on_request,
            bypass_window: Duration::from_millis(self.confirmation.bypass_window_ms),
            dispatch_delay: Duration::from_millis(self.confirmation.dispatch_delay_ms),
            stale_request_after: (self.confirmation.stale_request_secs > 0)
                .then(|| Duration::from_secs(self.confirmation.stale_request_secs)),
            accept_verbs: self.commands.accept_verbs.clone(),
            deny_verbs: self.commands.deny_verbs.clone(),
            accept_command: self.commands.accept_command.clone(),
            deny_command: self.commands.deny_command.clone(),
            no_pending_request_message: self.messages.no_pending_request.clone(),
            no_request_from_sender_message: self.messages.no_request_from_sender.clone(),
            dispatch_failed_message: self.messages.dispatch_failed.clone(),
        }
    }

    pub fn enrichment_settings(&self) -> EnrichmentSettings {
        EnrichmentSettings {
            poll_interval: Duration::from_millis(self.enrichment.poll_interval_ms),
            max_attempts: self.enrichment.max_attempts,
            loading_text: self.enrichment.loading_text.clone(),
            region_fallback: self.enrichment.region_fallback.clone(),
            dimension_fallback: self.enrichment.dimension_fallback.clone(),
            cache_ttl: Duration::from_secs(self.enrichment.cache_ttl_secs),
        }
    }

    pub fn surface_template(&self) -> SurfaceConfigToml {
        self.surface.clone()
    }
}

pub fn load_from_env() -> Result<TpConfirmConfig, ConfigError> {
    let path = config_path_from_env()?;
    load_from_path(path)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<TpConfirmConfig, ConfigError> {
    load_or_create_config(path.as_ref())
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let home = resolve_home_dir().ok_or_else(|| {
        ConfigError::configuration("Unable to resolve home directory from HOME or USERPROFILE")
    })?;

    Ok(home.join(".config").join("tpconfirm").join("config.toml"))
}

fn config_path_from_env() -> Result<PathBuf, ConfigError> {
    match std::env::var(ENV_TPCONFIRM_CONFIG) {
        Ok(raw) => {
            if raw.trim().is_empty() {
                default_config_path()
            } else {
                Ok(raw.into())
            }
        }
        Err(std::env::VarError::NotPresent) => default_config_path(),
        Err(_) => Err(ConfigError::configuration(
            "TPCONFIRM_CONFIG contained invalid UTF-8",
        )),
    }
}

fn resolve_home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("USERPROFILE")
                .ok()
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        })
}

fn default_enabled() -> bool {
    DEFAULT_ENABLED
}

fn default_auto_deny_on_close() -> bool {
    DEFAULT_AUTO_DENY_ON_CLOSE
}

fn default_close_on_click() -> bool {
    DEFAULT_CLOSE_ON_CLICK
}

fn default_play_feedback() -> bool {
    DEFAULT_PLAY_FEEDBACK
}

fn default_include_sender_in_command() -> bool {
    DEFAULT_INCLUDE_SENDER_IN_COMMAND
}

fn default_auto_open_on_request() -> bool {
    DEFAULT_AUTO_OPEN_ON_REQUEST
}

fn default_bypass_window_ms() -> u64 {
    DEFAULT_BYPASS_WINDOW_MS
}

fn default_dispatch_delay_ms() -> u64 {
    DEFAULT_DISPATCH_DELAY_MS
}

fn default_stale_request_secs() -> u64 {
    DEFAULT_STALE_REQUEST_SECS
}

fn default_accept_verbs() -> Vec<String> {
    DEFAULT_ACCEPT_VERBS
        .iter()
        .map(|value| (*value).to_owned())
        .collect()
}

fn default_deny_verbs() -> Vec<String> {
    DEFAULT_DENY_VERBS
        .iter()
        .map(|value| (*value).to_owned())
        .collect()
}

fn default_accept_command() -> String {
    DEFAULT_ACCEPT_COMMAND.to_owned()
}

fn default_deny_command() -> String {
    DEFAULT_DENY_COMMAND.to_owned()
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_loading_text() -> String {
    DEFAULT_LOADING_TEXT.to_owned()
}

fn default_region_fallback() -> String {
    DEFAULT_REGION_FALLBACK.to_owned()
}

fn default_dimension_fallback() -> String {
    DEFAULT_DIMENSION_FALLBACK.to_owned()
}

fn default_cache_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

fn default_no_pending_request() -> String {
    DEFAULT_NO_PENDING_REQUEST.to_owned()
}

fn default_no_request_from_sender() -> String {
    DEFAULT_NO_REQUEST_FROM_SENDER.to_owned()
}

fn default_dispatch_failed() -> String {
    DEFAULT_DISPATCH_FAILED.to_owned()
}

fn default_title_direct() -> String {
    DEFAULT_TITLE_DIRECT.to_owned()
}

fn default_title_to_sender() -> String {
    DEFAULT_TITLE_TO_SENDER.to_owned()
}

fn default_surface_rows() -> usize {
    DEFAULT_SURFACE_ROWS
}

fn default_overworld_material() -> String {
    DEFAULT_OVERWORLD_MATERIAL.to_owned()
}

fn default_nether_material() -> String {
    DEFAULT_NETHER_MATERIAL.to_owned()
}

fn default_end_material() -> String {
    DEFAULT_END_MATERIAL.to_owned()
}

fn default_surface_regions() -> Vec<RegionConfigToml> {
    let mut regions = [0, 8, 18, 26]
        .into_iter()
        .map(|slot| RegionConfigToml::new(slot, "filler", "GRAY_STAINED_GLASS_PANE", &[" "], false))
        .collect::<Vec<_>>();
    regions.extend([
        RegionConfigToml::new(
            4,
            "info",
            "PLAYER_HEAD",
            &["%sender%", "Server: %region%"],
            true,
        ),
        RegionConfigToml::new(
            11,
            "accept",
            "LIME_WOOL",
            &["Accept", "Accept the request from %sender%"],
            false,
        ),
        RegionConfigToml::new(
            13,
            "info",
            "GRASS_BLOCK",
            &["Location", "Server: %region%", "World: %dimension%"],
            false,
        ),
        RegionConfigToml::new(
            15,
            "deny",
            "RED_WOOL",
            &["Deny", "Decline the request from %sender%"],
            false,
        ),
    ]);
    regions
}

fn persist_config(path: &Path, config: &TpConfirmConfig) -> Result<(), ConfigError> {
    let rendered = toml::to_string_pretty(config).map_err(|err| {
        ConfigError::configuration(format!(
            "Failed to serialize TPCONFIRM_CONFIG for {}: {err}",
            path.display()
        ))
    })?;

    std::fs::write(path, rendered.as_bytes()).map_err(|err| {
        ConfigError::configuration(format!(
            "Failed to write TPCONFIRM_CONFIG to {}: {err}",
            path.display()
        ))
    })
}

fn load_or_create_config(path: &Path) -> Result<TpConfirmConfig, ConfigError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|err| {
                        ConfigError::configuration(format!(
                            "Failed to create parent directory {} for TPCONFIRM_CONFIG: {err}",
                            parent.display()
                        ))
                    })?;
                }
            }

            let default_config = TpConfirmConfig::default();
            persist_config(path, &default_config)?;
            tracing::info!(path = %path.display(), "wrote default tpconfirm config");
            return Ok(default_config);
        }
        Err(err) => {
            return Err(ConfigError::configuration(format!(
                "Failed to read TPCONFIRM_CONFIG from {}: {err}",
                path.display()
            )));
        }
    };

    let mut config: TpConfirmConfig = toml::from_str(&raw).map_err(|err| {
        ConfigError::configuration(format!(
            "Failed to parse TPCONFIRM_CONFIG from {}: {err}",
            path.display()
        ))
    })?;

    if normalize_config(&mut config) {
        tracing::warn!(
            path = %path.display(),
            "repaired out-of-range config values, persisting normalized config"
        );
        persist_config(path, &config)?;
    }

    Ok(config)
}

/// Repairs out-of-range values in place; returns whether anything changed.
pub fn normalize_config(config: &mut TpConfirmConfig) -> bool {
    let mut changed = false;

    if config.confirmation.bypass_window_ms == 0 {
        config.confirmation.bypass_window_ms = default_bypass_window_ms();
        changed = true;
    }

    changed |= normalize_verbs(&mut config.commands.accept_verbs, default_accept_verbs());
    changed |= normalize_verbs(&mut config.commands.deny_verbs, default_deny_verbs());
    changed |= normalize_command(&mut config.commands.accept_command, default_accept_command());
    changed |= normalize_command(&mut config.commands.deny_command, default_deny_command());

    if config.enrichment.poll_interval_ms == 0 {
        config.enrichment.poll_interval_ms = default_poll_interval_ms();
        changed = true;
    }
    if config.enrichment.max_attempts == 0 {
        config.enrichment.max_attempts = default_max_attempts();
        changed = true;
    }
    if config.enrichment.cache_ttl_secs == 0 {
        config.enrichment.cache_ttl_secs = default_cache_ttl_secs();
        changed = true;
    }
    changed |= normalize_non_empty_string(&mut config.enrichment.loading_text, default_loading_text());
    changed |= normalize_non_empty_string(
        &mut config.enrichment.region_fallback,
        default_region_fallback(),
    );
    changed |= normalize_non_empty_string(
        &mut config.enrichment.dimension_fallback,
        default_dimension_fallback(),
    );

    changed |= normalize_non_empty_string(
        &mut config.messages.no_pending_request,
        default_no_pending_request(),
    );
    changed |= normalize_non_empty_string(
        &mut config.messages.no_request_from_sender,
        default_no_request_from_sender(),
    );
    changed |= normalize_non_empty_string(
        &mut config.messages.dispatch_failed,
        default_dispatch_failed(),
    );

    changed |= normalize_surface_config(&mut config.surface);

    changed
}

pub fn normalize_surface_config(config: &mut SurfaceConfigToml) -> bool {
    let mut changed = false;

    let rows = config.rows.clamp(1, MAX_SURFACE_ROWS);
    if rows != config.rows {
        config.rows = rows;
        changed = true;
    }
    changed |= normalize_non_empty_string(&mut config.title_direct, default_title_direct());
    changed |= normalize_non_empty_string(&mut config.title_to_sender, default_title_to_sender());
    changed |= normalize_non_empty_string(
        &mut config.dimension_materials.overworld,
        default_overworld_material(),
    );
    changed |= normalize_non_empty_string(
        &mut config.dimension_materials.nether,
        default_nether_material(),
    );
    changed |= normalize_non_empty_string(
        &mut config.dimension_materials.end,
        default_end_material(),
    );
    if config.regions.is_empty() {
        config.regions = default_surface_regions();
        changed = true;
    }

    changed
}

fn normalize_verbs(values: &mut Vec<String>, default: Vec<String>) -> bool {
    let mut normalized = Vec::with_capacity(values.len());
    for value in values.iter() {
        let verb = value.trim().trim_start_matches('/').to_ascii_lowercase();
        if !verb.is_empty() && !normalized.contains(&verb) {
            normalized.push(verb);
        }
    }
    if normalized.is_empty() {
        normalized = default;
    }
    if *values != normalized {
        *values = normalized;
        return true;
    }
    false
}

fn normalize_command(value: &mut String, default: String) -> bool {
    let trimmed = value.trim().trim_start_matches('/');
    let normalized = if trimmed.is_empty() {
        default
    } else {
        trimmed.to_owned()
    };
    if *value != normalized {
        *value = normalized;
        return true;
    }
    false
}

fn normalize_non_empty_string(value: &mut String, default: String) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        if *value != default {
            *value = default;
            return true;
        }
        return false;
    }

    if trimmed != value {
        *value = trimmed.to_owned();
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::{Mutex, OnceLock};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn env_lock() -> &'static Mutex<()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn with_env_vars<F>(vars: &[(&str, Option<&str>)], test: F)
    where
        F: FnOnce(),
    {
        let _guard = env_lock().lock().expect("env lock");
        let backup = vars
            .iter()
            .map(|(name, _)| ((*name).to_owned(), std::env::var(name).ok()))
            .collect::<Vec<_>>();

        for (name, value) in vars {
            match value {
                Some(value) => std::env::set_var(name, value),
                None => std::env::remove_var(name),
            }
        }

        test();

        for (name, value) in backup {
            match value {
                Some(value) => std::env::set_var(name, value),
                None => std::env::remove_var(name),
            }
        }
    }

    fn unique_temp_dir(prefix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "tpconfirm-config-{prefix}-{nanos}-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&path).expect("create temp dir");
        path
    }

    fn remove_temp_path(path: &Path) {
        let _ = std::fs::remove_dir_all(path);
    }

    fn write_config_file(path: &Path, raw: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create fixture config parent");
        }
        std::fs::write(path, raw.as_bytes()).expect("write fixture config");
    }

    #[test]
    fn load_from_env_creates_default_config_when_missing() {
        let home = unique_temp_dir("home-defaults");
        let expected = home.join(".config").join("tpconfirm").join("config.toml");

        with_env_vars(
            &[
                ("HOME", Some(home.to_str().expect("home path"))),
                ("USERPROFILE", None),
                (ENV_TPCONFIRM_CONFIG, None),
            ],
            || {
                let config = load_from_env().expect("load defaults");
                assert_eq!(config, TpConfirmConfig::default());
                assert!(expected.exists());

                let reloaded = load_from_path(&expected).expect("reload persisted defaults");
                assert_eq!(reloaded, config);
            },
        );

        remove_temp_path(&home);
    }

    #[test]
    fn load_from_env_honors_explicit_config_path() {
        let root = unique_temp_dir("explicit-path");
        let path = root.join("nested").join("tpconfirm.toml");
        write_config_file(
            &path,
            r#"
[confirmation]
auto_deny_on_close = false
"#,
        );

        with_env_vars(
            &[(ENV_TPCONFIRM_CONFIG, Some(path.to_str().expect("path")))],
            || {
                let config = load_from_env().expect("load explicit config");
                assert!(!config.confirmation.auto_deny_on_close);
                assert!(config.confirmation.enabled);
            },
        );

        remove_temp_path(&root);
    }

    #[test]
    fn default_config_path_falls_back_to_userprofile_when_home_is_blank() {
        let profile = unique_temp_dir("userprofile");

        with_env_vars(
            &[
                ("HOME", Some("  ")),
                ("USERPROFILE", Some(profile.to_str().expect("profile path"))),
            ],
            || {
                let path = default_config_path().expect("config path");
                assert_eq!(
                    path,
                    profile.join(".config").join("tpconfirm").join("config.toml")
                );
            },
        );

        remove_temp_path(&profile);
    }

    #[test]
    fn load_from_path_returns_parse_error_for_invalid_toml() {
        let root = unique_temp_dir("invalid-toml");
        let path = root.join("config.toml");
        write_config_file(&path, "[confirmation\nenabled = true");

        let error = load_from_path(&path).expect_err("invalid toml should fail");
        assert!(error.to_string().contains("Failed to parse TPCONFIRM_CONFIG"));

        remove_temp_path(&root);
    }

    #[test]
    fn load_from_path_normalizes_and_persists_supported_bounds() {
        let root = unique_temp_dir("normalize");
        let path = root.join("config.toml");
        write_config_file(
            &path,
            r#"
[commands]
accept_verbs = [" /TPAccept ", "", "tpaccept"]
deny_verbs = []
accept_command = "/tpaccept"
deny_command = "  "

[enrichment]
poll_interval_ms = 0
max_attempts = 0
loading_text = "   "
cache_ttl_secs = 0

[surface]
rows = 9
"#,
        );

        let config = load_from_path(&path).expect("load config");
        assert_eq!(config.commands.accept_verbs, vec!["tpaccept".to_owned()]);
        assert_eq!(config.commands.deny_verbs, default_deny_verbs());
        assert_eq!(config.commands.accept_command, "tpaccept");
        assert_eq!(config.commands.deny_command, "tpdeny");
        assert_eq!(config.enrichment.poll_interval_ms, 100);
        assert_eq!(config.enrichment.max_attempts, 20);
        assert_eq!(config.enrichment.loading_text, "Loading...");
        assert_eq!(config.enrichment.cache_ttl_secs, 30);
        assert_eq!(config.surface.rows, 6);

        let persisted = std::fs::read_to_string(&path).expect("read persisted config");
        assert!(persisted.contains("poll_interval_ms = 100"));

        remove_temp_path(&root);
    }

    #[test]
    fn negative_region_slots_survive_parsing() {
        let mut config: TpConfirmConfig = toml::from_str(
            r#"
[[surface.regions]]
slot = -3
role = "accept"
material = "LIME_WOOL"
text = ["Accept"]
"#,
        )
        .expect("parse config");
        normalize_config(&mut config);

        assert_eq!(config.surface.regions.len(), 1);
        assert_eq!(config.surface.regions[0].slot, -3);
    }

    #[test]
    fn typed_settings_expose_durations() {
        let mut config = TpConfirmConfig::default();
        config.confirmation.stale_request_secs = 0;

        let confirmation = config.confirmation_settings();
        assert_eq!(confirmation.bypass_window, Duration::from_secs(1));
        assert_eq!(confirmation.dispatch_delay, Duration::from_millis(50));
        assert_eq!(confirmation.stale_request_after, None);
        assert_eq!(confirmation.accept_command, "tpaccept");

        let enrichment = config.enrichment_settings();
        assert_eq!(enrichment.poll_interval, Duration::from_millis(100));
        assert_eq!(enrichment.max_attempts, 20);
        assert_eq!(enrichment.region_fallback, "Offline");
        assert_eq!(enrichment.dimension_fallback, "Unknown");
        assert_eq!(enrichment.cache_ttl, Duration::from_secs(30));
    }

    #[test]
    fn default_template_covers_every_role() {
        let template = TpConfirmConfig::default().surface_template();
        for role in ["accept", "deny", "filler", "info"] {
            assert!(
                template.regions.iter().any(|region| region.role == role),
                "default template is missing a {role} region"
            );
        }
        assert!(template
            .regions
            .iter()
            .any(|region| region.requires_remote_data));
    }
}
