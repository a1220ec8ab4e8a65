use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::layout_engine::ContextFlags;

const MAX_SNAP_THRESHOLD: f64 = 64.0;
const MAX_HISTORY: usize = 500;

pub fn data_dir() -> PathBuf {
    dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join("hud")
}
pub fn restore_file() -> PathBuf { data_dir().join("layout.ron") }
pub fn storage_file() -> PathBuf { data_dir().join("storage.json") }
pub fn config_file() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".hud.toml")
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Number of chat inputs remembered across sessions.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Display language used until the player picks one.
    #[serde(default = "default_language")]
    pub language: String,
    /// How long a notification stays queued before it expires.
    #[serde(default = "default_notification_ttl_ms")]
    pub notification_ttl_ms: u64,
    #[serde(default)]
    pub layout: LayoutSettings,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct LayoutSettings {
    /// Hide sub-widgets (and ignore them as snap targets).
    #[serde(default)]
    pub simple_mode: bool,
    #[serde(default = "yes")]
    pub minimap: bool,
    /// Distance in pixels within which a dragged widget snaps to a guide.
    #[serde(default = "default_snap_threshold")]
    pub snap_threshold: f64,
    /// How long guides stay on screen after a keyboard nudge.
    #[serde(default = "default_guide_display_ms")]
    pub guide_display_ms: u64,
    /// Pixels moved per keyboard nudge.
    #[serde(default = "default_nudge_step")]
    pub nudge_step: f64,
    /// Render cycles granted for widgets to mount before the HUD stops
    /// waiting for new registrations.
    #[serde(default = "default_mount_frame_budget")]
    pub mount_frame_budget: u32,
    #[serde(default)]
    pub status: StatusRowSettings,
}

/// Packing of the vital-status indicator row.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct StatusRowSettings {
    /// Clearance that two indicators need to not count as overlapping.
    #[serde(default = "default_status_padding")]
    pub padding: f64,
    /// Space left between an indicator and the one it was pushed away from.
    #[serde(default = "default_status_gap")]
    pub gap: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            language: default_language(),
            notification_ttl_ms: default_notification_ttl_ms(),
            layout: LayoutSettings::default(),
        }
    }
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            simple_mode: false,
            minimap: true,
            snap_threshold: default_snap_threshold(),
            guide_display_ms: default_guide_display_ms(),
            nudge_step: default_nudge_step(),
            mount_frame_budget: default_mount_frame_budget(),
            status: StatusRowSettings::default(),
        }
    }
}

impl Default for StatusRowSettings {
    fn default() -> Self {
        Self {
            padding: default_status_padding(),
            gap: default_status_gap(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.history_limit == 0 {
            issues.push("history_limit must be at least 1".to_string());
        }
        if self.history_limit > MAX_HISTORY {
            issues.push(format!(
                "history_limit should not exceed {}, got {}",
                MAX_HISTORY, self.history_limit
            ));
        }
        if self.language.trim().is_empty() {
            issues.push("language must not be empty".to_string());
        }

        issues.extend(self.layout.validate());

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        if self.history_limit == 0 || self.history_limit > MAX_HISTORY {
            self.history_limit = default_history_limit();
            fixes += 1;
        }
        if self.language.trim().is_empty() {
            self.language = default_language();
            fixes += 1;
        }

        fixes += self.layout.auto_fix_values();

        fixes
    }
}

impl LayoutSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !(0.0..=MAX_SNAP_THRESHOLD).contains(&self.snap_threshold) {
            issues.push(format!(
                "snap_threshold must be between 0 and {}, got {}",
                MAX_SNAP_THRESHOLD, self.snap_threshold
            ));
        }
        if !is_positive(self.nudge_step) {
            issues.push(format!("nudge_step must be positive, got {}", self.nudge_step));
        }
        if self.mount_frame_budget == 0 {
            issues.push("mount_frame_budget must be at least 1".to_string());
        }

        issues.extend(self.status.validate());

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        if !(0.0..=MAX_SNAP_THRESHOLD).contains(&self.snap_threshold) {
            self.snap_threshold = default_snap_threshold();
            fixes += 1;
        }
        if !is_positive(self.nudge_step) {
            self.nudge_step = default_nudge_step();
            fixes += 1;
        }
        if self.mount_frame_budget == 0 {
            self.mount_frame_budget = default_mount_frame_budget();
            fixes += 1;
        }

        fixes + self.status.auto_fix_values()
    }

    pub fn context_flags(&self) -> ContextFlags {
        let mut flags = ContextFlags::empty();
        flags.set(ContextFlags::SIMPLE_MODE, self.simple_mode);
        flags.set(ContextFlags::MINIMAP, self.minimap);
        flags
    }
}

impl StatusRowSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !is_non_negative(self.padding) {
            issues.push(format!("status.padding must be non-negative, got {}", self.padding));
        }
        // The packed row is only overlap-free when the gap clears the padding.
        if !self.gap.is_finite() || self.gap <= self.padding.max(0.0) {
            issues.push(format!(
                "status.gap must be larger than status.padding ({}), got {}",
                self.padding, self.gap
            ));
        }

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        if !self.padding.is_finite() {
            self.padding = default_status_padding();
            fixes += 1;
        } else if self.padding < 0.0 {
            self.padding = 0.0;
            fixes += 1;
        }
        if !self.gap.is_finite() || self.gap <= self.padding {
            self.gap = self.padding + default_status_gap() - default_status_padding();
            fixes += 1;
        }

        fixes
    }
}

fn yes() -> bool { true }

fn is_positive(v: f64) -> bool { v.is_finite() && v > 0.0 }

fn is_non_negative(v: f64) -> bool { v.is_finite() && v >= 0.0 }

fn default_history_limit() -> usize { 50 }

fn default_language() -> String { "en".to_string() }

fn default_notification_ttl_ms() -> u64 { 5000 }

fn default_snap_threshold() -> f64 { 5.0 }

fn default_guide_display_ms() -> u64 { 1000 }

fn default_nudge_step() -> f64 { 1.0 }

fn default_mount_frame_budget() -> u32 { 10 }

fn default_status_padding() -> f64 { 2.0 }

fn default_status_gap() -> f64 { 4.0 }

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)?;
        Self::parse(&buf)
    }

    /// Reads `path` when it exists, otherwise returns the defaults.
    pub fn read_or_default(path: &Path) -> anyhow::Result<Config> {
        if path.exists() { Self::read(path) } else { Ok(Config::default()) }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, toml_string.as_bytes())?;

        Ok(())
    }

    pub fn validate(&self) -> Vec<String> { self.settings.validate() }

    pub fn auto_fix_values(&mut self) -> usize { self.settings.auto_fix_values() }

    pub fn parse(buf: &str) -> anyhow::Result<Config> { Ok(toml::from_str(buf)?) }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn default_config_file_matches_defaults() {
        let parsed = Config::parse(include_str!("../../hud.default.toml")).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::parse(
            r#"
            [settings.layout]
            snap_treshold = 4.0
            "#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn partial_layout_section_keeps_other_defaults() {
        let config = Config::parse(
            r#"
            [settings.layout]
            simple_mode = true
            snap_threshold = 8.0
            "#,
        )
        .unwrap();
        assert!(config.settings.layout.simple_mode);
        assert_eq!(config.settings.layout.snap_threshold, 8.0);
        assert_eq!(config.settings.layout.status, StatusRowSettings::default());
        assert!(
            config
                .settings
                .layout
                .context_flags()
                .contains(ContextFlags::SIMPLE_MODE | ContextFlags::MINIMAP)
        );
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_empty());

        config.settings.layout.snap_threshold = -1.0;
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("snap_threshold"));

        assert_eq!(config.auto_fix_values(), 1);
        assert_eq!(config.settings.layout.snap_threshold, 5.0);

        config.settings.layout.status.gap = 1.0;
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("status.gap"));

        assert_eq!(config.auto_fix_values(), 1);
        assert_eq!(config.settings.layout.status.gap, 4.0);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn non_finite_numbers_are_reported_and_fixed() {
        let mut config = Config::parse(
            r#"
            [settings.layout]
            nudge_step = nan
            snap_threshold = inf

            [settings.layout.status]
            padding = nan
            gap = inf
            "#,
        )
        .unwrap();

        let issues = config.validate();
        assert_eq!(issues.len(), 4, "{issues:?}");
        assert!(issues.iter().any(|i| i.contains("status.padding")));

        assert_eq!(config.auto_fix_values(), 4);
        assert_eq!(config.settings.layout.nudge_step, 1.0);
        assert_eq!(config.settings.layout.snap_threshold, 5.0);
        assert_eq!(config.settings.layout.status, StatusRowSettings::default());
        assert!(config.validate().is_empty());
    }

    #[test]
    fn persisted_state_lives_in_the_data_dir() {
        let data = data_dir();
        assert_eq!(storage_file().parent(), Some(data.as_path()));
        assert_eq!(restore_file().parent(), Some(data.as_path()));
        assert_ne!(storage_file(), restore_file());
    }

    #[test]
    fn save_and_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("hud.toml");

        let mut config = Config::default();
        config.settings.language = "de".to_string();
        config.settings.layout.guide_display_ms = 250;
        config.save(&path).unwrap();

        assert_eq!(Config::read(&path).unwrap(), config);
        assert_eq!(
            Config::read_or_default(&dir.path().join("missing.toml")).unwrap(),
            Config::default()
        );
    }
}
