use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::common::collections::HashSet;
use crate::layout_engine::ContextFlags;
use crate::layout_engine::defaults::default_widgets;
use crate::model::widget::{WidgetDescriptor, WidgetId, WidgetKind, clamp_scale};
use crate::sys::geometry::Point;

#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("unknown widget {0}")]
    UnknownWidget(WidgetId),
    #[error("position for {0} is not finite")]
    InvalidPosition(WidgetId),
}

/// What the player changed about one widget. Unset fields keep the
/// descriptor's value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WidgetConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
}

impl WidgetConfig {
    fn is_empty(&self) -> bool { self == &WidgetConfig::default() }
}

/// On-disk form of the player's layout edits.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SavedLayout {
    #[serde(default)]
    pub widgets: BTreeMap<WidgetId, WidgetConfig>,
}

/// Single owner of widget state: the descriptor table, the player's
/// overrides, and the set of widgets the host has disabled.
#[derive(Debug)]
pub struct WidgetRegistry {
    descriptors: Vec<WidgetDescriptor>,
    overrides: BTreeMap<WidgetId, WidgetConfig>,
    disabled: HashSet<WidgetId>,
}

impl Default for WidgetRegistry {
    fn default() -> Self { Self::new(default_widgets()) }
}

impl WidgetRegistry {
    pub fn new(descriptors: Vec<WidgetDescriptor>) -> Self {
        Self {
            descriptors,
            overrides: BTreeMap::new(),
            disabled: HashSet::default(),
        }
    }

    pub fn descriptors(&self) -> &[WidgetDescriptor] { &self.descriptors }

    pub fn contains(&self, id: &WidgetId) -> bool { self.descriptor(id).is_some() }

    pub fn descriptor(&self, id: &WidgetId) -> Option<&WidgetDescriptor> {
        self.descriptors.iter().find(|d| &d.id == id)
    }

    /// Descriptors with the player's overrides and the context applied.
    ///
    /// Order is never changed. Simple mode hides sub-widgets, vehicle gauges
    /// are hidden on foot, and the minimap follows its flag.
    pub fn effective_descriptors(&self, flags: ContextFlags) -> Vec<WidgetDescriptor> {
        self.descriptors
            .iter()
            .map(|d| {
                let mut d = d.clone();
                if let Some(cfg) = self.overrides.get(&d.id) {
                    if let Some(visible) = cfg.visible {
                        d.visible = visible;
                    }
                    if let Some(scale) = cfg.scale {
                        d.scale = clamp_scale(scale);
                    }
                }
                if (d.sub_widget && flags.contains(ContextFlags::SIMPLE_MODE))
                    || (d.kind.is_vehicle() && !flags.contains(ContextFlags::IN_VEHICLE))
                    || (d.kind == WidgetKind::Minimap && !flags.contains(ContextFlags::MINIMAP))
                {
                    d.visible = false;
                }
                d
            })
            .collect()
    }

    fn config_mut(&mut self, id: &WidgetId) -> Result<&mut WidgetConfig, RegistryError> {
        if !self.contains(id) {
            return Err(RegistryError::UnknownWidget(id.clone()));
        }
        Ok(self.overrides.entry(id.clone()).or_default())
    }

    fn prune(&mut self, id: &WidgetId) {
        if self.overrides.get(id).is_some_and(WidgetConfig::is_empty) {
            self.overrides.remove(id);
        }
    }

    pub fn set_position(&mut self, id: &WidgetId, position: Point) -> Result<(), RegistryError> {
        if !position.is_finite() {
            return Err(RegistryError::InvalidPosition(id.clone()));
        }
        self.config_mut(id)?.position = Some(position);
        Ok(())
    }

    /// Forgets a dragged position. Returns whether there was one.
    pub fn reset_position(&mut self, id: &WidgetId) -> bool {
        let had = self
            .overrides
            .get_mut(id)
            .and_then(|cfg| cfg.position.take())
            .is_some();
        self.prune(id);
        had
    }

    pub fn reset_all(&mut self) { self.overrides.clear(); }

    pub fn set_visible(&mut self, id: &WidgetId, visible: bool) -> Result<(), RegistryError> {
        self.config_mut(id)?.visible = Some(visible);
        Ok(())
    }

    pub fn set_scale(&mut self, id: &WidgetId, scale: f64) -> Result<(), RegistryError> {
        self.config_mut(id)?.scale = Some(clamp_scale(scale));
        Ok(())
    }

    pub fn saved_position(&self, id: &WidgetId) -> Option<Point> {
        self.overrides.get(id).and_then(|cfg| cfg.position)
    }

    /// Replaces the host-disabled set. Returns whether it changed.
    pub fn set_disabled(&mut self, ids: impl IntoIterator<Item = WidgetId>) -> bool {
        let next: HashSet<WidgetId> = ids.into_iter().collect();
        if next == self.disabled {
            return false;
        }
        debug!(count = next.len(), "disabled widgets changed");
        self.disabled = next;
        true
    }

    pub fn is_disabled(&self, id: &WidgetId) -> bool { self.disabled.contains(id) }

    pub fn saved_layout(&self) -> SavedLayout {
        SavedLayout { widgets: self.overrides.clone() }
    }

    /// Applies a saved layout on top of the current one. Entries for widgets
    /// that no longer exist are skipped. Returns how many were applied.
    pub fn restore(&mut self, saved: SavedLayout) -> usize {
        let mut applied = 0;
        for (id, mut cfg) in saved.widgets {
            if !self.contains(&id) {
                warn!(%id, "skipping saved layout for unknown widget");
                continue;
            }
            if cfg.position.is_some_and(|p| !p.is_finite()) {
                warn!(%id, "dropping non-finite saved position");
                cfg.position = None;
            }
            cfg.scale = cfg.scale.map(clamp_scale);
            if !cfg.is_empty() {
                self.overrides.insert(id, cfg);
                applied += 1;
            }
        }
        applied
    }

    pub fn serialize_to_string(&self) -> anyhow::Result<String> {
        Ok(ron::ser::to_string_pretty(
            &self.saved_layout(),
            ron::ser::PrettyConfig::default(),
        )?)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let buf = self.serialize_to_string()?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, buf.as_bytes())?;
        Ok(())
    }

    pub fn load(path: &Path) -> anyhow::Result<SavedLayout> {
        let buf = std::fs::read_to_string(path)?;
        Ok(ron::from_str(&buf)?)
    }
}
