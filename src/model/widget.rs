use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoStaticStr};

use crate::layout_engine::PositionFn;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetId(String);

impl WidgetId {
    pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl From<&str> for WidgetId {
    fn from(s: &str) -> Self { Self(s.to_string()) }
}

impl From<String> for WidgetId {
    fn from(s: String) -> Self { Self(s) }
}

impl From<&WidgetId> for WidgetId {
    fn from(id: &WidgetId) -> Self { id.clone() }
}

impl Borrow<str> for WidgetId {
    fn borrow(&self) -> &str { &self.0 }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WidgetKind {
    Health,
    Armor,
    Hunger,
    Thirst,
    Stamina,
    Stress,
    Oxygen,
    Voice,
    Minimap,
    Compass,
    Speedometer,
    Fuel,
    Seatbelt,
    Money,
    Chat,
    Notifications,
    Progress,
}

impl WidgetKind {
    /// Vital-status indicators share one row that must never overlap.
    pub fn is_status(self) -> bool {
        use WidgetKind::*;
        matches!(
            self,
            Health | Armor | Hunger | Thirst | Stamina | Stress | Oxygen
        )
    }

    pub fn is_vehicle(self) -> bool {
        matches!(self, WidgetKind::Speedometer | WidgetKind::Fuel | WidgetKind::Seatbelt)
    }

    pub fn name(self) -> &'static str { self.into() }
}

pub const MIN_SCALE: f64 = 0.5;
pub const MAX_SCALE: f64 = 3.0;

pub fn clamp_scale(scale: f64) -> f64 {
    if scale.is_finite() { scale.clamp(MIN_SCALE, MAX_SCALE) } else { 1.0 }
}

/// Immutable template for one widget, built once at startup.
#[derive(Clone)]
pub struct WidgetDescriptor {
    pub id: WidgetId,
    pub kind: WidgetKind,
    pub position: PositionFn,
    pub scale: f64,
    pub visible: bool,
    /// Secondary widgets (badges, gauges hanging off another widget) that
    /// simple mode hides.
    pub sub_widget: bool,
}

impl WidgetDescriptor {
    pub fn new(id: impl Into<WidgetId>, kind: WidgetKind, position: PositionFn) -> Self {
        Self {
            id: id.into(),
            kind,
            position,
            scale: 1.0,
            visible: true,
            sub_widget: false,
        }
    }

    pub fn scale(mut self, scale: f64) -> Self {
        self.scale = clamp_scale(scale);
        self
    }

    pub fn sub_widget(mut self) -> Self {
        self.sub_widget = true;
        self
    }
}

impl fmt::Debug for WidgetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetDescriptor")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("scale", &self.scale)
            .field("visible", &self.visible)
            .field("sub_widget", &self.sub_widget)
            .finish_non_exhaustive()
    }
}
