//! Host-fed state, one slice per concern.
//!
//! Each slice is owned by the HUD and handed out by reference; nothing here is
//! global. Applying an update reports whether anything changed so the caller
//! can skip redundant work, and applying the same update twice is a no-op the
//! second time.

use serde::{Deserialize, Serialize};

use crate::sys::geometry::Size;

pub trait Store {
    type Update;

    fn apply(&mut self, update: &Self::Update) -> bool;
}

fn assign<T: PartialEq + Copy>(slot: &mut T, value: Option<T>) -> bool {
    match value {
        Some(v) if *slot != v => {
            *slot = v;
            true
        }
        _ => false,
    }
}

fn percent(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite()).map(|v| v.clamp(0.0, 100.0))
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Vitals {
    pub health: f64,
    pub armor: f64,
    pub hunger: f64,
    pub thirst: f64,
    pub stamina: f64,
    pub stress: f64,
    pub oxygen: f64,
    pub cash: i64,
    pub bank: i64,
}

impl Default for Vitals {
    fn default() -> Self {
        Self {
            health: 100.0,
            armor: 0.0,
            hunger: 100.0,
            thirst: 100.0,
            stamina: 100.0,
            stress: 0.0,
            oxygen: 100.0,
            cash: 0,
            bank: 0,
        }
    }
}

/// Partial vitals update; percentages are clamped to `0..=100`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusUpdate {
    pub health: Option<f64>,
    pub armor: Option<f64>,
    pub hunger: Option<f64>,
    pub thirst: Option<f64>,
    pub stamina: Option<f64>,
    pub stress: Option<f64>,
    pub oxygen: Option<f64>,
    pub cash: Option<i64>,
    pub bank: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatusStore {
    vitals: Vitals,
}

impl StatusStore {
    pub fn vitals(&self) -> &Vitals { &self.vitals }
}

impl Store for StatusStore {
    type Update = StatusUpdate;

    fn apply(&mut self, u: &StatusUpdate) -> bool {
        let v = &mut self.vitals;
        // non-short-circuiting so every field is applied
        assign(&mut v.health, percent(u.health))
            | assign(&mut v.armor, percent(u.armor))
            | assign(&mut v.hunger, percent(u.hunger))
            | assign(&mut v.thirst, percent(u.thirst))
            | assign(&mut v.stamina, percent(u.stamina))
            | assign(&mut v.stress, percent(u.stress))
            | assign(&mut v.oxygen, percent(u.oxygen))
            | assign(&mut v.cash, u.cash)
            | assign(&mut v.bank, u.bank)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Vehicle {
    pub in_vehicle: bool,
    pub speed: f64,
    pub fuel: f64,
    pub seatbelt: bool,
    pub engine_on: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleUpdate {
    pub in_vehicle: Option<bool>,
    pub speed: Option<f64>,
    pub fuel: Option<f64>,
    pub seatbelt: Option<bool>,
    pub engine_on: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct VehicleStore {
    vehicle: Vehicle,
}

impl VehicleStore {
    pub fn vehicle(&self) -> &Vehicle { &self.vehicle }

    pub fn in_vehicle(&self) -> bool { self.vehicle.in_vehicle }
}

impl Store for VehicleStore {
    type Update = VehicleUpdate;

    fn apply(&mut self, u: &VehicleUpdate) -> bool {
        let v = &mut self.vehicle;
        let entered_or_left = assign(&mut v.in_vehicle, u.in_vehicle);
        if !v.in_vehicle {
            // on foot there is no telemetry to keep
            let had_telemetry = *v != Vehicle::default();
            *v = Vehicle::default();
            return entered_or_left || had_telemetry;
        }
        let speed = u.speed.filter(|s| s.is_finite()).map(|s| s.max(0.0));
        entered_or_left
            | assign(&mut v.speed, speed)
            | assign(&mut v.fuel, percent(u.fuel))
            | assign(&mut v.seatbelt, u.seatbelt)
            | assign(&mut v.engine_on, u.engine_on)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceRange {
    Whisper,
    #[default]
    Normal,
    Shout,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Voice {
    pub talking: bool,
    pub range: VoiceRange,
    pub radio: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceUpdate {
    pub talking: Option<bool>,
    pub range: Option<VoiceRange>,
    pub radio: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct VoiceStore {
    voice: Voice,
}

impl VoiceStore {
    pub fn voice(&self) -> &Voice { &self.voice }
}

impl Store for VoiceStore {
    type Update = VoiceUpdate;

    fn apply(&mut self, u: &VoiceUpdate) -> bool {
        let v = &mut self.voice;
        assign(&mut v.talking, u.talking) | assign(&mut v.range, u.range) | assign(&mut v.radio, u.radio)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VisibilityUpdate {
    Shown(bool),
    Screen(Size),
}

/// Whether the HUD is on screen, and how big the screen is.
#[derive(Clone, Debug, PartialEq)]
pub struct VisibilityStore {
    visible: bool,
    screen: Size,
}

impl VisibilityStore {
    pub fn new(screen: Size) -> Self { Self { visible: true, screen } }

    pub fn visible(&self) -> bool { self.visible }

    pub fn screen(&self) -> Size { self.screen }
}

impl Store for VisibilityStore {
    type Update = VisibilityUpdate;

    fn apply(&mut self, update: &VisibilityUpdate) -> bool {
        match *update {
            VisibilityUpdate::Shown(visible) => assign(&mut self.visible, Some(visible)),
            VisibilityUpdate::Screen(size) => {
                let valid = size.width.is_finite() && size.height.is_finite() && !size.is_empty();
                assign(&mut self.screen, valid.then_some(size))
            }
        }
    }
}

/// Every host-fed slice, created with the HUD and dropped with it.
#[derive(Clone, Debug, PartialEq)]
pub struct Stores {
    pub status: StatusStore,
    pub vehicle: VehicleStore,
    pub voice: VoiceStore,
    pub visibility: VisibilityStore,
}

impl Stores {
    pub fn new(screen: Size) -> Self {
        Self {
            status: StatusStore::default(),
            vehicle: VehicleStore::default(),
            voice: VoiceStore::default(),
            visibility: VisibilityStore::new(screen),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn status_updates_are_partial_clamped_and_idempotent() {
        let mut store = StatusStore::default();
        let update = StatusUpdate {
            health: Some(150.0),
            stress: Some(-3.0),
            cash: Some(250),
            ..Default::default()
        };

        assert!(store.apply(&update));
        assert!(!store.apply(&update));
        assert_eq!(store.vitals().health, 100.0);
        assert_eq!(store.vitals().stress, 0.0);
        assert_eq!(store.vitals().cash, 250);
        assert_eq!(store.vitals().armor, 0.0);

        assert!(!store.apply(&StatusUpdate { health: Some(f64::NAN), ..Default::default() }));
    }

    #[test]
    fn status_update_parses_from_partial_json() {
        let update: StatusUpdate = serde_json::from_str(r#"{"armor": 40}"#).unwrap();
        assert_eq!(update, StatusUpdate { armor: Some(40.0), ..Default::default() });
    }

    #[test]
    fn leaving_a_vehicle_resets_telemetry() {
        let mut store = VehicleStore::default();
        let enter = VehicleUpdate {
            in_vehicle: Some(true),
            speed: Some(80.0),
            fuel: Some(55.0),
            ..Default::default()
        };
        assert!(store.apply(&enter));
        assert!(!store.apply(&enter));
        assert_eq!(store.vehicle().fuel, 55.0);

        assert!(store.apply(&VehicleUpdate { in_vehicle: Some(false), ..Default::default() }));
        assert_eq!(store.vehicle(), &Vehicle::default());
        // telemetry without a vehicle is dropped
        assert!(!store.apply(&VehicleUpdate { speed: Some(10.0), ..Default::default() }));
    }

    #[test]
    fn voice_range_deserializes_snake_case() {
        let mut store = VoiceStore::default();
        let update: VoiceUpdate =
            serde_json::from_str(r#"{"talking": true, "range": "shout"}"#).unwrap();
        assert!(store.apply(&update));
        assert_eq!(store.voice().range, VoiceRange::Shout);
        assert!(!store.apply(&update));
    }

    #[test]
    fn visibility_ignores_degenerate_screens() {
        let mut store = VisibilityStore::new(Size::new(1920.0, 1080.0));
        assert!(!store.apply(&VisibilityUpdate::Screen(Size::new(0.0, 1080.0))));
        assert!(store.apply(&VisibilityUpdate::Screen(Size::new(2560.0, 1440.0))));
        assert!(!store.apply(&VisibilityUpdate::Screen(Size::new(2560.0, 1440.0))));
        assert!(store.apply(&VisibilityUpdate::Shown(false)));
        assert!(!store.visible());
    }
}
