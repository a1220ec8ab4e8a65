//! Messages exchanged with the game host.
//!
//! Inbound messages arrive as JSON envelopes, `{"action": "...", "data": {...}}`.
//! Outbound calls go through a [`HostBridge`]; outside the game they are only
//! logged.

use serde::{Deserialize, Serialize};
use strum::{IntoStaticStr, VariantNames};
use thiserror::Error;
use tracing::info;

use crate::model::notifications::NotificationKind;
use crate::model::stores::{StatusUpdate, VehicleUpdate, VoiceUpdate};
use crate::model::widget::WidgetId;

#[derive(Debug, Error)]
pub enum HostEventError {
    #[error("host event is not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("host event has no action")]
    MissingAction,
    #[error("unknown host action {0:?}")]
    UnknownAction(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, VariantNames)]
#[serde(tag = "action", content = "data", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HostEvent {
    UpdateStatus(StatusUpdate),
    UpdateVehicle(VehicleUpdate),
    SetVisible {
        visible: bool,
    },
    SetDisabledWidgets {
        #[serde(default)]
        widgets: Vec<WidgetId>,
    },
    Notify {
        #[serde(default)]
        kind: NotificationKind,
        text: String,
        #[serde(default)]
        duration_ms: Option<u64>,
    },
    UpdateVoice(VoiceUpdate),
    SetScreen {
        width: f64,
        height: f64,
    },
    ChatInput {
        text: String,
    },
    SetLanguage {
        language: String,
    },
}

impl HostEvent {
    pub fn parse(raw: &str) -> Result<Self, HostEventError> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        let action = value
            .get("action")
            .and_then(serde_json::Value::as_str)
            .ok_or(HostEventError::MissingAction)?;
        if !Self::VARIANTS.iter().any(|known| *known == action) {
            return Err(HostEventError::UnknownAction(action.to_string()));
        }
        Ok(serde_json::from_value(value)?)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, IntoStaticStr)]
#[serde(tag = "action", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HostCall {
    /// Every widget mounted and finished loading.
    Loaded,
    CloseOverlay,
    CancelProgress,
}

impl HostCall {
    pub fn name(self) -> &'static str { self.into() }
}

pub trait HostBridge {
    fn post(&self, call: HostCall);
}

/// Bridge for running outside the game.
#[derive(Debug, Default)]
pub struct LoggingBridge;

impl HostBridge for LoggingBridge {
    fn post(&self, call: HostCall) {
        info!(call = call.name(), "host call (standalone, not sent)");
    }
}
