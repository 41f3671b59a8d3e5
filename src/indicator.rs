// Status indicator: the surface that shows whether the bot is online.
//
// The poller only ever writes to an indicator. `SharedIndicator` is the
// in-process implementation read back by the dashboard API.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::status::BotStatus;

/// Icon/color and label for one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Presentation {
    pub icon: &'static str,
    pub color: &'static str,
    pub label: &'static str,
}

pub const ONLINE: Presentation = Presentation {
    icon: "fas fa-circle text-success",
    color: "#43b581",
    label: "Bot Online & Ready",
};

pub const OFFLINE: Presentation = Presentation {
    icon: "fas fa-circle text-danger",
    color: "#f04747",
    label: "Bot Offline",
};

impl Presentation {
    pub fn for_status(status: BotStatus) -> Self {
        match status {
            BotStatus::Online => ONLINE,
            BotStatus::Offline => OFFLINE,
        }
    }
}

/// A surface with two presentation slots (icon/color and label) that shows a
/// bot status. The poller only ever writes to it. Rendering must never fail.
pub trait Indicator: Send + Sync {
    fn render(&self, status: BotStatus, presentation: &Presentation);
}

/// An absent indicator renders nothing.
impl<I: Indicator> Indicator for Option<I> {
    fn render(&self, status: BotStatus, presentation: &Presentation) {
        if let Some(indicator) = self {
            indicator.render(status, presentation);
        }
    }
}

#[derive(Debug, Default)]
struct Slots {
    status: Option<BotStatus>,
    presentation: Option<Presentation>,
    updated_at: Option<DateTime<Utc>>,
}

/// Point-in-time view of a `SharedIndicator`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSnapshot {
    /// `online`, `offline`, or `unknown` before the first render.
    pub status: &'static str,
    #[serde(flatten)]
    pub presentation: Presentation,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Thread-safe in-memory indicator.
#[derive(Debug, Clone, Default)]
pub struct SharedIndicator {
    inner: Arc<Mutex<Slots>>,
}

impl SharedIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last rendered status, if any render has happened yet.
    pub fn status(&self) -> Option<BotStatus> {
        self.inner.lock().unwrap().status
    }

    pub fn snapshot(&self) -> IndicatorSnapshot {
        let slots = self.inner.lock().unwrap();
        match (slots.status, slots.presentation) {
            (Some(status), Some(presentation)) => IndicatorSnapshot {
                status: status.as_str(),
                presentation,
                updated_at: slots.updated_at,
            },
            // Nothing polled yet: show the offline badge, but say why.
            _ => IndicatorSnapshot {
                status: "unknown",
                presentation: OFFLINE,
                updated_at: None,
            },
        }
    }
}

impl Indicator for SharedIndicator {
    fn render(&self, status: BotStatus, presentation: &Presentation) {
        let mut slots = self.inner.lock().unwrap();
        slots.status = Some(status);
        slots.presentation = Some(*presentation);
        slots.updated_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presentations_are_distinct() {
        assert_eq!(Presentation::for_status(BotStatus::Online), ONLINE);
        assert_eq!(Presentation::for_status(BotStatus::Offline), OFFLINE);
        assert_ne!(ONLINE.icon, OFFLINE.icon);
        assert_ne!(ONLINE.color, OFFLINE.color);
        assert_eq!(ONLINE.label, "Bot Online & Ready");
        assert_eq!(OFFLINE.label, "Bot Offline");
    }

    #[test]
    fn test_shared_indicator_starts_unknown() {
        let indicator = SharedIndicator::new();
        assert!(indicator.status().is_none());

        let snap = indicator.snapshot();
        assert_eq!(snap.status, "unknown");
        assert_eq!(snap.presentation, OFFLINE);
        assert!(snap.updated_at.is_none());
    }

    #[test]
    fn test_shared_indicator_tracks_last_render() {
        let indicator = SharedIndicator::new();

        indicator.render(BotStatus::Online, &ONLINE);
        let snap = indicator.snapshot();
        assert_eq!(snap.status, "online");
        assert_eq!(snap.presentation, ONLINE);
        assert!(snap.updated_at.is_some());

        indicator.render(BotStatus::Offline, &OFFLINE);
        assert_eq!(indicator.status(), Some(BotStatus::Offline));
        assert_eq!(indicator.snapshot().presentation, OFFLINE);
    }

    #[test]
    fn test_clones_share_slots() {
        let indicator = SharedIndicator::new();
        let reader = indicator.clone();
        indicator.render(BotStatus::Online, &ONLINE);
        assert_eq!(reader.status(), Some(BotStatus::Online));
    }

    #[test]
    fn test_absent_indicator_is_noop() {
        let absent: Option<SharedIndicator> = None;
        absent.render(BotStatus::Online, &ONLINE);

        let present = Some(SharedIndicator::new());
        present.render(BotStatus::Online, &ONLINE);
        assert_eq!(
            present.as_ref().and_then(|i| i.status()),
            Some(BotStatus::Online)
        );
    }

    #[test]
    fn test_snapshot_shows_the_written_presentation() {
        let custom = Presentation {
            icon: "fas fa-bolt",
            color: "#ffffff",
            label: "Custom",
        };
        let indicator = SharedIndicator::new();
        indicator.render(BotStatus::Online, &custom);
        let snap = indicator.snapshot();
        assert_eq!(snap.status, "online");
        assert_eq!(snap.presentation, custom);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let indicator = SharedIndicator::new();
        indicator.render(BotStatus::Offline, &OFFLINE);
        let json = serde_json::to_value(indicator.snapshot()).unwrap();
        assert_eq!(json["status"], "offline");
        assert_eq!(json["icon"], "fas fa-circle text-danger");
        assert_eq!(json["color"], "#f04747");
        assert_eq!(json["label"], "Bot Offline");
        assert!(json["updated_at"].is_string());
    }
}
