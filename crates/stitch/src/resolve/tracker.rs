use super::AdResolver;
use crate::{
    correlate::AdEventInfo,
    model::{Ad, AdEventType, MetadataStore},
};

/// Seconds without a progress event after which the current ad is force
/// cleared.
pub const FORCE_AD_TIMEOUT: f64 = 2.0;

/// Event-driven ad lifecycle tracker for live streams.
///
/// `start`/`complete` tags open and close the current ad; `progress` tags act
/// as a heartbeat. If the heartbeat stops (seek, stream glitch, dropped
/// segment), a watchdog clears the current ad so the UI cannot stay stuck in
/// ad state.
pub struct EventTracker {
    current_ad: Option<Ad>,
    last_progress_time: f64,
    timeout: f64,
}

impl EventTracker {
    pub fn new() -> Self {
        Self {
            current_ad: None,
            last_progress_time: 0.0,
            timeout: FORCE_AD_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: f64) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for EventTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl AdResolver for EventTracker {
    fn on_ad_event(&mut self, info: &AdEventInfo, store: &MetadataStore, current_time: f64) {
        match &info.event {
            AdEventType::Start => {
                self.current_ad = store.ads.get(&info.ad).cloned();
                tracing::info!(ad = %info.ad, slate = info.is_slate, "Ad started");
            }
            AdEventType::Progress => {}
            AdEventType::Complete => {
                self.current_ad = None;
                tracing::info!(ad = %info.ad, "Ad completed");
            }
            // Any other event type reassigns the current ad. This mirrors the
            // behavior of deployed clients; see the unknown_event test below.
            AdEventType::Other(other) => {
                self.current_ad = store.ads.get(&info.ad).cloned();
                tracing::debug!(ad = %info.ad, event = %other, "Ad event");
            }
        }
        // Every event refreshes the heartbeat, whatever the branch.
        self.last_progress_time = current_time;
    }

    fn current_ad(&mut self, _store: &MetadataStore, current_time: f64) -> Option<Ad> {
        if self.current_ad.is_some()
            && (current_time - self.last_progress_time).abs() > self.timeout
        {
            tracing::warn!(
                current_time,
                last_progress_time = self.last_progress_time,
                "No ad progress within timeout, clearing current ad"
            );
            self.current_ad = None;
        }
        self.current_ad.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AdMap;

    fn store_with_ad(id: &str) -> MetadataStore {
        MetadataStore {
            ads: [(
                id.to_string(),
                Ad {
                    id: Some(id.to_string()),
                    duration: 15.0,
                    ..Default::default()
                },
            )]
            .into_iter()
            .collect::<AdMap>(),
            ..Default::default()
        }
    }

    fn event(ad: &str, event: AdEventType) -> AdEventInfo {
        AdEventInfo {
            ad: ad.to_string(),
            ad_break_id: None,
            event,
            is_slate: false,
        }
    }

    #[test]
    fn start_and_complete_drive_current_ad() {
        let store = store_with_ad("ad-1");
        let mut tracker = EventTracker::new();

        tracker.on_ad_event(&event("ad-1", AdEventType::Start), &store, 10.0);
        assert!(tracker.current_ad(&store, 10.1).is_some());

        tracker.on_ad_event(&event("ad-1", AdEventType::Complete), &store, 25.0);
        assert!(tracker.current_ad(&store, 25.1).is_none());
    }

    #[test]
    fn start_of_unknown_ad_yields_no_current_ad() {
        let store = MetadataStore::default();
        let mut tracker = EventTracker::new();
        tracker.on_ad_event(&event("ad-missing", AdEventType::Start), &store, 1.0);
        assert!(tracker.current_ad(&store, 1.1).is_none());
    }

    #[test]
    fn progress_keeps_the_ad_alive() {
        let store = store_with_ad("ad-1");
        let mut tracker = EventTracker::new();

        tracker.on_ad_event(&event("ad-1", AdEventType::Start), &store, 10.0);
        tracker.on_ad_event(&event("ad-1", AdEventType::Progress), &store, 11.5);
        tracker.on_ad_event(&event("ad-1", AdEventType::Progress), &store, 13.0);
        assert!(tracker.current_ad(&store, 13.5).is_some());
    }

    #[test]
    fn watchdog_clears_stale_ad() {
        let store = store_with_ad("ad-1");
        let mut tracker = EventTracker::new();

        tracker.on_ad_event(&event("ad-1", AdEventType::Progress), &store, 10.0);
        tracker.on_ad_event(&event("ad-1", AdEventType::Start), &store, 10.0);
        // Within the timeout the ad survives.
        assert!(tracker.current_ad(&store, 11.9).is_some());
        // 12.01 - 10.0 > 2.0: cleared on the next tick.
        assert!(tracker.current_ad(&store, 12.01).is_none());
    }

    #[test]
    fn watchdog_timeout_is_configurable() {
        let store = store_with_ad("ad-1");
        let mut tracker = EventTracker::new().with_timeout(5.0);

        tracker.on_ad_event(&event("ad-1", AdEventType::Start), &store, 10.0);
        // Past the default timeout but within the configured one.
        assert!(tracker.current_ad(&store, 12.01).is_some());
        assert!(tracker.current_ad(&store, 15.01).is_none());
    }

    #[test]
    fn unknown_event_reassigns_current_ad() {
        // Deliberately pinned: event types other than start/progress/complete
        // fall through to reassignment rather than being ignored.
        let store = store_with_ad("ad-2");
        let mut tracker = EventTracker::new();

        tracker.on_ad_event(&event("ad-1", AdEventType::Complete), &store, 5.0);
        tracker.on_ad_event(
            &event("ad-2", AdEventType::Other("midpoint".to_string())),
            &store,
            5.5,
        );
        let current = tracker.current_ad(&store, 5.6).unwrap();
        assert_eq!(current.id.as_deref(), Some("ad-2"));
    }

    #[test]
    fn controls_enabled_iff_no_current_ad() {
        let store = store_with_ad("ad-1");
        let mut tracker = EventTracker::new();
        assert!(tracker.controls_enabled(&store, 0.0));

        tracker.on_ad_event(&event("ad-1", AdEventType::Start), &store, 1.0);
        assert!(!tracker.controls_enabled(&store, 1.1));
    }
}
