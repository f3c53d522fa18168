//! Current-ad resolution.
//!
//! Live streams carry explicit lifecycle events in their in-band tags; VOD
//! streams only carry a break schedule. Both strategies sit behind one trait
//! so the session has a single notion of "is an ad playing right now".

mod schedule;
mod tracker;

pub use schedule::{current_ad_at, current_break_at, ScheduleResolver};
pub use tracker::{EventTracker, FORCE_AD_TIMEOUT};

use crate::{
    api::StreamMode,
    correlate::AdEventInfo,
    model::{Ad, MetadataStore},
};

pub trait AdResolver: Send {
    /// Feeds a correlated ad event into the resolver. `current_time` is the
    /// playback position at consumption time.
    fn on_ad_event(&mut self, info: &AdEventInfo, store: &MetadataStore, current_time: f64);

    /// The ad considered active at `current_time`, if any.
    fn current_ad(&mut self, store: &MetadataStore, current_time: f64) -> Option<Ad>;

    /// Player controls are shown iff no ad is considered active.
    fn controls_enabled(&mut self, store: &MetadataStore, current_time: f64) -> bool {
        self.current_ad(store, current_time).is_none()
    }
}

/// Picks the resolution strategy for a stream mode.
pub fn resolver_for(mode: StreamMode) -> Box<dyn AdResolver> {
    match mode {
        StreamMode::Live => Box::new(EventTracker::new()),
        StreamMode::Vod => Box::new(ScheduleResolver),
    }
}
