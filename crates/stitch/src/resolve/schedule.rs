use super::AdResolver;
use crate::{
    correlate::AdEventInfo,
    model::{Ad, AdBreak, MetadataStore},
};

/// The first break whose `[start, start + duration)` interval contains `time`.
pub fn current_break_at(breaks: &[AdBreak], time: f64) -> Option<&AdBreak> {
    breaks.iter().find(|b| b.contains(time))
}

/// The ad playing at `time`, derived from the break schedule.
///
/// Ads are stable-sorted by sequence number before durations are accumulated
/// from the break start; the first ad whose cumulative end time exceeds `time`
/// is current. Stateless and recomputed per query; correctness relies on ad
/// durations summing to no more than the break duration.
pub fn current_ad_at(breaks: &[AdBreak], time: f64) -> Option<Ad> {
    let ad_break = current_break_at(breaks, time)?;

    let mut ads = ad_break.ads.clone();
    ads.sort_by_key(|ad| ad.seq);

    let mut ad_end = ad_break.start;
    for ad in ads {
        ad_end += ad.duration;
        if time < ad_end {
            return Some(ad);
        }
    }
    None
}

/// Interval-derived resolution for VOD streams, which carry no lifecycle
/// events.
pub struct ScheduleResolver;

impl AdResolver for ScheduleResolver {
    fn on_ad_event(&mut self, info: &AdEventInfo, _store: &MetadataStore, _current_time: f64) {
        // Nothing to track; the schedule alone decides what is playing.
        tracing::debug!(ad = %info.ad, "Ignoring lifecycle event on schedule-resolved stream");
    }

    fn current_ad(&mut self, store: &MetadataStore, current_time: f64) -> Option<Ad> {
        current_ad_at(&store.ad_breaks, current_time)
    }

    fn controls_enabled(&mut self, store: &MetadataStore, current_time: f64) -> bool {
        current_break_at(&store.ad_breaks, current_time).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ad(seq: u64, duration: f64) -> Ad {
        Ad {
            id: Some(format!("ad-{seq}")),
            seq,
            duration,
            ..Default::default()
        }
    }

    fn one_break(start: f64, duration: f64, ads: Vec<Ad>) -> Vec<AdBreak> {
        vec![AdBreak {
            id: Some("break-1".to_string()),
            start,
            duration,
            ads,
        }]
    }

    #[test]
    fn break_interval_is_half_open() {
        let breaks = one_break(10.0, 30.0, vec![]);
        assert!(current_break_at(&breaks, 9.99).is_none());
        assert!(current_break_at(&breaks, 10.0).is_some());
        assert!(current_break_at(&breaks, 39.99).is_some());
        assert!(current_break_at(&breaks, 40.0).is_none());
    }

    #[test]
    fn ads_are_sorted_by_seq_before_accumulating() {
        // Out of order on the wire: seq 2 first.
        let breaks = one_break(10.0, 30.0, vec![ad(2, 15.0), ad(1, 15.0)]);
        // t = 22 falls in [10, 25), which belongs to seq 1 after sorting.
        let current = current_ad_at(&breaks, 22.0).unwrap();
        assert_eq!(current.seq, 1);

        let current = current_ad_at(&breaks, 25.0).unwrap();
        assert_eq!(current.seq, 2);
    }

    #[test]
    fn no_ad_outside_breaks() {
        let breaks = one_break(10.0, 30.0, vec![ad(1, 30.0)]);
        assert!(current_ad_at(&breaks, 5.0).is_none());
        assert!(current_ad_at(&breaks, 45.0).is_none());
    }

    #[test]
    fn past_the_last_ad_yields_none() {
        // Break longer than its ads; the tail has nothing playing.
        let breaks = one_break(0.0, 30.0, vec![ad(1, 10.0)]);
        assert!(current_ad_at(&breaks, 15.0).is_none());
    }

    #[test]
    fn resolver_controls_follow_the_break_not_the_ad() {
        let store = MetadataStore {
            ad_breaks: one_break(0.0, 30.0, vec![ad(1, 10.0)]).into(),
            ..Default::default()
        };
        let mut resolver = ScheduleResolver;
        // Inside the break but past its ads: controls stay hidden.
        assert!(resolver.current_ad(&store, 15.0).is_none());
        assert!(!resolver.controls_enabled(&store, 15.0));
        assert!(resolver.controls_enabled(&store, 35.0));
    }
}
