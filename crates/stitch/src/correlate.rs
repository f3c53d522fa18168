use crate::model::{AdEventType, MetadataStore};

/// Structured ad-event info produced by correlating a media id against the
/// tag table.
#[derive(Debug, Clone, PartialEq)]
pub struct AdEventInfo {
    /// Id of the ad the tag belongs to.
    pub ad: String,
    pub ad_break_id: Option<String>,
    pub event: AdEventType,
    pub is_slate: bool,
}

/// Looks up a media id in the tag table.
///
/// The first prefix (in table order) that `media_id` starts with wins; no
/// further entries are considered. Matching is case-sensitive. A miss is not
/// an error, the id simply carries no ad semantics.
pub fn correlate(store: &MetadataStore, media_id: &str) -> Option<AdEventInfo> {
    for (prefix, tag) in store.tags.iter() {
        if media_id.starts_with(prefix.as_str()) {
            let is_slate = store.ads.get(&tag.ad).map_or(false, |ad| ad.slate);
            return Some(AdEventInfo {
                ad: tag.ad.clone(),
                ad_break_id: tag.ad_break_id.clone(),
                event: tag.event.clone(),
                is_slate,
            });
        }
    }
    None
}

/// Whether a consumed media id should fire the verification beacon.
///
/// Every id is verified, matched or not, with one exception: a resolved
/// `progress` event is a UI-state signal only and must not trigger
/// verification.
pub fn should_verify(info: Option<&AdEventInfo>) -> bool {
    !matches!(info, Some(info) if info.event == AdEventType::Progress)
}
