use std::{collections::HashMap, fmt, ops::Deref};

use serde::{
    de::{MapAccess, SeqAccess, Visitor},
    Deserialize, Deserializer,
};

/// A single ad within an ad break.
///
/// All fields the metadata endpoint may omit carry explicit defaults instead of
/// being coerced at the use site.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Ad {
    #[serde(default)]
    pub id: Option<String>,
    /// Position of the ad within its break. Defaults to 0.
    #[serde(default)]
    pub seq: u64,
    /// Ad duration in seconds. Defaults to 0.
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub clickthrough_url: Option<String>,
    /// Slate ads are filler creatives played when no real ad is available.
    #[serde(default)]
    pub slate: bool,
}

/// An ad break stitched into the stream at a playback-time offset.
///
/// Breaks are assumed not to overlap; this is not enforced.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdBreak {
    #[serde(default)]
    pub id: Option<String>,
    /// Playback-time offset of the break start, in seconds.
    #[serde(default)]
    pub start: f64,
    /// Break duration in seconds.
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub ads: Vec<Ad>,
}

impl AdBreak {
    /// Whether `time` falls within `[start, start + duration)`.
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time < self.start + self.duration
    }
}

/// Event type carried by an ad-break tag. Unknown strings are preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdEventType {
    Start,
    Progress,
    Complete,
    Other(String),
}

impl From<&str> for AdEventType {
    fn from(value: &str) -> Self {
        match value {
            "start" => AdEventType::Start,
            "progress" => AdEventType::Progress,
            "complete" => AdEventType::Complete,
            other => AdEventType::Other(other.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for AdEventType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(value.as_str().into())
    }
}

/// Correlation entry for one media-id prefix.
///
/// The live metadata endpoint nests the ad reference under a `tag` object while
/// keeping `type` at the top level; a flat form is accepted as well.
#[derive(Debug, Clone)]
pub struct AdBreakTag {
    /// Id of the ad this tag belongs to. Empty when the endpoint omits it.
    pub ad: String,
    pub ad_break_id: Option<String>,
    pub event: AdEventType,
    /// Opaque fields we do not interpret but keep for logging.
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl<'de> Deserialize<'de> for AdBreakTag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize, Default)]
        struct NestedTag {
            #[serde(default)]
            ad: Option<String>,
            #[serde(default)]
            ad_break_id: Option<String>,
        }

        #[derive(Deserialize)]
        struct WireTag {
            #[serde(rename = "type", default)]
            event: Option<AdEventType>,
            #[serde(default)]
            ad: Option<String>,
            #[serde(default)]
            ad_break_id: Option<String>,
            #[serde(default)]
            tag: Option<NestedTag>,
            #[serde(flatten)]
            extra: serde_json::Map<String, serde_json::Value>,
        }

        let wire = WireTag::deserialize(deserializer)?;
        let nested = wire.tag.unwrap_or_default();
        Ok(AdBreakTag {
            ad: wire.ad.or(nested.ad).unwrap_or_default(),
            ad_break_id: wire.ad_break_id.or(nested.ad_break_id),
            event: wire.event.unwrap_or_else(|| AdEventType::Other(String::new())),
            extra: wire.extra,
        })
    }
}

/// Ordered table of media-id prefixes.
///
/// Iteration order is the document order of the metadata response, which pins
/// first-match-wins prefix resolution. Accepts a JSON object or a list of
/// `[prefix, tag]` pairs.
#[derive(Debug, Clone, Default)]
pub struct TagTable(Vec<(String, AdBreakTag)>);

impl TagTable {
    pub fn iter(&self) -> impl Iterator<Item = &(String, AdBreakTag)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, AdBreakTag)> for TagTable {
    fn from_iter<T: IntoIterator<Item = (String, AdBreakTag)>>(iter: T) -> Self {
        TagTable(iter.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for TagTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = TagTable;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a prefix-keyed map of tags or a list of [prefix, tag] pairs")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, AdBreakTag>()? {
                    entries.push(entry);
                }
                Ok(TagTable(entries))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut entries = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(entry) = seq.next_element::<(String, AdBreakTag)>()? {
                    entries.push(entry);
                }
                Ok(TagTable(entries))
            }
        }

        deserializer.deserialize_any(TableVisitor)
    }
}

/// Upcoming ad breaks. Accepts a JSON array or an object keyed by break id;
/// in the keyed form the key becomes the break's id when the break has none.
#[derive(Debug, Clone, Default)]
pub struct BreakList(Vec<AdBreak>);

impl Deref for BreakList {
    type Target = [AdBreak];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<AdBreak>> for BreakList {
    fn from(breaks: Vec<AdBreak>) -> Self {
        BreakList(breaks)
    }
}

impl<'de> Deserialize<'de> for BreakList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ListVisitor;

        impl<'de> Visitor<'de> for ListVisitor {
            type Value = BreakList;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a list of ad breaks or a map keyed by break id")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut breaks = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((id, mut ad_break)) = map.next_entry::<String, AdBreak>()? {
                    ad_break.id.get_or_insert(id);
                    breaks.push(ad_break);
                }
                Ok(BreakList(breaks))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut breaks = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(ad_break) = seq.next_element::<AdBreak>()? {
                    breaks.push(ad_break);
                }
                Ok(BreakList(breaks))
            }
        }

        deserializer.deserialize_any(ListVisitor)
    }
}

/// Ads keyed by ad id. Accepts an id-keyed JSON object or an array of ads,
/// in which case each ad's own `id` field is the key (ads without an id are
/// dropped).
#[derive(Debug, Clone, Default)]
pub struct AdMap(HashMap<String, Ad>);

impl Deref for AdMap {
    type Target = HashMap<String, Ad>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromIterator<(String, Ad)> for AdMap {
    fn from_iter<T: IntoIterator<Item = (String, Ad)>>(iter: T) -> Self {
        AdMap(iter.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for AdMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct AdMapVisitor;

        impl<'de> Visitor<'de> for AdMapVisitor {
            type Value = AdMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of ads keyed by ad id or a list of ads")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut ads = HashMap::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((id, mut ad)) = map.next_entry::<String, Ad>()? {
                    ad.id.get_or_insert_with(|| id.clone());
                    ads.insert(id, ad);
                }
                Ok(AdMap(ads))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut ads = HashMap::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(ad) = seq.next_element::<Ad>()? {
                    if let Some(id) = ad.id.clone() {
                        ads.insert(id, ad);
                    }
                }
                Ok(AdMap(ads))
            }
        }

        deserializer.deserialize_any(AdMapVisitor)
    }
}

/// Snapshot of the metadata endpoint. Replaced wholesale on every poll tick,
/// never merged field by field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetadataStore {
    #[serde(default)]
    pub tags: TagTable,
    #[serde(default)]
    pub ad_breaks: BreakList,
    #[serde(default)]
    pub ads: AdMap,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_table_keeps_document_order() {
        let json = r#"{
            "google_ad_1_progress": {"type": "progress", "tag": {"ad": "ad-1"}},
            "google_ad_1": {"type": "start", "tag": {"ad": "ad-1"}}
        }"#;
        let table: TagTable = serde_json::from_str(json).unwrap();
        let prefixes: Vec<_> = table.iter().map(|(prefix, _)| prefix.as_str()).collect();
        assert_eq!(prefixes, vec!["google_ad_1_progress", "google_ad_1"]);
    }

    #[test]
    fn tag_table_accepts_pair_list() {
        let json = r#"[
            ["google_ad_2", {"type": "complete", "ad": "ad-2"}]
        ]"#;
        let table: TagTable = serde_json::from_str(json).unwrap();
        let (prefix, tag) = table.iter().next().unwrap();
        assert_eq!(prefix, "google_ad_2");
        assert_eq!(tag.ad, "ad-2");
        assert_eq!(tag.event, AdEventType::Complete);
    }

    #[test]
    fn break_list_injects_map_keys() {
        let json = r#"{"break-1": {"start": 10.0, "duration": 30.0}}"#;
        let breaks: BreakList = serde_json::from_str(json).unwrap();
        assert_eq!(breaks.len(), 1);
        assert_eq!(breaks[0].id.as_deref(), Some("break-1"));
    }

    #[test]
    fn ad_map_accepts_both_forms() {
        let keyed: AdMap =
            serde_json::from_str(r#"{"ad-1": {"slate": true, "duration": 15.0}}"#).unwrap();
        assert!(keyed.get("ad-1").unwrap().slate);

        let listed: AdMap =
            serde_json::from_str(r#"[{"id": "ad-2", "duration": 15.0}, {"duration": 5.0}]"#)
                .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed.get("ad-2").unwrap().duration, 15.0);
    }

    #[test]
    fn unknown_event_types_are_preserved() {
        let tag: AdBreakTag =
            serde_json::from_str(r#"{"type": "firstquartile", "ad": "ad-1"}"#).unwrap();
        assert_eq!(tag.event, AdEventType::Other("firstquartile".to_string()));
    }

    #[test]
    fn missing_tag_fields_default() {
        let tag: AdBreakTag = serde_json::from_str(r#"{"seen": 1}"#).unwrap();
        assert_eq!(tag.ad, "");
        assert_eq!(tag.event, AdEventType::Other(String::new()));
        assert!(tag.extra.contains_key("seen"));
    }
}
