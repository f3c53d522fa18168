/// Marker preceding the media identifier inside an in-band metadata payload.
pub const MEDIA_ID_MARKER: &str = "google_";

/// One timed metadata sample from the playback engine: an opaque byte payload
/// plus its presentation timestamp in seconds.
#[derive(Debug, Clone)]
pub struct TimedMetaSample {
    pub data: Vec<u8>,
    pub pts: f64,
}

impl TimedMetaSample {
    pub fn new(data: impl Into<Vec<u8>>, pts: f64) -> Self {
        Self {
            data: data.into(),
            pts,
        }
    }
}

/// Extracts the media identifier from a sample payload: the payload is decoded
/// as UTF-8 (lossily) and the substring starting at the first marker
/// occurrence is the id. Payloads without the marker yield nothing.
pub fn extract_media_id(data: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(data);
    let start = text.find(MEDIA_ID_MARKER)?;
    Some(text[start..].to_string())
}
