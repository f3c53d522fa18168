use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::{
    error::{StitchError, StitchResult},
    model::{AdBreak, BreakList},
};

/// Metadata polling interval used when the stream response omits
/// `polling_frequency`.
pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_secs(10);

/// Selects how the current ad is resolved during playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    /// In-band tags drive an explicit ad lifecycle.
    Live,
    /// The current ad is derived from the inline break schedule.
    Vod,
}

#[derive(Debug, Deserialize)]
struct StreamResponse {
    /// The VOD endpoint names this field `hls_master_playlist`.
    #[serde(default, alias = "hls_master_playlist")]
    stream_manifest: Option<String>,
    #[serde(default)]
    media_verification_url: Option<String>,
    /// Polling frequency in seconds.
    #[serde(default)]
    polling_frequency: Option<f64>,
    #[serde(default)]
    metadata_url: Option<String>,
    #[serde(default)]
    ad_breaks: Option<BreakList>,
}

/// Validated stream-creation response.
#[derive(Debug, Clone)]
pub struct StreamInfo {
    pub mode: StreamMode,
    pub manifest_url: String,
    pub verification_url: String,
    /// Required for live streams, optional for VOD.
    pub metadata_url: Option<String>,
    pub polling_interval: Duration,
    /// Ad breaks delivered inline with the stream response (VOD).
    pub ad_breaks: Vec<AdBreak>,
}

impl StreamInfo {
    fn from_response(response: StreamResponse, mode: StreamMode) -> StitchResult<Self> {
        let manifest_url = response
            .stream_manifest
            .filter(|url| !url.is_empty())
            .ok_or(StitchError::MissingManifest)?;
        let verification_url = response
            .media_verification_url
            .filter(|url| !url.is_empty())
            .ok_or(StitchError::MissingVerificationUrl)?;
        let metadata_url = response.metadata_url.filter(|url| !url.is_empty());
        if mode == StreamMode::Live && metadata_url.is_none() {
            return Err(StitchError::MissingMetadataUrl);
        }

        // try_from_secs_f64 rejects NaN, negative and out-of-range values;
        // a nonsensical frequency falls back to the documented default.
        let polling_interval = response
            .polling_frequency
            .filter(|seconds| *seconds > 0.0)
            .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
            .unwrap_or(DEFAULT_POLLING_INTERVAL);

        Ok(Self {
            mode,
            manifest_url,
            verification_url,
            metadata_url,
            polling_interval,
            ad_breaks: response.ad_breaks.map(|b| b.to_vec()).unwrap_or_default(),
        })
    }
}

/// Creates a DAI stream by POSTing a form-encoded request to the stream API.
///
/// `params` carries targeting key-values and is sent as
/// `application/x-www-form-urlencoded`. The API responds with 201 Created;
/// anything else is fatal to session startup.
pub async fn create_stream(
    client: &Client,
    api_url: &str,
    params: &[(String, String)],
    mode: StreamMode,
) -> StitchResult<StreamInfo> {
    log::info!("Sending stream request to {api_url}");
    let response = client.post(api_url).form(params).send().await?;
    if response.status() != StatusCode::CREATED {
        return Err(StitchError::StreamCreationError(response.status()));
    }

    let body = response.bytes().await?;
    let response: StreamResponse = serde_json::from_slice(&body)?;
    log::info!("Stream created");
    StreamInfo::from_response(response, mode)
}
