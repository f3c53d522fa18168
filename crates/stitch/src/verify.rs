use reqwest::{Client, StatusCode};

use crate::error::StitchResult;

/// Classification of a verification beacon response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// 204: verification succeeded.
    Verified,
    /// 202: verification accepted for delayed processing.
    Deferred,
    /// 404: the beacon may have already fired, or may be expired.
    NotFound,
    /// Any other status. Logged, never fatal.
    Unexpected(StatusCode),
}

/// Fires media verification beacons by appending the media id to the
/// verification URL from the stream response.
#[derive(Clone)]
pub struct Verifier {
    client: Client,
    verification_url: String,
}

impl Verifier {
    pub fn new(client: Client, verification_url: impl Into<String>) -> Self {
        Self {
            client,
            verification_url: verification_url.into(),
        }
    }

    /// GETs `verification_url + media_id` and classifies the status code.
    /// No outcome is fatal; transport errors bubble up for the caller to log.
    pub async fn verify(&self, media_id: &str) -> StitchResult<VerifyOutcome> {
        let url = format!("{}{media_id}", self.verification_url);
        log::debug!("Verifying media id {media_id}");
        let response = self.client.get(&url).send().await?;

        let outcome = match response.status() {
            StatusCode::NO_CONTENT => VerifyOutcome::Verified,
            StatusCode::ACCEPTED => VerifyOutcome::Deferred,
            StatusCode::NOT_FOUND => {
                log::warn!(
                    "Media verification not found. This verification may have already fired, or may be expired."
                );
                VerifyOutcome::NotFound
            }
            status => {
                log::error!("Unknown status code from media verification: {status}");
                VerifyOutcome::Unexpected(status)
            }
        };
        Ok(outcome)
    }
}
