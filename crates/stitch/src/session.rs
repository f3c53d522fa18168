use std::{
    sync::{Arc, Mutex as StdMutex},
    time::Duration,
};

use reqwest::Client;
use tokio::{
    sync::{Mutex, RwLock},
    task::JoinHandle,
};
use url::Url;

use crate::{
    api::{self, StreamInfo, StreamMode},
    correlate::{correlate, should_verify},
    error::{StitchError, StitchResult},
    model::MetadataStore,
    queue::TimedIdQueue,
    resolve::{resolver_for, AdResolver},
    timed_meta::{extract_media_id, TimedMetaSample},
    verify::Verifier,
    PlayerSurface,
};

/// How often due media ids are consumed from the queue.
const MEDIA_ID_TICK: Duration = Duration::from_secs(1);

/// How often the controls toggle is refreshed.
const CONTROLS_TICK: Duration = Duration::from_millis(500);

/// One playback session over a stitched stream.
///
/// Owns every piece of mutable state (metadata snapshot, timed-id queue,
/// resolver, polling tasks), so multiple sessions can coexist and tests need
/// no shared globals. The embedder feeds it timed metadata from the playback
/// engine and drives play/pause; everything else runs on session-owned tasks.
pub struct Session {
    inner: Arc<SessionInner>,
    tasks: StdMutex<Vec<JoinHandle<()>>>,
}

struct SessionInner {
    client: Client,
    info: StreamInfo,
    surface: Arc<dyn PlayerSurface>,
    store: RwLock<MetadataStore>,
    queue: Mutex<TimedIdQueue>,
    resolver: Mutex<Box<dyn AdResolver>>,
    verifier: Verifier,
}

impl Session {
    /// Creates the stream via the stream-creation API and wraps it in a
    /// session. Bootstrap validation failures are fatal here.
    pub async fn create(
        client: Client,
        api_url: &str,
        params: &[(String, String)],
        mode: StreamMode,
        surface: Arc<dyn PlayerSurface>,
    ) -> StitchResult<Self> {
        let info = api::create_stream(&client, api_url, params, mode).await?;
        Ok(Self::new(client, info, surface))
    }

    pub fn new(client: Client, info: StreamInfo, surface: Arc<dyn PlayerSurface>) -> Self {
        let store = MetadataStore {
            ad_breaks: info.ad_breaks.clone().into(),
            ..Default::default()
        };
        let verifier = Verifier::new(client.clone(), info.verification_url.clone());
        let resolver = resolver_for(info.mode);

        Self {
            inner: Arc::new(SessionInner {
                client,
                info,
                surface,
                store: RwLock::new(store),
                queue: Mutex::new(TimedIdQueue::new()),
                resolver: Mutex::new(resolver),
                verifier,
            }),
            tasks: StdMutex::new(Vec::new()),
        }
    }

    /// The stitched manifest to hand to the playback engine.
    pub fn manifest_url(&self) -> &str {
        &self.inner.info.manifest_url
    }

    pub fn stream_info(&self) -> &StreamInfo {
        &self.inner.info
    }

    /// Feeds timed in-band metadata samples from the playback engine. Each
    /// sample's media id is queued until playback reaches its timestamp.
    pub async fn on_timed_metadata(&self, samples: &[TimedMetaSample]) {
        let mut queue = self.inner.queue.lock().await;
        for sample in samples {
            match extract_media_id(&sample.data) {
                Some(media_id) => queue.push(media_id, sample.pts),
                None => log::debug!("Dropping in-band sample without a media id marker"),
            }
        }
    }

    /// Fetches the metadata endpoint once and replaces the store wholesale.
    pub async fn poll_metadata(&self) -> StitchResult<()> {
        self.inner.poll_metadata().await
    }

    /// Consumes due media ids: correlate, drive the resolver, fire beacons.
    pub async fn process_media_ids(&self) {
        self.inner.process_media_ids().await;
    }

    /// Refreshes the player's controls toggle (and runs the ad watchdog).
    pub async fn update_controls(&self) {
        self.inner.update_controls().await;
    }

    /// Starts the session's periodic tasks: metadata polling, media-id
    /// consumption and controls refresh. Idempotent while playing.
    ///
    /// Must be called within a tokio runtime.
    pub fn play(&self) {
        let Ok(mut tasks) = self.tasks.lock() else {
            return;
        };
        if !tasks.is_empty() {
            return;
        }

        if self.inner.info.metadata_url.is_some() {
            let inner = self.inner.clone();
            tasks.push(tokio::spawn(async move {
                loop {
                    // A response landing after pause() is simply dropped with
                    // the task; stale responses are otherwise not detected.
                    if let Err(error) = inner.poll_metadata().await {
                        log::warn!("Metadata poll failed: {error}");
                    }
                    tokio::time::sleep(inner.info.polling_interval).await;
                }
            }));
        }

        let inner = self.inner.clone();
        tasks.push(tokio::spawn(async move {
            loop {
                inner.process_media_ids().await;
                tokio::time::sleep(MEDIA_ID_TICK).await;
            }
        }));

        let inner = self.inner.clone();
        tasks.push(tokio::spawn(async move {
            loop {
                inner.update_controls().await;
                tokio::time::sleep(CONTROLS_TICK).await;
            }
        }));

        log::info!("Session playing");
    }

    /// Stops the periodic tasks. Outstanding requests are not cancelled, only
    /// their results ignored.
    pub fn pause(&self) {
        let Ok(mut tasks) = self.tasks.lock() else {
            return;
        };
        for task in tasks.drain(..) {
            task.abort();
        }
        log::info!("Session paused");
    }

    /// The sanitized click-through URL of the currently playing ad, or None
    /// when no ad is playing or the ad carries no click-through.
    ///
    /// The session never opens the URL itself; that is the embedder's job.
    pub async fn clickthrough(&self) -> StitchResult<Option<Url>> {
        let current_time = self.inner.surface.position();
        let store = self.inner.store.read().await;
        let mut resolver = self.inner.resolver.lock().await;

        let Some(ad) = resolver.current_ad(&store, current_time) else {
            log::info!("No current ad");
            return Ok(None);
        };
        let Some(raw) = ad.clickthrough_url.filter(|url| !url.is_empty()) else {
            return Ok(None);
        };
        log::info!("Ad clicked: {raw}");
        sanitize_clickthrough(&raw).map(Some)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Ok(mut tasks) = self.tasks.lock() {
            for task in tasks.drain(..) {
                task.abort();
            }
        }
    }
}

impl SessionInner {
    async fn poll_metadata(&self) -> StitchResult<()> {
        let Some(metadata_url) = &self.info.metadata_url else {
            return Ok(());
        };

        let response = self.client.get(metadata_url).send().await?;
        if !response.status().is_success() {
            return Err(StitchError::HttpError(response.status()));
        }
        let body = response.bytes().await?;
        let snapshot: MetadataStore = serde_json::from_slice(&body)?;
        log::debug!(
            "Metadata updated: {} tags, {} breaks, {} ads",
            snapshot.tags.len(),
            snapshot.ad_breaks.len(),
            snapshot.ads.len()
        );

        // Wholesale replacement, never a merge.
        *self.store.write().await = snapshot;
        Ok(())
    }

    async fn process_media_ids(&self) {
        let current_time = self.surface.position();
        let store = self.store.read().await;
        let mut resolver = self.resolver.lock().await;
        let mut queue = self.queue.lock().await;

        let mut to_verify = Vec::new();
        queue.consume_ready(current_time, |media_id| {
            let info = correlate(&store, media_id);
            if let Some(info) = &info {
                log::info!(
                    "Media id {media_id} correlated to ad {ad} ({event:?})",
                    ad = info.ad,
                    event = info.event
                );
                resolver.on_ad_event(info, &store, current_time);
            }
            if should_verify(info.as_ref()) {
                to_verify.push(media_id.to_string());
            }
        });
        drop(queue);
        drop(resolver);
        drop(store);

        // Fire-and-forget: outcomes are classified and logged by the verifier.
        for media_id in to_verify {
            let verifier = self.verifier.clone();
            tokio::spawn(async move {
                if let Err(error) = verifier.verify(&media_id).await {
                    log::error!("Media verification request failed: {error}");
                }
            });
        }
    }

    async fn update_controls(&self) {
        let current_time = self.surface.position();
        let store = self.store.read().await;
        let mut resolver = self.resolver.lock().await;
        let enabled = resolver.controls_enabled(&store, current_time);
        self.surface.set_controls_enabled(enabled);
    }
}

/// Sanitizes an ad click-through URL before it is handed to the embedder.
///
/// Scheme-relative URLs (`//host/path`) are normalized to https. The
/// `javascript:` scheme is rejected: click-through URLs come from ad metadata
/// and must not be able to inject script into the embedder.
pub fn sanitize_clickthrough(raw: &str) -> StitchResult<Url> {
    let normalized = if let Some(rest) = raw.strip_prefix("//") {
        format!("https://{rest}")
    } else {
        raw.to_string()
    };

    let url = Url::parse(&normalized)?;
    if url.scheme() == "javascript" {
        return Err(StitchError::InvalidClickthrough(raw.to_string()));
    }
    Ok(url)
}
