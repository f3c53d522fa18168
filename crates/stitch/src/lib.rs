pub mod api;
pub mod correlate;
pub mod error;
pub mod model;
pub mod queue;
pub mod resolve;
pub mod session;
pub mod timed_meta;
pub mod verify;

pub use api::{StreamInfo, StreamMode};
pub use error::{StitchError, StitchResult};
pub use session::Session;

/// The player surface a session talks to.
///
/// The session only ever reads the playback position and toggles the
/// controls; the actual playback engine and UI stay on the embedder's side of
/// this trait.
pub trait PlayerSurface: Send + Sync {
    /// Current playback position in seconds.
    fn position(&self) -> f64;

    /// Shows or hides the player's own controls. Called on every controls
    /// tick; controls are enabled iff no ad is playing.
    fn set_controls_enabled(&self, enabled: bool);
}
