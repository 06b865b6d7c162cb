use crate::engine::EngineEvent;

/// Inputs serialized onto the controller's update thread.
///
/// Pollers and engine adapters run on other threads; they only ever touch the
/// channel sender, and the host drains the receiver into
/// [`crate::controller::VastVideoController::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    /// Asynchronous callback forwarded from the media engine.
    Engine(EngineEvent),
    /// Fast tick: progress bar, progress trackers, icon overlay.
    ProgressTick,
    /// Slow tick: countdown widget and close-control gating.
    CountdownTick,
    /// User tapped the close/skip control.
    CloseTapped,
    /// User tapped the video surface or the CTA button.
    ClickThrough,
    /// User tapped the industry icon, or its embedded content requested a
    /// navigation (never followed, only tracked).
    IconClicked,
    /// The icon's embedded content renderer went away.
    IconRenderLost,
}
