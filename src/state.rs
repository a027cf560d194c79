//! Session-wide request state observed by the presentation layer.

use crate::image::AspectRatio;
use serde::Serialize;

/// Lifecycle phase of the generation controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// No request in flight; submissions are accepted.
    Idle,
    /// A request is in flight; submissions are rejected.
    Generating,
}

/// Transient UI state: prompt input, ratio selection, in-flight flag and
/// the last error message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequestState {
    /// Current contents of the prompt input.
    pub prompt: String,
    /// Currently selected ratio; applies to the next submission.
    pub aspect_ratio: AspectRatio,
    /// True while a generation is in flight.
    pub generating: bool,
    /// Message from the last failed attempt.
    pub error: Option<String>,
}

impl GenerationRequestState {
    /// Creates an idle state with the given ratio selected.
    pub fn with_aspect_ratio(aspect_ratio: AspectRatio) -> Self {
        Self {
            aspect_ratio,
            ..Self::default()
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        if self.generating {
            Phase::Generating
        } else {
            Phase::Idle
        }
    }

    /// Whether a submission of the current prompt would be accepted.
    ///
    /// Mirrors the guard in the controller; presentation layers use it to
    /// enable or disable their submit control.
    pub fn can_submit(&self) -> bool {
        !self.generating && !self.prompt.trim().is_empty()
    }
}
