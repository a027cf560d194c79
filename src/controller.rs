//! Generation request lifecycle.
//!
//! [`GenerationController`] turns a prompt into at most one in-flight
//! provider request, parses the outcome and commits successful results to
//! the gallery. The controller is the only writer of both the
//! [`GenerationRequestState`] and the [`GalleryStore`]; observers follow
//! them through [`watch`] receivers.
//!
//! All methods take `&self`, so prompt and ratio edits can interleave with an
//! in-flight [`submit`](GenerationController::submit) on the same task. The
//! request captures its prompt and ratio when it starts; later edits only
//! affect the next submission.

use crate::error::{FailureKind, LuminaError};
use crate::gallery::{GalleryLimit, GalleryStore};
use crate::image::{AspectRatio, GeneratedImage, GenerationRequest, ImageProvider};
use crate::state::GenerationRequestState;
use chrono::Utc;
use tokio::sync::watch;

/// Why a submission was dropped without contacting the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The prompt was empty or whitespace-only.
    EmptyPrompt,
    /// Another generation is already in flight.
    AlreadyGenerating,
}

/// A failed generation attempt, as surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationFailure {
    /// Failure classification.
    pub kind: FailureKind,
    /// Short user-visible message.
    pub message: String,
}

impl From<&LuminaError> for GenerationFailure {
    fn from(err: &LuminaError) -> Self {
        Self {
            kind: err.failure_kind(),
            message: err.user_message(),
        }
    }
}

impl std::fmt::Display for GenerationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Result of a call to [`GenerationController::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a submission may have been rejected or failed"]
pub enum SubmitOutcome {
    /// Dropped by the input guard; nothing changed.
    Rejected(Rejection),
    /// The image was committed to the front of the gallery.
    Completed(GeneratedImage),
    /// The attempt failed; the gallery is unchanged.
    Failed(GenerationFailure),
}

impl SubmitOutcome {
    /// Returns the committed image, if any.
    pub fn image(&self) -> Option<&GeneratedImage> {
        match self {
            Self::Completed(image) => Some(image),
            _ => None,
        }
    }
}

/// Owns the generation lifecycle and the gallery for one session.
pub struct GenerationController<P> {
    provider: P,
    state: watch::Sender<GenerationRequestState>,
    gallery: watch::Sender<GalleryStore>,
}

impl<P: ImageProvider> GenerationController<P> {
    /// Creates a controller with the default ratio and an unbounded gallery.
    pub fn new(provider: P) -> Self {
        Self::with_options(provider, AspectRatio::default(), GalleryLimit::Unbounded)
    }

    /// Creates a controller with an initial ratio and gallery size policy.
    pub fn with_options(provider: P, aspect_ratio: AspectRatio, limit: GalleryLimit) -> Self {
        let (state, _) = watch::channel(GenerationRequestState::with_aspect_ratio(aspect_ratio));
        let (gallery, _) = watch::channel(GalleryStore::with_limit(limit));
        Self {
            provider,
            state,
            gallery,
        }
    }

    /// The provider requests are sent to.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Snapshot of the current request state.
    pub fn state(&self) -> GenerationRequestState {
        self.state.borrow().clone()
    }

    /// Subscribes to request state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<GenerationRequestState> {
        self.state.subscribe()
    }

    /// Snapshot of the gallery, newest first.
    pub fn gallery(&self) -> Vec<GeneratedImage> {
        self.gallery.borrow().list()
    }

    /// Subscribes to gallery changes.
    pub fn subscribe_gallery(&self) -> watch::Receiver<GalleryStore> {
        self.gallery.subscribe()
    }

    /// Returns true while a generation is in flight.
    pub fn is_generating(&self) -> bool {
        self.state.borrow().generating
    }

    /// Replaces the prompt input text.
    pub fn set_prompt(&self, prompt: impl Into<String>) {
        let prompt = prompt.into();
        self.state.send_if_modified(|s| {
            if s.prompt == prompt {
                return false;
            }
            s.prompt = prompt;
            true
        });
    }

    /// Selects the ratio for the next submission.
    pub fn set_aspect_ratio(&self, aspect_ratio: AspectRatio) {
        self.state.send_if_modified(|s| {
            if s.aspect_ratio == aspect_ratio {
                return false;
            }
            s.aspect_ratio = aspect_ratio;
            true
        });
    }

    /// Submits the prompt and ratio currently held in the request state.
    pub async fn submit_current(&self) -> SubmitOutcome {
        let (prompt, aspect_ratio) = {
            let state = self.state.borrow();
            (state.prompt.clone(), state.aspect_ratio)
        };
        self.submit(&prompt, aspect_ratio).await
    }

    /// Runs one generation for `prompt` at `aspect_ratio`.
    ///
    /// Empty prompts and submissions made while another generation is in
    /// flight are rejected without touching any state. Otherwise exactly one
    /// provider call is made; on success the image is prepended to the
    /// gallery and the prompt input cleared, on failure the error message is
    /// recorded and the prompt input kept for another attempt.
    pub async fn submit(&self, prompt: &str, aspect_ratio: AspectRatio) -> SubmitOutcome {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            tracing::debug!("ignoring submission with empty prompt");
            return SubmitOutcome::Rejected(Rejection::EmptyPrompt);
        }

        let Some(in_flight) = InFlight::acquire(&self.state) else {
            tracing::debug!("ignoring submission while a generation is in flight");
            return SubmitOutcome::Rejected(Rejection::AlreadyGenerating);
        };

        let request = GenerationRequest::new(prompt).with_aspect_ratio(aspect_ratio);
        tracing::info!(aspect_ratio = %aspect_ratio, prompt_len = prompt.len(), "starting generation");

        match self.provider.generate(&request).await {
            Ok(inline) => {
                let timestamp = self.gallery.borrow().next_timestamp(Utc::now());
                let image = GeneratedImage::new(&inline, prompt, timestamp, aspect_ratio);

                self.gallery.send_modify(|gallery| {
                    if let Some(evicted) = gallery.commit(image.clone()) {
                        tracing::debug!(id = evicted.id(), "gallery full, evicted oldest image");
                    }
                });
                in_flight.finish(|s| {
                    s.prompt.clear();
                    s.error = None;
                });

                tracing::info!(id = image.id(), "generation committed to gallery");
                SubmitOutcome::Completed(image)
            }
            Err(err) => {
                let failure = GenerationFailure::from(&err);
                tracing::warn!(kind = %failure.kind, "generation failed: {err}");

                in_flight.finish(|s| s.error = Some(failure.message.clone()));
                SubmitOutcome::Failed(failure)
            }
        }
    }
}

/// Holds the in-flight flag for one submission.
///
/// The flag is cleared exactly once: by [`finish`](InFlight::finish) on the
/// normal paths, or on drop if the submission future is dropped or unwinds.
struct InFlight<'a> {
    state: &'a watch::Sender<GenerationRequestState>,
    armed: bool,
}

impl<'a> InFlight<'a> {
    fn acquire(state: &'a watch::Sender<GenerationRequestState>) -> Option<Self> {
        let acquired = state.send_if_modified(|s| {
            if s.generating {
                return false;
            }
            s.generating = true;
            s.error = None;
            true
        });
        if acquired {
            Some(Self { state, armed: true })
        } else {
            None
        }
    }

    fn finish(mut self, apply: impl FnOnce(&mut GenerationRequestState)) {
        self.armed = false;
        self.state.send_modify(|s| {
            apply(s);
            s.generating = false;
        });
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state.send_modify(|s| s.generating = false);
        }
    }
}
