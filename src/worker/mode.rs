use super::backend::InferenceMode;

/// Inference mode state of a loaded model.
///
/// Every model (re)load or unload starts over at `FreshModel`; the first
/// successful call moves to `Tracking` and stays there until the next load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelState {
    /// No call has succeeded since the model was set.
    #[default]
    FreshModel,
    /// At least one call succeeded; track ids persist across calls.
    Tracking,
}

impl ModelState {
    #[inline]
    pub fn mode(self) -> InferenceMode {
        match self {
            ModelState::FreshModel => InferenceMode::Detect,
            ModelState::Tracking => InferenceMode::Track,
        }
    }

    /// State after a successful call, whether or not anything was detected.
    #[inline]
    pub fn after_success(self) -> Self {
        ModelState::Tracking
    }
}
