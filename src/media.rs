//! Deferred media loading.
//!
//! Each media element owns a small state machine that withholds the real
//! source URL until the element has been revealed by the viewport detector,
//! so the fetch cost is only paid for media the visitor actually reaches.

pub const DEFAULT_VISIBILITY_THRESHOLD: f64 = 0.1;
pub const DEFAULT_ROOT_MARGIN_PX: u32 = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadState {
    /// Created, not yet visible. Only the placeholder may be shown.
    Pending,
    /// Visibility confirmed; the real source is handed to the renderer.
    Revealed,
    /// The underlying media decoded successfully.
    Loaded,
    /// The fetch or decode failed. Back to the placeholder, no retry.
    Errored,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LazyMedia {
    target_src: String,
    placeholder: Option<String>,
    state: LoadState,
}

impl LazyMedia {
    pub fn new(target_src: impl Into<String>, placeholder: Option<String>) -> Self {
        Self {
            target_src: target_src.into(),
            placeholder,
            state: LoadState::Pending,
        }
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.state == LoadState::Loaded
    }

    /// URL the rendering layer should currently display. The real target is
    /// only handed out after the element has been revealed, and an errored
    /// element falls back to the placeholder.
    pub fn current_source(&self) -> Option<&str> {
        match self.state {
            LoadState::Pending | LoadState::Errored => self.placeholder.as_deref(),
            LoadState::Revealed | LoadState::Loaded => Some(&self.target_src),
        }
    }

    /// Viewport reveal signal. Suppressed while `paused` holds; callers
    /// re-deliver the signal once the pause clears. Returns whether the
    /// element transitioned.
    pub fn reveal(&mut self, paused: bool) -> bool {
        if paused || self.state != LoadState::Pending {
            return false;
        }

        self.state = LoadState::Revealed;
        true
    }

    /// Successful decode of the real source.
    pub fn mark_loaded(&mut self) -> bool {
        if self.state != LoadState::Revealed {
            return false;
        }

        self.state = LoadState::Loaded;
        true
    }

    /// Fetch or decode failure. A fresh element is required to re-attempt.
    pub fn mark_errored(&mut self) -> bool {
        if !matches!(self.state, LoadState::Revealed | LoadState::Loaded) {
            return false;
        }

        self.state = LoadState::Errored;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media() -> LazyMedia {
        LazyMedia::new("/images/full.jpg", Some("/images/thumb.jpg".to_string()))
    }

    #[test]
    fn real_source_is_withheld_until_revealed() {
        let media = media();

        assert_eq!(media.state(), LoadState::Pending);
        assert_eq!(media.current_source(), Some("/images/thumb.jpg"));
    }

    #[test]
    fn missing_placeholder_means_no_source_at_all() {
        let media = LazyMedia::new("/images/full.jpg", None);

        assert_eq!(media.current_source(), None);
    }

    #[test]
    fn reveal_hands_out_the_real_source_exactly_once() {
        let mut media = media();

        assert!(media.reveal(false));
        assert_eq!(media.state(), LoadState::Revealed);
        assert_eq!(media.current_source(), Some("/images/full.jpg"));

        // A second reveal signal is a no-op.
        assert!(!media.reveal(false));
    }

    #[test]
    fn pause_suppresses_the_reveal_until_it_clears() {
        let mut media = media();

        assert!(!media.reveal(true));
        assert_eq!(media.current_source(), Some("/images/thumb.jpg"));

        assert!(media.reveal(false));
        assert_eq!(media.current_source(), Some("/images/full.jpg"));
    }

    #[test]
    fn pause_never_regresses_a_revealed_element() {
        let mut media = media();

        assert!(media.reveal(false));
        assert!(!media.reveal(true));
        assert_eq!(media.state(), LoadState::Revealed);
        assert_eq!(media.current_source(), Some("/images/full.jpg"));
    }

    #[test]
    fn load_completes_only_after_reveal() {
        let mut media = media();

        assert!(!media.mark_loaded(), "load before reveal must be ignored");

        media.reveal(false);
        assert!(media.mark_loaded());
        assert!(media.is_loaded());
    }

    #[test]
    fn error_reverts_to_the_placeholder_with_no_retry() {
        let mut media = media();

        media.reveal(false);
        assert!(media.mark_errored());
        assert_eq!(media.state(), LoadState::Errored);
        assert_eq!(media.current_source(), Some("/images/thumb.jpg"));
        assert!(!media.is_loaded());

        // Errored elements stay errored; only a fresh element retries.
        assert!(!media.reveal(false));
        assert!(!media.mark_loaded());
    }

    #[test]
    fn gallery_reveal_is_per_element() {
        let mut gallery: Vec<LazyMedia> = (0..6)
            .map(|index| {
                LazyMedia::new(
                    format!("/gallery/{index}.jpg"),
                    Some("/gallery/blur.jpg".to_string()),
                )
            })
            .collect();

        // Only image #3 crosses into the viewport.
        gallery[3].reveal(false);

        for (index, media) in gallery.iter().enumerate() {
            if index == 3 {
                assert_eq!(media.current_source(), Some("/gallery/3.jpg"));
            } else {
                assert_eq!(media.current_source(), Some("/gallery/blur.jpg"));
            }
        }
    }
}
