//! The viewer state machine.
//!
//! Transitions consume the state and return the next one. Only
//! [`ViewerState::on_submit`] produces work for the outside world (an
//! [`UploadRequest`]); its outcome is fed back through
//! [`ViewerState::on_upload_complete`] once the request has resolved.

use serde::{Deserialize, Deserializer};

use crate::error::ViewerError;
use crate::file::SelectedFile;
use crate::preview::{PreviewHandle, PreviewStore};

/// The single outbound request a submit produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub file: SelectedFile,
}

/// A successful response from the captioning endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct CaptionResult {
    pub caption: String,
    /// Absent and `null` both read as an empty list.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub detected_colors: Vec<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ViewerState {
    selected_file: Option<SelectedFile>,
    preview: Option<PreviewHandle>,
    caption: Option<String>,
    detected_colors: Vec<String>,
    loading: bool,
    error: Option<ViewerError>,
}

impl ViewerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a file-pick event. `None` means the picker closed without a file.
    pub fn on_file_picked(mut self, file: Option<SelectedFile>, previews: &PreviewStore) -> Self {
        // Release the old preview before a new one can be created.
        drop(self.preview.take());

        self.caption = None;
        self.detected_colors.clear();

        match file {
            Some(file) if file.is_image() => {
                tracing::debug!(name = %file.name, content_type = %file.content_type, "image picked");
                self.preview = Some(previews.create(&file));
                self.selected_file = Some(file);
                self.error = None;
            }
            other => {
                if let Some(file) = other {
                    tracing::debug!(name = %file.name, content_type = %file.content_type, "rejected non-image file");
                }
                self.selected_file = None;
                self.error = Some(ViewerError::InvalidFileType);
            }
        }
        self
    }

    /// Applies a submit event, returning the request to perform, if any.
    pub fn on_submit(mut self) -> (Self, Option<UploadRequest>) {
        if self.loading {
            return (self, None);
        }

        let Some(file) = self.selected_file.clone() else {
            self.error = Some(ViewerError::NoFileSelected);
            return (self, None);
        };

        self.loading = true;
        self.error = None;
        (self, Some(UploadRequest { file }))
    }

    /// Applies the outcome of the request issued by [`ViewerState::on_submit`].
    ///
    /// A failure leaves any earlier caption and colors in place.
    pub fn on_upload_complete(mut self, outcome: Result<CaptionResult, ViewerError>) -> Self {
        self.loading = false;
        match outcome {
            Ok(result) => {
                self.caption = Some(result.caption).filter(|c| !c.is_empty());
                self.detected_colors = result.detected_colors;
            }
            Err(err) => {
                tracing::warn!(error = %err, "caption request failed");
                self.error = Some(err);
            }
        }
        self
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected_file.as_ref()
    }

    pub fn preview(&self) -> Option<&PreviewHandle> {
        self.preview.as_ref()
    }

    pub fn preview_url(&self) -> Option<String> {
        self.preview.as_ref().map(PreviewHandle::url)
    }

    pub fn caption(&self) -> Option<&str> {
        self.caption.as_deref()
    }

    pub fn detected_colors(&self) -> &[String] {
        &self.detected_colors
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&ViewerError> {
        self.error.as_ref()
    }

    /// The submit control is enabled only with a file and no request in flight.
    pub fn can_submit(&self) -> bool {
        self.selected_file.is_some() && !self.loading
    }

    /// A settled state without an error; the command line exits non-zero otherwise.
    pub fn succeeded(&self) -> bool {
        !self.loading && self.error.is_none()
    }

    /// True when the result panel has something to show.
    pub fn has_result(&self) -> bool {
        self.caption.is_some() || !self.detected_colors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> SelectedFile {
        SelectedFile::new("car.png", "image/png", b"png-bytes".to_vec())
    }

    fn text() -> SelectedFile {
        SelectedFile::new("notes.txt", "text/plain", b"hello".to_vec())
    }

    fn with_result(store: &PreviewStore) -> ViewerState {
        let (state, request) = ViewerState::new()
            .on_file_picked(Some(image()), store)
            .on_submit();
        assert!(request.is_some());
        state.on_upload_complete(Ok(CaptionResult {
            caption: "a red car".into(),
            detected_colors: vec!["red".into(), "black".into()],
        }))
    }

    #[test]
    fn initial_state_is_empty() {
        let state = ViewerState::new();
        assert!(state.selected_file().is_none());
        assert!(state.preview_url().is_none());
        assert!(state.caption().is_none());
        assert!(state.detected_colors().is_empty());
        assert!(!state.is_loading());
        assert!(state.error().is_none());
        assert!(!state.can_submit());
    }

    #[test]
    fn picking_an_image_sets_file_and_preview_and_clears_results() {
        let store = PreviewStore::new();
        let state = with_result(&store).on_file_picked(Some(image()), &store);

        assert_eq!(state.selected_file(), Some(&image()));
        assert!(state.preview_url().is_some());
        assert!(state.caption().is_none());
        assert!(state.detected_colors().is_empty());
        assert!(state.error().is_none());
        assert!(state.can_submit());
    }

    #[test]
    fn picking_a_non_image_clears_everything_and_sets_error() {
        let store = PreviewStore::new();
        let state = with_result(&store).on_file_picked(Some(text()), &store);

        assert!(state.selected_file().is_none());
        assert!(state.preview_url().is_none());
        assert!(state.caption().is_none());
        assert!(state.detected_colors().is_empty());
        assert_eq!(state.error(), Some(&ViewerError::InvalidFileType));
        assert!(store.is_empty());
    }

    #[test]
    fn picking_nothing_is_an_invalid_pick() {
        let store = PreviewStore::new();
        let state = ViewerState::new()
            .on_file_picked(Some(image()), &store)
            .on_file_picked(None, &store);

        assert!(state.selected_file().is_none());
        assert!(state.preview_url().is_none());
        assert_eq!(state.error(), Some(&ViewerError::InvalidFileType));
    }

    #[test]
    fn valid_pick_clears_previous_error() {
        let store = PreviewStore::new();
        let state = ViewerState::new()
            .on_file_picked(Some(text()), &store)
            .on_file_picked(Some(image()), &store);
        assert!(state.error().is_none());
    }

    #[test]
    fn repicking_releases_the_previous_preview() {
        let store = PreviewStore::new();
        let state = ViewerState::new().on_file_picked(Some(image()), &store);
        let first_key = state.preview().unwrap().key().to_string();

        let other = SelectedFile::new("tree.jpg", "image/jpeg", b"jpeg".to_vec());
        let state = state.on_file_picked(Some(other), &store);

        assert!(store.get(&first_key).is_none());
        assert_eq!(store.len(), 1);
        drop(state);
        assert!(store.is_empty(), "teardown releases the preview");
    }

    #[test]
    fn picking_the_same_file_twice_is_idempotent() {
        let store = PreviewStore::new();
        let once = ViewerState::new().on_file_picked(Some(image()), &store);
        let once_url = once.preview_url();
        drop(once);

        let twice = ViewerState::new()
            .on_file_picked(Some(image()), &store)
            .on_file_picked(Some(image()), &store);

        assert_eq!(twice.preview_url(), once_url);
        assert_eq!(twice.selected_file(), Some(&image()));
        assert!(twice.error().is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn submit_without_file_issues_no_request() {
        let (state, request) = ViewerState::new().on_submit();
        assert!(request.is_none());
        assert!(!state.is_loading());
        assert_eq!(state.error(), Some(&ViewerError::NoFileSelected));
    }

    #[test]
    fn submit_with_file_starts_loading() {
        let store = PreviewStore::new();
        let (state, request) = ViewerState::new()
            .on_file_picked(Some(image()), &store)
            .on_submit();

        assert_eq!(request, Some(UploadRequest { file: image() }));
        assert!(state.is_loading());
        assert!(state.error().is_none());
        assert!(!state.can_submit());
    }

    #[test]
    fn submit_while_loading_is_ignored() {
        let store = PreviewStore::new();
        let (state, _) = ViewerState::new()
            .on_file_picked(Some(image()), &store)
            .on_submit();
        let (state, second) = state.on_submit();

        assert!(second.is_none());
        assert!(state.is_loading());
        assert!(!state.can_submit());
    }

    #[test]
    fn success_sets_caption_and_colors() {
        let store = PreviewStore::new();
        let state = with_result(&store);

        assert_eq!(state.caption(), Some("a red car"));
        assert_eq!(state.detected_colors(), ["red", "black"]);
        assert!(state.error().is_none());
        assert!(!state.is_loading());
        assert!(state.has_result());
    }

    #[test]
    fn success_without_colors_yields_empty_list() {
        let result: CaptionResult = serde_json::from_str(r#"{"caption":"a tree"}"#).unwrap();
        let store = PreviewStore::new();
        let (state, _) = ViewerState::new()
            .on_file_picked(Some(image()), &store)
            .on_submit();
        let state = state.on_upload_complete(Ok(result));

        assert_eq!(state.caption(), Some("a tree"));
        assert!(state.detected_colors().is_empty());
    }

    #[test]
    fn null_colors_deserialize_as_empty() {
        let result: CaptionResult =
            serde_json::from_str(r#"{"caption":"a tree","detected_colors":null}"#).unwrap();
        assert!(result.detected_colors.is_empty());
        assert!(serde_json::from_str::<CaptionResult>(r#"{"detected_colors":[]}"#).is_err());
    }

    #[test]
    fn failure_sets_error_and_keeps_previous_result() {
        let store = PreviewStore::new();
        let (state, request) = with_result(&store).on_submit();
        assert!(request.is_some());
        assert!(state.error().is_none());

        let state = state.on_upload_complete(Err(ViewerError::ServerRejected(
            "unsupported format".into(),
        )));

        assert!(!state.is_loading());
        assert!(state
            .error()
            .unwrap()
            .to_string()
            .contains("unsupported format"));
        assert_eq!(state.caption(), Some("a red car"));
        assert_eq!(state.detected_colors(), ["red", "black"]);
    }

    #[test]
    fn empty_caption_is_not_shown() {
        let store = PreviewStore::new();
        let (state, _) = ViewerState::new()
            .on_file_picked(Some(image()), &store)
            .on_submit();
        let state = state.on_upload_complete(Ok(CaptionResult::default()));

        assert!(state.caption().is_none());
        assert!(!state.has_result());
    }
}
