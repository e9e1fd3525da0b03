//! The three tools. Each owns a [`Session`] that enforces the
//! `Empty → Loaded → Cropped → Submitting → Completed | Failed` ordering.

pub mod enhance;
pub mod perspective;
pub mod sketch;

pub use enhance::EnhanceFlow;
pub use perspective::PerspectiveFlow;
pub use sketch::SketchFlow;

use crate::{
    codec::{DownloadFormat, SourceImage},
    download::{prepare_download, Download},
    error::{Result, StudioError},
    models::ResultImage,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Empty,
    Loaded,
    Cropped,
    Submitting,
    Completed,
    Failed,
}

#[derive(Debug, Default)]
pub struct Session {
    stage: Stage,
    source: Option<SourceImage>,
    results: Vec<ResultImage>,
    error: Option<String>,
}

impl Session {
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    pub fn results(&self) -> &[ResultImage] {
        &self.results
    }

    /// Message of the last failed action, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Drop everything and go back to `Empty`.
    pub fn reset(&mut self) {
        *self = Session::default();
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.stage == Stage::Submitting {
            return Err(StudioError::Validation(
                "A generation is already in progress.".into(),
            ));
        }
        Ok(())
    }

    fn require_source(&self, message: &str) -> Result<&SourceImage> {
        self.source
            .as_ref()
            .ok_or_else(|| StudioError::Validation(message.to_string()))
    }

    /// Replace the source; previous results and errors go with it.
    fn load(&mut self, source: SourceImage) -> Result<()> {
        self.ensure_idle()?;
        log::info!(
            "Loaded {} ({}, {} bytes)",
            source.file_name(),
            source.mime_type(),
            source.bytes().len()
        );
        self.source = Some(source);
        self.results.clear();
        self.error = None;
        self.stage = Stage::Loaded;
        Ok(())
    }

    fn set_cropped(&mut self, cropped: bool) {
        if self.source.is_some() && self.stage != Stage::Submitting {
            self.stage = if cropped { Stage::Cropped } else { Stage::Loaded };
        }
    }

    /// Record an error raised before any remote call.
    fn reject(&mut self, err: StudioError) -> StudioError {
        self.error = Some(err.to_string());
        if !err.is_user_correctable() {
            self.results.clear();
            self.stage = Stage::Failed;
        }
        err
    }

    fn begin(&mut self) -> Result<Stage> {
        self.ensure_idle()?;
        let previous = self.stage;
        self.stage = Stage::Submitting;
        self.error = None;
        Ok(previous)
    }

    /// Leave `Submitting` for an action that does not produce results.
    fn restore(&mut self, previous: Stage, outcome: &Result<String>) {
        self.stage = previous;
        if let Err(e) = outcome {
            self.error = Some(e.to_string());
        }
    }

    fn finish(&mut self, outcome: Result<Vec<ResultImage>>) -> Result<&[ResultImage]> {
        match outcome {
            Ok(results) => {
                log::info!("Generated {} images", results.len());
                self.results = results;
                self.stage = Stage::Completed;
                Ok(&self.results)
            }
            Err(e) => {
                log::error!("Generation failed: {}", e);
                self.results.clear();
                self.error = Some(e.to_string());
                self.stage = Stage::Failed;
                Err(e)
            }
        }
    }

    fn downloads(&self, label: &str, format: DownloadFormat) -> Result<Vec<Download>> {
        let stem = self.source.as_ref().map(|s| s.stem()).unwrap_or("image");
        self.results
            .iter()
            .map(|result| prepare_download(result, stem, label, format))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::tests::png_source;

    #[test]
    fn new_session_is_empty() {
        let session = Session::default();
        assert_eq!(session.stage(), Stage::Empty);
        assert!(session.source().is_none());
        assert!(session.results().is_empty());
    }

    #[test]
    fn cannot_load_while_submitting() {
        let mut session = Session::default();
        session.load(png_source(4, 4)).unwrap();
        session.begin().unwrap();

        let err = session.load(png_source(4, 4)).unwrap_err();
        assert!(err.is_user_correctable());
        assert!(session.begin().is_err());
        assert_eq!(session.stage(), Stage::Submitting);
    }

    #[test]
    fn failure_clears_results() {
        let mut session = Session::default();
        session.load(png_source(4, 4)).unwrap();
        session.begin().unwrap();
        session
            .finish(Ok(vec![ResultImage {
                index: 1,
                image: crate::codec::EncodedImage::new("AAAA", "image/png"),
            }]))
            .unwrap();
        assert_eq!(session.stage(), Stage::Completed);

        session.begin().unwrap();
        let err = session
            .finish(Err(StudioError::IncompleteGeneration {
                obtained: 1,
                expected: 2,
            }))
            .unwrap_err();
        assert!(matches!(err, StudioError::IncompleteGeneration { .. }));
        assert_eq!(session.stage(), Stage::Failed);
        assert!(session.results().is_empty());
        assert_eq!(
            session.error(),
            Some("AI failed to generate the requested number of images. Got 1, expected 2.")
        );
    }

    #[test]
    fn reload_replaces_results_and_error() {
        let mut session = Session::default();
        session.load(png_source(4, 4)).unwrap();
        session.reject(StudioError::Decode("bad".into()));
        assert_eq!(session.stage(), Stage::Failed);

        session.load(png_source(8, 8)).unwrap();
        assert_eq!(session.stage(), Stage::Loaded);
        assert!(session.error().is_none());
    }
}
