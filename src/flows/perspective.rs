use super::{Session, Stage};
use crate::{
    codec::{decode_to_base64, DownloadFormat, SourceImage},
    download::Download,
    error::Result,
    genai::GenAiClient,
    logger,
    models::ResultImage,
    prompt::{perspective_prompts, PerspectiveOptions, PERSPECTIVE_DEFAULT_PROMPT},
};

const LABEL: &str = "perspective";

/// Four views of the whole image, one per camera template.
#[derive(Debug)]
pub struct PerspectiveFlow {
    session: Session,
    prompt: String,
    options: PerspectiveOptions,
}

impl Default for PerspectiveFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl PerspectiveFlow {
    pub fn new() -> Self {
        Self {
            session: Session::default(),
            prompt: PERSPECTIVE_DEFAULT_PROMPT.to_string(),
            options: PerspectiveOptions::default(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn stage(&self) -> Stage {
        self.session.stage()
    }

    pub fn results(&self) -> &[ResultImage] {
        self.session.results()
    }

    pub fn options(&self) -> &PerspectiveOptions {
        &self.options
    }

    pub fn load(&mut self, source: SourceImage) -> Result<()> {
        self.session.load(source)
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    pub fn set_options(&mut self, options: PerspectiveOptions) {
        self.options = options;
    }

    pub fn prompts(&self) -> Vec<String> {
        perspective_prompts(&self.prompt, &self.options)
    }

    pub async fn submit(&mut self, client: &GenAiClient) -> Result<&[ResultImage]> {
        self.session.ensure_idle()?;
        let prepared = self
            .session
            .require_source("Please upload a source image first.")
            .and_then(decode_to_base64);
        let payload = match prepared {
            Ok(payload) => payload,
            Err(e) => return Err(self.session.reject(e)),
        };
        let prompts = self.prompts();

        self.session.begin()?;
        let _timer = logger::timer("perspective");
        let outcome = client
            .image()
            .generate_variations(&payload, &prompts)
            .await;
        self.session.finish(outcome)
    }

    pub fn downloads(&self, format: DownloadFormat) -> Result<Vec<Download>> {
        self.session.downloads(LABEL, format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::tests::png_source;
    use crate::error::StudioError;
    use crate::genai::mock::{MockBackend, MockReply};
    use crate::prompt::{CameraEffect, CameraHeight, PERSPECTIVE_VIEWS};
    use std::sync::Arc;

    #[tokio::test]
    async fn submit_sends_four_views_and_maps_by_prompt() {
        let backend = Arc::new(MockBackend::new(|_, request| {
            let slot = PERSPECTIVE_VIEWS
                .iter()
                .position(|view| request.prompt.starts_with(view))
                .unwrap() as u64;
            MockReply::Image {
                data: format!("view-{}", slot),
                delay_ms: (4 - slot) * 10,
            }
        }));
        let client = GenAiClient::with_backend(backend.clone());

        let mut flow = PerspectiveFlow::new();
        flow.load(png_source(32, 16)).unwrap();
        flow.set_prompt("A museum.");
        flow.set_options(PerspectiveOptions {
            height: Some(CameraHeight::Aerial),
            lens: None,
            effect: Some(CameraEffect::DepthOfField),
        });

        let results = flow.submit(&client).await.unwrap();
        let data: Vec<&str> = results.iter().map(|r| r.image.data.as_str()).collect();
        assert_eq!(data, vec!["view-0", "view-1", "view-2", "view-3"]);

        let sent = backend.seen();
        assert_eq!(sent.len(), 4);
        assert!(sent
            .iter()
            .all(|r| r.prompt.ends_with("A museum. Camera Height: Aerial. Effect: Depth of Field")));
        assert_eq!(flow.stage(), Stage::Completed);
    }

    #[tokio::test]
    async fn submit_without_image_is_rejected() {
        let backend = Arc::new(MockBackend::always_succeeds());
        let client = GenAiClient::with_backend(backend.clone());

        let mut flow = PerspectiveFlow::new();
        let err = flow.submit(&client).await.unwrap_err();
        assert!(matches!(err, StudioError::Validation(_)));
        assert_eq!(backend.calls(), 0);
        assert_eq!(flow.stage(), Stage::Empty);
    }
}
