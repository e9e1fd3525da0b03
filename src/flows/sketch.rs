use super::{Session, Stage};
use crate::{
    codec::{decode_to_base64, render_cropped, DownloadFormat, EncodedImage, SourceImage},
    download::Download,
    error::{Result, StudioError},
    genai::GenAiClient,
    geometry::{aspect_ratio_crop, AspectRatio, CropRegion},
    logger,
    models::ResultImage,
    prompt::sketch_prompt,
};

pub const SKETCH_COUNT: usize = 4;
const LABEL: &str = "result";

/// Turn a sketch into four photorealistic renderings at a chosen aspect ratio.
#[derive(Debug, Default)]
pub struct SketchFlow {
    session: Session,
    prompt: String,
    aspect_ratio: AspectRatio,
    crop: Option<CropRegion>,
}

impl SketchFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn stage(&self) -> Stage {
        self.session.stage()
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect_ratio
    }

    /// Native-pixel region that will be sent, once a sketch is loaded.
    pub fn crop(&self) -> Option<&CropRegion> {
        self.crop.as_ref()
    }

    pub fn results(&self) -> &[ResultImage] {
        self.session.results()
    }

    /// Load a new sketch. The prompt is cleared since it described the old one.
    pub fn load(&mut self, source: SourceImage) -> Result<()> {
        self.session.ensure_idle()?;
        let native = source.dimensions()?;
        let crop = aspect_ratio_crop(native.width, native.height, self.aspect_ratio.ratio())?;

        self.session.load(source)?;
        self.prompt.clear();
        self.crop = Some(crop);
        self.session.set_cropped(true);
        Ok(())
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: AspectRatio) -> Result<()> {
        self.session.ensure_idle()?;
        if let Some(source) = self.session.source() {
            let native = source.dimensions()?;
            self.crop = Some(aspect_ratio_crop(
                native.width,
                native.height,
                aspect_ratio.ratio(),
            )?);
            self.session.set_cropped(true);
        }
        self.aspect_ratio = aspect_ratio;
        Ok(())
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    /// Ask the text model to describe the sketch and use that as the prompt.
    pub async fn suggest_prompt(&mut self, client: &GenAiClient) -> Result<&str> {
        self.session.ensure_idle()?;
        let prepared = self
            .session
            .require_source("Please upload a sketch first.")
            .and_then(decode_to_base64);
        let payload = match prepared {
            Ok(payload) => payload,
            Err(e) => return Err(self.session.reject(e)),
        };

        let previous = self.session.begin()?;
        let outcome = client.text().describe_image(&payload).await;
        self.session.restore(previous, &outcome);

        self.prompt = outcome?;
        Ok(&self.prompt)
    }

    fn prepare(&self) -> Result<EncodedImage> {
        let source = self
            .session
            .require_source("Please upload a sketch image first.")?;
        if self.prompt.trim().is_empty() {
            return Err(StudioError::Validation(
                "Please enter a prompt or use the suggestion tool.".into(),
            ));
        }
        let crop = self.crop.as_ref().ok_or_else(|| {
            StudioError::InvalidGeometry("Sketch has not been fitted to an aspect ratio.".into())
        })?;

        render_cropped(source, crop, source.kind()?)
    }

    pub async fn submit(&mut self, client: &GenAiClient) -> Result<&[ResultImage]> {
        self.session.ensure_idle()?;
        let payload = match self.prepare() {
            Ok(payload) => payload,
            Err(e) => return Err(self.session.reject(e)),
        };
        let prompt = sketch_prompt(&self.prompt);

        self.session.begin()?;
        let _timer = logger::timer("sketch");
        let outcome = client
            .image()
            .generate_n(&payload, &prompt, SKETCH_COUNT)
            .await;
        self.session.finish(outcome)
    }

    pub fn downloads(&self, format: DownloadFormat) -> Result<Vec<Download>> {
        self.session.downloads(LABEL, format)
    }
}
