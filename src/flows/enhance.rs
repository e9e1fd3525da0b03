use super::{Session, Stage};
use crate::{
    codec::{render_cropped, DownloadFormat, EncodedImage, SourceImage},
    download::Download,
    error::{Result, StudioError},
    genai::GenAiClient,
    geometry::{center_crop_region, CropRegion, Dimensions, Scale},
    logger,
    models::ResultImage,
    prompt::ENHANCE_DEFAULT_PROMPT,
};

pub const ENHANCE_COUNT: usize = 2;
pub const DEFAULT_COVERAGE_PERCENT: f64 = 90.0;
const LABEL: &str = "enhanced";

/// Crop a region of an image and ask for two enhanced versions of it.
#[derive(Debug)]
pub struct EnhanceFlow {
    session: Session,
    prompt: String,
    scale: Scale,
    crop: Option<CropRegion>,
}

impl Default for EnhanceFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl EnhanceFlow {
    pub fn new() -> Self {
        Self {
            session: Session::default(),
            prompt: ENHANCE_DEFAULT_PROMPT.to_string(),
            scale: Scale::default(),
            crop: None,
        }
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

    pub fn crop(&self) -> Option<&CropRegion> {
        self.crop.as_ref()
    }

    pub fn results(&self) -> &[ResultImage] {
        self.session.results()
    }

    /// Load a new image shown at `displayed` size and preselect a centered 90% crop.
    pub fn load(&mut self, source: SourceImage, displayed: Dimensions) -> Result<()> {
        self.session.ensure_idle()?;
        let native = source.dimensions()?;
        let scale = Scale::between(native, displayed)?;
        let crop = center_crop_region(
            displayed.width as f64,
            displayed.height as f64,
            DEFAULT_COVERAGE_PERCENT,
        )?
        .with_scale(scale);

        self.session.load(source)?;
        self.scale = scale;
        self.crop = Some(crop);
        self.session.set_cropped(true);
        Ok(())
    }

    /// Replace the selection with a rectangle in displayed coordinates.
    pub fn select(&mut self, x: f64, y: f64, width: f64, height: f64) -> Result<()> {
        self.session.ensure_idle()?;
        self.session
            .require_source("Please upload an image first.")?;

        let region = CropRegion::new(x, y, width, height).with_scale(self.scale);
        self.session.set_cropped(!region.is_empty());
        self.crop = Some(region);
        Ok(())
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    fn prepare(&self) -> Result<EncodedImage> {
        let source = self
            .session
            .require_source("Please upload an image first.")?;
        let crop = self.crop.as_ref().ok_or_else(|| {
            StudioError::InvalidGeometry("Please select a region on the image to enhance.".into())
        })?;
        crop.validate()?;

        render_cropped(source, &crop.to_native(), source.kind()?)
    }

    pub async fn submit(&mut self, client: &GenAiClient) -> Result<&[ResultImage]> {
        self.session.ensure_idle()?;
        let payload = match self.prepare() {
            Ok(payload) => payload,
            Err(e) => return Err(self.session.reject(e)),
        };

        self.session.begin()?;
        let _timer = logger::timer("enhance");
        let outcome = client
            .image()
            .generate_n(&payload, &self.prompt, ENHANCE_COUNT)
            .await;
        self.session.finish(outcome)
    }

    pub fn downloads(&self, format: DownloadFormat) -> Result<Vec<Download>> {
        self.session.downloads(LABEL, format)
    }
}
