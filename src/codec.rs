//! Source image reading, cropped re-encoding and download format conversion.

use crate::error::{ConversionWarning, Result, StudioError};
use crate::geometry::{CropRegion, Dimensions};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageReader, RgbImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::str::FromStr;

pub const JPEG_QUALITY: u8 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Png,
    Jpeg,
    Webp,
}

impl ImageKind {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageKind::Png => "image/png",
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Webp => "image/webp",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Png => "png",
            ImageKind::Jpeg => "jpg",
            ImageKind::Webp => "webp",
        }
    }

    pub fn from_mime(mime_type: &str) -> Option<Self> {
        match mime_type.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(ImageKind::Png),
            "image/jpeg" | "image/jpg" => Some(ImageKind::Jpeg),
            "image/webp" => Some(ImageKind::Webp),
            _ => None,
        }
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.trim().to_ascii_lowercase().as_str() {
            "png" => Some(ImageKind::Png),
            "jpg" | "jpeg" => Some(ImageKind::Jpeg),
            "webp" => Some(ImageKind::Webp),
            _ => None,
        }
    }
}

/// File formats offered for download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadFormat {
    Png,
    Jpg,
}

impl DownloadFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            DownloadFormat::Png => "png",
            DownloadFormat::Jpg => "jpg",
        }
    }

    pub fn kind(&self) -> ImageKind {
        match self {
            DownloadFormat::Png => ImageKind::Png,
            DownloadFormat::Jpg => ImageKind::Jpeg,
        }
    }
}

impl fmt::Display for DownloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for DownloadFormat {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(DownloadFormat::Png),
            "jpg" | "jpeg" => Ok(DownloadFormat::Jpg),
            other => Err(StudioError::Config(format!(
                "unsupported download format '{}'",
                other
            ))),
        }
    }
}

/// An uploaded image, owned by the workflow that received it.
#[derive(Debug, Clone)]
pub struct SourceImage {
    bytes: Vec<u8>,
    mime_type: String,
    file_name: String,
}

impl SourceImage {
    pub fn new(
        bytes: Vec<u8>,
        mime_type: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Result<Self> {
        let mime_type = mime_type.into();
        let file_name = file_name.into();

        if !mime_type.starts_with("image/") {
            return Err(StudioError::Decode(format!(
                "{} is not an image ({})",
                file_name, mime_type
            )));
        }
        if bytes.is_empty() {
            return Err(StudioError::Decode(format!("{} is empty", file_name)));
        }

        Ok(Self {
            bytes,
            mime_type,
            file_name,
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let kind = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(ImageKind::from_extension)
            .ok_or_else(|| {
                StudioError::Decode(format!("unsupported image type: {}", path.display()))
            })?;
        let bytes = std::fs::read(path)
            .map_err(|e| StudioError::Decode(format!("{}: {}", path.display(), e)))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        Self::new(bytes, kind.mime_type(), file_name)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// File name without its final extension, used to name downloads.
    pub fn stem(&self) -> &str {
        match self.file_name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => &self.file_name,
        }
    }

    pub fn kind(&self) -> Result<ImageKind> {
        ImageKind::from_mime(&self.mime_type).ok_or_else(|| {
            StudioError::Decode(format!("unsupported image type: {}", self.mime_type))
        })
    }

    pub fn dimensions(&self) -> Result<Dimensions> {
        let (width, height) = ImageReader::new(Cursor::new(&self.bytes))
            .with_guessed_format()
            .map_err(|e| StudioError::Decode(e.to_string()))?
            .into_dimensions()
            .map_err(|e| StudioError::Decode(e.to_string()))?;
        Ok(Dimensions::new(width, height))
    }

    pub fn decode(&self) -> Result<DynamicImage> {
        image::load_from_memory(&self.bytes)
            .map_err(|e| StudioError::Decode(format!("{}: {}", self.file_name, e)))
    }
}

/// A base64 payload and its MIME type, as exchanged with the generation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImage {
    pub data: String,
    pub mime_type: String,
}

impl EncodedImage {
    pub fn new(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn from_bytes(bytes: &[u8], kind: ImageKind) -> Self {
        Self::new(BASE64.encode(bytes), kind.mime_type())
    }

    pub fn bytes(&self) -> Result<Vec<u8>> {
        BASE64
            .decode(self.data.as_bytes())
            .map_err(|e| StudioError::Decode(format!("invalid base64 payload: {}", e)))
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

pub fn decode_to_base64(source: &SourceImage) -> Result<EncodedImage> {
    if source.bytes().is_empty() {
        return Err(StudioError::Decode(format!(
            "{} could not be read",
            source.file_name()
        )));
    }
    Ok(EncodedImage::new(
        BASE64.encode(source.bytes()),
        source.mime_type(),
    ))
}

/// Copy the native-pixel `region` 1:1 into a new image encoded as `output`.
pub fn render_cropped(
    source: &SourceImage,
    region: &CropRegion,
    output: ImageKind,
) -> Result<EncodedImage> {
    let image = source.decode()?;
    let bounds = Dimensions::new(image.width(), image.height());
    let rect = region.to_pixel_rect(bounds)?;

    log::debug!(
        "Cropping {} to {}x{} at ({}, {})",
        source.file_name(),
        rect.width,
        rect.height,
        rect.x,
        rect.y
    );

    let cropped = image.crop_imm(rect.x, rect.y, rect.width, rect.height);
    let bytes = encode(&cropped, output)?;
    Ok(EncodedImage::from_bytes(&bytes, output))
}

pub fn encode(image: &DynamicImage, kind: ImageKind) -> Result<Vec<u8>> {
    match kind {
        ImageKind::Jpeg => encode_jpeg(&flatten_onto_white(image), JPEG_QUALITY),
        ImageKind::Png => write_with(image, image::ImageFormat::Png),
        ImageKind::Webp => write_with(
            &DynamicImage::ImageRgba8(image.to_rgba8()),
            image::ImageFormat::WebP,
        ),
    }
}

fn write_with(image: &DynamicImage, format: image::ImageFormat) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, format)
        .map_err(|e| StudioError::Encode(e.to_string()))?;
    Ok(buffer.into_inner())
}

fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| StudioError::Encode(e.to_string()))?;
    Ok(buffer.into_inner())
}

/// Composite over an opaque white background, dropping the alpha channel.
pub fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());

    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        out.put_pixel(x, y, image::Rgb([blend(r), blend(g), blend(b)]));
    }

    out
}

/// Result of preparing a payload in a download format.
#[derive(Debug, Clone)]
pub struct Converted {
    pub image: EncodedImage,
    pub format: DownloadFormat,
    pub warning: Option<ConversionWarning>,
}

/// Re-encode a generated payload for download.
///
/// PNG targets (and payloads already in the target format) pass through
/// untouched. JPEG conversion composites onto white at full resolution.
/// A payload that cannot be decoded is delivered as PNG with a warning.
pub fn convert_format(payload: &EncodedImage, target: DownloadFormat) -> Converted {
    let passthrough = target == DownloadFormat::Png
        || ImageKind::from_mime(&payload.mime_type) == Some(target.kind());
    if passthrough {
        return Converted {
            image: payload.clone(),
            format: target,
            warning: None,
        };
    }

    match transcode(payload, target.kind()) {
        Ok(image) => Converted {
            image,
            format: target,
            warning: None,
        },
        Err(e) => {
            log::error!(
                "Could not load image for conversion, delivering original format: {}",
                e
            );
            Converted {
                image: payload.clone(),
                format: DownloadFormat::Png,
                warning: Some(ConversionWarning {
                    target: target.to_string(),
                    reason: e.to_string(),
                }),
            }
        }
    }
}

fn transcode(payload: &EncodedImage, kind: ImageKind) -> Result<EncodedImage> {
    let bytes = payload.bytes()?;
    let image = image::load_from_memory(&bytes).map_err(|e| StudioError::Decode(e.to_string()))?;
    let encoded = encode(&image, kind)?;
    Ok(EncodedImage::from_bytes(&encoded, kind))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    /// PNG whose pixel values encode their position.
    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
        });
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(image)
            .write_to(&mut buffer, image::ImageFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    pub(crate) fn png_source(width: u32, height: u32) -> SourceImage {
        SourceImage::new(png_bytes(width, height), "image/png", "facade.png").unwrap()
    }

    #[test]
    fn rejects_non_image_uploads() {
        let err = SourceImage::new(b"hello".to_vec(), "text/plain", "notes.txt").unwrap_err();
        assert!(matches!(err, StudioError::Decode(_)));

        let err = SourceImage::new(Vec::new(), "image/png", "empty.png").unwrap_err();
        assert!(matches!(err, StudioError::Decode(_)));
    }

    #[test]
    fn stem_drops_only_the_last_extension() {
        let source = SourceImage::new(vec![1], "image/png", "site.plan.v2.png").unwrap();
        assert_eq!(source.stem(), "site.plan.v2");

        let source = SourceImage::new(vec![1], "image/png", "sketch").unwrap();
        assert_eq!(source.stem(), "sketch");
    }

    #[test]
    fn base64_payload_round_trips_source_bytes() {
        let source = png_source(4, 4);
        let encoded = decode_to_base64(&source).unwrap();
        assert_eq!(encoded.mime_type, "image/png");
        assert_eq!(encoded.bytes().unwrap(), source.bytes());
        assert!(encoded.data_url().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn reads_dimensions_from_header() {
        let source = png_source(37, 21);
        assert_eq!(source.dimensions().unwrap(), Dimensions::new(37, 21));
    }

    #[test]
    fn render_cropped_copies_region_pixels() {
        let source = png_source(1000, 500);
        let region = CropRegion::new(250.0, 0.0, 500.0, 500.0);
        let encoded = render_cropped(&source, &region, ImageKind::Png).unwrap();

        let cropped = image::load_from_memory(&encoded.bytes().unwrap())
            .unwrap()
            .to_rgba8();
        assert_eq!(cropped.dimensions(), (500, 500));
        assert_eq!(cropped.get_pixel(0, 0).0, [250, 0, 128, 255]);
        assert_eq!(cropped.get_pixel(10, 3).0, [4, 3, 128, 255]);
    }

    #[test]
    fn render_cropped_rejects_empty_region() {
        let source = png_source(10, 10);
        let err = render_cropped(&source, &CropRegion::new(0.0, 0.0, 0.0, 5.0), ImageKind::Png)
            .unwrap_err();
        assert!(matches!(err, StudioError::InvalidGeometry(_)));
    }

    #[test]
    fn png_to_png_is_identity() {
        let payload = EncodedImage::from_bytes(&png_bytes(8, 8), ImageKind::Png);
        let converted = convert_format(&payload, DownloadFormat::Png);
        assert_eq!(converted.image, payload);
        assert_eq!(converted.format, DownloadFormat::Png);
        assert!(converted.warning.is_none());
    }

    #[test]
    fn png_to_jpg_produces_jpeg() {
        let payload = EncodedImage::from_bytes(&png_bytes(16, 16), ImageKind::Png);
        let converted = convert_format(&payload, DownloadFormat::Jpg);
        assert!(converted.warning.is_none());
        assert_eq!(converted.format, DownloadFormat::Jpg);
        assert_eq!(converted.image.mime_type, "image/jpeg");

        let bytes = converted.image.bytes().unwrap();
        assert_eq!(&bytes[0..2], &[0xFF, 0xD8]);
        assert_eq!(&bytes[bytes.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn corrupt_payload_falls_back_with_warning() {
        let payload = EncodedImage::from_bytes(b"definitely not a png", ImageKind::Png);
        let converted = convert_format(&payload, DownloadFormat::Jpg);
        assert_eq!(converted.format, DownloadFormat::Png);
        assert_eq!(converted.image, payload);
        let warning = converted.warning.unwrap();
        assert_eq!(warning.target, "jpg");
    }

    #[test]
    fn transparent_pixels_become_white() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 0])));
        let flat = flatten_onto_white(&image);
        assert_eq!(flat.get_pixel(1, 1).0, [255, 255, 255]);

        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba([10, 20, 30, 255])));
        assert_eq!(flatten_onto_white(&image).get_pixel(0, 0).0, [10, 20, 30]);
    }

    #[test]
    fn download_format_parses_aliases() {
        assert_eq!("JPEG".parse::<DownloadFormat>().unwrap(), DownloadFormat::Jpg);
        assert_eq!("png".parse::<DownloadFormat>().unwrap(), DownloadFormat::Png);
        assert!("gif".parse::<DownloadFormat>().is_err());
    }
}
