use crate::{
    codec::{convert_format, DownloadFormat},
    error::{ConversionWarning, Result},
    models::ResultImage,
};
use std::fs;
use std::path::{Path, PathBuf};

/// A result ready to be handed to the user, e.g. `facade-enhanced-1.jpg`.
#[derive(Debug, Clone)]
pub struct Download {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub warning: Option<ConversionWarning>,
}

pub fn prepare_download(
    result: &ResultImage,
    stem: &str,
    label: &str,
    format: DownloadFormat,
) -> Result<Download> {
    let converted = convert_format(&result.image, format);
    if let Some(warning) = &converted.warning {
        log::warn!("{}", warning);
    }

    Ok(Download {
        file_name: format!(
            "{}-{}-{}.{}",
            stem,
            label,
            result.index,
            converted.format.extension()
        ),
        bytes: converted.image.bytes()?,
        warning: converted.warning,
    })
}

impl Download {
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        fs::write(&path, &self.bytes)?;
        log::info!("Saved {}", path.display());
        Ok(path)
    }
}
