use crate::codec::DownloadFormat;
use std::env;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Clone)]
pub struct GenAiConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub image_model: Option<String>,
    pub text_model: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub genai: Option<GenAiConfig>,
    pub output_dir: Option<String>,
    pub download_format: DownloadFormat,
}

impl Default for GenAiConfig {
    fn default() -> Self {
        GenAiConfig {
            api_key: None,
            base_url: None,
            image_model: None,
            text_model: None,
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl GenAiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let api_key = non_empty_env("GEMINI_API_KEY").or_else(|| non_empty_env("API_KEY"));
        let base_url = non_empty_env("GEMINI_API_BASE");
        let image_model = non_empty_env("GEMINI_IMAGE_MODEL");
        let text_model = non_empty_env("GEMINI_TEXT_MODEL");

        GenAiConfig {
            api_key,
            base_url,
            image_model,
            text_model,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_models(
        mut self,
        image_model: impl Into<String>,
        text_model: impl Into<String>,
    ) -> Self {
        self.image_model = Some(image_model.into());
        self.text_model = Some(text_model.into());
        self
    }

    pub fn base_url(&self) -> String {
        self.base_url
            .as_deref()
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
    }

    pub fn image_model(&self) -> &str {
        self.image_model.as_deref().unwrap_or(DEFAULT_IMAGE_MODEL)
    }

    pub fn text_model(&self) -> &str {
        self.text_model.as_deref().unwrap_or(DEFAULT_TEXT_MODEL)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            genai: None,
            output_dir: None,
            download_format: DownloadFormat::Png,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let output_dir = non_empty_env("OUTPUT_DIR");
        let download_format = non_empty_env("DOWNLOAD_FORMAT")
            .and_then(|value| value.parse().ok())
            .unwrap_or(DownloadFormat::Png);

        Config {
            genai: Some(GenAiConfig::from_env()),
            output_dir,
            download_format,
        }
    }

    pub fn with_genai(mut self, config: GenAiConfig) -> Self {
        self.genai = Some(config);
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<String>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn with_download_format(mut self, format: DownloadFormat) -> Self {
        self.download_format = format;
        self
    }

    pub fn output_dir(&self) -> &str {
        self.output_dir.as_deref().unwrap_or(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fall_back_to_gemini_models() {
        let config = GenAiConfig::new();
        assert_eq!(config.image_model(), DEFAULT_IMAGE_MODEL);
        assert_eq!(config.text_model(), DEFAULT_TEXT_MODEL);
        assert_eq!(config.base_url(), DEFAULT_API_BASE);
    }

    #[test]
    fn base_url_drops_trailing_slash() {
        let config = GenAiConfig::new().with_base_url("http://localhost:8080/v1beta/");
        assert_eq!(config.base_url(), "http://localhost:8080/v1beta");
    }

    #[test]
    fn builder_sets_output_and_format() {
        let config = Config::new()
            .with_output_dir("renders")
            .with_download_format(DownloadFormat::Jpg);
        assert_eq!(config.output_dir(), "renders");
        assert_eq!(config.download_format, DownloadFormat::Jpg);
        assert!(config.genai.is_none());
    }
}
