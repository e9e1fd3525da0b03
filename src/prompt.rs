//! Prompt text for each tool.

use crate::error::StudioError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const ENHANCE_DEFAULT_PROMPT: &str =
    "Enhance this image, improving resolution, colors, and sharpness.";

pub const PERSPECTIVE_DEFAULT_PROMPT: &str = "A photorealistic image of this building, maintain all architectural details, materials, and lighting from the original image.";

pub const SKETCH_RENDER_PREFIX: &str =
    "Create a photorealistic architectural rendering based on the provided sketch.";

/// One prefix per perspective slot, in slot order.
pub const PERSPECTIVE_VIEWS: [&str; 4] = [
    "Front view.",
    "Dynamic low-angle view from the corner.",
    "High-angle view showing the building in its context.",
    "A detailed close-up shot of a key architectural feature.",
];

const FRAGMENT_SEPARATOR: &str = ". ";

/// A base prompt followed by `Label: value` fragments in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptSpec {
    base: String,
    fragments: Vec<String>,
}

impl PromptSpec {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            fragments: Vec::new(),
        }
    }

    /// Add `label: value`; `None` adds nothing.
    pub fn option<T: fmt::Display>(mut self, label: &str, value: Option<T>) -> Self {
        if let Some(value) = value {
            self.fragments.push(format!("{}: {}", label, value));
        }
        self
    }

    pub fn options_text(&self) -> String {
        self.fragments.join(FRAGMENT_SEPARATOR)
    }

    pub fn build(&self) -> String {
        let base = self.base.trim();
        if self.fragments.is_empty() {
            return base.to_string();
        }
        if base.is_empty() {
            return self.options_text();
        }
        format!("{} {}", base, self.options_text())
    }
}

macro_rules! option_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = StudioError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = normalize(s);
                $name::ALL
                    .iter()
                    .copied()
                    .find(|option| normalize(option.label()) == wanted)
                    .ok_or_else(|| {
                        StudioError::Validation(format!(
                            "unknown {} '{}'",
                            stringify!($name),
                            s
                        ))
                    })
            }
        }
    };
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

option_enum!(CameraHeight {
    Low => "Low",
    Medium => "Medium",
    High => "High",
    Aerial => "Aerial",
});

option_enum!(CameraLens {
    SuperWide => "Super Wide",
    Wide => "Wide",
    CloseUp => "Close-up",
    Macro => "Macro",
});

option_enum!(CameraEffect {
    DepthOfField => "Depth of Field",
    Bokeh => "Bokeh",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerspectiveOptions {
    pub height: Option<CameraHeight>,
    pub lens: Option<CameraLens>,
    pub effect: Option<CameraEffect>,
}

impl Default for PerspectiveOptions {
    fn default() -> Self {
        Self {
            height: Some(CameraHeight::Medium),
            lens: Some(CameraLens::Wide),
            effect: None,
        }
    }
}

impl PerspectiveOptions {
    pub fn to_spec(&self, base: &str) -> PromptSpec {
        PromptSpec::new(base)
            .option("Camera Height", self.height)
            .option("Lens", self.lens)
            .option("Effect", self.effect)
    }
}

/// The four perspective prompts, one per view, sharing the same base and options.
pub fn perspective_prompts(base: &str, options: &PerspectiveOptions) -> Vec<String> {
    let shared = options.to_spec(base).build();
    PERSPECTIVE_VIEWS
        .iter()
        .map(|view| format!("{} {}", view, shared))
        .collect()
}

pub fn sketch_prompt(user_prompt: &str) -> String {
    format!("{} {}", SKETCH_RENDER_PREFIX, user_prompt.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragments_follow_declared_order() {
        let spec = PromptSpec::new("A house.")
            .option("Camera Height", Some(CameraHeight::High))
            .option("Lens", None::<CameraLens>)
            .option("Effect", Some(CameraEffect::Bokeh));
        assert_eq!(spec.build(), "A house. Camera Height: High. Effect: Bokeh");
    }

    #[test]
    fn no_fragments_leaves_base_untouched() {
        assert_eq!(PromptSpec::new(" A house. ").build(), "A house.");
    }

    #[test]
    fn perspective_prompts_prefix_each_view() {
        let prompts = perspective_prompts("Base.", &PerspectiveOptions::default());
        assert_eq!(prompts.len(), 4);
        assert_eq!(
            prompts[0],
            "Front view. Base. Camera Height: Medium. Lens: Wide"
        );
        assert!(prompts[3].starts_with("A detailed close-up shot"));
        assert!(prompts.iter().all(|p| p.ends_with("Lens: Wide")));
    }

    #[test]
    fn options_parse_loosely() {
        assert_eq!("super-wide".parse::<CameraLens>().unwrap(), CameraLens::SuperWide);
        assert_eq!("close up".parse::<CameraLens>().unwrap(), CameraLens::CloseUp);
        assert_eq!(
            "depth_of_field".parse::<CameraEffect>().unwrap(),
            CameraEffect::DepthOfField
        );
        assert!("fisheye".parse::<CameraLens>().is_err());
    }

    #[test]
    fn sketch_prompt_is_prefixed() {
        assert_eq!(
            sketch_prompt("brick villa "),
            "Create a photorealistic architectural rendering based on the provided sketch. brick villa"
        );
    }
}
