use std::pin::Pin;

use color_eyre::Result;
use serde::{Deserialize, Serialize};
use strum::Display;

pub mod imagen;
pub use imagen::{Imagen, ImagenConfig};

#[derive(
    Debug,
    Clone,
    Copy,
    Display,
    clap::ValueEnum,
    Serialize,
    Deserialize,
    Hash,
    PartialEq,
    Eq,
    Default,
)]
pub enum Model {
    #[default]
    #[strum(to_string = "imagen-3.0-generate-002")]
    Imagen3,
    #[strum(to_string = "imagen-3.0-fast-generate-001")]
    Imagen3Fast,
    #[strum(to_string = "imagen-4.0-generate-001")]
    Imagen4,
}

#[derive(
    Debug, Clone, Copy, Display, clap::ValueEnum, Serialize, Deserialize, PartialEq, Eq, Default,
)]
pub enum AspectRatio {
    #[default]
    #[strum(to_string = "1:1")]
    #[serde(rename = "1:1")]
    #[value(name = "1:1")]
    Square,
    #[strum(to_string = "9:16")]
    #[serde(rename = "9:16")]
    #[value(name = "9:16")]
    Portrait,
    #[strum(to_string = "16:9")]
    #[serde(rename = "16:9")]
    #[value(name = "16:9")]
    Landscape,
    #[strum(to_string = "3:4")]
    #[serde(rename = "3:4")]
    #[value(name = "3:4")]
    Fullscreen,
    #[strum(to_string = "4:3")]
    #[serde(rename = "4:3")]
    #[value(name = "4:3")]
    FullscreenLandscape,
}

/// How aggressively the provider filters generated content.
#[derive(
    Debug, Clone, Copy, Display, clap::ValueEnum, Serialize, Deserialize, PartialEq, Eq, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SafetyLevel {
    BlockMost,
    BlockSome,
    #[default]
    BlockFew,
    BlockFewest,
}

/// Sampling options sent along with every prompt of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub image_count: u32,
    pub aspect_ratio: AspectRatio,
    pub safety_level: SafetyLevel,
    pub allow_adult_subjects: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            image_count: 1,
            aspect_ratio: AspectRatio::Square,
            safety_level: SafetyLevel::BlockFew,
            allow_adult_subjects: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Display, PartialEq, Eq, Default)]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl ImageFormat {
    /// Unknown or missing mime types fall back to png, the provider's default.
    pub fn from_mime(mime: Option<&str>) -> Self {
        match mime.map(|m| m.trim().to_ascii_lowercase()).as_deref() {
            Some("image/jpeg" | "image/jpg") => ImageFormat::Jpeg,
            Some("image/webp") => ImageFormat::Webp,
            _ => ImageFormat::Png,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Webp => "webp",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub data: Vec<u8>,
    pub format: ImageFormat,
}

impl Image {
    pub fn file_name(&self, stem: &str) -> String {
        format!("{stem}.{}", self.format.extension())
    }
}

pub trait ImageModel {
    /// Returns every image the provider produced, which may be none.
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
        params: &'a GenerationParams,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Image>>> + Send + 'a>>;

    fn model(&self) -> Model;
}
