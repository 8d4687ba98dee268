use crate::image_model::ImageModel;

pub mod catalog;
pub mod image_model;
pub mod notice;
pub mod runner;

pub type ImgModBox = Box<dyn ImageModel + Send>;

/// Pause between two consecutive Imagen requests
pub const DEFAULT_THROTTLE_SECS: u64 = 65;
