//! Run configuration for a single extraction.

use crate::types::Picture;
use std::path::{Path, PathBuf};

/// Default name of the report file inside the output directory.
pub const DEFAULT_REPORT_FILE: &str = "extracted_data.txt";

/// Default name of the images subdirectory inside the output directory.
pub const DEFAULT_IMAGES_DIR: &str = "images";

/// Extension used for every extracted image unless told otherwise.
const DEFAULT_IMAGE_EXTENSION: &str = "png";

/// How extracted image files are named.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImageNaming {
    /// `image_<n>.png` regardless of the encoded format.
    #[default]
    AlwaysPng,
    /// `image_<n>.<ext>` where `<ext>` is the extension of the embedded part,
    /// falling back to `png`.
    SourceExtension,
}

impl ImageNaming {
    /// File name for the `index`-th extracted picture.
    pub fn file_name(&self, index: usize, picture: &Picture) -> String {
        let ext = match self {
            Self::AlwaysPng => DEFAULT_IMAGE_EXTENSION.to_string(),
            Self::SourceExtension => picture
                .source_extension()
                .unwrap_or_else(|| DEFAULT_IMAGE_EXTENSION.to_string()),
        };
        format!("image_{}.{}", index, ext)
    }
}

/// Inputs and output locations for one extraction run.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Presentation to read.
    input: PathBuf,

    /// Directory receiving the report and the images folder.
    output_dir: PathBuf,

    report_file_name: String,

    images_dir_name: String,

    image_naming: ImageNaming,
}

impl ExtractConfig {
    /// Create a configuration with the default report and image names.
    pub fn new(input: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output_dir: output_dir.into(),
            report_file_name: DEFAULT_REPORT_FILE.to_string(),
            images_dir_name: DEFAULT_IMAGES_DIR.to_string(),
            image_naming: ImageNaming::default(),
        }
    }

    /// Use a different report file name.
    pub fn with_report_file_name(mut self, name: impl Into<String>) -> Self {
        self.report_file_name = name.into();
        self
    }

    /// Use a different images subdirectory name.
    pub fn with_images_dir_name(mut self, name: impl Into<String>) -> Self {
        self.images_dir_name = name.into();
        self
    }

    /// Choose how extracted images are named.
    pub fn with_image_naming(mut self, naming: ImageNaming) -> Self {
        self.image_naming = naming;
        self
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn image_naming(&self) -> ImageNaming {
        self.image_naming
    }

    /// Full path of the report file.
    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(&self.report_file_name)
    }

    /// Full path of the images directory.
    pub fn images_dir(&self) -> PathBuf {
        self.output_dir.join(&self.images_dir_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let config = ExtractConfig::new("deck.pptx", "out");
        assert_eq!(config.report_path(), Path::new("out").join("extracted_data.txt"));
        assert_eq!(config.images_dir(), Path::new("out").join("images"));
        assert_eq!(config.image_naming(), ImageNaming::AlwaysPng);
    }

    #[test]
    fn test_custom_names() {
        let config = ExtractConfig::new("deck.pptx", "out")
            .with_report_file_name("report.txt")
            .with_images_dir_name("media");
        assert_eq!(config.report_path(), Path::new("out").join("report.txt"));
        assert_eq!(config.images_dir(), Path::new("out").join("media"));
    }

    #[test]
    fn test_always_png_ignores_source_format() {
        let jpeg = Picture::embedded(vec![0xFF, 0xD8], "image1.jpeg");
        assert_eq!(ImageNaming::AlwaysPng.file_name(4, &jpeg), "image_4.png");
    }

    #[test]
    fn test_source_extension_naming() {
        let jpeg = Picture::embedded(vec![0xFF, 0xD8], "image1.jpeg");
        assert_eq!(
            ImageNaming::SourceExtension.file_name(0, &jpeg),
            "image_0.jpeg"
        );
        assert_eq!(
            ImageNaming::SourceExtension.file_name(1, &Picture::default()),
            "image_1.png"
        );
    }
}
