//! Error types for presentation dumping.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading a presentation or writing the dump.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read the input or write an output file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The file format is not supported or could not be detected.
    #[error("Unsupported or unrecognized file format: {0}")]
    UnsupportedFormat(String),

    /// The package opened but does not describe a usable presentation.
    #[error("Failed to load presentation: {0}")]
    LoadError(String),

    /// ZIP container error.
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error inside a package part.
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// A part referenced by the package is absent.
    #[error("Missing package part: {0}")]
    MissingPart(String),

    /// A picture shape carries no embedded image bytes.
    #[error("Picture on slide {slide} has no embedded image")]
    MissingImage { slide: usize },
}

impl Error {
    /// Whether this error was raised while opening or parsing the input
    /// document, as opposed to writing the dump.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedFormat(_)
                | Error::LoadError(_)
                | Error::ZipError(_)
                | Error::XmlError(_)
                | Error::MissingPart(_)
        )
    }
}
