//! Document model, report formatting, and the extraction passes that dump a
//! presentation's text, fonts, tables, images and layouts.

pub mod config;
pub mod error;
pub mod extractor;
pub mod format;
pub mod loader;
pub mod report;
pub mod types;

pub use config::{ExtractConfig, ImageNaming};
pub use error::{Error, Result};
pub use extractor::{run, ExtractedImage, ExtractionSummary, Extractor};
pub use loader::DocumentLoader;
pub use report::ReportWriter;
pub use types::{
    Document, Font, FontColor, Layout, Paragraph, Picture, PresentationFormat, Run, Shape,
    ShapeKind, Slide, Table, TableCell, TableRow, TextFrame,
};
