//! The four extraction passes over a loaded document.
//!
//! A run truncates the report, writes the start banner, then walks the
//! document four times in a fixed order (text and fonts, tables, images,
//! layouts) before writing the completion banner. Every pass follows document
//! order; nothing is sorted or deduplicated.

use crate::config::{ExtractConfig, ImageNaming};
use crate::error::{Error, Result};
use crate::format::{self, Section};
use crate::loader::DocumentLoader;
use crate::report::ReportWriter;
use crate::types::Document;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// One image written to the images directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedImage {
    /// Global zero-based image counter.
    pub index: usize,
    /// 1-based slide number the picture came from.
    pub slide: usize,
    pub path: PathBuf,
    /// Number of bytes written.
    pub bytes: usize,
}

/// Counts of what a run wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionSummary {
    pub slides: usize,
    pub paragraphs: usize,
    pub runs: usize,
    pub tables: usize,
    pub table_rows: usize,
    pub images: Vec<ExtractedImage>,
    pub layouts: usize,
    pub report_path: PathBuf,
}

/// Load the configured input and write its report and images.
///
/// Creates the output directory and its images subdirectory if absent.
/// Loader failures propagate before the report is touched.
pub fn run<L: DocumentLoader>(loader: &L, config: &ExtractConfig) -> Result<ExtractionSummary> {
    fs::create_dir_all(config.output_dir())?;
    fs::create_dir_all(config.images_dir())?;

    log::info!("Loading {}", config.input().display());
    let document = loader.load(config.input())?;
    log::info!(
        "Loaded {} slides and {} layouts",
        document.slides.len(),
        document.layouts.len()
    );

    Extractor::new(&document, config)?.extract_all()
}

/// Walks one document and writes the report.
pub struct Extractor<'a> {
    document: &'a Document,
    report: ReportWriter,
    images_dir: PathBuf,
    image_naming: ImageNaming,
    summary: ExtractionSummary,
}

impl<'a> Extractor<'a> {
    /// Create the extractor, truncating the report file.
    pub fn new(document: &'a Document, config: &ExtractConfig) -> Result<Self> {
        let report = ReportWriter::create(config.report_path())?;
        let summary = ExtractionSummary {
            slides: document.slides.len(),
            report_path: report.path().to_path_buf(),
            ..ExtractionSummary::default()
        };

        Ok(Self {
            document,
            report,
            images_dir: config.images_dir(),
            image_naming: config.image_naming(),
            summary,
        })
    }

    /// Run all four passes between the start and completion banners.
    pub fn extract_all(mut self) -> Result<ExtractionSummary> {
        self.report.line(format::START_BANNER)?;
        self.report.blank()?;

        self.extract_text_and_fonts()?;
        self.extract_tables()?;
        self.extract_images()?;
        self.extract_layouts()?;

        self.report.blank()?;
        self.report.line(format::COMPLETE_BANNER)?;

        let Self {
            report, summary, ..
        } = self;
        report.finish()?;

        log::info!(
            "Extraction complete: {} paragraphs, {} table rows, {} images",
            summary.paragraphs,
            summary.table_rows,
            summary.images.len()
        );
        Ok(summary)
    }

    /// Paragraph text and per-run size, colour and bold flag for every
    /// shape with a text frame.
    pub fn extract_text_and_fonts(&mut self) -> Result<()> {
        self.section(Section::TextAndFonts)?;
        let document = self.document;

        for (idx, slide) in document.slides.iter().enumerate() {
            self.report.line(format::slide_header(idx + 1))?;

            let frames = slide
                .shapes
                .iter()
                .filter(|s| s.has_text_frame())
                .filter_map(|s| s.text_frame.as_ref());
            for frame in frames {
                for paragraph in &frame.paragraphs {
                    self.report.line(format::paragraph_line(&paragraph.text))?;
                    self.summary.paragraphs += 1;

                    for run in &paragraph.runs {
                        for line in format::font_lines(&run.font) {
                            self.report.line(line)?;
                        }
                        self.summary.runs += 1;
                    }
                }
            }
        }

        Ok(())
    }

    /// One line per table row, rows numbered from 1 within each table.
    pub fn extract_tables(&mut self) -> Result<()> {
        self.section(Section::Tables)?;
        let document = self.document;

        for (idx, slide) in document.slides.iter().enumerate() {
            self.report.line(format::slide_header(idx + 1))?;

            let tables = slide
                .shapes
                .iter()
                .filter(|s| s.has_table())
                .filter_map(|s| s.table.as_ref());
            for table in tables {
                for (row_idx, row) in table.rows.iter().enumerate() {
                    self.report.line(format::row_line(row_idx + 1, row))?;
                }
                self.summary.tables += 1;
                self.summary.table_rows += table.rows.len();
            }
        }

        Ok(())
    }

    /// Write every picture's bytes to `images/image_<n>.<ext>`, `n` counting
    /// from zero across the whole document.
    pub fn extract_images(&mut self) -> Result<()> {
        self.section(Section::Images)?;
        let document = self.document;
        fs::create_dir_all(&self.images_dir)?;
        log::debug!(
            "{} pictures to write to {}",
            document.picture_count(),
            self.images_dir.display()
        );

        let mut count = 0usize;
        for (idx, slide) in document.slides.iter().enumerate() {
            let slide_number = idx + 1;

            for shape in slide.shapes.iter().filter(|s| s.is_picture()) {
                let picture = shape
                    .picture
                    .as_ref()
                    .ok_or(Error::MissingImage {
                        slide: slide_number,
                    })?;
                let blob = picture.blob.as_deref().ok_or(Error::MissingImage {
                    slide: slide_number,
                })?;

                let path = self
                    .images_dir
                    .join(self.image_naming.file_name(count, picture));
                fs::write(&path, blob)?;
                log::debug!("Wrote {} bytes to {}", blob.len(), path.display());

                self.report
                    .line(format::image_line(count, slide_number, &path))?;
                self.summary.images.push(ExtractedImage {
                    index: count,
                    slide: slide_number,
                    path,
                    bytes: blob.len(),
                });
                count += 1;
            }
        }

        Ok(())
    }

    /// Layout names in layout-list order, numbered from 1.
    pub fn extract_layouts(&mut self) -> Result<()> {
        self.section(Section::Layouts)?;

        for (idx, layout) in self.document.layouts.iter().enumerate() {
            self.report.line(format::layout_line(idx + 1, &layout.name))?;
        }
        self.summary.layouts = self.document.layouts.len();

        Ok(())
    }

    fn section(&mut self, section: Section) -> Result<()> {
        log::debug!("{}", section.banner());
        self.report.blank()?;
        self.report.line(section.banner())?;
        self.report.blank()
    }
}
