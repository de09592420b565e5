//! Read-only document model produced by a [`DocumentLoader`](crate::DocumentLoader).

/// A loaded presentation: slides and the layouts of its first slide master.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    /// Slides in presentation order.
    pub slides: Vec<Slide>,

    /// Slide layouts in layout-list order.
    pub layouts: Vec<Layout>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a slide to the document.
    pub fn add_slide(&mut self, slide: Slide) {
        self.slides.push(slide);
    }

    /// Add a layout to the document.
    pub fn add_layout(&mut self, layout: Layout) {
        self.layouts.push(layout);
    }

    /// Number of picture shapes across all slides.
    pub fn picture_count(&self) -> usize {
        self.slides
            .iter()
            .map(|s| s.shapes.iter().filter(|sh| sh.is_picture()).count())
            .sum()
    }
}

/// A single slide.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Slide {
    /// Top-level shapes in document order.
    pub shapes: Vec<Shape>,
}

impl Slide {
    /// Create a slide from its shapes.
    pub fn new(shapes: Vec<Shape>) -> Self {
        Self { shapes }
    }
}

/// The element a shape was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    /// A free-standing shape or text box.
    AutoShape,
    /// A shape bound to a layout placeholder.
    Placeholder,
    /// A picture.
    Picture,
    /// A picture filling a layout placeholder.
    PlaceholderPicture,
    /// A movie frame.
    Media,
    /// A graphic frame (table, chart, diagram, OLE object).
    GraphicFrame,
    /// A group of shapes.
    Group,
    /// A connector line.
    Connector,
    /// Ink or other content part.
    ContentPart,
}

/// A positioned visual element on a slide.
///
/// `text_frame`, `table` and `picture` are independent: the extraction
/// passes check each predicate on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    /// Shape name from its non-visual properties.
    pub name: String,

    pub kind: ShapeKind,

    pub text_frame: Option<TextFrame>,

    pub table: Option<Table>,

    pub picture: Option<Picture>,
}

impl Shape {
    /// Create a shape of the given kind with no content.
    pub fn new(kind: ShapeKind) -> Self {
        Self {
            name: String::new(),
            kind,
            text_frame: None,
            table: None,
            picture: None,
        }
    }

    /// Set the shape name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Attach a text frame.
    pub fn with_text_frame(mut self, frame: TextFrame) -> Self {
        self.text_frame = Some(frame);
        self
    }

    /// Attach a table.
    pub fn with_table(mut self, table: Table) -> Self {
        self.table = Some(table);
        self
    }

    /// Attach a picture payload.
    pub fn with_picture(mut self, picture: Picture) -> Self {
        self.picture = Some(picture);
        self
    }

    pub fn has_text_frame(&self) -> bool {
        self.text_frame.is_some()
    }

    pub fn has_table(&self) -> bool {
        self.table.is_some()
    }

    /// Whether the shape is a plain picture. Placeholder pictures and media
    /// frames also carry an image but are not pictures here.
    pub fn is_picture(&self) -> bool {
        self.kind == ShapeKind::Picture
    }
}

/// Text content of a shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextFrame {
    pub paragraphs: Vec<Paragraph>,
}

impl TextFrame {
    /// Create a text frame from paragraphs.
    pub fn new(paragraphs: Vec<Paragraph>) -> Self {
        Self { paragraphs }
    }

    /// A frame for a shape without a text body: a single empty paragraph.
    pub fn empty() -> Self {
        Self {
            paragraphs: vec![Paragraph::default()],
        }
    }

    /// Paragraph texts joined by newlines.
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A paragraph: its combined text and its formatted runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    /// Runs, fields and line breaks concatenated. Line breaks appear as
    /// U+000B.
    pub text: String,

    /// Regular runs only.
    pub runs: Vec<Run>,
}

impl Paragraph {
    /// Build a paragraph whose text is the concatenation of its runs.
    pub fn from_runs(runs: Vec<Run>) -> Self {
        let text: String = runs.iter().map(|r| r.text.as_str()).collect();
        Self { text, runs }
    }
}

/// A span of text sharing uniform font formatting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Run {
    pub text: String,
    pub font: Font,
}

impl Run {
    /// Create a run with unset font attributes.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font: Font::default(),
        }
    }

    /// Replace the run font.
    pub fn with_font(mut self, font: Font) -> Self {
        self.font = font;
        self
    }
}

/// Directly applied run font properties. `None` means inherited.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Font {
    /// Size in points.
    pub size: Option<f64>,
    pub color: Option<FontColor>,
    pub bold: Option<bool>,
}

impl Font {
    /// Convert a size in hundredths of a point to points.
    ///
    /// Goes through English Metric Units (12700 per point) so that values
    /// such as `1050` come out as exactly `10.5`. Computed in `f64`, so
    /// out-of-range sizes still give a finite value.
    pub fn size_from_centipoints(centipoints: i64) -> f64 {
        centipoints as f64 * 127.0 / 12700.0
    }
}

/// Colour of a solid font fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontColor {
    /// Explicit sRGB colour.
    Rgb([u8; 3]),
    /// Theme colour reference, e.g. `accent1`.
    Scheme(String),
    /// Preset colour name, e.g. `red`.
    Preset(String),
    /// System colour, e.g. `windowText`.
    System(String),
    /// HSL or scRGB percentage colour.
    Other,
}

impl FontColor {
    /// Parse a six-digit hex `RRGGBB` value.
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::Rgb([channel(0)?, channel(2)?, channel(4)?]))
    }

    /// The explicit RGB value, if this is an sRGB colour.
    pub fn rgb(&self) -> Option<[u8; 3]> {
        match self {
            Self::Rgb(rgb) => Some(*rgb),
            _ => None,
        }
    }
}

/// A table from a graphic frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub rows: Vec<TableRow>,
}

impl Table {
    /// Build a table from rows of cell texts.
    pub fn from_texts<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| TableRow {
                    cells: row
                        .into_iter()
                        .map(|text| TableCell { text: text.into() })
                        .collect(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

impl TableRow {
    /// Cell texts in column order.
    pub fn texts(&self) -> Vec<&str> {
        self.cells.iter().map(|c| c.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableCell {
    /// Paragraph texts joined by newlines.
    pub text: String,
}

/// Image payload of a picture shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Picture {
    /// Raw bytes of the embedded image; `None` for linked or unresolvable
    /// images.
    pub blob: Option<Vec<u8>>,

    /// File name of the image part inside the package, e.g. `image3.jpeg`.
    pub source_name: Option<String>,
}

impl Picture {
    /// Create a picture from embedded bytes.
    pub fn embedded(blob: Vec<u8>, source_name: impl Into<String>) -> Self {
        Self {
            blob: Some(blob),
            source_name: Some(source_name.into()),
        }
    }

    /// Extension of the source part, lowercased.
    pub fn source_extension(&self) -> Option<String> {
        self.source_name
            .as_deref()
            .and_then(|n| n.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
    }
}

/// A named slide layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    pub name: String,
}

impl Layout {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// The format of the source presentation file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationFormat {
    /// Modern PPTX (Office Open XML).
    Pptx,
    /// Legacy PPT (OLE/CFB binary).
    Ppt,
}

impl PresentationFormat {
    /// Detect format from file magic bytes.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 4 {
            return None;
        }

        // PPTX is a ZIP file (PK\x03\x04)
        if bytes.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
            return Some(Self::Pptx);
        }

        // PPT is an OLE/CFB file (D0 CF 11 E0 A1 B1 1A E1)
        if bytes.len() >= 8
            && bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1])
        {
            return Some(Self::Ppt);
        }

        None
    }
}
