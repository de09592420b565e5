//! Shape tree parsing for slide parts.
//!
//! Only direct children of `p:spTree` become shapes; members of a group stay
//! inside their group. The parser keeps a stack of open element local names
//! and interprets each event by its position relative to the shape, text body
//! or table it belongs to.

use crate::xml::{attr, local_name, parse_bool, prefixed_attr};
use deckdump_core::{
    Error, Font, FontColor, Paragraph, Result, Run, Shape, ShapeKind, Table, TableCell, TableRow,
    TextFrame,
};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Character used for `a:br` inside paragraph text.
const LINE_BREAK: char = '\u{b}';

/// A shape plus the relationship id of its embedded image, still to be
/// resolved against the slide's relationships.
#[derive(Debug)]
pub(crate) struct ParsedShape {
    pub shape: Shape,
    pub image_rel: Option<String>,
}

/// Parse the top-level shapes of a slide part.
pub(crate) fn parse_shapes(xml: &str) -> Result<Vec<ParsedShape>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut parser = ShapeTreeParser::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                stack.push(local_name(e.name().as_ref()).to_vec());
                parser.start(&stack, e)?;
            }
            Ok(Event::Empty(ref e)) => {
                stack.push(local_name(e.name().as_ref()).to_vec());
                parser.start(&stack, e)?;
                parser.end(&stack);
                stack.pop();
            }
            Ok(Event::End(_)) => {
                parser.end(&stack);
                stack.pop();
            }
            Ok(Event::Text(ref e)) => {
                let text = e
                    .unescape()
                    .map_err(|e| Error::XmlError(format!("Bad text content: {}", e)))?;
                parser.text(&stack, &text);
            }
            Ok(Event::CData(e)) => {
                let bytes = e.into_inner();
                parser.text(&stack, &String::from_utf8_lossy(&bytes));
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing slide at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(parser.shapes)
}

/// Element names that open a shape inside `p:spTree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShapeTag {
    Sp,
    Pic,
    GraphicFrame,
    GrpSp,
    CxnSp,
    ContentPart,
}

impl ShapeTag {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"sp" => Some(Self::Sp),
            b"pic" => Some(Self::Pic),
            b"graphicFrame" => Some(Self::GraphicFrame),
            b"grpSp" => Some(Self::GrpSp),
            b"cxnSp" => Some(Self::CxnSp),
            b"contentPart" => Some(Self::ContentPart),
            _ => None,
        }
    }
}

fn parent(stack: &[Vec<u8>]) -> &[u8] {
    stack
        .len()
        .checked_sub(2)
        .map(|i| stack[i].as_slice())
        .unwrap_or_default()
}

fn top(stack: &[Vec<u8>]) -> &[u8] {
    stack.last().map(|n| n.as_slice()).unwrap_or_default()
}

#[derive(Default)]
struct ShapeTreeParser {
    shapes: Vec<ParsedShape>,
    current: Option<ShapeBuilder>,
}

impl ShapeTreeParser {
    fn start(&mut self, stack: &[Vec<u8>], e: &BytesStart<'_>) -> Result<()> {
        let name = top(stack);
        match self.current.as_mut() {
            None => {
                if parent(stack) == b"spTree" {
                    if let Some(tag) = ShapeTag::from_local_name(name) {
                        self.current = Some(ShapeBuilder::new(tag, stack.len()));
                    }
                }
                Ok(())
            }
            Some(shape) => shape.start(stack, e),
        }
    }

    fn end(&mut self, stack: &[Vec<u8>]) {
        let Some(shape) = self.current.as_mut() else {
            return;
        };
        if stack.len() == shape.depth {
            if let Some(shape) = self.current.take() {
                self.shapes.push(shape.finish());
            }
        } else {
            shape.end(stack);
        }
    }

    fn text(&mut self, stack: &[Vec<u8>], text: &str) {
        if let Some(shape) = self.current.as_mut() {
            shape.text(stack, text);
        }
    }
}

struct ShapeBuilder {
    tag: ShapeTag,
    /// Stack length at which the shape element is open.
    depth: usize,
    name: String,
    placeholder: bool,
    video: bool,
    text_body: Option<TextBodyBuilder>,
    text_frame: Option<TextFrame>,
    table: Option<TableBuilder>,
    finished_table: Option<Table>,
    image_rel: Option<String>,
}

impl ShapeBuilder {
    fn new(tag: ShapeTag, depth: usize) -> Self {
        Self {
            tag,
            depth,
            name: String::new(),
            placeholder: false,
            video: false,
            text_body: None,
            text_frame: None,
            table: None,
            finished_table: None,
            image_rel: None,
        }
    }

    fn start(&mut self, stack: &[Vec<u8>], e: &BytesStart<'_>) -> Result<()> {
        if let Some(body) = self.text_body.as_mut() {
            return body.start(stack, e);
        }
        if let Some(table) = self.table.as_mut() {
            return table.start(stack, e);
        }

        let rel = stack.len() - self.depth;
        let name = top(stack);
        let parent_name = parent(stack);

        match (rel, name) {
            (2, b"cNvPr") => {
                self.name = attr(e, b"name")?.unwrap_or_default();
            }
            (3, b"ph") if parent_name == b"nvPr" => self.placeholder = true,
            (3, b"videoFile") if parent_name == b"nvPr" => self.video = true,
            (1, b"txBody") if self.tag == ShapeTag::Sp => {
                self.text_body = Some(TextBodyBuilder::new(stack.len()));
            }
            (2, b"blip") if self.tag == ShapeTag::Pic && parent_name == b"blipFill" => {
                self.image_rel = prefixed_attr(e, b"embed")?;
            }
            (3, b"tbl") if self.tag == ShapeTag::GraphicFrame && parent_name == b"graphicData" => {
                self.table = Some(TableBuilder::new(stack.len()));
            }
            _ => {}
        }
        Ok(())
    }

    fn end(&mut self, stack: &[Vec<u8>]) {
        if let Some(body) = self.text_body.as_mut() {
            if stack.len() == body.depth {
                if let Some(body) = self.text_body.take() {
                    self.text_frame = Some(body.finish());
                }
            } else {
                body.end(stack);
            }
            return;
        }
        if let Some(table) = self.table.as_mut() {
            if stack.len() == table.depth {
                if let Some(table) = self.table.take() {
                    self.finished_table = Some(table.finish());
                }
            } else {
                table.end(stack);
            }
        }
    }

    fn text(&mut self, stack: &[Vec<u8>], text: &str) {
        if let Some(body) = self.text_body.as_mut() {
            body.text(stack, text);
        } else if let Some(table) = self.table.as_mut() {
            table.text(stack, text);
        }
    }

    fn finish(self) -> ParsedShape {
        let kind = match self.tag {
            ShapeTag::Sp if self.placeholder => ShapeKind::Placeholder,
            ShapeTag::Sp => ShapeKind::AutoShape,
            ShapeTag::Pic if self.placeholder => ShapeKind::PlaceholderPicture,
            ShapeTag::Pic if self.video => ShapeKind::Media,
            ShapeTag::Pic => ShapeKind::Picture,
            ShapeTag::GraphicFrame => ShapeKind::GraphicFrame,
            ShapeTag::GrpSp => ShapeKind::Group,
            ShapeTag::CxnSp => ShapeKind::Connector,
            ShapeTag::ContentPart => ShapeKind::ContentPart,
        };

        let mut shape = Shape::new(kind).with_name(self.name);
        if self.tag == ShapeTag::Sp {
            shape.text_frame = Some(self.text_frame.unwrap_or_else(TextFrame::empty));
        }
        shape.table = self.finished_table;

        ParsedShape {
            shape,
            image_rel: self.image_rel,
        }
    }
}

/// Collects paragraphs of an `a:txBody`/`p:txBody` element.
struct TextBodyBuilder {
    /// Stack length at which the text body element is open.
    depth: usize,
    paragraphs: Vec<Paragraph>,
    paragraph: Option<Paragraph>,
    run: Option<RunBuilder>,
    in_field: bool,
}

#[derive(Default)]
struct RunBuilder {
    text: String,
    font: Font,
}

impl TextBodyBuilder {
    fn new(depth: usize) -> Self {
        Self {
            depth,
            paragraphs: Vec::new(),
            paragraph: None,
            run: None,
            in_field: false,
        }
    }

    fn start(&mut self, stack: &[Vec<u8>], e: &BytesStart<'_>) -> Result<()> {
        let rel = stack.len() - self.depth;
        let name = top(stack);
        let parent_name = parent(stack);

        match (rel, name) {
            (1, b"p") => self.paragraph = Some(Paragraph::default()),
            (2, b"r") => self.run = Some(RunBuilder::default()),
            (2, b"fld") => self.in_field = true,
            (2, b"br") => {
                if let Some(paragraph) = self.paragraph.as_mut() {
                    paragraph.text.push(LINE_BREAK);
                }
            }
            (3, b"rPr") if parent_name == b"r" => {
                if let Some(run) = self.run.as_mut() {
                    if let Some(sz) = attr(e, b"sz")?.and_then(|v| v.parse::<i64>().ok()) {
                        run.font.size = Some(Font::size_from_centipoints(sz));
                    }
                    run.font.bold = attr(e, b"b")?.as_deref().and_then(parse_bool);
                }
            }
            (5, _) if parent_name == b"solidFill" && stack[stack.len() - 3] == b"rPr" => {
                if let Some(run) = self.run.as_mut() {
                    if let Some(color) = parse_color(name, e)? {
                        run.font.color = Some(color);
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn end(&mut self, stack: &[Vec<u8>]) {
        let rel = stack.len() - self.depth;
        match (rel, top(stack)) {
            (2, b"r") => {
                if let (Some(run), Some(paragraph)) = (self.run.take(), self.paragraph.as_mut()) {
                    paragraph.text.push_str(&run.text);
                    paragraph.runs.push(Run {
                        text: run.text,
                        font: run.font,
                    });
                }
            }
            (2, b"fld") => self.in_field = false,
            (1, b"p") => {
                if let Some(paragraph) = self.paragraph.take() {
                    self.paragraphs.push(paragraph);
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, stack: &[Vec<u8>], text: &str) {
        if stack.len() != self.depth + 3 || top(stack) != b"t" {
            return;
        }
        match parent(stack) {
            b"r" => {
                if let Some(run) = self.run.as_mut() {
                    run.text.push_str(text);
                }
            }
            b"fld" if self.in_field => {
                if let Some(paragraph) = self.paragraph.as_mut() {
                    paragraph.text.push_str(text);
                }
            }
            _ => {}
        }
    }

    fn finish(self) -> TextFrame {
        TextFrame::new(self.paragraphs)
    }
}

/// Map a DrawingML colour element to a [`FontColor`].
fn parse_color(name: &[u8], e: &BytesStart<'_>) -> Result<Option<FontColor>> {
    let val = attr(e, b"val")?.unwrap_or_default();
    let color = match name {
        b"srgbClr" => FontColor::from_hex(&val).unwrap_or(FontColor::Other),
        b"schemeClr" => FontColor::Scheme(val),
        b"prstClr" => FontColor::Preset(val),
        b"sysClr" => FontColor::System(val),
        b"hslClr" | b"scrgbClr" => FontColor::Other,
        _ => return Ok(None),
    };
    Ok(Some(color))
}

/// Collects rows and cells of an `a:tbl` element.
struct TableBuilder {
    /// Stack length at which the table element is open.
    depth: usize,
    rows: Vec<TableRow>,
    cells: Option<Vec<TableCell>>,
    cell_text: Option<String>,
    cell_body: Option<TextBodyBuilder>,
}

impl TableBuilder {
    fn new(depth: usize) -> Self {
        Self {
            depth,
            rows: Vec::new(),
            cells: None,
            cell_text: None,
            cell_body: None,
        }
    }

    fn start(&mut self, stack: &[Vec<u8>], e: &BytesStart<'_>) -> Result<()> {
        if let Some(body) = self.cell_body.as_mut() {
            return body.start(stack, e);
        }

        match (stack.len() - self.depth, top(stack)) {
            (1, b"tr") => self.cells = Some(Vec::new()),
            (2, b"tc") => self.cell_text = Some(String::new()),
            (3, b"txBody") if parent(stack) == b"tc" => {
                self.cell_body = Some(TextBodyBuilder::new(stack.len()));
            }
            _ => {}
        }
        Ok(())
    }

    fn end(&mut self, stack: &[Vec<u8>]) {
        if let Some(body) = self.cell_body.as_mut() {
            if stack.len() == body.depth {
                if let Some(body) = self.cell_body.take() {
                    self.cell_text = Some(body.finish().text());
                }
            } else {
                body.end(stack);
            }
            return;
        }

        match (stack.len() - self.depth, top(stack)) {
            (2, b"tc") => {
                if let (Some(text), Some(cells)) = (self.cell_text.take(), self.cells.as_mut()) {
                    cells.push(TableCell { text });
                }
            }
            (1, b"tr") => {
                if let Some(cells) = self.cells.take() {
                    self.rows.push(TableRow { cells });
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, stack: &[Vec<u8>], text: &str) {
        if let Some(body) = self.cell_body.as_mut() {
            body.text(stack, text);
        }
    }

    fn finish(self) -> Table {
        Table { rows: self.rows }
    }
}
