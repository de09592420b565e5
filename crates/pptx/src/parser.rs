//! PPTX document loader implementation.

use crate::package::{rel_types, Package, Relationships};
use crate::slide::{parse_shapes, ParsedShape};
use crate::xml::{attr, prefixed_attr};
use deckdump_core::{
    Document, DocumentLoader, Error, Layout, Picture, PresentationFormat, Result, ShapeKind, Slide,
};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

/// Fallback location of the main presentation part.
const DEFAULT_PRESENTATION_PART: &str = "ppt/presentation.xml";

/// Loader for PPTX (Office Open XML) files.
pub struct PptxLoader;

impl PptxLoader {
    /// Create a new PPTX loader.
    pub fn new() -> Self {
        Self
    }

    /// Load a PPTX document from a reader.
    pub fn load_reader<R: Read + Seek>(&self, reader: R) -> Result<Document> {
        let mut package = Package::open(reader)?;

        let presentation_part = self.presentation_part(&mut package)?;
        log::debug!("Main presentation part: {}", presentation_part);

        let content = package.read_string(&presentation_part)?;
        let ids = parse_presentation_ids(&content)?;
        let rels = package.relationships(&presentation_part)?;

        let mut document = Document::new();

        for (idx, rid) in ids.slides.iter().enumerate() {
            let slide_part = rels
                .part_name(rid)
                .ok_or_else(|| Error::LoadError(format!("Slide relationship '{}' not found", rid)))?;
            warn_unexpected_type(&rels, rid, rel_types::SLIDE);
            log::debug!("Parsing slide {} from {}", idx + 1, slide_part);
            let slide = self.parse_slide(&mut package, &slide_part, idx + 1)?;
            document.add_slide(slide);
        }

        if let Some(master_rid) = ids.masters.first() {
            let master_part = rels.part_name(master_rid).ok_or_else(|| {
                Error::LoadError(format!("Slide master relationship '{}' not found", master_rid))
            })?;
            warn_unexpected_type(&rels, master_rid, rel_types::SLIDE_MASTER);
            for layout in self.parse_layouts(&mut package, &master_part)? {
                document.add_layout(layout);
            }
        }

        Ok(document)
    }

    /// Find the main presentation part through the package relationships.
    fn presentation_part<R: Read + Seek>(&self, package: &mut Package<R>) -> Result<String> {
        let root_rels = package.relationships("")?;
        if let Some(part) = root_rels.first_of_type(rel_types::OFFICE_DOCUMENT) {
            return Ok(part);
        }
        if package.has_part(DEFAULT_PRESENTATION_PART) {
            return Ok(DEFAULT_PRESENTATION_PART.to_string());
        }
        Err(Error::LoadError(
            "Package has no presentation part".to_string(),
        ))
    }

    /// Parse a single slide and read the bytes of its pictures.
    fn parse_slide<R: Read + Seek>(
        &self,
        package: &mut Package<R>,
        slide_part: &str,
        slide_number: usize,
    ) -> Result<Slide> {
        let content = package.read_string(slide_part)?;
        let parsed = parse_shapes(&content)?;
        let rels = package.relationships(slide_part)?;

        let mut shapes = Vec::with_capacity(parsed.len());
        for ParsedShape { mut shape, image_rel } in parsed {
            if matches!(
                shape.kind,
                ShapeKind::Picture | ShapeKind::PlaceholderPicture | ShapeKind::Media
            ) {
                shape.picture = Some(self.read_picture(package, &rels, image_rel, slide_number)?);
            }
            shapes.push(shape);
        }

        Ok(Slide::new(shapes))
    }

    /// Resolve a picture's image relationship and read its bytes.
    ///
    /// Linked or dangling images yield a picture without a blob.
    fn read_picture<R: Read + Seek>(
        &self,
        package: &mut Package<R>,
        rels: &Relationships,
        image_rel: Option<String>,
        slide_number: usize,
    ) -> Result<Picture> {
        let Some(rid) = image_rel else {
            return Ok(Picture::default());
        };
        let Some(part) = rels.part_name(&rid) else {
            log::warn!(
                "Slide {}: image relationship '{}' is external or missing",
                slide_number,
                rid
            );
            return Ok(Picture::default());
        };
        warn_unexpected_type(rels, &rid, rel_types::IMAGE);

        let blob = package.read_bytes(&part)?;
        let file_name = part.rsplit('/').next().unwrap_or(&part).to_string();
        Ok(Picture::embedded(blob, file_name))
    }

    /// Layouts of a slide master, in the master's layout-list order.
    fn parse_layouts<R: Read + Seek>(
        &self,
        package: &mut Package<R>,
        master_part: &str,
    ) -> Result<Vec<Layout>> {
        let content = package.read_string(master_part)?;
        let layout_ids = parse_layout_ids(&content)?;
        let rels = package.relationships(master_part)?;

        let mut layouts = Vec::with_capacity(layout_ids.len());
        for rid in layout_ids {
            let part = rels.part_name(&rid).ok_or_else(|| {
                Error::LoadError(format!("Slide layout relationship '{}' not found", rid))
            })?;
            warn_unexpected_type(&rels, &rid, rel_types::SLIDE_LAYOUT);
            let content = package.read_string(&part)?;
            let name = parse_common_slide_name(&content)?;
            log::debug!("Layout {} ({}): {:?}", layouts.len() + 1, part, name);
            layouts.push(Layout::new(name));
        }

        Ok(layouts)
    }
}

impl Default for PptxLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentLoader for PptxLoader {
    fn load(&self, path: &Path) -> Result<Document> {
        let mut file = File::open(path)?;

        let mut magic = [0u8; 8];
        let read = file.read(&mut magic)?;
        match PresentationFormat::from_magic(&magic[..read]) {
            Some(PresentationFormat::Pptx) => {}
            Some(PresentationFormat::Ppt) => {
                return Err(Error::UnsupportedFormat(format!(
                    "{} is a legacy binary PowerPoint file; only .pptx is supported",
                    path.display()
                )));
            }
            None => {
                return Err(Error::UnsupportedFormat(format!(
                    "{} is not a ZIP-based presentation",
                    path.display()
                )));
            }
        }

        file.rewind()?;
        self.load_reader(BufReader::new(file))
    }
}

/// Log relationships whose type does not match what the referencing
/// element expects. The target is still followed.
fn warn_unexpected_type(rels: &Relationships, rid: &str, suffix: &str) {
    if let Some(rel) = rels.get(rid).filter(|r| !r.is_type(suffix)) {
        log::warn!(
            "Relationship '{}' has type '{}', expected '*{}'",
            rid,
            rel.rel_type,
            suffix
        );
    }
}

/// Relationship ids listed by the presentation part.
#[derive(Debug, Default, PartialEq, Eq)]
struct PresentationIds {
    /// `p:sldIdLst` entries in presentation order.
    slides: Vec<String>,
    /// `p:sldMasterIdLst` entries.
    masters: Vec<String>,
}

fn parse_presentation_ids(xml: &str) -> Result<PresentationIds> {
    let mut ids = PresentationIds::default();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                let list = match e.local_name().as_ref() {
                    b"sldId" => &mut ids.slides,
                    b"sldMasterId" => &mut ids.masters,
                    _ => continue,
                };
                if let Some(rid) = prefixed_attr(e, b"id")? {
                    list.push(rid);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing presentation part: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(ids)
}

fn parse_layout_ids(xml: &str) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.local_name().as_ref() == b"sldLayoutId" =>
            {
                if let Some(rid) = prefixed_attr(e, b"id")? {
                    ids.push(rid);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing slide master: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(ids)
}

/// The `name` attribute of the part's `p:cSld` element, empty when absent.
fn parse_common_slide_name(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.local_name().as_ref() == b"cSld" =>
            {
                return Ok(attr(e, b"name")?.unwrap_or_default());
            }
            Ok(Event::Eof) => return Ok(String::new()),
            Err(e) => {
                return Err(Error::XmlError(format!("Error parsing slide layout: {}", e)));
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckdump_core::{ExtractConfig, FontColor};
    use std::fs;
    use std::io::{Cursor, Write};
    use tempfile::TempDir;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;
    const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

    fn relationships(entries: &[(&str, &str, &str)]) -> String {
        let body: String = entries
            .iter()
            .map(|(id, kind, target)| {
                format!(
                    r#"<Relationship Id="{}" Type="{}/{}" Target="{}"/>"#,
                    id, REL_NS, kind, target
                )
            })
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
            body
        )
    }

    fn slide_xml(tree: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sld {}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}</p:spTree></p:cSld></p:sld>"#,
            NS, tree
        )
    }

    fn text_box(text: &str, rpr: &str) -> String {
        format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="TextBox"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:p><a:r>{}<a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>"#,
            rpr, text
        )
    }

    fn picture(rid: &str) -> String {
        format!(
            r#"<p:pic><p:nvPicPr><p:cNvPr id="3" name="Picture"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="{}"/></p:blipFill><p:spPr/></p:pic>"#,
            rid
        )
    }

    fn table(rows: &[&[&str]]) -> String {
        let rows: String = rows
            .iter()
            .map(|cells| {
                let cells: String = cells
                    .iter()
                    .map(|c| {
                        format!(
                            r#"<a:tc><a:txBody><a:bodyPr/><a:p><a:r><a:t>{}</a:t></a:r></a:p></a:txBody></a:tc>"#,
                            c
                        )
                    })
                    .collect();
                format!(r#"<a:tr h="370840">{}</a:tr>"#, cells)
            })
            .collect();
        format!(
            r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="4" name="Table"/><p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr><p:xfrm/><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/table"><a:tbl>{}</a:tbl></a:graphicData></a:graphic></p:graphicFrame>"#,
            rows
        )
    }

    /// Build a minimal presentation package. Slides are listed in
    /// presentation order but stored under reversed part names so that
    /// ordering must come from `p:sldIdLst`.
    fn build_pptx(slides: &[String], slide_rels: &[String], layouts: &[&str]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default();

        let add = |zip: &mut ZipWriter<Cursor<Vec<u8>>>, name: &str, content: &[u8]| {
            zip.start_file(name, options).unwrap();
            zip.write_all(content).unwrap();
        };

        add(
            &mut zip,
            "_rels/.rels",
            relationships(&[("rId1", "officeDocument", "ppt/presentation.xml")]).as_bytes(),
        );

        let count = slides.len();
        let mut pres_rels = vec![(
            "rId1".to_string(),
            "slideMaster",
            "slideMasters/slideMaster1.xml".to_string(),
        )];
        let mut sld_ids = String::new();
        for (idx, (slide, rels)) in slides.iter().zip(slide_rels).enumerate() {
            let part_number = count - idx;
            let rid = format!("rId{}", idx + 2);
            add(
                &mut zip,
                &format!("ppt/slides/slide{}.xml", part_number),
                slide.as_bytes(),
            );
            add(
                &mut zip,
                &format!("ppt/slides/_rels/slide{}.xml.rels", part_number),
                rels.as_bytes(),
            );
            sld_ids.push_str(&format!(r#"<p:sldId id="{}" r:id="{}"/>"#, 256 + idx, rid));
            pres_rels.push((rid, "slide", format!("slides/slide{}.xml", part_number)));
        }

        let pres_rels: Vec<(&str, &str, &str)> = pres_rels
            .iter()
            .map(|(id, kind, target)| (id.as_str(), *kind, target.as_str()))
            .collect();
        add(
            &mut zip,
            "ppt/_rels/presentation.xml.rels",
            relationships(&pres_rels).as_bytes(),
        );
        add(
            &mut zip,
            "ppt/presentation.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:presentation {}><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{}</p:sldIdLst><p:sldSz cx="9144000" cy="6858000"/></p:presentation>"#,
                NS, sld_ids
            )
            .as_bytes(),
        );

        let mut layout_ids = String::new();
        let mut master_rels = Vec::new();
        for (idx, name) in layouts.iter().enumerate() {
            let rid = format!("rId{}", idx + 1);
            // Layout parts are numbered backwards to check list ordering.
            let part_number = layouts.len() - idx;
            layout_ids.push_str(&format!(
                r#"<p:sldLayoutId id="{}" r:id="{}"/>"#,
                2147483649usize + idx,
                rid
            ));
            master_rels.push((
                rid,
                format!("../slideLayouts/slideLayout{}.xml", part_number),
            ));
            add(
                &mut zip,
                &format!("ppt/slideLayouts/slideLayout{}.xml", part_number),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sldLayout {}><p:cSld name="{}"><p:spTree/></p:cSld></p:sldLayout>"#,
                    NS, name
                )
                .as_bytes(),
            );
        }
        let master_rels: Vec<(&str, &str, &str)> = master_rels
            .iter()
            .map(|(id, target)| (id.as_str(), "slideLayout", target.as_str()))
            .collect();
        add(
            &mut zip,
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            relationships(&master_rels).as_bytes(),
        );
        add(
            &mut zip,
            "ppt/slideMasters/slideMaster1.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sldMaster {}><p:cSld><p:spTree/></p:cSld><p:sldLayoutIdLst>{}</p:sldLayoutIdLst></p:sldMaster>"#,
                NS, layout_ids
            )
            .as_bytes(),
        );

        add(&mut zip, "ppt/media/image1.png", b"\x89PNG first");
        add(&mut zip, "ppt/media/image2.jpeg", b"\xFF\xD8\xFF second");
        add(&mut zip, "ppt/media/image3.png", b"\x89PNG third");

        zip.finish().unwrap().into_inner()
    }

    fn sample_pptx() -> Vec<u8> {
        let slide1 = slide_xml(&format!(
            "{}{}{}",
            text_box("Hello", r#"<a:rPr lang="en-US" sz="1800" b="1"><a:solidFill><a:srgbClr val="1F4E79"/></a:solidFill></a:rPr>"#),
            table(&[&["A", "B"], &["C", "D"]]),
            picture("rId2"),
        ));
        let slide2 = slide_xml(&format!(
            "{}{}{}",
            text_box("World", ""),
            picture("rId2"),
            picture("rId3"),
        ));

        let rels1 = relationships(&[
            ("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml"),
            ("rId2", "image", "../media/image1.png"),
        ]);
        let rels2 = relationships(&[
            ("rId1", "slideLayout", "../slideLayouts/slideLayout2.xml"),
            ("rId2", "image", "../media/image2.jpeg"),
            ("rId3", "image", "/ppt/media/image3.png"),
        ]);

        build_pptx(
            &[slide1, slide2],
            &[rels1, rels2],
            &["Title Slide", "Title and Content", "Blank"],
        )
    }

    #[test]
    fn test_load_slides_in_presentation_order() {
        let doc = PptxLoader::new()
            .load_reader(Cursor::new(sample_pptx()))
            .unwrap();

        assert_eq!(doc.slides.len(), 2);
        let first_text = doc.slides[0].shapes[0].text_frame.as_ref().unwrap();
        assert_eq!(first_text.paragraphs[0].text, "Hello");
        let second_text = doc.slides[1].shapes[0].text_frame.as_ref().unwrap();
        assert_eq!(second_text.paragraphs[0].text, "World");
    }

    #[test]
    fn test_load_fonts_tables_and_pictures() {
        let doc = PptxLoader::new()
            .load_reader(Cursor::new(sample_pptx()))
            .unwrap();

        let run = &doc.slides[0].shapes[0].text_frame.as_ref().unwrap().paragraphs[0].runs[0];
        assert_eq!(run.font.size, Some(18.0));
        assert_eq!(run.font.bold, Some(true));
        assert_eq!(run.font.color, Some(FontColor::Rgb([0x1F, 0x4E, 0x79])));

        let table = doc.slides[0].shapes[1].table.as_ref().unwrap();
        assert_eq!(table.rows[0].texts(), vec!["A", "B"]);
        assert_eq!(table.rows[1].texts(), vec!["C", "D"]);

        assert_eq!(doc.picture_count(), 3);
        let pic = doc.slides[1].shapes[1].picture.as_ref().unwrap();
        assert_eq!(pic.blob.as_deref(), Some(&b"\xFF\xD8\xFF second"[..]));
        assert_eq!(pic.source_name.as_deref(), Some("image2.jpeg"));
        let absolute = doc.slides[1].shapes[2].picture.as_ref().unwrap();
        assert_eq!(absolute.blob.as_deref(), Some(&b"\x89PNG third"[..]));
    }

    #[test]
    fn test_load_layouts_in_master_order() {
        let doc = PptxLoader::new()
            .load_reader(Cursor::new(sample_pptx()))
            .unwrap();

        let names: Vec<&str> = doc.layouts.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Title Slide", "Title and Content", "Blank"]);
    }

    #[test]
    fn test_picture_with_missing_relationship_has_no_blob() {
        let slide = slide_xml(&picture("rId7"));
        let rels = relationships(&[]);
        let bytes = build_pptx(&[slide], &[rels], &[]);

        let doc = PptxLoader::new().load_reader(Cursor::new(bytes)).unwrap();
        let shape = &doc.slides[0].shapes[0];
        assert_eq!(shape.kind, ShapeKind::Picture);
        assert_eq!(shape.picture.as_ref().unwrap().blob, None);
        assert!(doc.layouts.is_empty());
    }

    #[test]
    fn test_not_a_zip_is_a_zip_error() {
        let result = PptxLoader::new().load_reader(Cursor::new(b"definitely not a zip".to_vec()));
        assert!(matches!(result, Err(Error::ZipError(_))));
    }

    #[test]
    fn test_missing_presentation_part() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("docProps/app.xml", FileOptions::default())
            .unwrap();
        zip.write_all(b"<Properties/>").unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        let err = PptxLoader::new()
            .load_reader(Cursor::new(bytes))
            .unwrap_err();
        assert!(err.is_load_error());
    }

    #[test]
    fn test_load_from_path_rejects_legacy_ppt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("old.ppt");
        let mut header = vec![0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
        header.extend_from_slice(&[0u8; 504]);
        fs::write(&path, header).unwrap();

        let err = PptxLoader::new().load(&path).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn test_load_from_path_rejects_unknown_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "plain text").unwrap();

        let err = PptxLoader::new().load(&path).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn test_end_to_end_extraction() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("deck.pptx");
        fs::write(&input, sample_pptx()).unwrap();

        let config = ExtractConfig::new(&input, dir.path().join("out"));
        let summary = deckdump_core::run(&PptxLoader::new(), &config).unwrap();

        assert_eq!(summary.images.len(), 3);
        let images = config.images_dir();
        assert_eq!(fs::read(images.join("image_0.png")).unwrap(), b"\x89PNG first");
        assert_eq!(
            fs::read(images.join("image_1.png")).unwrap(),
            b"\xFF\xD8\xFF second"
        );
        assert_eq!(fs::read(images.join("image_2.png")).unwrap(), b"\x89PNG third");

        let report = fs::read_to_string(config.report_path()).unwrap();
        assert!(report.starts_with("Starting PowerPoint Extraction...\n"));
        assert!(report.contains(
            "Slide 1:\n  Paragraph: Hello\n    Font Size: 18.0\n    Font Color: 1F4E79\n    Bold: true\n"
        ));
        assert!(report.contains(
            "Slide 2:\n  Paragraph: World\n    Font Size: Default\n    Font Color: Default\n    Bold: Default\n"
        ));
        assert!(report.contains("  Row 1: ['A', 'B']\n  Row 2: ['C', 'D']\n"));
        assert!(report.contains("Extracted image 1 from slide 2 to "));
        assert!(report.contains(
            "Layout 1: Title Slide\nLayout 2: Title and Content\nLayout 3: Blank\n"
        ));
        assert!(report.ends_with("\nExtraction Complete!\n"));
    }
}
