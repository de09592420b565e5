//! ZIP package access: part reading and relationship resolution.

use crate::xml::attr;
use deckdump_core::{Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Read, Seek};
use zip::ZipArchive;

/// Largest buffer reserved up front when reading a part.
const MAX_PREALLOC: u64 = 16 * 1024 * 1024;

/// Relationship type suffixes used by the loader.
pub(crate) mod rel_types {
    pub const OFFICE_DOCUMENT: &str = "/officeDocument";
    pub const SLIDE: &str = "/slide";
    pub const SLIDE_MASTER: &str = "/slideMaster";
    pub const SLIDE_LAYOUT: &str = "/slideLayout";
    pub const IMAGE: &str = "/image";
}

/// One entry of a `.rels` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Relationship {
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

impl Relationship {
    /// Whether the relationship type URI ends with `suffix`.
    pub fn is_type(&self, suffix: &str) -> bool {
        self.rel_type.ends_with(suffix)
    }
}

/// Relationships of one source part, keyed by `Id`.
#[derive(Debug, Default)]
pub(crate) struct Relationships {
    /// Package-absolute name of the source part (`""` for the package).
    source: String,
    by_id: HashMap<String, Relationship>,
}

impl Relationships {
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.by_id.get(id)
    }

    /// Resolve relationship `id` to the part name of an internal target.
    pub fn part_name(&self, id: &str) -> Option<String> {
        self.get(id)
            .filter(|rel| !rel.external)
            .map(|rel| resolve_target(&self.source, &rel.target))
    }

    /// Part name of the first internal relationship of the given type.
    pub fn first_of_type(&self, suffix: &str) -> Option<String> {
        let mut ids: Vec<&String> = self
            .by_id
            .iter()
            .filter(|(_, rel)| rel.is_type(suffix) && !rel.external)
            .map(|(id, _)| id)
            .collect();
        ids.sort();
        ids.first().and_then(|id| self.part_name(id))
    }
}

/// An opened presentation package.
pub(crate) struct Package<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl<R: Read + Seek> Package<R> {
    /// Open the ZIP container.
    pub fn open(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;
        Ok(Self { archive })
    }

    pub fn has_part(&self, name: &str) -> bool {
        self.archive.file_names().any(|n| n == name)
    }

    /// Read a part as UTF-8 text.
    pub fn read_string(&mut self, name: &str) -> Result<String> {
        let mut file = self
            .archive
            .by_name(name)
            .map_err(|_| Error::MissingPart(name.to_string()))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", name, e)))?;

        Ok(content)
    }

    /// Read a part as raw bytes.
    pub fn read_bytes(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut file = self
            .archive
            .by_name(name)
            .map_err(|_| Error::MissingPart(name.to_string()))?;

        // The header size is untrusted, so cap the up-front allocation.
        let mut content = Vec::with_capacity(file.size().min(MAX_PREALLOC) as usize);
        file.read_to_end(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", name, e)))?;

        Ok(content)
    }

    /// Relationships of `part`; empty when the part has no `.rels` part.
    pub fn relationships(&mut self, part: &str) -> Result<Relationships> {
        let rels_path = rels_path_for(part);
        if !self.has_part(&rels_path) {
            log::debug!("No relationships for '{}'", part);
            return Ok(Relationships {
                source: part.to_string(),
                by_id: HashMap::new(),
            });
        }

        let content = self.read_string(&rels_path)?;
        let by_id = parse_relationships(&content)
            .map_err(|e| Error::XmlError(format!("Error parsing '{}': {}", rels_path, e)))?;
        Ok(Relationships {
            source: part.to_string(),
            by_id,
        })
    }
}

fn parse_relationships(content: &str) -> Result<HashMap<String, Relationship>> {
    let mut by_id = HashMap::new();
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let id = attr(e, b"Id")?.unwrap_or_default();
                let rel = Relationship {
                    rel_type: attr(e, b"Type")?.unwrap_or_default(),
                    target: attr(e, b"Target")?.unwrap_or_default(),
                    external: attr(e, b"TargetMode")?.as_deref() == Some("External"),
                };
                by_id.insert(id, rel);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlError(e.to_string())),
            _ => {}
        }
    }

    Ok(by_id)
}

/// `ppt/slides/slide1.xml` -> `ppt/slides/_rels/slide1.xml.rels`;
/// the package itself (`""`) -> `_rels/.rels`.
pub(crate) fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the directory of its source part.
///
/// A leading `/` makes the target package-absolute. `..` and `.` segments are
/// collapsed. The result never starts with `/`.
pub(crate) fn resolve_target(source_part: &str, target: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    if let Some(absolute) = target.strip_prefix('/') {
        return normalize(segments, absolute);
    }

    if let Some((dir, _)) = source_part.rsplit_once('/') {
        segments.extend(dir.split('/').filter(|s| !s.is_empty()));
    }
    normalize(segments, target)
}

fn normalize<'a>(mut segments: Vec<&'a str>, path: &'a str) -> String {
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}
