//! The boundary between extraction and format parsing.

use crate::error::Result;
use crate::types::Document;
use std::path::Path;

/// Something that can turn a file on disk into a [`Document`].
pub trait DocumentLoader {
    /// Load and fully parse the document at `path`.
    fn load(&self, path: &Path) -> Result<Document>;
}

impl<L: DocumentLoader + ?Sized> DocumentLoader for &L {
    fn load(&self, path: &Path) -> Result<Document> {
        (**self).load(path)
    }
}
