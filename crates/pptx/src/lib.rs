//! PPTX (Office Open XML) document loader.
//!
//! Reads .pptx files, which are ZIP archives of XML parts tied together by
//! relationship parts, into the read-only document model.

mod package;
pub mod parser;
mod slide;
mod xml;

pub use parser::PptxLoader;
