//! In-memory document model: blocks, paragraphs, runs, tables, pictures and styles.

pub mod document;
pub mod paragraph;
pub mod picture;
pub mod style;
pub mod table;

pub use document::{Block, BlockKind, BlockSummary, DocumentModel, RunRef};
pub use paragraph::{clean_text, Paragraph, Run, RunFormatting};
pub use picture::{ImageFormat, Picture};
pub use style::{Style, StyleKind, StyleSheet};
pub use table::{Cell, Table};
