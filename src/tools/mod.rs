//! Document command implementations, one function per tool.

pub mod document;
pub mod picture;
pub mod session;
pub mod table;
pub mod text;

// Re-export common types
pub use document::*;
pub use picture::*;
pub use session::*;
pub use table::*;
pub use text::*;
