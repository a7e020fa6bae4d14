pub mod document;
pub mod entry;
pub mod enums;
pub mod summary;

pub use document::*;
pub use entry::*;
pub use enums::*;
pub use summary::*;
