mod reader;
mod types;
mod writer;

pub use reader::ArchiveReader;
pub use types::*;
pub use writer::ArchiveWriter;
