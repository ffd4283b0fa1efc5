//! Archive layer: tabular serialization, file naming and atomic writes.

pub mod naming;
pub mod serializer;
pub mod writer;

pub use naming::ArchiveNaming;
pub use serializer::TabularSerializer;
pub use writer::ArchiveWriter;
