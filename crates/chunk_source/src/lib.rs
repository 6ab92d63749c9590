//! # Chunk Source
//!
//! Input side of the batch engine: item readers over sequential resources
//! and the chunk assembler the dispatcher drives.
//!
//! Single pass, single consumer. Constructed only after the run parameters
//! (input path, chunk size) are known.

mod flat_file;
mod mock;
mod source;

pub use flat_file::FlatFileItemReader;
pub use mock::VecItemReader;
pub use source::ChunkSource;
