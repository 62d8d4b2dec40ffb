pub mod artifact;
pub mod manager;
pub mod schema_file;

pub use artifact::{checksum, read_artifact, write_artifact};
pub use manager::{LoadedModel, ModelInfo, ModelStore};
pub use schema_file::load_schema;
