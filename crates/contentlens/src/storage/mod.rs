pub mod filesystem;

pub use filesystem::{move_file, remove_if_exists, ArtifactStorage};
