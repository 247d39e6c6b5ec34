//! File-backed collaborators and I/O helpers

pub mod additions;
pub mod io;
pub mod typings;

pub use additions::FsAdditionsSource;
pub use io::{clear_output_path, read_json, write_json, write_text};
pub use typings::FsPackageReader;
