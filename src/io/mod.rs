//! Types and methods for reading and parsing input and writing output.

pub mod file;
pub mod noodles;
pub mod parsers;

pub use file::InputStream;
pub use parsers::{read_rois, RoiIterator};
