/// Texture module - canonical pixel formats, headers and descriptors

pub mod pixel_format;
pub mod header;
pub mod descriptor;

pub use pixel_format::*;
pub use header::*;
pub use descriptor::*;
