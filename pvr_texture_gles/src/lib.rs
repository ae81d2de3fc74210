/*!
# PVR Texture - OpenGL ES Backend

OpenGL ES implementation of the `TextureBackend` trait from `pvr_texture`.

The application owns the GL loader and context and exposes them through the
`GlApi` trait. The backend reads the context's version and extension string,
maps pvr formats to GL enumerants (PVRTC, ETC1/ETC2, S3TC, BPTC and the
uncompressed formats) and uploads every mip level, array layer and cube face.

`RecordingGl` is a `GlApi` that records calls instead of issuing them.
*/

mod gles_api;
mod gles_backend;
mod gles_capabilities;
mod gles_format;
mod gles_recording;

pub use gles_api::GlApi;
pub use gles_backend::{GlesBackend, GlesConfig, GlesTexture};
pub use gles_capabilities::{query_capabilities, GlFeatures, GlLimits, GlesVersion};
pub use gles_format::{gl, gl_error_name, to_gl_format, GlFormat, Requirement, FORMAT_TABLE};
pub use gles_recording::{GlCall, RecordingGl};
