/// RecordingGl - GlApi that records calls instead of talking to a driver
///
/// Used by tests and by tools that want to see what an upload would issue.
/// Reports a configurable version, extension string and limits, hands out
/// increasing texture names and can be told to raise a GL error on a given
/// call.

use rustc_hash::FxHashSet;

use crate::gles_api::GlApi;
use crate::gles_format::gl;

/// One recorded GL call (data is kept as its length)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlCall {
    GenTexture(u32),
    DeleteTexture(u32),
    BindTexture { target: u32, texture: u32 },
    PixelStore { name: u32, value: i32 },
    TexParameter { target: u32, name: u32, value: i32 },
    TexStorage2D { target: u32, levels: i32, internal_format: u32, width: i32, height: i32 },
    TexStorage3D { target: u32, levels: i32, internal_format: u32, width: i32, height: i32, depth: i32 },
    TexImage2D { target: u32, level: i32, internal_format: u32, width: i32, height: i32, format: u32, data_type: u32, len: usize },
    TexSubImage2D { target: u32, level: i32, width: i32, height: i32, format: u32, data_type: u32, len: usize },
    TexSubImage3D { target: u32, level: i32, z_offset: i32, width: i32, height: i32, depth: i32, format: u32, len: usize },
    CompressedTexImage2D { target: u32, level: i32, internal_format: u32, width: i32, height: i32, len: usize },
    CompressedTexSubImage2D { target: u32, level: i32, width: i32, height: i32, format: u32, len: usize },
    CompressedTexSubImage3D { target: u32, level: i32, z_offset: i32, width: i32, height: i32, depth: i32, format: u32, len: usize },
}

impl GlCall {
    /// True for calls that transfer texel data
    pub fn is_data_upload(&self) -> bool {
        matches!(
            self,
            GlCall::TexImage2D { .. }
                | GlCall::TexSubImage2D { .. }
                | GlCall::TexSubImage3D { .. }
                | GlCall::CompressedTexImage2D { .. }
                | GlCall::CompressedTexSubImage2D { .. }
                | GlCall::CompressedTexSubImage3D { .. }
        )
    }
}

/// Recording GL context
#[derive(Debug, Clone)]
pub struct RecordingGl {
    version: String,
    extensions: String,
    pub max_texture_size: i32,
    pub max_3d_texture_size: i32,
    pub max_array_layers: i32,
    calls: Vec<GlCall>,
    live: FxHashSet<u32>,
    next_name: u32,
    /// Raise `error` after the call with this index (0-based over all recorded calls)
    fail_after_call: Option<(usize, u32)>,
    pending_error: u32,
}

impl RecordingGl {
    /// Context reporting `version` ("OpenGL ES 3.0 ...") and `extensions`
    pub fn new(version: &str, extensions: &str) -> Self {
        Self {
            version: version.to_string(),
            extensions: extensions.to_string(),
            max_texture_size: 4096,
            max_3d_texture_size: 256,
            max_array_layers: 256,
            calls: Vec::new(),
            live: FxHashSet::default(),
            next_name: 1,
            fail_after_call: None,
            pending_error: gl::NO_ERROR,
        }
    }

    /// Raise `error` from glGetError once the call with index `call` has been recorded
    pub fn fail_after(&mut self, call: usize, error: u32) {
        self.fail_after_call = Some((call, error));
    }

    /// Raise `error` on the next recorded call
    pub fn fail_next_call(&mut self, error: u32) {
        self.fail_after_call = Some((self.calls.len(), error));
    }

    /// Leave `error` pending right now, as if an earlier call had failed
    pub fn raise_error(&mut self, error: u32) {
        self.pending_error = error;
    }

    pub fn calls(&self) -> &[GlCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Texture names generated and not deleted
    pub fn live_textures(&self) -> usize {
        self.live.len()
    }

    fn record(&mut self, call: GlCall) {
        if let Some((index, error)) = self.fail_after_call {
            if index == self.calls.len() {
                self.pending_error = error;
                self.fail_after_call = None;
            }
        }
        self.calls.push(call);
    }
}

impl GlApi for RecordingGl {
    fn get_string(&self, name: u32) -> Option<String> {
        match name {
            gl::VERSION => Some(self.version.clone()),
            gl::EXTENSIONS => Some(self.extensions.clone()),
            _ => None,
        }
    }

    fn get_integer(&self, name: u32) -> i32 {
        match name {
            gl::MAX_TEXTURE_SIZE | gl::MAX_CUBE_MAP_TEXTURE_SIZE => self.max_texture_size,
            gl::MAX_3D_TEXTURE_SIZE => self.max_3d_texture_size,
            gl::MAX_ARRAY_TEXTURE_LAYERS => self.max_array_layers,
            _ => 0,
        }
    }

    fn get_error(&mut self) -> u32 {
        std::mem::replace(&mut self.pending_error, gl::NO_ERROR)
    }

    fn gen_texture(&mut self) -> u32 {
        let name = self.next_name;
        self.next_name += 1;
        self.live.insert(name);
        self.record(GlCall::GenTexture(name));
        name
    }

    fn delete_texture(&mut self, texture: u32) {
        self.live.remove(&texture);
        self.record(GlCall::DeleteTexture(texture));
    }

    fn bind_texture(&mut self, target: u32, texture: u32) {
        self.record(GlCall::BindTexture { target, texture });
    }

    fn pixel_store_i(&mut self, name: u32, value: i32) {
        self.record(GlCall::PixelStore { name, value });
    }

    fn tex_parameter_i(&mut self, target: u32, name: u32, value: i32) {
        self.record(GlCall::TexParameter { target, name, value });
    }

    fn tex_storage_2d(&mut self, target: u32, levels: i32, internal_format: u32, width: i32, height: i32) {
        self.record(GlCall::TexStorage2D { target, levels, internal_format, width, height });
    }

    fn tex_storage_3d(&mut self, target: u32, levels: i32, internal_format: u32, width: i32, height: i32, depth: i32) {
        self.record(GlCall::TexStorage3D { target, levels, internal_format, width, height, depth });
    }

    fn tex_image_2d(
        &mut self,
        target: u32,
        level: i32,
        internal_format: u32,
        width: i32,
        height: i32,
        format: u32,
        data_type: u32,
        data: &[u8],
    ) {
        self.record(GlCall::TexImage2D { target, level, internal_format, width, height, format, data_type, len: data.len() });
    }

    fn tex_sub_image_2d(
        &mut self,
        target: u32,
        level: i32,
        _x_offset: i32,
        _y_offset: i32,
        width: i32,
        height: i32,
        format: u32,
        data_type: u32,
        data: &[u8],
    ) {
        self.record(GlCall::TexSubImage2D { target, level, width, height, format, data_type, len: data.len() });
    }

    fn tex_sub_image_3d(
        &mut self,
        target: u32,
        level: i32,
        _x_offset: i32,
        _y_offset: i32,
        z_offset: i32,
        width: i32,
        height: i32,
        depth: i32,
        format: u32,
        _data_type: u32,
        data: &[u8],
    ) {
        self.record(GlCall::TexSubImage3D { target, level, z_offset, width, height, depth, format, len: data.len() });
    }

    fn compressed_tex_image_2d(
        &mut self,
        target: u32,
        level: i32,
        internal_format: u32,
        width: i32,
        height: i32,
        data: &[u8],
    ) {
        self.record(GlCall::CompressedTexImage2D { target, level, internal_format, width, height, len: data.len() });
    }

    fn compressed_tex_sub_image_2d(
        &mut self,
        target: u32,
        level: i32,
        _x_offset: i32,
        _y_offset: i32,
        width: i32,
        height: i32,
        format: u32,
        data: &[u8],
    ) {
        self.record(GlCall::CompressedTexSubImage2D { target, level, width, height, format, len: data.len() });
    }

    fn compressed_tex_sub_image_3d(
        &mut self,
        target: u32,
        level: i32,
        _x_offset: i32,
        _y_offset: i32,
        z_offset: i32,
        width: i32,
        height: i32,
        depth: i32,
        format: u32,
        data: &[u8],
    ) {
        self.record(GlCall::CompressedTexSubImage3D { target, level, z_offset, width, height, depth, format, len: data.len() });
    }
}
