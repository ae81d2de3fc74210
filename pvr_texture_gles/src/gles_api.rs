/// GlApi - the GL entry points the backend calls
///
/// The application owns the GL loader and the current context; it implements
/// this trait over whatever bindings it uses. Enumerants are raw `GLenum`
/// values (see `gles_format::gl`), sizes are `GLsizei`.

pub trait GlApi {
    /// glGetString; `None` for a null result
    fn get_string(&self, name: u32) -> Option<String>;

    /// glGetIntegerv for a single value
    fn get_integer(&self, name: u32) -> i32;

    /// glGetError
    fn get_error(&mut self) -> u32;

    /// glGenTextures for one name
    fn gen_texture(&mut self) -> u32;

    /// glDeleteTextures for one name
    fn delete_texture(&mut self, texture: u32);

    fn bind_texture(&mut self, target: u32, texture: u32);

    fn pixel_store_i(&mut self, name: u32, value: i32);

    fn tex_parameter_i(&mut self, target: u32, name: u32, value: i32);

    fn tex_storage_2d(&mut self, target: u32, levels: i32, internal_format: u32, width: i32, height: i32);

    fn tex_storage_3d(&mut self, target: u32, levels: i32, internal_format: u32, width: i32, height: i32, depth: i32);

    #[allow(clippy::too_many_arguments)]
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
    );

    #[allow(clippy::too_many_arguments)]
    fn tex_sub_image_2d(
        &mut self,
        target: u32,
        level: i32,
        x_offset: i32,
        y_offset: i32,
        width: i32,
        height: i32,
        format: u32,
        data_type: u32,
        data: &[u8],
    );

    #[allow(clippy::too_many_arguments)]
    fn tex_sub_image_3d(
        &mut self,
        target: u32,
        level: i32,
        x_offset: i32,
        y_offset: i32,
        z_offset: i32,
        width: i32,
        height: i32,
        depth: i32,
        format: u32,
        data_type: u32,
        data: &[u8],
    );

    fn compressed_tex_image_2d(
        &mut self,
        target: u32,
        level: i32,
        internal_format: u32,
        width: i32,
        height: i32,
        data: &[u8],
    );

    #[allow(clippy::too_many_arguments)]
    fn compressed_tex_sub_image_2d(
        &mut self,
        target: u32,
        level: i32,
        x_offset: i32,
        y_offset: i32,
        width: i32,
        height: i32,
        format: u32,
        data: &[u8],
    );

    #[allow(clippy::too_many_arguments)]
    fn compressed_tex_sub_image_3d(
        &mut self,
        target: u32,
        level: i32,
        x_offset: i32,
        y_offset: i32,
        z_offset: i32,
        width: i32,
        height: i32,
        depth: i32,
        format: u32,
        data: &[u8],
    );
}
