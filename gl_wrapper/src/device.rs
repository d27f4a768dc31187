use std::ffi::{c_char, c_void, CString};

use crate::program::ShaderKind;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ShaderId(pub u32);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub i32);

/// The subset of the graphics API the triangle pipeline talks to.
///
/// Every operation takes the device explicitly, so nothing in the pipeline
/// reaches for a process-wide context.
pub trait Device {
    fn viewport(&mut self, width: u32, height: u32);
    fn clear(&mut self, color: [f32; 4], depth: f32);

    fn create_shader(&mut self, kind: ShaderKind) -> ShaderId;
    /// Uploads and compiles `source`, returning the compile status.
    fn compile_shader(&mut self, shader: ShaderId, source: &str) -> bool;
    fn shader_info_log(&self, shader: ShaderId) -> String;
    fn delete_shader(&mut self, shader: ShaderId);

    fn create_program(&mut self) -> ProgramId;
    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId);
    /// Links `program`, returning the link status.
    fn link_program(&mut self, program: ProgramId) -> bool;
    fn program_info_log(&self, program: ProgramId) -> String;
    fn use_program(&mut self, program: ProgramId);
    fn delete_program(&mut self, program: ProgramId);

    fn create_buffer(&mut self) -> BufferId;
    fn bind_array_buffer(&mut self, buffer: Option<BufferId>);
    /// Fills the bound array buffer with a static usage hint.
    fn buffer_data_f32(&mut self, data: &[f32]);

    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<u32>;
    fn enable_vertex_attrib_array(&mut self, location: u32);
    /// Declares a tightly packed, non-normalized float attribute at offset zero.
    fn vertex_attrib_pointer_f32(&mut self, location: u32, components: u8);

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation>;
    /// Uploads a column-major matrix (no transpose).
    fn uniform_matrix4(&mut self, location: UniformLocation, matrix: &[f32; 16]);

    fn draw_triangles(&mut self, first: u32, count: u32);
    fn flush(&mut self);
}

/// OpenGL implementation backed by the `gl` crate.
///
/// Holding one of these means the function table has been loaded and a
/// vertex array object is bound, which core profiles need before any
/// attribute pointer is declared.
pub struct GlDevice {
    vao: u32,
}

impl GlDevice {
    /// Loads GL function pointers through `loader` and binds a vertex array.
    ///
    /// # Safety
    /// A GL context must be current on the calling thread and stay current
    /// for as long as the device is used.
    pub unsafe fn load<F>(loader: F) -> Self
    where
        F: FnMut(&'static str) -> *const c_void,
    {
        gl::load_with(loader);

        let mut vao = 0;
        gl::GenVertexArrays(1, (&mut vao) as *mut u32);
        gl::BindVertexArray(vao);

        Self { vao }
    }
}

impl Drop for GlDevice {
    fn drop(&mut self) {
        unsafe {
            gl::DeleteVertexArrays(1, (&self.vao) as *const u32);
        }
    }
}

fn trim_log(mut buf: Vec<u8>) -> String {
    if let Some(end) = buf.iter().position(|b| *b == 0) {
        buf.truncate(end);
    }

    String::from_utf8_lossy(&buf).trim_end().to_string()
}

impl Device for GlDevice {
    fn viewport(&mut self, width: u32, height: u32) {
        unsafe {
            gl::Viewport(0, 0, width as i32, height as i32);
        }
    }

    fn clear(&mut self, color: [f32; 4], depth: f32) {
        unsafe {
            gl::ClearColor(color[0], color[1], color[2], color[3]);
            gl::ClearDepth(depth as f64);
            gl::Clear(gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT);
        }
    }

    fn create_shader(&mut self, kind: ShaderKind) -> ShaderId {
        let ty = match kind {
            ShaderKind::Vertex => gl::VERTEX_SHADER,
            ShaderKind::Fragment => gl::FRAGMENT_SHADER,
        };

        ShaderId(unsafe { gl::CreateShader(ty) })
    }

    fn compile_shader(&mut self, shader: ShaderId, source: &str) -> bool {
        let ptr = source.as_ptr() as *const c_char;
        let len = source.len() as i32;
        let mut success = 0;

        unsafe {
            gl::ShaderSource(shader.0, 1, &ptr, &len);
            gl::CompileShader(shader.0);
            gl::GetShaderiv(shader.0, gl::COMPILE_STATUS, (&mut success) as *mut i32);
        }

        success == gl::TRUE as i32
    }

    fn shader_info_log(&self, shader: ShaderId) -> String {
        let mut len = 0;

        unsafe {
            gl::GetShaderiv(shader.0, gl::INFO_LOG_LENGTH, (&mut len) as *mut i32);
        }

        let mut buf = vec![0_u8; len.max(1) as usize];

        unsafe {
            gl::GetShaderInfoLog(
                shader.0,
                buf.len() as i32,
                std::ptr::null_mut(),
                buf.as_mut_ptr() as *mut c_char,
            );
        }

        trim_log(buf)
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        unsafe { gl::DeleteShader(shader.0) }
    }

    fn create_program(&mut self) -> ProgramId {
        ProgramId(unsafe { gl::CreateProgram() })
    }

    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        unsafe { gl::AttachShader(program.0, shader.0) }
    }

    fn link_program(&mut self, program: ProgramId) -> bool {
        let mut success = 0;

        unsafe {
            gl::LinkProgram(program.0);
            gl::GetProgramiv(program.0, gl::LINK_STATUS, (&mut success) as *mut i32);
        }

        success == gl::TRUE as i32
    }

    fn program_info_log(&self, program: ProgramId) -> String {
        let mut len = 0;

        unsafe {
            gl::GetProgramiv(program.0, gl::INFO_LOG_LENGTH, (&mut len) as *mut i32);
        }

        let mut buf = vec![0_u8; len.max(1) as usize];

        unsafe {
            gl::GetProgramInfoLog(
                program.0,
                buf.len() as i32,
                std::ptr::null_mut(),
                buf.as_mut_ptr() as *mut c_char,
            );
        }

        trim_log(buf)
    }

    fn use_program(&mut self, program: ProgramId) {
        unsafe { gl::UseProgram(program.0) }
    }

    fn delete_program(&mut self, program: ProgramId) {
        unsafe { gl::DeleteProgram(program.0) }
    }

    fn create_buffer(&mut self) -> BufferId {
        let mut id = 0;

        unsafe {
            gl::GenBuffers(1, (&mut id) as *mut u32);
        }

        BufferId(id)
    }

    fn bind_array_buffer(&mut self, buffer: Option<BufferId>) {
        unsafe { gl::BindBuffer(gl::ARRAY_BUFFER, buffer.map_or(0, |b| b.0)) }
    }

    fn buffer_data_f32(&mut self, data: &[f32]) {
        unsafe {
            gl::BufferData(
                gl::ARRAY_BUFFER,
                std::mem::size_of_val(data) as isize,
                data.as_ptr() as *const c_void,
                gl::STATIC_DRAW,
            );
        }
    }

    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        let name = CString::new(name).ok()?;
        let location = unsafe { gl::GetAttribLocation(program.0, name.as_ptr()) };

        u32::try_from(location).ok()
    }

    fn enable_vertex_attrib_array(&mut self, location: u32) {
        unsafe { gl::EnableVertexAttribArray(location) }
    }

    fn vertex_attrib_pointer_f32(&mut self, location: u32, components: u8) {
        unsafe {
            gl::VertexAttribPointer(
                location,
                components as i32,
                gl::FLOAT,
                gl::FALSE,
                0,
                std::ptr::null(),
            );
        }
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let name = CString::new(name).ok()?;
        let location = unsafe { gl::GetUniformLocation(program.0, name.as_ptr()) };

        (location >= 0).then_some(UniformLocation(location))
    }

    fn uniform_matrix4(&mut self, location: UniformLocation, matrix: &[f32; 16]) {
        unsafe { gl::UniformMatrix4fv(location.0, 1, gl::FALSE, matrix.as_ptr()) }
    }

    fn draw_triangles(&mut self, first: u32, count: u32) {
        unsafe { gl::DrawArrays(gl::TRIANGLES, first as i32, count as i32) }
    }

    fn flush(&mut self) {
        unsafe { gl::Flush() }
    }
}
