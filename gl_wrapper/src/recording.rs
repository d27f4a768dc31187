//! A [`Device`] that keeps every command in memory instead of talking to a GPU.
//!
//! Compilation is simulated: a source fails when it contains `#error` or has
//! unbalanced braces. Attributes and uniforms are only "active" when they were
//! declared up front with [`RecordingDevice::with_attributes`] and
//! [`RecordingDevice::with_uniforms`].

use std::collections::{HashMap, HashSet};

use crate::device::{BufferId, Device, ProgramId, ShaderId, UniformLocation};
use crate::program::ShaderKind;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Viewport(u32, u32),
    Clear([f32; 4], f32),
    CreateShader(ShaderKind, ShaderId),
    CompileShader(ShaderId),
    DeleteShader(ShaderId),
    CreateProgram(ProgramId),
    AttachShader(ProgramId, ShaderId),
    LinkProgram(ProgramId),
    UseProgram(ProgramId),
    DeleteProgram(ProgramId),
    CreateBuffer(BufferId),
    BindArrayBuffer(Option<BufferId>),
    BufferData(usize),
    EnableVertexAttribArray(u32),
    VertexAttribPointer(u32, u8),
    UniformMatrix4(UniformLocation, [f32; 16]),
    DrawTriangles(u32, u32),
    Flush,
}

#[derive(Debug, Default)]
pub struct RecordingDevice {
    calls: Vec<Call>,
    next_id: u32,
    shaders: HashMap<ShaderId, ShaderKind>,
    shader_logs: HashMap<ShaderId, String>,
    programs: HashSet<ProgramId>,
    current: Option<ProgramId>,
    bound: Option<BufferId>,
    buffers: HashMap<BufferId, Vec<f32>>,
    attributes: Vec<String>,
    uniforms: Vec<String>,
    bindings: HashMap<u32, (BufferId, u8)>,
    enabled: HashSet<u32>,
    link_failure: Option<String>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the attribute names linked programs expose, in location order.
    pub fn with_attributes(mut self, names: &[&str]) -> Self {
        self.attributes = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn with_uniforms(mut self, names: &[&str]) -> Self {
        self.uniforms = names.iter().map(|n| n.to_string()).collect();
        self
    }

    /// Makes every link attempt fail with `log` as the diagnostic.
    pub fn failing_link(mut self, log: &str) -> Self {
        self.link_failure = Some(log.to_string());
        self
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn current_program(&self) -> Option<ProgramId> {
        self.current
    }

    pub fn live_shaders(&self) -> usize {
        self.shaders.len()
    }

    pub fn buffer_contents(&self, buffer: BufferId) -> Option<&[f32]> {
        self.buffers.get(&buffer).map(|b| b.as_slice())
    }

    /// Buffer and component count an enabled attribute slot reads from.
    pub fn attribute_binding(&self, location: u32) -> Option<(BufferId, u8)> {
        if !self.enabled.contains(&location) {
            return None;
        }

        self.bindings.get(&location).copied()
    }

    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

fn check_source(source: &str) -> Result<(), String> {
    let mut depth = 0_i32;

    for (line_no, line) in source.lines().enumerate() {
        if let Some(msg) = line.trim_start().strip_prefix("#error") {
            return Err(format!("0:{}: '#error' :{msg}", line_no + 1));
        }

        for c in line.chars() {
            match c {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }

            if depth < 0 {
                return Err(format!("0:{}: syntax error, unexpected '}}'", line_no + 1));
            }
        }
    }

    if depth != 0 {
        return Err("0:0: syntax error, unexpected end of file".to_string());
    }

    Ok(())
}

impl Device for RecordingDevice {
    fn viewport(&mut self, width: u32, height: u32) {
        self.calls.push(Call::Viewport(width, height));
    }

    fn clear(&mut self, color: [f32; 4], depth: f32) {
        self.calls.push(Call::Clear(color, depth));
    }

    fn create_shader(&mut self, kind: ShaderKind) -> ShaderId {
        let id = ShaderId(self.next());
        self.shaders.insert(id, kind);
        self.calls.push(Call::CreateShader(kind, id));
        id
    }

    fn compile_shader(&mut self, shader: ShaderId, source: &str) -> bool {
        self.calls.push(Call::CompileShader(shader));

        match check_source(source) {
            Ok(()) => true,
            Err(log) => {
                self.shader_logs.insert(shader, log);
                false
            }
        }
    }

    fn shader_info_log(&self, shader: ShaderId) -> String {
        self.shader_logs.get(&shader).cloned().unwrap_or_default()
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        self.shaders.remove(&shader);
        self.calls.push(Call::DeleteShader(shader));
    }

    fn create_program(&mut self) -> ProgramId {
        let id = ProgramId(self.next());
        self.programs.insert(id);
        self.calls.push(Call::CreateProgram(id));
        id
    }

    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        self.calls.push(Call::AttachShader(program, shader));
    }

    fn link_program(&mut self, program: ProgramId) -> bool {
        self.calls.push(Call::LinkProgram(program));
        self.link_failure.is_none()
    }

    fn program_info_log(&self, _program: ProgramId) -> String {
        self.link_failure.clone().unwrap_or_default()
    }

    fn use_program(&mut self, program: ProgramId) {
        self.current = Some(program);
        self.calls.push(Call::UseProgram(program));
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.programs.remove(&program);
        if self.current == Some(program) {
            self.current = None;
        }
        self.calls.push(Call::DeleteProgram(program));
    }

    fn create_buffer(&mut self) -> BufferId {
        let id = BufferId(self.next());
        self.buffers.insert(id, Vec::new());
        self.calls.push(Call::CreateBuffer(id));
        id
    }

    fn bind_array_buffer(&mut self, buffer: Option<BufferId>) {
        self.bound = buffer;
        self.calls.push(Call::BindArrayBuffer(buffer));
    }

    fn buffer_data_f32(&mut self, data: &[f32]) {
        if let Some(buffer) = self.bound {
            self.buffers.insert(buffer, data.to_vec());
        }
        self.calls.push(Call::BufferData(data.len()));
    }

    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        if !self.programs.contains(&program) {
            return None;
        }

        self.attributes
            .iter()
            .position(|a| a == name)
            .map(|i| i as u32)
    }

    fn enable_vertex_attrib_array(&mut self, location: u32) {
        self.enabled.insert(location);
        self.calls.push(Call::EnableVertexAttribArray(location));
    }

    fn vertex_attrib_pointer_f32(&mut self, location: u32, components: u8) {
        if let Some(buffer) = self.bound {
            self.bindings.insert(location, (buffer, components));
        }
        self.calls.push(Call::VertexAttribPointer(location, components));
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        if !self.programs.contains(&program) {
            return None;
        }

        self.uniforms
            .iter()
            .position(|u| u == name)
            .map(|i| UniformLocation(i as i32))
    }

    fn uniform_matrix4(&mut self, location: UniformLocation, matrix: &[f32; 16]) {
        self.calls.push(Call::UniformMatrix4(location, *matrix));
    }

    fn draw_triangles(&mut self, first: u32, count: u32) {
        self.calls.push(Call::DrawTriangles(first, count));
    }

    fn flush(&mut self) {
        self.calls.push(Call::Flush);
    }
}
