use thiserror::Error;

use crate::device::{BufferId, Device};
use crate::program::Program;

#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("attribute `{name}` has {components} components, expected 1 to 4")]
    InvalidComponents { name: String, components: u8 },
    #[error("attribute `{name}` has {len} values, not a multiple of {components}")]
    InvalidDataLength {
        name: String,
        len: usize,
        components: u8,
    },
    #[error("attribute `{0}` has no data")]
    Empty(String),
    #[error("program has no active attribute `{0}`")]
    MissingAttribute(String),
    #[error("attribute `{name}` holds {found} vertices, expected {expected}")]
    VertexCountMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("no `{0}` attribute to take the vertex count from")]
    MissingPosition(String),
}

/// A named, flat attribute stream as handed to [`upload_attribute`].
#[derive(Debug, Clone, Copy)]
pub struct VertexAttribute<'a> {
    pub name: &'a str,
    pub components: u8,
    pub values: &'a [f32],
}

impl<'a> VertexAttribute<'a> {
    pub fn new(name: &'a str, components: u8, values: &'a [f32]) -> Self {
        Self {
            name,
            components,
            values,
        }
    }

    /// Number of vertices described, after checking the data is well formed.
    pub fn vertices(&self) -> Result<usize, GeometryError> {
        if !(1..=4).contains(&self.components) {
            return Err(GeometryError::InvalidComponents {
                name: self.name.to_string(),
                components: self.components,
            });
        }

        if self.values.is_empty() {
            return Err(GeometryError::Empty(self.name.to_string()));
        }

        let components = self.components as usize;

        if self.values.len() % components != 0 {
            return Err(GeometryError::InvalidDataLength {
                name: self.name.to_string(),
                len: self.values.len(),
                components: self.components,
            });
        }

        Ok(self.values.len() / components)
    }
}

/// Checks that every attribute describes the same number of vertices and
/// returns the count of the attribute named `position`.
pub fn check_layout(
    attributes: &[VertexAttribute<'_>],
    position: &str,
) -> Result<usize, GeometryError> {
    let expected = attributes
        .iter()
        .find(|a| a.name == position)
        .ok_or_else(|| GeometryError::MissingPosition(position.to_string()))?
        .vertices()?;

    for attr in attributes {
        let found = attr.vertices()?;

        if found != expected {
            return Err(GeometryError::VertexCountMismatch {
                name: attr.name.to_string(),
                expected,
                found,
            });
        }
    }

    Ok(expected)
}

#[derive(Debug)]
pub struct AttributeBuffer {
    name: String,
    location: u32,
    components: u8,
    vertices: usize,
    buffer: BufferId,
}

impl AttributeBuffer {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn location(&self) -> u32 {
        self.location
    }
    pub fn components(&self) -> u8 {
        self.components
    }
    pub fn vertices(&self) -> usize {
        self.vertices
    }
    pub fn buffer(&self) -> BufferId {
        self.buffer
    }
}

/// Uploads one attribute stream and points the program's attribute slot at it.
pub fn upload_attribute<D: Device>(
    device: &mut D,
    program: &Program,
    attr: VertexAttribute<'_>,
) -> Result<AttributeBuffer, GeometryError> {
    let vertices = attr.vertices()?;

    let location = device
        .attrib_location(program.id(), attr.name)
        .ok_or_else(|| GeometryError::MissingAttribute(attr.name.to_string()))?;

    let buffer = device.create_buffer();

    device.bind_array_buffer(Some(buffer));
    device.buffer_data_f32(attr.values);
    device.enable_vertex_attrib_array(location);
    device.vertex_attrib_pointer_f32(location, attr.components);
    device.bind_array_buffer(None);

    tracing::debug!(
        name = attr.name,
        location,
        components = attr.components,
        vertices,
        "attribute uploaded"
    );

    Ok(AttributeBuffer {
        name: attr.name.to_string(),
        location,
        components: attr.components,
        vertices,
        buffer,
    })
}
