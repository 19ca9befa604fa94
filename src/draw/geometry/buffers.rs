//! Flat vertex buffers and the camera uniform handed to the render backend
//!
//! Buffers are regenerated in full on every geometry rebuild. For remote
//! backends (the webview behind `map_server`) they serialize either as base64
//! little-endian float32 inside JSON or as one binary frame.

use base64::{engine::general_purpose, Engine as _};
use byteorder::{LittleEndian, WriteBytesExt};
use serde::{Serialize, Serializer};

/// Magic header of the binary buffer frame
pub const BUFFER_FRAME_MAGIC: &[u8; 8] = b"TMAPGEO1";

/// Size of the camera uniform block in bytes
pub const UNIFORM_BLOCK_SIZE: usize = 32;

fn f32_le_bytes(data: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(data.len() * 4);
    for &v in data {
        // Writing into a Vec cannot fail
        let _ = bytes.write_f32::<LittleEndian>(v);
    }
    bytes
}

/// Serialize Vec<f32> as base64-encoded little-endian bytes for compact JSON transmission
pub fn serialize_f32_vec_base64<S>(data: &[f32], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let encoded = general_purpose::STANDARD.encode(f32_le_bytes(data));
    serializer.serialize_str(&encoded)
}

/// Vertex data for one frame of the map
///
/// Fill buffers hold a triangle list (three positions per triangle, no index
/// buffer), line buffers a line list (two positions per segment). Colors are
/// RGBA per vertex.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MapBuffers {
    #[serde(rename = "fillPositions", serialize_with = "serialize_f32_vec_base64")]
    pub fill_positions: Vec<f32>,

    #[serde(rename = "fillColors", serialize_with = "serialize_f32_vec_base64")]
    pub fill_colors: Vec<f32>,

    #[serde(rename = "linePositions", serialize_with = "serialize_f32_vec_base64")]
    pub line_positions: Vec<f32>,

    #[serde(rename = "lineColors", serialize_with = "serialize_f32_vec_base64")]
    pub line_colors: Vec<f32>,

    /// (first vertex, vertex count) in the fill buffer for each world polygon
    #[serde(rename = "fillRanges")]
    pub fill_ranges: Vec<(u32, u32)>,
}

impl MapBuffers {
    pub fn fill_vertex_count(&self) -> usize {
        self.fill_positions.len() / 2
    }

    pub fn line_vertex_count(&self) -> usize {
        self.line_positions.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.fill_positions.is_empty() && self.line_positions.is_empty()
    }

    /// Binary frame: [magic][4 x u32 float counts][fill pos][fill col][line pos][line col]
    ///
    /// All values little-endian; every section is 4-byte aligned so the
    /// receiver can view it as a Float32Array without copying.
    pub fn to_bytes(&self) -> Vec<u8> {
        let sections = [
            &self.fill_positions,
            &self.fill_colors,
            &self.line_positions,
            &self.line_colors,
        ];
        let payload: usize = sections.iter().map(|s| s.len() * 4).sum();
        let mut buffer = Vec::with_capacity(BUFFER_FRAME_MAGIC.len() + 16 + payload);

        buffer.extend_from_slice(BUFFER_FRAME_MAGIC);
        for section in &sections {
            let _ = buffer.write_u32::<LittleEndian>(section.len() as u32);
        }
        for section in &sections {
            buffer.extend_from_slice(&f32_le_bytes(section));
        }
        buffer
    }
}

/// Camera uniform block: scale.xy, pad, center.xy, pad (8 x f32 = 32 bytes)
///
/// The vertex stage computes clip = (world - center) * scale.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CameraUniform {
    pub data: [f32; 8],
}

impl CameraUniform {
    pub fn new(scale: [f64; 2], center: [f64; 2]) -> Self {
        let mut data = [0.0f32; 8];
        data[0] = scale[0] as f32;
        data[1] = scale[1] as f32;
        data[4] = center[0] as f32;
        data[5] = center[1] as f32;
        Self { data }
    }

    pub fn scale(&self) -> [f32; 2] {
        [self.data[0], self.data[1]]
    }

    pub fn center(&self) -> [f32; 2] {
        [self.data[4], self.data[5]]
    }

    pub fn to_bytes(&self) -> [u8; UNIFORM_BLOCK_SIZE] {
        let mut out = [0u8; UNIFORM_BLOCK_SIZE];
        for (chunk, value) in out.chunks_exact_mut(4).zip(self.data.iter()) {
            chunk.copy_from_slice(&value.to_le_bytes());
        }
        out
    }
}
