//! Builders for stroke streams and notebook archives used across integration tests.

#![allow(dead_code)]

use rmnb_core::HEADER;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

/// Writes `.lines` records in stream order
pub struct StrokeStream {
    buf: Vec<u8>,
}

impl StrokeStream {
    /// Starts a stream with the expected header and a page count
    pub fn new(page_count: u32) -> Self {
        let mut stream = Self {
            buf: HEADER.as_bytes().to_vec(),
        };
        stream.count(page_count);
        stream
    }

    /// Writes a page, layer or point count
    pub fn count(&mut self, value: u32) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Writes a line header: type, color, reserved, size, point count
    pub fn line(&mut self, brush_type: u32, brush_color: u32, size: f32, points: u32) -> &mut Self {
        self.count(brush_type).count(brush_color).count(0);
        self.buf.extend_from_slice(&size.to_le_bytes());
        self.count(points)
    }

    /// Writes one point record
    pub fn point(&mut self, x: f32, y: f32, pressure: f32, x_rot: f32, y_rot: f32) -> &mut Self {
        for v in [x, y, pressure, x_rot, y_rot] {
            self.buf.extend_from_slice(&v.to_le_bytes());
        }
        self
    }

    pub fn finish(&self) -> Vec<u8> {
        self.buf.clone()
    }
}

/// Stream with `pages` pages, each with one empty layer
pub fn empty_pages(pages: u32) -> Vec<u8> {
    let mut stream = StrokeStream::new(pages);
    for _ in 0..pages {
        stream.count(1).count(0);
    }
    stream.finish()
}

/// Builds a zip archive from `(name, bytes)` pairs, in order
pub fn archive(members: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default();

    for (name, data) in members {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
    }

    writer.finish().unwrap().into_inner()
}

/// Sets the "encrypted" general-purpose flag on member `name` in both its local and
/// central headers, so readers refuse to open it without a password
pub fn mark_encrypted(data: &mut [u8], name: &str) {
    const LOCAL: &[u8] = b"PK\x03\x04";
    const CENTRAL: &[u8] = b"PK\x01\x02";

    let mut marked = 0;
    let mut pos = 0;
    while pos + 4 <= data.len() {
        // (flags offset, name length offset, name offset) within each header
        let (flags_at, name_len_at, name_at) = match &data[pos..pos + 4] {
            sig if sig == LOCAL => (6, 26, 30),
            sig if sig == CENTRAL => (8, 28, 46),
            _ => {
                pos += 1;
                continue;
            }
        };
        if pos + name_at > data.len() {
            break;
        }

        let len = u16::from_le_bytes([data[pos + name_len_at], data[pos + name_len_at + 1]]);
        let start = pos + name_at;
        if data.get(start..start + len as usize) == Some(name.as_bytes()) {
            data[pos + flags_at] |= 1;
            marked += 1;
        }
        pos += 4;
    }

    assert_eq!(marked, 2, "member '{}' not found in both headers", name);
}
