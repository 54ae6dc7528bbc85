//! Decoder for the `.lines` stroke format.
//!
//! ## Layout
//!
//! All integers are little-endian `u32`, all reals little-endian `f32`:
//!
//! ```text
//! header      43 ASCII bytes, "reMarkable lines with selections and layers"
//! page_count
//!   layer_count
//!     line_count
//!       brush_type, brush_color, reserved, brush_size (f32), point_count
//!         x, y, pen_pressure, x_rotation, y_rotation (f32 each)
//! ```
//!
//! Counts are element counts, so a corrupted count only surfaces as a
//! [`TruncatedInput`](crate::Error::TruncatedInput) further down the stream.

use crate::cursor::ByteCursor;
use crate::error::{Error, Result};
use crate::model::{BrushColor, BrushSize, BrushType, Layer, Line, Page, Point};
use tracing::{debug, trace};

/// Header literal every supported `.lines` stream starts with
pub const HEADER: &str = "reMarkable lines with selections and layers";

/// Smallest encoded size of a page or layer record (its child count)
const MIN_CONTAINER_SIZE: usize = 4;

/// Encoded size of the fixed part of a line record
const LINE_FIXED_SIZE: usize = 20;

/// Encoded size of a point record
const POINT_SIZE: usize = 20;

/// Recursive-descent decoder over a `.lines` stream
#[derive(Debug)]
pub struct StrokeDecoder<'a> {
    cursor: ByteCursor<'a>,
}

impl<'a> StrokeDecoder<'a> {
    /// Creates a decoder over the full stroke member
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: ByteCursor::new(data),
        }
    }

    /// Decodes every page in the stream
    pub fn decode(mut self) -> Result<Vec<Page>> {
        self.check_header()?;

        let page_count = self.cursor.read_u32()?;
        debug!("Decoding {} page(s)", page_count);

        let mut pages = Vec::with_capacity(self.capacity_for(page_count, MIN_CONTAINER_SIZE));
        for index in 0..page_count {
            trace!("Page [{}/{}]", index + 1, page_count);
            pages.push(self.decode_page()?);
        }

        if self.cursor.remaining() > 0 {
            trace!(
                "Ignoring {} trailing byte(s) after last page",
                self.cursor.remaining()
            );
        }

        Ok(pages)
    }

    /// Rejects any stream whose leading bytes differ from the header, however short.
    /// Only a true prefix of the header is reported as truncated.
    fn check_header(&mut self) -> Result<()> {
        let leading = self.cursor.peek(HEADER.len());
        if leading != &HEADER.as_bytes()[..leading.len()] {
            return Err(Error::FormatMismatch { expected: HEADER });
        }
        self.cursor.read_bytes(HEADER.len())?;
        Ok(())
    }

    fn decode_page(&mut self) -> Result<Page> {
        let layer_count = self.cursor.read_u32()?;
        let mut layers = Vec::with_capacity(self.capacity_for(layer_count, MIN_CONTAINER_SIZE));

        for index in 0..layer_count {
            trace!("  Layer [{}/{}]", index + 1, layer_count);
            layers.push(self.decode_layer()?);
        }

        Ok(Page::new(layers))
    }

    fn decode_layer(&mut self) -> Result<Layer> {
        let line_count = self.cursor.read_u32()?;
        let mut lines = Vec::with_capacity(self.capacity_for(line_count, LINE_FIXED_SIZE));

        for index in 0..line_count {
            trace!("    Line [{}/{}]", index + 1, line_count);
            lines.push(self.decode_line()?);
        }

        Ok(Layer { lines })
    }

    fn decode_line(&mut self) -> Result<Line> {
        let brush_type = BrushType::from_code(self.cursor.read_u32()?);
        let brush_color = BrushColor::from_code(self.cursor.read_u32()?);
        // Reserved slot, written as zero by every known firmware
        self.cursor.read_u32()?;
        let brush_size = BrushSize(self.cursor.read_f32()?);
        let point_count = self.cursor.read_u32()?;

        trace!(
            "      {:?} {:?} size {} with {} point(s)",
            brush_type,
            brush_color,
            brush_size.value(),
            point_count
        );

        let mut points = Vec::with_capacity(self.capacity_for(point_count, POINT_SIZE));
        for _ in 0..point_count {
            points.push(self.decode_point()?);
        }

        Ok(Line {
            brush_type,
            brush_color,
            brush_size,
            points,
        })
    }

    fn decode_point(&mut self) -> Result<Point> {
        Ok(Point {
            x: self.cursor.read_f32()?,
            y: self.cursor.read_f32()?,
            pen_pressure: self.cursor.read_f32()?,
            x_rotation: self.cursor.read_f32()?,
            y_rotation: self.cursor.read_f32()?,
        })
    }

    /// Caps a declared count by how many records could still fit in the buffer
    fn capacity_for(&self, count: u32, record_size: usize) -> usize {
        (count as usize).min(self.cursor.remaining() / record_size)
    }
}

/// Decodes a complete `.lines` member into pages
pub fn decode_pages(data: &[u8]) -> Result<Vec<Page>> {
    StrokeDecoder::new(data).decode()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn push_u32(buf: &mut Vec<u8>, value: u32) {
        buf.extend_from_slice(&value.to_le_bytes());
    }

    fn push_f32(buf: &mut Vec<u8>, value: f32) {
        buf.extend_from_slice(&value.to_le_bytes());
    }

    /// One page, one layer, one pen line with a single point
    fn single_point_stream() -> Vec<u8> {
        let mut buf = HEADER.as_bytes().to_vec();
        push_u32(&mut buf, 1); // pages
        push_u32(&mut buf, 1); // layers
        push_u32(&mut buf, 1); // lines
        push_u32(&mut buf, 2); // pen
        push_u32(&mut buf, 0); // black
        push_u32(&mut buf, 0); // reserved
        push_f32(&mut buf, 2.0);
        push_u32(&mut buf, 1); // points
        for v in [10.0, 20.0, 0.5, 0.0, 0.0] {
            push_f32(&mut buf, v);
        }
        buf
    }

    #[test]
    fn test_header_length() {
        assert_eq!(HEADER.len(), 43);
    }

    #[test]
    fn test_single_point() {
        let pages = decode_pages(&single_point_stream()).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].layers.len(), 1);

        let line = &pages[0].layers[0].lines[0];
        assert_eq!(line.brush_type, BrushType::Pen);
        assert_eq!(line.brush_color, BrushColor::Black);
        assert_eq!(line.brush_size, BrushSize::MEDIUM);
        assert_eq!(
            line.points,
            vec![Point {
                x: 10.0,
                y: 20.0,
                pen_pressure: 0.5,
                x_rotation: 0.0,
                y_rotation: 0.0,
            }]
        );
        assert_eq!(pages[0].template, "");
        assert!(pages[0].thumbnail.is_none());
    }

    #[test]
    fn test_zero_pages() {
        let mut buf = HEADER.as_bytes().to_vec();
        push_u32(&mut buf, 0);
        assert!(decode_pages(&buf).unwrap().is_empty());
    }

    #[test]
    fn test_header_mismatch() {
        let mut buf = single_point_stream();
        buf[0] = b'R';
        let err = decode_pages(&buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FormatMismatch);
    }

    #[test]
    fn test_header_mismatch_before_counts() {
        // Wrong header followed by nothing at all: still a mismatch, not a truncation
        let buf = b"reMarkable .lines file, version=3          ".to_vec();
        assert_eq!(buf.len(), HEADER.len());
        let err = decode_pages(&buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FormatMismatch);
    }

    #[test]
    fn test_short_garbage_is_mismatch() {
        for data in [&b"hello"[..], &b"x"[..], &b"reMarkable lines without"[..]] {
            let err = decode_pages(data).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::FormatMismatch);
        }
    }

    #[test]
    fn test_header_prefix_is_truncated() {
        for data in [&b""[..], &b"reMarkable"[..], &HEADER.as_bytes()[..42]] {
            let err = decode_pages(data).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::TruncatedInput);
        }
    }

    #[test]
    fn test_unknown_codes_are_kept() {
        let mut buf = single_point_stream();
        let type_offset = HEADER.len() + 12;
        buf[type_offset..type_offset + 4].copy_from_slice(&99u32.to_le_bytes());
        buf[type_offset + 4..type_offset + 8].copy_from_slice(&7u32.to_le_bytes());

        let pages = decode_pages(&buf).unwrap();
        let line = &pages[0].layers[0].lines[0];
        assert_eq!(line.brush_type, BrushType::Unknown(99));
        assert_eq!(line.brush_color, BrushColor::Unknown(7));
    }

    #[test]
    fn test_every_truncation_is_reported() {
        let buf = single_point_stream();
        for len in 0..buf.len() {
            let err = decode_pages(&buf[..len]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::TruncatedInput, "prefix of {} bytes", len);
        }
    }

    #[test]
    fn test_huge_count_does_not_preallocate() {
        let mut buf = HEADER.as_bytes().to_vec();
        push_u32(&mut buf, u32::MAX);
        let err = decode_pages(&buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TruncatedInput);
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let mut buf = single_point_stream();
        buf.extend_from_slice(&[0xFF; 3]);
        assert_eq!(decode_pages(&buf).unwrap().len(), 1);
    }
}
