//! Decoded notebook tree.
//!
//! A [`Notebook`] owns its [`Page`]s, each page owns its [`Layer`]s, and so on down to
//! [`Point`]. Order at every level is drawing order as it appeared in the stroke data.

use serde::{Deserialize, Deserializer, Serialize};

/// Width of the device canvas in points
pub const DEVICE_WIDTH: u32 = 1404;

/// Height of the device canvas in points
pub const DEVICE_HEIGHT: u32 = 1872;

/// Drawing tool used for a stroke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BrushType {
    /// Paint brush
    Brush,
    /// Pencil, tilt-sensitive
    PencilTilt,
    /// Ballpoint pen
    Pen,
    /// Marker
    Marker,
    /// Fineliner
    Fineliner,
    /// Highlighter
    Highlighter,
    /// Eraser
    Eraser,
    /// Mechanical pencil
    PencilSharp,
    /// Area eraser
    EraseArea,
    /// Code not known to this decoder
    Unknown(u32),
}

impl BrushType {
    /// Maps a raw code to a brush type, keeping unrecognized codes
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => Self::Brush,
            1 => Self::PencilTilt,
            2 => Self::Pen,
            3 => Self::Marker,
            4 => Self::Fineliner,
            5 => Self::Highlighter,
            6 => Self::Eraser,
            7 => Self::PencilSharp,
            8 => Self::EraseArea,
            other => Self::Unknown(other),
        }
    }

    /// Returns the raw code as stored in the stroke data
    pub fn code(self) -> u32 {
        match self {
            Self::Brush => 0,
            Self::PencilTilt => 1,
            Self::Pen => 2,
            Self::Marker => 3,
            Self::Fineliner => 4,
            Self::Highlighter => 5,
            Self::Eraser => 6,
            Self::PencilSharp => 7,
            Self::EraseArea => 8,
            Self::Unknown(code) => code,
        }
    }
}

/// Ink color of a stroke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BrushColor {
    /// Black
    Black,
    /// Grey
    Grey,
    /// White
    White,
    /// Code not known to this decoder
    Unknown(u32),
}

impl BrushColor {
    /// Maps a raw code to a color, keeping unrecognized codes
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => Self::Black,
            1 => Self::Grey,
            2 => Self::White,
            other => Self::Unknown(other),
        }
    }

    /// Returns the raw code as stored in the stroke data
    pub fn code(self) -> u32 {
        match self {
            Self::Black => 0,
            Self::Grey => 1,
            Self::White => 2,
            Self::Unknown(code) => code,
        }
    }
}

/// Stroke width as recorded by the device
///
/// The raw value is kept verbatim. The tablet's UI only offers three sizes, exposed as
/// associated constants.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct BrushSize(pub f32);

impl BrushSize {
    /// Thin stroke
    pub const SMALL: BrushSize = BrushSize(1.875);
    /// Medium stroke
    pub const MEDIUM: BrushSize = BrushSize(2.0);
    /// Thick stroke
    pub const LARGE: BrushSize = BrushSize(2.125);

    /// Returns the raw value
    pub fn value(self) -> f32 {
        self.0
    }

    /// Name of the matching UI size, if the raw value is one of them
    pub fn canonical(self) -> Option<&'static str> {
        if self == Self::SMALL {
            Some("small")
        } else if self == Self::MEDIUM {
            Some("medium")
        } else if self == Self::LARGE {
            Some("large")
        } else {
            None
        }
    }
}

/// A single sample of a stroke
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    /// Horizontal position
    pub x: f32,
    /// Vertical position
    pub y: f32,
    /// Pen pressure
    pub pen_pressure: f32,
    /// Pen tilt along the x axis
    pub x_rotation: f32,
    /// Pen tilt along the y axis
    pub y_rotation: f32,
}

/// One continuous stroke
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    /// Drawing tool
    pub brush_type: BrushType,
    /// Ink color
    pub brush_color: BrushColor,
    /// Stroke width
    pub brush_size: BrushSize,
    /// Samples in drawing order
    pub points: Vec<Point>,
}

/// An ordered group of strokes
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Layer {
    /// Strokes in drawing order
    pub lines: Vec<Line>,
}

impl Layer {
    /// Total number of points across all strokes
    pub fn point_count(&self) -> usize {
        self.lines.iter().map(|line| line.points.len()).sum()
    }
}

/// One notebook sheet
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Page {
    /// Layers from bottom to top
    pub layers: Vec<Layer>,
    /// Background template name, empty when none was assigned
    pub template: String,
    /// Raw JPEG thumbnail
    #[serde(skip)]
    pub thumbnail: Option<Vec<u8>>,
}

impl Page {
    /// Creates a page with the given layers and no template or thumbnail
    pub fn new(layers: Vec<Layer>) -> Self {
        Self {
            layers,
            ..Self::default()
        }
    }

    /// Total number of strokes across all layers
    pub fn line_count(&self) -> usize {
        self.layers.iter().map(|layer| layer.lines.len()).sum()
    }

    /// Total number of points across all layers
    pub fn point_count(&self) -> usize {
        self.layers.iter().map(Layer::point_count).sum()
    }
}

/// Reads a JSON `null` as the field's zero value, like an absent field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// View transform stored in the metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct Transform {
    #[serde(deserialize_with = "null_as_default")]
    pub m11: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub m12: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub m13: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub m21: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub m22: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub m23: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub m31: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub m32: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub m33: i64,
}

/// Last tool settings stored in the metadata
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtraMetadata {
    /// Last used color
    #[serde(rename = "LastColor", deserialize_with = "null_as_default")]
    pub last_color: String,
    /// Last used tool
    #[serde(rename = "LastTool", deserialize_with = "null_as_default")]
    pub last_tool: String,
    /// Last thickness scale
    #[serde(rename = "ThicknessScale", deserialize_with = "null_as_default")]
    pub thickness_scale: String,
}

/// Notebook metadata from the `.content` member
///
/// Every field is optional in the source document and falls back to its zero value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Content {
    /// Tool settings
    #[serde(deserialize_with = "null_as_default")]
    pub extra_metadata: ExtraMetadata,
    /// Document type, e.g. `notebook`, `pdf` or `epub`
    #[serde(deserialize_with = "null_as_default")]
    pub file_type: String,
    /// Font used for reflowed documents
    #[serde(deserialize_with = "null_as_default")]
    pub font_name: String,
    /// Index of the page that was open last
    #[serde(deserialize_with = "null_as_default")]
    pub last_opened_page: i64,
    /// Line height for reflowed documents
    #[serde(deserialize_with = "null_as_default")]
    pub line_height: i64,
    /// Page margins for reflowed documents
    #[serde(deserialize_with = "null_as_default")]
    pub margins: i64,
    /// Page count as recorded by the device
    #[serde(deserialize_with = "null_as_default")]
    pub page_count: i64,
    /// Text scale for reflowed documents
    #[serde(deserialize_with = "null_as_default")]
    pub text_scale: f64,
    /// View transform
    #[serde(deserialize_with = "null_as_default")]
    pub transform: Transform,
}

/// A fully decoded notebook export
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Notebook {
    /// Identifier derived from the archive's first member
    pub id: String,
    /// Pages in notebook order
    pub pages: Vec<Page>,
    /// Metadata from the `.content` member
    pub content: Content,
    /// Embedded PDF document
    #[serde(skip)]
    pub pdf: Option<Vec<u8>>,
    /// Embedded EPUB document
    #[serde(skip)]
    pub epub: Option<Vec<u8>>,
}

impl Notebook {
    /// Creates an empty notebook with the given identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Total number of strokes in the notebook
    pub fn line_count(&self) -> usize {
        self.pages.iter().map(Page::line_count).sum()
    }

    /// Total number of points in the notebook
    pub fn point_count(&self) -> usize {
        self.pages.iter().map(Page::point_count).sum()
    }

    /// Number of pages that received a thumbnail
    pub fn thumbnail_count(&self) -> usize {
        self.pages.iter().filter(|p| p.thumbnail.is_some()).count()
    }
}
