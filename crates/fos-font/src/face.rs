//! Face resources and platform face handles

use std::fmt;
use std::sync::Arc;

use ttf_parser::Face;

use crate::style::FontWeight;

/// Opaque identity of an installed face
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FaceId(u64);

impl FaceId {
    pub fn new(raw: u64) -> Self {
        FaceId(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "face#{}", self.0)
    }
}

/// Weight/style variant available within a family
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FaceTraits {
    pub weight: FontWeight,
    pub italic: bool,
}

/// A concrete rasterizable face.
///
/// Shared between every handle that uses it, whatever the size.
pub struct FaceResource {
    id: FaceId,
    family: String,
    bold: bool,
    italic: bool,
    data: Arc<[u8]>,
    index: u32,
}

impl FaceResource {
    pub fn new(id: FaceId, family: impl Into<String>, bold: bool, italic: bool, data: Arc<[u8]>, index: u32) -> Self {
        Self {
            id,
            family: family.into(),
            bold,
            italic,
            data,
            index,
        }
    }

    pub fn id(&self) -> FaceId {
        self.id
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    /// Whether the face itself is bold
    pub fn is_bold(&self) -> bool {
        self.bold
    }

    /// Whether the face itself is italic or oblique
    pub fn is_italic(&self) -> bool {
        self.italic
    }

    /// Raw font file data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Face index within a collection file
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Run `f` against the parsed face, `None` if the data does not parse.
    pub fn with_parsed<R>(&self, f: impl FnOnce(&Face<'_>) -> R) -> Option<R> {
        Face::parse(&self.data, self.index).ok().map(|face| f(&face))
    }

    /// Check if the face has a glyph for a character
    pub fn has_char(&self, c: char) -> bool {
        self.with_parsed(|face| face.glyph_index(c).is_some())
            .unwrap_or(false)
    }

    pub fn units_per_em(&self) -> Option<u16> {
        self.with_parsed(|face| face.units_per_em())
    }
}

impl fmt::Debug for FaceResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaceResource")
            .field("id", &self.id)
            .field("family", &self.family)
            .field("bold", &self.bold)
            .field("italic", &self.italic)
            .field("bytes", &self.data.len())
            .field("index", &self.index)
            .finish()
    }
}

#[derive(Debug)]
struct PlatformFaceData {
    face: Arc<FaceResource>,
    size_px: f32,
    synthetic_bold: bool,
    synthetic_italic: bool,
}

/// Face at a size, with the emphasis the rasterizer has to synthesize.
///
/// Cloning shares the handle; it never copies the face.
#[derive(Debug, Clone)]
pub struct PlatformFaceHandle(Arc<PlatformFaceData>);

impl PlatformFaceHandle {
    /// Wrap `face` for a request with the given weight and italic flag.
    pub fn new(face: Arc<FaceResource>, size_px: f32, weight: FontWeight, italic: bool) -> Self {
        let synthetic_bold = weight.is_bold() && !face.is_bold();
        let synthetic_italic = italic && !face.is_italic();
        Self(Arc::new(PlatformFaceData {
            face,
            size_px,
            synthetic_bold,
            synthetic_italic,
        }))
    }

    pub fn face_id(&self) -> FaceId {
        self.0.face.id()
    }

    pub fn face(&self) -> &Arc<FaceResource> {
        &self.0.face
    }

    pub fn family(&self) -> &str {
        self.0.face.family()
    }

    pub fn size_px(&self) -> f32 {
        self.0.size_px
    }

    pub fn synthetic_bold(&self) -> bool {
        self.0.synthetic_bold
    }

    pub fn synthetic_italic(&self) -> bool {
        self.0.synthetic_italic
    }

    /// Whether both handles are the same handle instance
    pub fn ptr_eq(&self, other: &PlatformFaceHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Whether both handles render from the same face resource
    pub fn shares_face(&self, other: &PlatformFaceHandle) -> bool {
        Arc::ptr_eq(&self.0.face, &other.0.face)
    }
}
