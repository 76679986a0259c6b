/*!
    Decoded frame types.
*/

use bytemuck::Pod;

use crate::{ChromaLayout, RoleSet, StreamRole};

/**
    One single-channel image buffer.

    Rows are stored tightly packed: `stride == width` samples once the plane
    has been written. The backing vector only grows; shrinking the
    dimensions keeps the allocation so a frame can be reused across streams.
*/
#[derive(Clone, Debug, Default)]
pub struct Plane<S> {
    data: Vec<S>,
    width: u32,
    height: u32,
    /// Row stride in samples.
    stride: usize,
}

impl<S: Pod> Plane<S> {
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            width: 0,
            height: 0,
            stride: 0,
        }
    }

    pub fn with_size(width: u32, height: u32) -> Self {
        let mut plane = Self::new();
        plane.resize(width, height);
        plane
    }

    /**
        Set the plane dimensions, growing the backing storage if needed.

        Existing sample values are left in place; callers overwrite every row.
    */
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.width == width && self.height == height && self.stride == width as usize {
            return;
        }
        let samples = width as usize * height as usize;
        if self.data.len() < samples {
            self.data.resize(samples, S::zeroed());
        } else {
            self.data.truncate(samples);
        }
        self.width = width;
        self.height = height;
        self.stride = width as usize;
    }

    /**
        Mark the plane as unused without releasing its storage.
    */
    pub fn clear(&mut self) {
        self.data.clear();
        self.width = 0;
        self.height = 0;
        self.stride = 0;
    }

    /**
        Copy a strided source image into this plane, tightly packing rows.

        `src_stride` is in samples. Fails if the source is too short for the
        requested geometry.
    */
    pub fn copy_from_strided(
        &mut self,
        src: &[S],
        src_stride: usize,
        width: u32,
        height: u32,
    ) -> crate::Result<()> {
        let row_len = width as usize;
        if src_stride < row_len {
            return Err(crate::Error::invalid_data(format!(
                "source stride {src_stride} shorter than row width {row_len}"
            )));
        }
        if height > 0 && src.len() < (height as usize - 1) * src_stride + row_len {
            return Err(crate::Error::invalid_data(format!(
                "source buffer of {} samples too small for {width}x{height} (stride {src_stride})",
                src.len()
            )));
        }

        self.resize(width, height);
        for y in 0..height as usize {
            let start = y * src_stride;
            self.row_mut(y).copy_from_slice(&src[start..start + row_len]);
        }
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row stride in samples.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Row stride in bytes.
    pub fn stride_bytes(&self) -> usize {
        self.stride * std::mem::size_of::<S>()
    }

    pub fn is_populated(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn samples(&self) -> &[S] {
        &self.data
    }

    pub fn samples_mut(&mut self) -> &mut [S] {
        &mut self.data
    }

    pub fn row(&self, y: usize) -> &[S] {
        let start = y * self.stride;
        &self.data[start..start + self.width as usize]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [S] {
        let start = y * self.stride;
        let width = self.width as usize;
        &mut self.data[start..start + width]
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /**
        Checks `len >= height * stride` and `stride >= width`.
    */
    pub fn is_consistent(&self) -> bool {
        self.data.len() >= self.height as usize * self.stride && self.stride >= self.width as usize
    }
}

/**
    Identifies a plane of a [`VideoFrame`].
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlaneKind {
    Y,
    U,
    V,
    Alpha,
    Depth,
}

impl PlaneKind {
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            Self::Depth => 2,
            _ => 1,
        }
    }
}

/**
    Read-only view of one plane, the unit a renderer uploads as a texture.
*/
#[derive(Clone, Copy, Debug)]
pub struct PlaneView<'a> {
    pub kind: PlaneKind,
    /// Plane bytes; depth samples are 16-bit native-endian (little-endian on
    /// every supported target).
    pub data: &'a [u8],
    pub width: u32,
    pub height: u32,
    pub stride_bytes: usize,
}

/**
    One logical frame: color planes plus optional alpha and depth.

    Frames live in a pool and are overwritten in place, so every plane
    keeps its allocation between decodes.
*/
#[derive(Clone, Debug, Default)]
pub struct VideoFrame {
    pub y: Plane<u8>,
    pub u: Plane<u8>,
    pub v: Plane<u8>,
    pub alpha: Plane<u8>,
    pub depth: Plane<u16>,
    /// Presentation timestamp of the color image in microseconds.
    pub ts_us: i64,
    /// Logical frame counter assigned by the decoder that produced it.
    pub sequence: u64,
}

impl VideoFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /**
        Allocate planes for the given luma size.

        Chroma planes assume 4:2:0 until the first decode reports the real
        layout. Roles not in `roles` get no storage.
    */
    pub fn with_dimensions(width: u32, height: u32, roles: RoleSet) -> Self {
        let mut frame = Self::new();
        frame.reserve(width, height, roles);
        frame
    }

    /**
        Size the planes for the given luma size, reusing existing storage.
    */
    pub fn reserve(&mut self, width: u32, height: u32, roles: RoleSet) {
        if width == 0 || height == 0 {
            return;
        }
        if roles.contains(StreamRole::Color) {
            let (cw, ch) = ChromaLayout::I420.chroma_size(width, height);
            self.y.resize(width, height);
            self.u.resize(cw, ch);
            self.v.resize(cw, ch);
        }
        if roles.contains(StreamRole::Alpha) {
            self.alpha.resize(width, height);
        }
        if roles.contains(StreamRole::Depth) {
            self.depth.resize(width, height);
        }
    }

    /**
        Returns a view of the requested plane if it holds image data.
    */
    pub fn plane(&self, kind: PlaneKind) -> Option<PlaneView<'_>> {
        let (data, width, height, stride_bytes) = match kind {
            PlaneKind::Y => plane_parts(&self.y),
            PlaneKind::U => plane_parts(&self.u),
            PlaneKind::V => plane_parts(&self.v),
            PlaneKind::Alpha => plane_parts(&self.alpha),
            PlaneKind::Depth => plane_parts(&self.depth),
        };
        if width == 0 || height == 0 {
            return None;
        }
        Some(PlaneView {
            kind,
            data,
            width,
            height,
            stride_bytes,
        })
    }

    /**
        Iterate over every populated plane in Y, U, V, alpha, depth order.
    */
    pub fn planes(&self) -> impl Iterator<Item = PlaneView<'_>> {
        [
            PlaneKind::Y,
            PlaneKind::U,
            PlaneKind::V,
            PlaneKind::Alpha,
            PlaneKind::Depth,
        ]
        .into_iter()
        .filter_map(|kind| self.plane(kind))
    }

    pub fn width(&self) -> u32 {
        self.y.width()
    }

    pub fn height(&self) -> u32 {
        self.y.height()
    }
}

fn plane_parts<S: Pod>(plane: &Plane<S>) -> (&[u8], u32, u32, usize) {
    (
        plane.as_bytes(),
        plane.width(),
        plane.height(),
        plane.stride_bytes(),
    )
}
