/*!
    Codec and pixel format types.
*/

/**
    Codecs the volumetric container may carry.

    Only the three codecs the player knows how to route are named; anything
    else is reported as `Other` and ignored by the role assignment.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CodecId {
    /// AV1, used for the color stream.
    Av1,
    /// FFV1, used for the lossless alpha stream.
    Ffv1,
    /// PNG, used for the 16-bit depth stream.
    Png,
    Other,
}

/**
    Video pixel formats.

    This is the subset of formats the player can accept or needs to name in
    an error message.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PixelFormat {
    /// Planar YUV 4:2:0, 8-bit
    Yuv420p,
    /// Planar YUV 4:2:2, 8-bit
    Yuv422p,
    /// Planar YUV 4:4:4, 8-bit
    Yuv444p,
    /// Planar YUV 4:2:0, 10-bit (rejected by the color engine)
    Yuv420p10,
    /// Single 8-bit gray plane
    Gray8,
    /// Single 16-bit gray plane, big-endian
    Gray16Be,
    /// Single 16-bit gray plane, little-endian
    Gray16Le,
    /// Anything the player does not handle
    Other,
}

impl PixelFormat {
    /**
        Returns the chroma layout for 8-bit planar YUV formats, `None` for
        everything the color stream cannot carry.
    */
    pub const fn chroma_layout(self) -> Option<ChromaLayout> {
        match self {
            Self::Yuv420p => Some(ChromaLayout::I420),
            Self::Yuv422p => Some(ChromaLayout::I422),
            Self::Yuv444p => Some(ChromaLayout::I444),
            _ => None,
        }
    }

    /**
        Returns the number of bytes used to store one sample of the first plane.
    */
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            Self::Yuv420p10 | Self::Gray16Be | Self::Gray16Le => 2,
            _ => 1,
        }
    }

    pub const fn is_gray(self) -> bool {
        matches!(self, Self::Gray8 | Self::Gray16Be | Self::Gray16Le)
    }
}

/**
    Chroma subsampling of an 8-bit planar YUV image.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChromaLayout {
    I420,
    I422,
    I444,
}

impl ChromaLayout {
    /**
        Horizontal and vertical subsampling shifts.
    */
    pub const fn subsampling(self) -> (u32, u32) {
        match self {
            Self::I420 => (1, 1),
            Self::I422 => (1, 0),
            Self::I444 => (0, 0),
        }
    }

    /**
        Dimensions of each chroma plane for a luma plane of the given size.

        Odd sizes round up, so a 5x3 4:2:0 image has 3x2 chroma planes.
    */
    pub const fn chroma_size(self, width: u32, height: u32) -> (u32, u32) {
        let (ss_hor, ss_ver) = self.subsampling();
        ((width + ss_hor) >> ss_hor, (height + ss_ver) >> ss_ver)
    }
}
