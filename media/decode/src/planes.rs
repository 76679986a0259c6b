/*!
    Copying decoder output into frame planes.

    Decoders hand out planes with padded rows; these helpers pack them
    tightly and normalize 16-bit depth to native little-endian samples.
*/

use media_types::{Error, Plane, Result};

/**
    Copy an 8-bit single-channel image.
*/
pub fn copy_gray8(
    dst: &mut Plane<u8>,
    src: &[u8],
    src_stride: usize,
    width: u32,
    height: u32,
) -> Result<()> {
    dst.copy_from_strided(src, src_stride, width, height)
}

/**
    Copy a big-endian 16-bit gray image, byte-swapping every sample.

    `src_stride` is in bytes.
*/
pub fn copy_gray16be(
    dst: &mut Plane<u16>,
    src: &[u8],
    src_stride: usize,
    width: u32,
    height: u32,
) -> Result<()> {
    copy_gray16(dst, src, src_stride, width, height, u16::from_be_bytes)
}

/**
    Copy a little-endian 16-bit gray image.

    `src_stride` is in bytes.
*/
pub fn copy_gray16le(
    dst: &mut Plane<u16>,
    src: &[u8],
    src_stride: usize,
    width: u32,
    height: u32,
) -> Result<()> {
    copy_gray16(dst, src, src_stride, width, height, u16::from_le_bytes)
}

fn copy_gray16(
    dst: &mut Plane<u16>,
    src: &[u8],
    src_stride: usize,
    width: u32,
    height: u32,
    sample: fn([u8; 2]) -> u16,
) -> Result<()> {
    let row_bytes = width as usize * 2;
    if src_stride < row_bytes {
        return Err(Error::invalid_data(format!(
            "depth stride {src_stride} shorter than row of {row_bytes} bytes"
        )));
    }
    if height > 0 && src.len() < (height as usize - 1) * src_stride + row_bytes {
        return Err(Error::invalid_data(format!(
            "depth buffer of {} bytes too small for {width}x{height}",
            src.len()
        )));
    }

    dst.resize(width, height);
    for y in 0..height as usize {
        let start = y * src_stride;
        let src_row = &src[start..start + row_bytes];
        for (out, bytes) in dst.row_mut(y).iter_mut().zip(src_row.chunks_exact(2)) {
            *out = sample([bytes[0], bytes[1]]);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray16be_is_swapped_to_native_samples() {
        // 2x2 image, stride 6 bytes (one padding sample per row)
        let src = [
            0x01, 0x02, 0xff, 0x00, 0xaa, 0xaa, //
            0x00, 0x10, 0x80, 0x01, 0xbb, 0xbb,
        ];
        let mut plane = Plane::new();
        copy_gray16be(&mut plane, &src, 6, 2, 2).unwrap();

        assert_eq!(plane.samples(), &[0x0102, 0xff00, 0x0010, 0x8001]);
        assert_eq!(plane.stride_bytes(), 4);
        assert_eq!(&plane.as_bytes()[..2], &0x0102u16.to_ne_bytes());
    }

    #[test]
    fn gray16le_is_copied_as_is() {
        let src = [0x01, 0x02, 0x03, 0x04];
        let mut plane = Plane::new();
        copy_gray16le(&mut plane, &src, 4, 2, 1).unwrap();
        assert_eq!(plane.samples(), &[0x0201, 0x0403]);
    }

    #[test]
    fn short_depth_source_is_rejected() {
        let mut plane = Plane::new();
        assert!(copy_gray16be(&mut plane, &[0; 7], 4, 2, 2).is_err());
        assert!(copy_gray16be(&mut plane, &[0; 16], 3, 2, 2).is_err());
        assert!(!plane.is_populated());
    }

    #[test]
    fn gray8_packs_rows() {
        let src = [1, 2, 9, 3, 4, 9];
        let mut plane = Plane::new();
        copy_gray8(&mut plane, &src, 3, 2, 2).unwrap();
        assert_eq!(plane.samples(), &[1, 2, 3, 4]);
    }
}
