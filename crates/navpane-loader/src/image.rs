//! Image decoding: PNG through the `png` crate, uncompressed BMP by hand.

use navpane_types::Image;

/// Largest accepted width or height.
const MAX_DIMENSION: u32 = 8192;

/// Image format detected from magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Bmp,
    Jpeg,
    Gif,
    Unknown,
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("unsupported image format: {0:?}")]
    Unsupported(ImageFormat),

    #[error("PNG decode failed")]
    Png(#[from] png::DecodingError),

    #[error("invalid BMP: {0}")]
    Bmp(&'static str),

    #[error("image dimensions {0}x{1} exceed the limit")]
    TooLarge(u32, u32),
}

pub fn detect_format(data: &[u8]) -> ImageFormat {
    if data.starts_with(&[0x89, b'P', b'N', b'G']) {
        ImageFormat::Png
    } else if data.starts_with(b"BM") {
        ImageFormat::Bmp
    } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        ImageFormat::Jpeg
    } else if data.starts_with(b"GIF8") {
        ImageFormat::Gif
    } else {
        ImageFormat::Unknown
    }
}

/// Decode raw bytes into RGBA.
pub fn decode_image(data: &[u8]) -> Result<Image, DecodeError> {
    match detect_format(data) {
        ImageFormat::Png => decode_png(data),
        ImageFormat::Bmp => decode_bmp(data),
        other => Err(DecodeError::Unsupported(other)),
    }
}

fn check_dimensions(width: u32, height: u32) -> Result<(), DecodeError> {
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(DecodeError::TooLarge(width, height));
    }
    Ok(())
}

fn decode_png(data: &[u8]) -> Result<Image, DecodeError> {
    let mut decoder = png::Decoder::new(data);
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info()?;
    let mut buf = vec![0u8; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf)?;
    check_dimensions(info.width, info.height)?;
    let bytes = &buf[..info.buffer_size()];

    let pixels = match info.color_type {
        png::ColorType::Rgba => bytes.to_vec(),
        png::ColorType::Rgb => bytes
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        png::ColorType::Grayscale => bytes.iter().flat_map(|&g| [g, g, g, 255]).collect(),
        png::ColorType::GrayscaleAlpha => bytes
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        // EXPAND turns palettes into RGB(A).
        png::ColorType::Indexed => return Err(DecodeError::Unsupported(ImageFormat::Png)),
    };

    Ok(Image {
        width: info.width,
        height: info.height,
        pixels,
    })
}

/// Uncompressed 24-bit or 32-bit BMP.
fn decode_bmp(data: &[u8]) -> Result<Image, DecodeError> {
    if data.len() < 54 {
        return Err(DecodeError::Bmp("truncated header"));
    }

    let pixel_offset = u32::from_le_bytes([data[10], data[11], data[12], data[13]]) as usize;
    let width = i32::from_le_bytes([data[18], data[19], data[20], data[21]]);
    let height = i32::from_le_bytes([data[22], data[23], data[24], data[25]]);
    let bpp = u16::from_le_bytes([data[28], data[29]]);
    let compression = u32::from_le_bytes([data[30], data[31], data[32], data[33]]);

    if width <= 0 || height == 0 {
        return Err(DecodeError::Bmp("empty image"));
    }
    if compression != 0 {
        return Err(DecodeError::Bmp("compressed BMP"));
    }
    if bpp != 24 && bpp != 32 {
        return Err(DecodeError::Bmp("only 24-bit and 32-bit BMP are supported"));
    }

    let w = width.unsigned_abs();
    let h = height.unsigned_abs();
    check_dimensions(w, h)?;
    // Positive height means rows are stored bottom-up.
    let bottom_up = height > 0;
    let bytes_per_pixel = (bpp / 8) as usize;
    let row_size = (w as usize * bytes_per_pixel).div_ceil(4) * 4;

    let needed = pixel_offset + row_size * h as usize;
    if data.len() < needed {
        return Err(DecodeError::Bmp("truncated pixel data"));
    }

    let mut pixels = Vec::with_capacity(w as usize * h as usize * 4);
    for row in 0..h as usize {
        let src_row = if bottom_up { h as usize - 1 - row } else { row };
        let row_start = pixel_offset + src_row * row_size;
        for col in 0..w as usize {
            let src = row_start + col * bytes_per_pixel;
            // BGR(A) on disk.
            let alpha = if bpp == 32 { data[src + 3] } else { 255 };
            pixels.extend_from_slice(&[data[src + 2], data[src + 1], data[src], alpha]);
        }
    }

    Ok(Image {
        width: w,
        height: h,
        pixels,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// 2x2 24-bit BMP: top row blue, white; bottom row red, green.
    pub(crate) fn sample_bmp() -> Vec<u8> {
        let (w, h) = (2u32, 2u32);
        let row = 8usize;
        let size = 54 + row * h as usize;
        let mut bmp = vec![0u8; size];
        bmp[0] = b'B';
        bmp[1] = b'M';
        bmp[2..6].copy_from_slice(&(size as u32).to_le_bytes());
        bmp[10..14].copy_from_slice(&54u32.to_le_bytes());
        bmp[14..18].copy_from_slice(&40u32.to_le_bytes());
        bmp[18..22].copy_from_slice(&(w as i32).to_le_bytes());
        bmp[22..26].copy_from_slice(&(h as i32).to_le_bytes());
        bmp[26..28].copy_from_slice(&1u16.to_le_bytes());
        bmp[28..30].copy_from_slice(&24u16.to_le_bytes());
        // Bottom row first.
        bmp[54..60].copy_from_slice(&[0, 0, 255, 0, 255, 0]);
        bmp[62..68].copy_from_slice(&[255, 0, 0, 255, 255, 255]);
        bmp
    }

    /// 3x1 RGB PNG encoded with the `png` crate.
    pub(crate) fn sample_png() -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, 3, 1);
            encoder.set_color(png::ColorType::Rgb);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer
                .write_image_data(&[255, 0, 0, 0, 255, 0, 0, 0, 255])
                .unwrap();
        }
        out
    }

    #[test]
    fn detect_formats() {
        assert_eq!(detect_format(&sample_png()), ImageFormat::Png);
        assert_eq!(detect_format(b"BM\0\0"), ImageFormat::Bmp);
        assert_eq!(detect_format(&[0xFF, 0xD8, 0xFF, 0xE0]), ImageFormat::Jpeg);
        assert_eq!(detect_format(b"GIF89a"), ImageFormat::Gif);
        assert_eq!(detect_format(b"<h"), ImageFormat::Unknown);
    }

    #[test]
    fn decode_bmp_24bit() {
        let img = decode_image(&sample_bmp()).unwrap();
        assert_eq!((img.width, img.height), (2, 2));
        assert_eq!(img.pixel(0, 0), Some([0, 0, 255, 255]));
        assert_eq!(img.pixel(1, 0), Some([255, 255, 255, 255]));
        assert_eq!(img.pixel(0, 1), Some([255, 0, 0, 255]));
        assert_eq!(img.pixel(1, 1), Some([0, 255, 0, 255]));
    }

    #[test]
    fn decode_truncated_bmp_fails() {
        let mut bmp = sample_bmp();
        bmp.truncate(60);
        assert!(matches!(decode_image(&bmp), Err(DecodeError::Bmp(_))));
        assert!(matches!(decode_image(b"BM"), Err(DecodeError::Bmp(_))));
    }

    #[test]
    fn decode_png_rgb() {
        let img = decode_image(&sample_png()).unwrap();
        assert_eq!((img.width, img.height), (3, 1));
        assert_eq!(img.pixel(0, 0), Some([255, 0, 0, 255]));
        assert_eq!(img.pixel(2, 0), Some([0, 0, 255, 255]));
    }

    #[test]
    fn corrupt_png_fails() {
        let mut png = sample_png();
        png.truncate(20);
        assert!(matches!(decode_image(&png), Err(DecodeError::Png(_))));
    }

    #[test]
    fn unsupported_formats() {
        assert!(matches!(
            decode_image(&[0xFF, 0xD8, 0xFF, 0xE0]),
            Err(DecodeError::Unsupported(ImageFormat::Jpeg))
        ));
        assert!(matches!(
            decode_image(b"<html>"),
            Err(DecodeError::Unsupported(ImageFormat::Unknown))
        ));
    }
}
