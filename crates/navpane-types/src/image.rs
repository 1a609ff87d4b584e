//! Decoded RGBA images and the placeholder shown when an image is missing.

/// Decoded image data (RGBA pixels).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    /// RGBA pixel data, 4 bytes per pixel.
    pub pixels: Vec<u8>,
}

const PLACEHOLDER_WIDTH: u32 = 100;
const PLACEHOLDER_HEIGHT: u32 = 50;
const PLACEHOLDER_INSET: u32 = 5;
const BLUE: [u8; 4] = [0, 0, 255, 255];
const YELLOW: [u8; 4] = [255, 255, 0, 255];

impl Image {
    /// Solid-colour image.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take((width * height * 4) as usize)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    /// The 100x50 stand-in for any image that could not be fetched:
    /// blue background with a yellow ellipse inset by 5 px on every side.
    pub fn placeholder() -> Self {
        let mut img = Self::filled(PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT, BLUE);

        let left = PLACEHOLDER_INSET as f32;
        let top = PLACEHOLDER_INSET as f32;
        let rx = (PLACEHOLDER_WIDTH - 2 * PLACEHOLDER_INSET) as f32 / 2.0;
        let ry = (PLACEHOLDER_HEIGHT - 2 * PLACEHOLDER_INSET) as f32 / 2.0;
        let (cx, cy) = (left + rx, top + ry);

        for y in 0..PLACEHOLDER_HEIGHT {
            for x in 0..PLACEHOLDER_WIDTH {
                let dx = (x as f32 + 0.5 - cx) / rx;
                let dy = (y as f32 + 0.5 - cy) / ry;
                if dx * dx + dy * dy <= 1.0 {
                    img.set_pixel(x, y, YELLOW);
                }
            }
        }
        img
    }

    /// RGBA at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        self.pixels
            .get(i..i + 4)
            .map(|p| [p[0], p[1], p[2], p[3]])
    }

    fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = ((y * self.width + x) * 4) as usize;
        if let Some(dst) = self.pixels.get_mut(i..i + 4) {
            dst.copy_from_slice(&rgba);
        }
    }
}
