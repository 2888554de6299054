//! Fixed-size monochrome frame buffer.

use core::convert::Infallible;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

/// A 1-bit canvas. `BinaryColor::On` is ink (black), `Off` is paper (white).
///
/// Writes outside the canvas are dropped and counted, so layout code can be
/// checked for overflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    ink: Vec<bool>,
    clipped: usize,
}

impl Frame {
    /// Create a blank (all white) frame.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ink: vec![false; (width * height) as usize],
            clipped: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the pixel at (x, y) is inked. Out-of-range reads are paper.
    pub fn is_ink(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.ink[(y * self.width + x) as usize]
    }

    /// Number of pixel writes that fell outside the canvas.
    pub fn clipped_pixels(&self) -> usize {
        self.clipped
    }

    pub fn ink_count(&self) -> usize {
        self.ink.iter().filter(|&&ink| ink).count()
    }

    /// Number of inked pixels inside `area`.
    pub fn ink_in(&self, area: &Rectangle) -> usize {
        area.points()
            .filter(|p| p.x >= 0 && p.y >= 0 && self.is_ink(p.x as u32, p.y as u32))
            .count()
    }

    /// Bytes per packed row.
    pub fn stride(&self) -> usize {
        self.width.div_ceil(8) as usize
    }

    /// Pack rows MSB-first with set bits meaning white, the layout e-paper
    /// controllers expect. Padding bits at the end of a row are white.
    pub fn to_packed_bytes(&self) -> Vec<u8> {
        let stride = self.stride();
        let mut bytes = vec![0xFF_u8; stride * self.height as usize];
        for y in 0..self.height {
            for x in 0..self.width {
                if self.is_ink(x, y) {
                    let index = y as usize * stride + (x / 8) as usize;
                    bytes[index] &= !(0x80 >> (x % 8));
                }
            }
        }
        bytes
    }

    fn set(&mut self, point: Point, color: BinaryColor) {
        if point.x < 0
            || point.y < 0
            || point.x as u32 >= self.width
            || point.y as u32 >= self.height
        {
            self.clipped += 1;
            return;
        }
        let index = (point.y as u32 * self.width + point.x as u32) as usize;
        self.ink[index] = color.is_on();
    }
}

impl OriginDimensions for Frame {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Frame {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set(point, color);
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.ink.fill(color.is_on());
        Ok(())
    }
}
