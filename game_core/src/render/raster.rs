use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{Rgb, RgbImage};
use itertools::iproduct;

use super::{GridPicture, PictureFormat, RenderError, RenderRequest, Renderer};
use crate::color::Color;

const BACKGROUND: Rgb<u8> = Rgb([0xff, 0xff, 0xff]);
const INK: Rgb<u8> = Rgb([0x00, 0x00, 0x00]);

const GLYPH_WIDTH: u32 = 3;
const GLYPH_HEIGHT: u32 = 5;

// 3x5 digits, one row per entry, high bit on the left
const DIGITS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b010, 0b010, 0b010],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];

/// Draws the grid straight into a bitmap, no browser involved.
#[derive(Clone, Copy, Debug, Default)]
pub struct RasterRenderer;

impl RasterRenderer {
    pub fn rasterize(&self, picture: &GridPicture) -> Result<RgbImage, RenderError> {
        let n = picture.grid_size();
        if n == 0 || picture.block_size() == 0 {
            return Err(RenderError::EmptyGrid);
        }
        let side = picture.canvas_size()?;
        let mut canvas = RgbImage::from_pixel(side, side, BACKGROUND);
        let block = picture.block_size();

        for (row, col) in iproduct!(0..n, 0..n) {
            let (x, y) = picture.block_origin(row, col);
            fill_rect(&mut canvas, x, y, block, block, to_rgb(picture.color_at(row, col)));
        }

        let scale = (block / 12).max(1);
        for i in 0..n {
            let (center, _) = picture.block_origin(0, i);
            let center = center + block / 2;
            let label = (i + 1).to_string();
            draw_label(&mut canvas, &label, center, block / 2, scale);
            draw_label(&mut canvas, &label, block / 2, center, scale);
        }
        Ok(canvas)
    }
}

impl Renderer for RasterRenderer {
    fn render(&self, request: &RenderRequest) -> Result<Vec<u8>, RenderError> {
        let canvas = self.rasterize(&request.picture)?;
        let mut bytes = Vec::new();
        match request.format {
            PictureFormat::Png => canvas.write_with_encoder(PngEncoder::new(&mut bytes))?,
            PictureFormat::Jpeg { quality } => canvas
                .write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100)))?,
        }
        log::debug!(
            "Rasterized {side}x{side} grid into {} bytes",
            bytes.len(),
            side = canvas.width()
        );
        Ok(bytes)
    }
}

fn to_rgb(color: Color) -> Rgb<u8> {
    Rgb(color.channels())
}

fn fill_rect(canvas: &mut RgbImage, x: u32, y: u32, width: u32, height: u32, color: Rgb<u8>) {
    let x_end = (x + width).min(canvas.width());
    let y_end = (y + height).min(canvas.height());
    for py in y..y_end {
        for px in x..x_end {
            canvas.put_pixel(px, py, color);
        }
    }
}

/// Draws `text` (digits only) centered on `(cx, cy)`.
fn draw_label(canvas: &mut RgbImage, text: &str, cx: u32, cy: u32, scale: u32) {
    let advance = (GLYPH_WIDTH + 1) * scale;
    let width = advance * text.len() as u32 - scale;
    let height = GLYPH_HEIGHT * scale;
    let left = cx.saturating_sub(width / 2);
    let top = cy.saturating_sub(height / 2);
    for (i, digit) in text.chars().filter_map(|c| c.to_digit(10)).enumerate() {
        let glyph = &DIGITS[digit as usize];
        let glyph_left = left + i as u32 * advance;
        for (gy, bits) in glyph.iter().enumerate() {
            for gx in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - gx)) != 0 {
                    fill_rect(
                        canvas,
                        glyph_left + gx * scale,
                        top + gy as u32 * scale,
                        scale,
                        scale,
                        INK,
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::round::Round;

    fn picture() -> GridPicture {
        let round = Round::new(2, 2, 3, Color::new(200, 40, 40), Color::new(210, 44, 44));
        GridPicture::new(round, 24, 4)
    }

    #[test]
    fn blocks_take_their_colors() {
        let picture = picture();
        let canvas = RasterRenderer.rasterize(&picture).unwrap();
        assert_eq!(canvas.width(), picture.canvas_size().unwrap());
        let (x, y) = picture.block_origin(0, 0);
        assert_eq!(*canvas.get_pixel(x + 12, y + 12), Rgb([200, 40, 40]));
        let (x, y) = picture.block_origin(1, 1);
        assert_eq!(*canvas.get_pixel(x + 12, y + 12), Rgb([210, 44, 44]));
        // spacing between blocks stays background
        assert_eq!(*canvas.get_pixel(x - 1, y + 12), BACKGROUND);
    }

    #[test]
    fn labels_leave_ink_in_the_margin() {
        let picture = picture();
        let canvas = RasterRenderer.rasterize(&picture).unwrap();
        let offset = picture.offset();
        let inked = (0..offset)
            .flat_map(|y| (offset..canvas.width()).map(move |x| (x, y)))
            .any(|(x, y)| *canvas.get_pixel(x, y) == INK);
        assert!(inked);
    }

    #[test]
    fn encodes_png_and_jpeg() {
        let picture = picture();
        let png = RasterRenderer
            .render(&RenderRequest::new(picture, PictureFormat::Png).unwrap())
            .unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        let jpeg = RasterRenderer
            .render(&RenderRequest::new(picture, PictureFormat::Jpeg { quality: 70 }).unwrap())
            .unwrap();
        assert_eq!(&jpeg[..2], &[0xff, 0xd8]);
    }

    #[test]
    fn empty_grid_is_an_error() {
        let round = Round::new(0, 0, 0, Color::BLACK, Color::WHITE);
        assert!(matches!(
            RasterRenderer.rasterize(&GridPicture::new(round, 24, 4)),
            Err(RenderError::EmptyGrid)
        ));
    }
}
