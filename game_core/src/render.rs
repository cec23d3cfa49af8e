//! Turning a [Round] into an image.
//!
//! The game only describes the grid; producing pixels is left to a [Renderer].
//! A renderer gets both an HTML document (for browser-based renderers) and the
//! structured [GridPicture] it was built from.

mod markup;
mod raster;

use getset::CopyGetters;
use thiserror::Error;

pub use markup::grid_document;
pub use raster::RasterRenderer;

use crate::color::Color;
use crate::configuration::GameConfiguration;
use crate::round::Round;

/// Largest canvas side, in pixels, that will be rendered.
pub const MAX_CANVAS_SIZE: u32 = 16_384;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("cannot render an empty grid")]
    EmptyGrid,
    #[error("a {grid_size}×{grid_size} grid of {block_size}px blocks is wider than {max}px", max = MAX_CANVAS_SIZE)]
    TooLarge { grid_size: u32, block_size: u32 },
    #[error("image encoding failed: {0}")]
    Encoding(#[from] image::ImageError),
    #[error("renderer failed: {0}")]
    Backend(#[from] anyhow::Error),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PictureFormat {
    Png,
    Jpeg { quality: u8 },
}

impl PictureFormat {
    pub fn from_config(config: &GameConfiguration) -> Self {
        if config.compress_images() {
            PictureFormat::Jpeg {
                quality: config.image_quality(),
            }
        } else {
            PictureFormat::Png
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            PictureFormat::Png => "image/png",
            PictureFormat::Jpeg { .. } => "image/jpeg",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            PictureFormat::Png => "png",
            PictureFormat::Jpeg { .. } => "jpg",
        }
    }
}

/// Geometry and colors of a grid image.
///
/// Row and column labels sit in a margin `offset` pixels wide on the top and
/// left; the same margin is kept on the bottom and right.
#[derive(Clone, Copy, Debug, CopyGetters, Eq, PartialEq)]
#[getset(get_copy = "pub")]
pub struct GridPicture {
    round: Round,
    block_size: u32,
    spacing: u32,
    offset: u32,
}

impl GridPicture {
    pub fn new(round: Round, block_size: u32, spacing: u32) -> Self {
        GridPicture {
            round,
            block_size,
            spacing,
            offset: block_size,
        }
    }

    pub fn from_config(round: Round, config: &GameConfiguration) -> Self {
        Self::new(round, config.block_size(), config.spacing())
    }

    pub fn grid_size(&self) -> u32 {
        self.round.grid_size()
    }

    /// Width and height of the square canvas, at most [MAX_CANVAS_SIZE].
    pub fn canvas_size(&self) -> Result<u32, RenderError> {
        canvas_side(self.grid_size(), self.block_size, self.spacing).ok_or(RenderError::TooLarge {
            grid_size: self.grid_size(),
            block_size: self.block_size,
        })
    }

    /// Top-left pixel of the block at zero-based `row`, `col`.
    pub fn block_origin(&self, row: u32, col: u32) -> (u32, u32) {
        let stride = self.block_size + self.spacing;
        (col * stride + self.offset, row * stride + self.offset)
    }

    pub fn color_at(&self, row: u32, col: u32) -> Color {
        self.round
            .color_of(crate::grid::row_col_to_block(self.grid_size(), row, col))
    }
}

/// Canvas side for an `n`×`n` grid with label margins one block wide, or
/// `None` past [MAX_CANVAS_SIZE].
pub fn canvas_side(n: u32, block_size: u32, spacing: u32) -> Option<u32> {
    let blocks = n.checked_mul(block_size)?;
    let gaps = n.saturating_sub(1).checked_mul(spacing)?;
    let side = blocks
        .checked_add(gaps)?
        .checked_add(block_size.checked_mul(2)?)?;
    (side <= MAX_CANVAS_SIZE).then_some(side)
}

#[derive(Clone, Debug)]
pub struct RenderRequest {
    pub document: String,
    pub picture: GridPicture,
    pub width: u32,
    pub height: u32,
    pub format: PictureFormat,
}

impl RenderRequest {
    pub fn new(picture: GridPicture, format: PictureFormat) -> Result<Self, RenderError> {
        let side = picture.canvas_size()?;
        Ok(RenderRequest {
            document: grid_document(&picture, side),
            picture,
            width: side,
            height: side,
            format,
        })
    }
}

/// Rendered image bytes plus how they are encoded.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RenderedImage {
    pub bytes: Vec<u8>,
    pub format: PictureFormat,
}

pub trait Renderer: Send + Sync {
    fn render(&self, request: &RenderRequest) -> Result<Vec<u8>, RenderError>;
}

impl<R: Renderer + ?Sized> Renderer for &R {
    fn render(&self, request: &RenderRequest) -> Result<Vec<u8>, RenderError> {
        (**self).render(request)
    }
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn render(&self, request: &RenderRequest) -> Result<Vec<u8>, RenderError> {
        (**self).render(request)
    }
}
