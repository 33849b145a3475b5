//! PNG input and palette-index mapping

use std::io;
use std::path::Path;

use image::RgbImage;

use crate::color::Rgb;
use crate::models::IndexedImage;
use crate::palette::Palette;

/// Error type for input operations
#[derive(Debug)]
pub enum InputError {
    /// IO error during file operations
    Io(io::Error),
    /// Image decoding error
    Image(image::ImageError),
    /// The file decoded to something other than 8-bit RGB
    NotRgb(image::ColorType),
    /// Image colors missing from the palette
    UnknownColors(Vec<Rgb>),
}

impl std::fmt::Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputError::Io(e) => write!(f, "IO error: {}", e),
            InputError::Image(e) => write!(f, "Image error: {}", e),
            InputError::NotRgb(ty) => write!(f, "not a RGB image ({:?} detected)", ty),
            InputError::UnknownColors(colors) => {
                let list: Vec<String> = colors.iter().map(|c| c.to_string()).collect();
                write!(
                    f,
                    "colors used in the image must be present in the palette: {}",
                    list.join(", ")
                )
            }
        }
    }
}

impl std::error::Error for InputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InputError::Io(e) => Some(e),
            InputError::Image(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for InputError {
    fn from(e: io::Error) -> Self {
        InputError::Io(e)
    }
}

impl From<image::ImageError> for InputError {
    fn from(e: image::ImageError) -> Self {
        InputError::Image(e)
    }
}

/// Load an 8-bit RGB PNG. Other pixel formats are rejected rather than
/// silently converted, since a stray alpha channel usually means the
/// transparent key color was exported wrong.
pub fn load_rgb(path: &Path) -> Result<RgbImage, InputError> {
    let image = image::open(path)?;
    match image {
        image::DynamicImage::ImageRgb8(rgb) => Ok(rgb),
        other => Err(InputError::NotRgb(other.color())),
    }
}

/// Map an RGB image onto palette indices by exact color match.
///
/// Every distinct image color absent from the palette is collected into a
/// single `UnknownColors` error for diagnosis.
pub fn index_image(image: &RgbImage, palette: &Palette) -> Result<IndexedImage, InputError> {
    let lookup = palette.lookup();
    let mut pixels = Vec::with_capacity((image.width() * image.height()) as usize);
    let mut unknown: Vec<Rgb> = Vec::new();
    for pixel in image.pixels() {
        let color = Rgb::from(pixel.0);
        match lookup.get(&color) {
            Some(&index) => pixels.push(index),
            None => {
                if !unknown.contains(&color) {
                    unknown.push(color);
                }
                pixels.push(0);
            }
        }
    }
    if !unknown.is_empty() {
        unknown.sort_unstable();
        return Err(InputError::UnknownColors(unknown));
    }
    Ok(IndexedImage::new(image.width(), image.height(), pixels))
}
