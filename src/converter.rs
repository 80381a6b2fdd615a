//! Page image conversion to JPEG.
//!
//! Pages are decoded with the format guessed from their content, flattened to
//! RGB over a white background when they carry transparency, and written as
//! baseline JPEG next to the original. Decoding and encoding are blocking and
//! are moved off the async executor by [`convert_image_to_jpeg`].

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageReader, Rgb, RgbImage};
use tokio::task::spawn_blocking;

use crate::error::{Error, Result};
use crate::path_utils::{jpeg_sibling, path_to_string_lossy};

/// JPEG quality used when none is configured.
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// Converts a decoded image to RGB, compositing it onto white if it has alpha.
///
/// Paletted sources with a transparent entry decode to RGBA, so they are
/// flattened the same way.
pub fn flatten_onto_white(image: DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as u16;
        let blend = |channel: u8| -> u8 {
            ((channel as u16 * alpha + 255 * (255 - alpha) + 127) / 255) as u8
        };
        Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Decodes the image at `path`, guessing the format from its bytes.
pub fn decode_image(path: &Path) -> Result<DynamicImage> {
    let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    Ok(image)
}

/// Encodes an RGB image as JPEG into `target`.
pub fn write_jpeg(image: &RgbImage, target: &Path, quality: u8) -> Result<()> {
    let file = File::create(target)?;
    let writer = BufWriter::new(file);
    JpegEncoder::new_with_quality(writer, quality).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(())
}

/// Blocking conversion of `source` to a `.jpg` sibling.
///
/// The original is removed only once the JPEG has been written. A failed
/// encode removes the partial output and leaves the original in place.
pub fn convert_image_to_jpeg_blocking(source: &Path, quality: u8) -> Result<PathBuf> {
    let target = jpeg_sibling(source);
    let flattened = flatten_onto_white(decode_image(source)?);

    if let Err(e) = write_jpeg(&flattened, &target, quality) {
        if target != source {
            let _ = fs::remove_file(&target);
        }
        return Err(Error::InvalidPath(
            source.to_path_buf(),
            format!(
                "Failed to encode '{}' as JPEG: {}",
                path_to_string_lossy(&target),
                e
            ),
        ));
    }

    if target != source {
        fs::remove_file(source)?;
    }

    log::debug!(
        "Converted '{}' to '{}'",
        path_to_string_lossy(source),
        path_to_string_lossy(&target)
    );
    Ok(target)
}

/// Converts the image at `source` to a JPEG sibling and deletes the original.
///
/// # Returns
///
/// * `Ok(PathBuf)` - Path of the new `.jpg` file
/// * `Err(Error)` - The image could not be decoded or encoded; `source` is untouched
pub async fn convert_image_to_jpeg(source: &Path, quality: u8) -> Result<PathBuf> {
    let source = source.to_path_buf();
    spawn_blocking(move || convert_image_to_jpeg_blocking(&source, quality))
        .await?
}
