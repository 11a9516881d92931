//! Headless rendering to a pixel buffer.

use std::path::Path;

use image::{ImageBuffer, Rgba};
use pollster::FutureExt;

use crate::{render_error, Camera, Result, ShadowRenderer, UmbraError, Vec4, WgpuDevice};

const CLEAR_COLOR: Vec4 = Vec4::new(0.0, 0.0, 0.0, 1.0);

/// Renders the current scene to an image file.
///
/// The format follows the extension: `.png`, or `.jpg`/`.jpeg` without
/// alpha.
pub fn render_to_file(
    filename: impl AsRef<Path>,
    width: u32,
    height: u32,
    camera: &Camera,
) -> Result<()> {
    let data = render_to_image(width, height, camera)?;
    save_image(filename.as_ref(), data, width, height)
}

/// Renders the current scene to a raw RGBA pixel buffer.
///
/// Creates a headless GPU device, renders one frame with `camera` (its
/// aspect ratio is fitted to the image) and returns `width * height * 4`
/// bytes, row by row from the top left.
pub fn render_to_image(width: u32, height: u32, camera: &Camera) -> Result<Vec<u8>> {
    let mut device = WgpuDevice::new_headless(width, height)
        .block_on()
        .map_err(render_error)?;
    let mut camera = camera.clone();
    camera.set_aspect_ratio(width as f32 / height.max(1) as f32);
    render_with_device(&mut device, &camera)
}

/// Renders the current scene into an existing headless device and reads the
/// color target back.
pub fn render_with_device(device: &mut WgpuDevice, camera: &Camera) -> Result<Vec<u8>> {
    let mut renderer = ShadowRenderer::new(&*device)?;
    device.begin_frame(CLEAR_COLOR);
    let report = renderer.render_frame(device, camera, false)?;
    device.end_frame().map_err(render_error)?;
    if !report.failures.is_empty() {
        log::warn!("{} nodes skipped while rendering", report.failures.len());
    }
    device.read_pixels().map_err(render_error)
}

fn save_image(path: &Path, data: Vec<u8>, width: u32, height: u32) -> Result<()> {
    let img: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::from_raw(width, height, data)
        .ok_or_else(|| UmbraError::RenderError("image buffer size mismatch".to_string()))?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let saved = match extension.as_str() {
        "jpg" | "jpeg" => image::DynamicImage::ImageRgba8(img)
            .to_rgb8()
            .save_with_format(path, image::ImageFormat::Jpeg),
        _ => img.save_with_format(path, image::ImageFormat::Png),
    };
    saved.map_err(|e| UmbraError::RenderError(format!("failed to save image: {e}")))?;
    log::info!("saved {}", path.display());
    Ok(())
}
