use image::{ImageBuffer, Luma};
use qrcode::render::svg;
use qrcode::QrCode;

#[derive(thiserror::Error, Debug)]
pub enum QrGenerationError {
    #[error("QR code generation failed: {0}")]
    QrCodeError(#[from] qrcode::types::QrError),

    #[error("PNG encoding failed: {0}")]
    ImageError(#[from] image::ImageError),
}

/// Each module is rendered as a square of this many pixels
const MODULE_SIZE: u32 = 10;

/// Renders a link as an SVG QR code
pub fn generate_link_svg(link: &str) -> Result<String, QrGenerationError> {
    let code = QrCode::new(link.as_bytes())?;

    let svg = code
        .render::<svg::Color>()
        .min_dimensions(200, 200)
        .quiet_zone(true)
        .build();

    Ok(svg)
}

/// Renders a link as a PNG QR code
pub fn generate_link_png(link: &str) -> Result<Vec<u8>, QrGenerationError> {
    let code = QrCode::new(link.as_bytes())?;

    let width = code.width() as u32;
    let img_size = width * MODULE_SIZE;

    let mut img = ImageBuffer::<Luma<u8>, Vec<u8>>::new(img_size, img_size);

    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let module_x = (x / MODULE_SIZE) as usize;
        let module_y = (y / MODULE_SIZE) as usize;
        *pixel = match code[(module_x, module_y)] {
            qrcode::types::Color::Dark => Luma([0u8]),
            qrcode::types::Color::Light => Luma([255u8]),
        };
    }

    let mut png_data = Vec::new();
    image::DynamicImage::ImageLuma8(img).write_to(
        &mut std::io::Cursor::new(&mut png_data),
        image::ImageFormat::Png,
    )?;

    Ok(png_data)
}
