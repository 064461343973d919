use image::{GrayImage, Luma, RgbaImage};

/// Luminance cut between text and background in the context menu.
pub const DEFAULT_BINARIZE_THRESHOLD: u8 = 150;

/// Converts an image to black and white by average luminance.
///
/// A pixel whose mean of R, G and B is below `threshold` becomes black,
/// everything else becomes white. The menu renders light text on a dark
/// panel, so the text ends up white on black, which Tesseract handles fine
/// once the noise from gradients is gone.
pub fn binarize_luminance(img: &RgbaImage, threshold: u8) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut output = GrayImage::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels() {
        let avg = (pixel[0] as u16 + pixel[1] as u16 + pixel[2] as u16) / 3;
        let value = if avg < threshold as u16 { 0u8 } else { 255u8 };
        output.put_pixel(x, y, Luma([value]));
    }

    output
}
