use image::RgbImage;
use lensing::Vec3;

/// Linear RGB framebuffer, row-major with row 0 at the top.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<Vec3>,
}

impl Surface {
    /// Allocates a black surface; zero dimensions are bumped to one pixel.
    pub fn new(width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        Self {
            width,
            height,
            pixels: vec![Vec3::ZERO; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Reallocates to a new size. Returns `false` when the size is unchanged.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        let (width, height) = (width.max(1), height.max(1));
        if (width, height) == self.size() {
            return false;
        }
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(width as usize * height as usize, Vec3::ZERO);
        true
    }

    pub fn pixels(&self) -> &[Vec3] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Vec3] {
        &mut self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Vec3> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = y as usize * self.width as usize + x as usize;
        self.pixels.get(index).copied()
    }

    /// Quantises one pixel to 8-bit RGB.
    pub fn rgb8(&self, x: u32, y: u32) -> [u8; 3] {
        self.pixel(x, y).map_or([0, 0, 0], quantise)
    }

    /// Copies the framebuffer into an 8-bit image ready for encoding.
    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| image::Rgb(self.rgb8(x, y)))
    }
}

pub(crate) fn quantise(color: Vec3) -> [u8; 3] {
    let scaled = color.clamp(Vec3::ZERO, Vec3::ONE) * 255.0 + Vec3::splat(0.5);
    [scaled.x as u8, scaled.y as u8, scaled.z as u8]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sized_surfaces_hold_one_pixel() {
        let surface = Surface::new(0, 0);
        assert_eq!(surface.size(), (1, 1));
        assert_eq!(surface.pixels().len(), 1);
    }

    #[test]
    fn resize_reallocates_only_on_change() {
        let mut surface = Surface::new(4, 3);
        assert!(!surface.resize(4, 3));
        assert!(surface.resize(8, 2));
        assert_eq!(surface.pixels().len(), 16);
        assert!(surface.pixels().iter().all(|p| *p == Vec3::ZERO));
    }

    #[test]
    fn quantise_clamps_and_rounds() {
        assert_eq!(quantise(Vec3::new(-1.0, 0.5, 2.0)), [0, 128, 255]);
        assert_eq!(quantise(Vec3::splat(f32::NAN)), [0, 0, 0]);
    }

    #[test]
    fn image_matches_pixel_layout() {
        let mut surface = Surface::new(2, 2);
        surface.pixels_mut()[1] = Vec3::new(1.0, 0.0, 0.0);
        let image = surface.to_rgb_image();
        assert_eq!(image.get_pixel(1, 0).0, [255, 0, 0]);
        assert_eq!(image.get_pixel(0, 1).0, [0, 0, 0]);
        assert_eq!(surface.pixel(2, 0), None);
    }
}
