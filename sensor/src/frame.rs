/// One RGB frame captured from a camera source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Capture index, starting at zero and increasing by one per frame.
    pub index: u64,
    pub width: u32,
    pub height: u32,
    /// Packed RGB8 pixels, row-major.
    pub rgb: Vec<u8>,
}

impl Frame {
    pub fn new(index: u64, width: u32, height: u32, rgb: Vec<u8>) -> Self {
        Self {
            index,
            width,
            height,
            rgb,
        }
    }

    /// Luminance plane of the frame, one byte per pixel.
    pub fn luma(&self) -> Vec<u8> {
        self.rgb
            .chunks_exact(3)
            .map(|px| {
                let y = 0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32;
                y as u8
            })
            .collect()
    }
}

/// Mean absolute difference between two luminance planes, normalized to
/// [0, 1]. Planes of different lengths compare only their shared prefix.
pub fn mean_abs_delta(a: &[u8], b: &[u8]) -> f32 {
    let len = a.len().min(b.len());
    if len == 0 {
        return 0.0;
    }
    let sum: u64 = a
        .iter()
        .zip(b)
        .take(len)
        .map(|(x, y)| x.abs_diff(*y) as u64)
        .sum();
    sum as f32 / (len as f32 * 255.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luma_matches_pixel_count() {
        let frame = Frame::new(0, 2, 2, vec![255; 12]);
        assert_eq!(frame.luma().len(), 4);
    }

    #[test]
    fn delta_of_identical_planes_is_zero() {
        let plane = vec![7u8; 64];
        assert_eq!(mean_abs_delta(&plane, &plane), 0.0);
    }

    #[test]
    fn delta_of_opposite_planes_is_one() {
        let black = vec![0u8; 16];
        let white = vec![255u8; 16];
        assert!((mean_abs_delta(&black, &white) - 1.0).abs() < 1e-6);
    }
}
