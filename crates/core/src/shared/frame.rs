use ndarray::{ArrayView3, ArrayViewMut3};

/// A single camera frame: contiguous RGB bytes in row-major order.
///
/// `index` is the acquisition sequence number assigned by the video source.
/// Format conversion happens at I/O boundaries only; the domain layer
/// treats pixel data as opaque.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    /// A uniformly filled RGB frame. Handy for sources that need a
    /// placeholder and for tests.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3], index: usize) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self::new(data, width, height, 3, index)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, 3, 5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.index(), 5);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    fn test_filled_repeats_color() {
        let frame = Frame::filled(3, 2, [10, 20, 30], 7);
        assert_eq!(frame.data().len(), 18);
        assert_eq!(frame.index(), 7);
        for px in frame.data().chunks(3) {
            assert_eq!(px, &[10, 20, 30]);
        }
    }

    #[test]
    fn test_clone_is_independent() {
        let frame = Frame::filled(2, 2, [100, 100, 100], 0);
        let mut cloned = frame.clone();
        cloned.as_ndarray_mut()[[0, 0, 0]] = 0;
        assert_eq!(frame.data()[0], 100);
        assert_eq!(cloned.data()[0], 0);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        let data = vec![0u8; 10]; // wrong size for 2x2x3
        Frame::new(data, 2, 2, 3, 0);
    }

    #[test]
    fn test_as_ndarray_shape() {
        let frame = Frame::filled(4, 2, [0, 0, 0], 0);
        let arr = frame.as_ndarray();
        assert_eq!(arr.shape(), &[2, 4, 3]); // (height, width, channels)
    }

    #[test]
    fn test_as_ndarray_mut_modification() {
        let mut frame = Frame::filled(2, 2, [0, 0, 0], 0);
        {
            let mut arr = frame.as_ndarray_mut();
            arr[[0, 1, 2]] = 128; // row=0, col=1, B channel
        }
        assert_eq!(frame.as_ndarray()[[0, 1, 2]], 128);
        assert_eq!(frame.data()[5], 128);
    }
}
