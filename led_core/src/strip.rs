use crate::{Result, Rgb};

/// An addressable strip with a frame buffer.
///
/// `set_pixel` and `clear` only touch the buffer; `refresh` latches it onto
/// the LEDs.
pub trait PixelStrip {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn set_pixel(&mut self, index: usize, color: Rgb) -> Result<()>;

    fn clear(&mut self) -> Result<()>;

    fn refresh(&mut self) -> Result<()>;
}
