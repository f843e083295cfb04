//! Hooks between the core and the presentation layer.
//!
//! The core never opens windows or polls devices. It hands each completed frame to a
//! [`FrameSink`] and asks an [`InputSource`] for the pad state when the game strobes $4016.
//! Closures implement both traits, which is usually all a host needs.

/// Receives every completed 256×240 frame (0xRRGGBB per pixel, row-major).
pub trait FrameSink {
    fn deliver_frame(&mut self, frame: &[u32]);
}

impl<F: FnMut(&[u32])> FrameSink for F {
    fn deliver_frame(&mut self, frame: &[u32]) {
        self(frame)
    }
}

/// Supplies the current controller bit-state.
///
/// Bit 0 = A, 1 = B, 2 = Select, 3 = Start, 4 = Up, 5 = Down, 6 = Left, 7 = Right.
pub trait InputSource {
    fn buttons(&mut self) -> u8;
}

impl<F: FnMut() -> u8> InputSource for F {
    fn buttons(&mut self) -> u8 {
        self()
    }
}

/// A sink that drops frames; used by headless runs and tests.
pub fn discard_frames() -> Box<dyn FrameSink> {
    Box::new(|_: &[u32]| {})
}

/// An input source with no buttons held.
pub fn no_input() -> Box<dyn InputSource> {
    Box::new(|| 0u8)
}
