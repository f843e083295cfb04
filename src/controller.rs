//! NES controller input handling.
//!
//! Implements the standard NES controller shift register protocol:
//! write $01 then $00 to $4016 to latch the current state; then read $4016 repeatedly
//! to get one bit per read (A, B, Select, Start, Up, Down, Left, Right).

use crate::io::InputSource;

pub const BUTTON_A: u8 = 1 << 0;
pub const BUTTON_B: u8 = 1 << 1;
pub const BUTTON_SELECT: u8 = 1 << 2;
pub const BUTTON_START: u8 = 1 << 3;
pub const BUTTON_UP: u8 = 1 << 4;
pub const BUTTON_DOWN: u8 = 1 << 5;
pub const BUTTON_LEFT: u8 = 1 << 6;
pub const BUTTON_RIGHT: u8 = 1 << 7;

/// A single NES controller connected to port 1 ($4016).
pub struct Controller {
    input: Box<dyn InputSource>,
    /// Strobe bit (bit 0 of the last $4016 write). While high the pad keeps reloading.
    strobe: bool,
    /// Shift register latched from the input source; shifted out LSB-first on read.
    shift: u8,
    /// Bits left before reads start returning 1.
    remaining: u8,
}

impl Controller {
    /// Create a controller backed by `input`.
    pub fn new(input: Box<dyn InputSource>) -> Self {
        Controller {
            input,
            strobe: false,
            shift: 0,
            remaining: 0,
        }
    }

    /// Read one button state from $4016. Returns the next bit OR'd with open bus ($40).
    /// Once all eight buttons have been read, official pads report 1.
    pub fn read(&mut self) -> u8 {
        if self.strobe {
            return (self.input.buttons() & 1) | 0x40;
        }
        if self.remaining == 0 {
            return 0x41;
        }
        let bit = self.shift & 1;
        self.shift >>= 1;
        self.remaining -= 1;
        bit | 0x40
    }

    /// Write to $4016. The falling edge of bit 0 latches the button state.
    pub fn write(&mut self, data: u8) {
        let strobe = data & 1 != 0;
        if self.strobe && !strobe {
            self.shift = self.input.buttons();
            self.remaining = 8;
        }
        self.strobe = strobe;
    }
}
