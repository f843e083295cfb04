//! Errors raised while loading a cartridge image.
//!
//! Loading is the only fallible operation in the core. Once a cartridge is running the
//! machine is a deterministic state machine; undefined opcodes are logged and skipped
//! rather than reported here.

use std::fmt;
use std::io;

/// Fatal cartridge load failure. No partial machine is built when one of these is returned.
#[derive(Debug)]
pub enum LoadError {
    /// The ROM file could not be read.
    Io(io::Error),
    /// The first four bytes are not `NES\x1A`.
    BadMagic,
    /// The header declares zero PRG banks.
    EmptyPrg,
    /// The image is shorter than its header declares.
    Truncated { expected: usize, actual: usize },
    /// The header names a mapper this core does not implement.
    UnsupportedMapper(u8),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io(e) => write!(f, "cannot read ROM: {}", e),
            LoadError::BadMagic => write!(f, "not an iNES image (missing NES\\x1A magic)"),
            LoadError::EmptyPrg => write!(f, "iNES header declares no PRG ROM"),
            LoadError::Truncated { expected, actual } => write!(
                f,
                "truncated iNES image: header needs {} bytes, file has {}",
                expected, actual
            ),
            LoadError::UnsupportedMapper(id) => write!(f, "unsupported mapper {}", id),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for LoadError {
    fn from(e: io::Error) -> Self {
        LoadError::Io(e)
    }
}
