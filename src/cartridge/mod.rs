//! NES cartridge loading and mapper support.
//!
//! - **cartridge**: Loads iNES (.nes) images, holds the mapper that owns PRG/CHR.
//! - **mapper**: NROM (0), MMC1 (1), MMC3 (4); PRG/CHR bank switching and nametable mirroring.

pub mod cartridge;
pub mod mapper;

pub use cartridge::{Cartridge, Header};
pub use mapper::Mirroring;
