pub mod error;
pub mod interrupts;
pub mod model;
pub mod ppu;

pub use crate::error::LoadStateError;
pub use crate::interrupts::InterruptFlags;
pub use crate::model::GameBoyModel;
pub use crate::ppu::palette::{DisplayColour, RGB};
pub use crate::ppu::{Mode, Ppu};
