use bitflags::bitflags;

bitflags! {
    /// CGB background/window tile-map attribute byte, stored in VRAM bank 1
    /// at the same map offset as the tile index it describes in bank 0.
    #[derive(Default)]
    pub struct CgbTileAttribute: u8 {
        /// BG palette number, 0-7.
        const BG_PALETTE_NUMBER = 0b0000_0111;
        /// 0 = tile data from bank 0, 1 = bank 1.
        const TILE_VRAM_BANK_NUMBER = 0b0000_1000;
        /// Unused, kept so the full byte round-trips through save state.
        const UNUSED = 0b0001_0000;
        const X_FLIP = 0b0010_0000;
        const Y_FLIP = 0b0100_0000;
        /// 0 = defer to the OAM priority bit, 1 = BG always has priority.
        const BG_TO_OAM_PRIORITY = 0b1000_0000;
    }
}

impl CgbTileAttribute {
    /// Returns the BG palette number in the range `0..=7`.
    pub fn bg_palette_numb(&self) -> u8 {
        self.bits & 0x7
    }

    pub fn set_bg_palette_numb(&mut self, value: u8) {
        self.bits = (self.bits & 0xF8) | (value & 0x7);
    }

    pub fn uses_bank_1(&self) -> bool {
        self.contains(CgbTileAttribute::TILE_VRAM_BANK_NUMBER)
    }
}
