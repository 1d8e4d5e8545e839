use crate::ppu::Mode;

use bitflags::bitflags;

bitflags! {
    /// FF40
    /// LCDC is a powerful tool: each bit controls a lot of behavior,
    /// and can be modified at any time during the frame.
    ///
    /// Unlike VRAM, the PPU never locks LCDC: it's possible to modify it
    /// mid-scanline.
    #[derive(Default)]
    pub struct LcdControl: u8 {
        /// `BG_WINDOW_PRIORITY` has a different meaning per model:
        ///
        /// * DMG/CGB-in-DMG-mode: BG/window display. When cleared both
        ///   become blank (white) and the window bit is ignored; sprites
        ///   may still be displayed.
        /// * CGB in CGB mode: BG/window master priority. When cleared the
        ///   background and window lose their priority bits entirely and
        ///   sprites are always drawn on top.
        const BG_WINDOW_PRIORITY = 0b0000_0001;
        /// Sprite display enable. Can be toggled mid-frame.
        const SPRITE_DISPLAY_ENABLE = 0b0000_0010;
        /// Sprite size: 0 = 8x8, 1 = 8x16 (two tiles stacked vertically).
        const SPRITE_SIZE = 0b0000_0100;
        /// 0 = background uses tilemap $9800, 1 = $9C00.
        const BG_TILE_MAP_SELECT = 0b0000_1000;
        /// 0 = BG/window tiles addressed signed from $9000, 1 = unsigned
        /// from $8000. Sprites always use the $8000 addressing mode.
        const BG_WINDOW_TILE_SELECT = 0b0001_0000;
        /// Window display enable. Overridden on DMG by a cleared
        /// `BG_WINDOW_PRIORITY`.
        const WINDOW_DISPLAY = 0b0010_0000;
        /// 0 = window uses tilemap $9800, 1 = $9C00.
        const WINDOW_MAP_SELECT = 0b0100_0000;
        /// LCD power. Clearing it grants immediate, unrestricted VRAM/OAM
        /// access and forces LY/mode/clock back to their power-on values.
        const LCD_DISPLAY = 0b1000_0000;
    }
}

bitflags! {
    /// FF41
    #[derive(Default)]
    pub struct LcdStatus: u8 {
        /// Mode flag low bit (read-only, set via `set_mode_flag`).
        const MODE_FLAG_0 = 0b0000_0001;
        /// Mode flag high bit.
        const MODE_FLAG_1 = 0b0000_0010;
        /// (0: LYC<>LY, 1: LYC=LY), read-only.
        const COINCIDENCE_FLAG = 0b0000_0100;
        /// Mode 0 (HBlank) STAT interrupt enable.
        const MODE_0_H_INTERRUPT = 0b0000_1000;
        /// Mode 1 (VBlank) STAT interrupt enable.
        const MODE_1_V_INTERRUPT = 0b0001_0000;
        /// Mode 2 (OAM search) STAT interrupt enable.
        const MODE_2_OAM_INTERRUPT = 0b0010_0000;
        /// LYC=LY coincidence STAT interrupt enable.
        const COINCIDENCE_INTERRUPT = 0b0100_0000;

        const UNUSED = 0b1000_0000;
    }
}

bitflags! {
    /// OAM attribute byte (sprite attribute 3).
    #[derive(Default)]
    pub struct AttributeFlags: u8 {
        /// CGB mode only: palette number 0-7.
        const PALETTE_NUMBER_CGB = 0b0000_0111;
        /// CGB mode only: tile VRAM bank (0 or 1).
        const TILE_VRAM_BANK = 0b0000_1000;
        /// Non-CGB mode only: 0 = OBP0, 1 = OBP1.
        const PALETTE_NUMBER = 0b0001_0000;
        const X_FLIP = 0b0010_0000;
        const Y_FLIP = 0b0100_0000;
        /// 0 = sprite above BG, 1 = sprite behind BG colors 1-3 (BG color 0
        /// is always behind the sprite).
        const OBJ_TO_BG_PRIORITY = 0b1000_0000;
    }
}

impl AttributeFlags {
    pub fn get_cgb_palette_number(&self) -> usize {
        (self.bits & 0x07) as usize
    }

    pub fn dmg_palette_number(&self) -> usize {
        if self.contains(AttributeFlags::PALETTE_NUMBER) {
            1
        } else {
            0
        }
    }
}

impl LcdStatus {
    pub fn mode_flag(&self) -> Mode {
        match self.bits & 0x3 {
            0 => Mode::HBlank,
            1 => Mode::VBlank,
            2 => Mode::OamSearch,
            3 => Mode::LcdTransfer,
            _ => unreachable!("mode flag is masked to 2 bits"),
        }
    }

    pub fn set_mode_flag(&mut self, value: Mode) {
        self.bits = (self.bits & 0xFC)
            | match value {
                Mode::HBlank => 0,
                Mode::VBlank => 1,
                Mode::OamSearch => 2,
                Mode::LcdTransfer => 3,
            }
    }
}
