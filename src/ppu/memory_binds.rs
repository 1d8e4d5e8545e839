//! Bus-facing read/write entry points. A host core wires its address
//! decoding for `0x8000..=0x9FFF`, `0xFE00..=0xFE9F` and the PPU registers
//! to these methods; everything below is oblivious to the rest of the bus.

use crate::ppu::cgb_attr::CgbTileAttribute;
use crate::ppu::oam::SpriteAttribute;
use crate::ppu::palette::Palette;
use crate::ppu::register_flags::{LcdControl, LcdStatus};
use crate::ppu::{tilecache, Mode, Ppu};

const VRAM_START: u16 = 0x8000;
const OAM_START: u16 = 0xFE00;

impl Ppu {
    pub fn read_vram(&self, address: u16) -> u8 {
        if !self.can_access_vram() {
            return 0xFF;
        }
        let bank = self.active_vram_bank as usize;
        self.vram[bank][(address - VRAM_START) as usize]
    }

    pub fn write_vram(&mut self, address: u16, value: u8) {
        if !self.can_access_vram() {
            return;
        }
        let bank = self.active_vram_bank as usize;
        let offset = address - VRAM_START;
        self.vram[bank][offset as usize] = value;
        if offset < tilecache::TILE_AREA_END - tilecache::TILE_AREA_START {
            self.dirty[bank].mark_address(offset);
        }
    }

    pub fn read_oam(&self, address: u16) -> u8 {
        if !self.can_access_oam() {
            return 0xFF;
        }
        let relative = (address - OAM_START) as usize;
        self.oam[relative / 4].to_bytes()[relative % 4]
    }

    pub fn write_oam(&mut self, address: u16, value: u8) {
        if !self.can_access_oam() {
            return;
        }
        let relative = (address - OAM_START) as usize;
        let mut bytes = self.oam[relative / 4].to_bytes();
        bytes[relative % 4] = value;
        self.oam[relative / 4] = SpriteAttribute::from_bytes(bytes);
    }

    /// Same VRAM read but bypassing the mode 3 lock, for a frontend
    /// debugger that wants to inspect tile data mid-scanline.
    pub fn read_vram_unlocked(&self, bank: usize, address: u16) -> u8 {
        self.vram[bank][(address - VRAM_START) as usize]
    }

    pub(crate) fn can_access_vram(&self) -> bool {
        !self.lcd_control.contains(LcdControl::LCD_DISPLAY)
            || self.lcd_status.mode_flag() != Mode::LcdTransfer
    }

    pub(crate) fn can_access_oam(&self) -> bool {
        !self.lcd_control.contains(LcdControl::LCD_DISPLAY)
            || !matches!(self.lcd_status.mode_flag(), Mode::OamSearch | Mode::LcdTransfer)
    }

    pub fn read_register(&self, address: u16) -> u8 {
        match address {
            super::LCD_CONTROL_REGISTER => self.lcd_control.bits(),
            super::LCD_STATUS_REGISTER => self.lcd_status.bits() | 0x80,
            super::SCY_REGISTER => self.scy,
            super::SCX_REGISTER => self.scx,
            super::LY_REGISTER => self.ly,
            super::LYC_REGISTER => self.lyc,
            super::BG_PALETTE_REGISTER => self.bgp.byte(),
            super::OBJECT_PALETTE_0_REGISTER => self.obp0.byte(),
            super::OBJECT_PALETTE_1_REGISTER => self.obp1.byte(),
            super::WY_REGISTER => self.wy,
            super::WX_REGISTER => self.wx,
            super::VRAM_BANK_REGISTER => 0xFE | self.active_vram_bank,
            super::CGB_BG_PALETTE_INDEX => self.cgb_bg_palette_index.read(),
            super::CGB_BG_PALETTE_DATA => self.cgb_bg_palette_mem.read(&self.cgb_bg_palette_index),
            super::CGB_OBJ_PALETTE_INDEX => self.cgb_obj_palette_index.read(),
            super::CGB_OBJ_PALETTE_DATA => self.cgb_obj_palette_mem.read(&self.cgb_obj_palette_index),
            _ => {
                log::error!("read of unknown PPU register {:#06x}", address);
                0xFF
            }
        }
    }

    pub fn write_register(&mut self, address: u16, value: u8) {
        match address {
            super::LCD_CONTROL_REGISTER => self.set_lcd_control(value),
            super::LCD_STATUS_REGISTER => self.set_lcd_status(value),
            super::SCY_REGISTER => self.scy = value,
            super::SCX_REGISTER => self.scx = value,
            super::LY_REGISTER => (), // read-only
            super::LYC_REGISTER => {
                self.lyc = value;
                self.update_ly_lyc();
            }
            super::BG_PALETTE_REGISTER => {
                if value != self.bgp.byte() {
                    self.bgp = Palette::new(value, self.display_colours);
                    self.dirty[0].mark_all();
                }
            }
            super::OBJECT_PALETTE_0_REGISTER => {
                if value != self.obp0.byte() {
                    self.obp0 = Palette::new(value, self.display_colours);
                    self.dirty[0].mark_all();
                }
            }
            super::OBJECT_PALETTE_1_REGISTER => {
                if value != self.obp1.byte() {
                    self.obp1 = Palette::new(value, self.display_colours);
                    self.dirty[0].mark_all();
                }
            }
            super::WY_REGISTER => self.wy = value,
            super::WX_REGISTER => self.wx = value,
            super::VRAM_BANK_REGISTER => {
                if self.model.is_cgb() {
                    self.active_vram_bank = value & 0x1;
                }
            }
            super::CGB_BG_PALETTE_INDEX => self.cgb_bg_palette_index.write(value),
            super::CGB_BG_PALETTE_DATA => {
                self.cgb_bg_palette_mem.write(&self.cgb_bg_palette_index, value);
                self.cgb_bg_palette_index.increment();
                self.dirty[0].mark_all();
                self.dirty[1].mark_all();
            }
            super::CGB_OBJ_PALETTE_INDEX => self.cgb_obj_palette_index.write(value),
            super::CGB_OBJ_PALETTE_DATA => {
                self.cgb_obj_palette_mem.write(&self.cgb_obj_palette_index, value);
                self.cgb_obj_palette_index.increment();
                self.dirty[0].mark_all();
                self.dirty[1].mark_all();
            }
            _ => log::error!("write of unknown PPU register {:#06x} <- {:#04x}", address, value),
        }
    }

    /// Reads a CGB background tile-map attribute byte straight from bank 1,
    /// interpreting the raw byte rather than storing a parallel typed copy.
    pub(crate) fn bg_attribute_at(&self, map_offset: u16) -> CgbTileAttribute {
        CgbTileAttribute::from_bits_truncate(self.vram[1][map_offset as usize])
    }

    fn set_lcd_control(&mut self, value: u8) {
        let was_on = self.lcd_control.contains(LcdControl::LCD_DISPLAY);
        self.lcd_control = LcdControl::from_bits_truncate(value);
        let now_on = self.lcd_control.contains(LcdControl::LCD_DISPLAY);

        if was_on && !now_on {
            self.turn_off_lcd();
        } else if !was_on && now_on {
            self.turn_on_lcd();
        }
    }

    /// Resets LY, the window line counter and the mode timer to their
    /// power-on values, per the invariant that a disabled LCD always comes
    /// back up at the start of a fresh frame.
    fn turn_off_lcd(&mut self) {
        self.ly = 0;
        self.ly_window = -1;
        self.lcd_status.set_mode_flag(Mode::HBlank);
        self.stat_irq_triggered = false;
        self.clock = 0;
        self.clock_target = 0;
        self.next_stat_mode = Mode::OamSearch;
        self.disabled_clock = 0;
        self.update_ly_lyc();
    }

    fn turn_on_lcd(&mut self) {
        self.clock = 0;
        self.clock_target = 0;
        self.next_stat_mode = Mode::OamSearch;
        self.update_ly_lyc();
    }

    fn set_lcd_status(&mut self, value: u8) {
        let writable = value & 0x78;
        let readonly = self.lcd_status.bits() & 0x07;
        self.lcd_status = LcdStatus::from_bits_truncate(writable | readonly);
        self.refresh_stat_interrupt();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GameBoyModel;
    use crate::ppu::palette::DEFAULT_DISPLAY_COLOURS;

    fn new_ppu() -> Ppu {
        Ppu::new(GameBoyModel::Dmg, DEFAULT_DISPLAY_COLOURS)
    }

    #[test]
    fn vram_write_in_hblank_marks_tile_dirty() {
        let mut ppu = new_ppu();
        assert!(ppu.can_access_vram());
        ppu.write_vram(0x8000, 0xFF);
        assert_eq!(ppu.read_vram(0x8000), 0xFF);
        assert!(!ppu.dirty[0].is_empty());
    }

    #[test]
    fn vram_locked_during_lcd_transfer_reads_as_ff() {
        let mut ppu = new_ppu();
        ppu.lcd_status.set_mode_flag(Mode::LcdTransfer);
        assert!(!ppu.can_access_vram());
        assert_eq!(ppu.read_vram(0x8000), 0xFF);
    }

    #[test]
    fn lcd_status_write_preserves_read_only_bits() {
        let mut ppu = new_ppu();
        ppu.lcd_status.set_mode_flag(Mode::VBlank);
        ppu.write_register(super::super::LCD_STATUS_REGISTER, 0x78);
        assert_eq!(ppu.lcd_status.mode_flag(), Mode::VBlank);
        assert!(ppu.lcd_status.contains(LcdStatus::MODE_0_H_INTERRUPT));
    }

    #[test]
    fn lyc_write_updates_coincidence_flag() {
        let mut ppu = new_ppu();
        ppu.ly = 5;
        ppu.write_register(super::super::LYC_REGISTER, 5);
        assert!(ppu.lcd_status.contains(LcdStatus::COINCIDENCE_FLAG));
    }

    #[test]
    fn turning_lcd_off_resets_ly_and_mode() {
        let mut ppu = new_ppu();
        ppu.ly = 80;
        ppu.write_register(super::super::LCD_CONTROL_REGISTER, 0x00);
        assert_eq!(ppu.ly, 0);
        assert_eq!(ppu.lcd_status.mode_flag(), Mode::HBlank);
    }

    #[test]
    fn bg_palette_write_forces_full_cache_invalidate() {
        let mut ppu = new_ppu();
        ppu.write_register(super::super::BG_PALETTE_REGISTER, 0b00_01_10_11);
        assert!(!ppu.dirty[0].is_empty());
    }

    #[test]
    fn bg_palette_write_with_unchanged_value_is_a_no_op() {
        let mut ppu = new_ppu();
        let unchanged = ppu.bgp.byte();
        ppu.dirty[0].drain();
        ppu.write_register(super::super::BG_PALETTE_REGISTER, unchanged);
        assert!(ppu.dirty[0].is_empty());
    }
}
