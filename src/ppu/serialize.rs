//! Save-state encoding. A fixed, hand-written byte order rather than a
//! generic derive: the format is a stable on-disk contract, and the field
//! order here must stay independent of however the struct gets reordered
//! for other reasons.
//!
//! The order of the fields shared with the original implementation (VRAM0,
//! OAM, the LCD registers, the CGB-conditional block, then the renderer's
//! per-scanline parameter log and framebuffer) is fixed and must not change.
//! Everything after that — the mode timer and scheduling fields this crate
//! needs to resume mid-frame that the original didn't track separately — is
//! appended as a trailing section specific to this implementation.

use crate::error::LoadStateError;
use crate::model::GameBoyModel;
use crate::ppu::oam::{SpriteAttribute, OAM_ENTRIES};
use crate::ppu::palette::{CgbPaletteIndex, CgbPaletteMemory, Palette};
use crate::ppu::register_flags::{LcdControl, LcdStatus};
use crate::ppu::renderer::{self, ScanlineParams};
use crate::ppu::{Mode, Ppu, FRAMEBUFFER_SIZE, VRAM_BANK_SIZE};

fn mode_tag(mode: Mode) -> u8 {
    match mode {
        Mode::HBlank => 0,
        Mode::VBlank => 1,
        Mode::OamSearch => 2,
        Mode::LcdTransfer => 3,
    }
}

fn mode_from_tag(tag: u8) -> Mode {
    match tag {
        0 => Mode::HBlank,
        1 => Mode::VBlank,
        2 => Mode::OamSearch,
        3 => Mode::LcdTransfer,
        _ => {
            log::error!("save state carries unknown STAT mode tag {}, defaulting to LcdTransfer", tag);
            Mode::LcdTransfer
        }
    }
}

fn push_palette_index(out: &mut Vec<u8>, index: &CgbPaletteIndex) {
    out.push(index.raw_value());
    out.push(index.auto_increment() as u8);
    out.push(index.word_index() as u8);
    out.push(index.high_byte() as u8);
}

fn read_palette_index(cursor: &mut Cursor<'_>) -> CgbPaletteIndex {
    let raw = cursor.u8();
    let _auto_increment = cursor.u8();
    let _word_index = cursor.u8();
    let _high_byte = cursor.u8();
    let mut index = CgbPaletteIndex::default();
    index.load_raw_value(raw);
    index
}

impl Ppu {
    /// Serialises this PPU's state in the order: VRAM bank 0, OAM, LCDC,
    /// BGP, OBP0, OBP1, STAT, LY, LYC, SCY, SCX, WY, WX, a CGB-model flag
    /// and the double-speed flag; then, only when the model is CGB, VRAM
    /// bank 1, the active bank select, and the BCPS/BCPD/OCPS/OCPD palette
    /// registers; then the renderer's per-scanline parameter log and the
    /// full framebuffer; then this crate's own mode-timer bookkeeping.
    pub fn save_state(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(32 * 1024);

        out.extend_from_slice(&self.vram[0]);
        for sprite in &self.oam {
            out.extend_from_slice(&sprite.to_bytes());
        }

        out.push(self.lcd_control.bits());
        out.push(self.bgp.byte());
        out.push(self.obp0.byte());
        out.push(self.obp1.byte());
        out.push(self.lcd_status.bits());
        out.push(self.ly);
        out.push(self.lyc);
        out.push(self.scy);
        out.push(self.scx);
        out.push(self.wy);
        out.push(self.wx);
        out.push(self.model.is_cgb() as u8);
        out.push(self.double_speed as u8);

        if self.model.is_cgb() {
            out.extend_from_slice(&self.vram[1]);
            out.push(self.active_vram_bank);
            push_palette_index(&mut out, &self.cgb_bg_palette_index);
            out.extend_from_slice(self.cgb_bg_palette_mem.raw_bytes());
            push_palette_index(&mut out, &self.cgb_obj_palette_index);
            out.extend_from_slice(self.cgb_obj_palette_mem.raw_bytes());
        }

        for params in self.scanline_params.iter() {
            out.push(params.scx);
            out.push(params.scy);
            out.push(params.wx);
            out.push(params.wy);
            out.push(params.tiledata_unsigned as u8);
        }
        for &pixel in self.frame_buffer.iter() {
            out.extend_from_slice(&pixel.to_le_bytes());
        }

        out.extend_from_slice(&self.ly_window.to_le_bytes());
        out.extend_from_slice(&self.clock.to_le_bytes());
        out.extend_from_slice(&self.clock_target.to_le_bytes());
        out.push(mode_tag(self.next_stat_mode));
        out.extend_from_slice(&self.disabled_clock.to_le_bytes());
        out.push(self.frame_done as u8);

        out
    }

    /// Restores state saved by [`Ppu::save_state`]. The model flag sits
    /// partway through the shared field order (matching the original's own
    /// layout), so the whole shared prefix is parsed into locals first and
    /// only committed once the model is confirmed to match: a mismatched
    /// load is rejected cleanly rather than leaving this PPU half-mutated.
    pub fn load_state(&mut self, data: &[u8]) -> Result<(), LoadStateError> {
        let mut cursor = Cursor::new(data);

        let mut vram0 = [0u8; VRAM_BANK_SIZE];
        vram0.copy_from_slice(cursor.take(VRAM_BANK_SIZE));

        let mut oam = [SpriteAttribute::default(); OAM_ENTRIES];
        for sprite in oam.iter_mut() {
            let bytes = cursor.take(4);
            *sprite = SpriteAttribute::from_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        }

        let lcdc = cursor.u8();
        let bgp = cursor.u8();
        let obp0 = cursor.u8();
        let obp1 = cursor.u8();
        let stat = cursor.u8();
        let ly = cursor.u8();
        let lyc = cursor.u8();
        let scy = cursor.u8();
        let scx = cursor.u8();
        let wy = cursor.u8();
        let wx = cursor.u8();
        let found_cgb = cursor.u8() != 0;
        let double_speed = cursor.u8() != 0;

        let found = if found_cgb { GameBoyModel::Cgb } else { GameBoyModel::Dmg };
        if found != self.model {
            return Err(LoadStateError::ModelMismatch { expected: self.model, found });
        }

        let mut vram1 = [0u8; VRAM_BANK_SIZE];
        let mut active_vram_bank = 0u8;
        let mut bg_index = CgbPaletteIndex::default();
        let mut bg_mem = CgbPaletteMemory::default();
        let mut obj_index = CgbPaletteIndex::default();
        let mut obj_mem = CgbPaletteMemory::default();

        if self.model.is_cgb() {
            vram1.copy_from_slice(cursor.take(VRAM_BANK_SIZE));
            active_vram_bank = cursor.u8();
            bg_index = read_palette_index(&mut cursor);
            bg_mem.load_raw_bytes(cursor.take(64));
            obj_index = read_palette_index(&mut cursor);
            obj_mem.load_raw_bytes(cursor.take(64));
        }

        let mut scanline_params = renderer::default_scanline_params();
        for params in scanline_params.iter_mut() {
            *params = ScanlineParams {
                scx: cursor.u8(),
                scy: cursor.u8(),
                wx: cursor.u8(),
                wy: cursor.u8(),
                tiledata_unsigned: cursor.u8() != 0,
            };
        }

        let mut frame_buffer = Box::new([0u32; FRAMEBUFFER_SIZE]);
        for pixel in frame_buffer.iter_mut() {
            *pixel = cursor.u32();
        }

        let ly_window = cursor.i16();
        let clock = cursor.u32();
        let clock_target = cursor.u32();
        let next_stat_mode = mode_from_tag(cursor.u8());
        let disabled_clock = cursor.u32();
        let frame_done = cursor.u8() != 0;

        self.vram[0] = vram0;
        self.oam = oam;
        self.lcd_control = LcdControl::from_bits_truncate(lcdc);
        self.bgp = Palette::new(bgp, self.display_colours);
        self.obp0 = Palette::new(obp0, self.display_colours);
        self.obp1 = Palette::new(obp1, self.display_colours);
        self.lcd_status = LcdStatus::from_bits_truncate(stat);
        self.ly = ly;
        self.lyc = lyc;
        self.scy = scy;
        self.scx = scx;
        self.wy = wy;
        self.wx = wx;
        self.double_speed = double_speed;

        if self.model.is_cgb() {
            self.vram[1] = vram1;
            self.active_vram_bank = active_vram_bank;
            self.cgb_bg_palette_index = bg_index;
            self.cgb_bg_palette_mem = bg_mem;
            self.cgb_obj_palette_index = obj_index;
            self.cgb_obj_palette_mem = obj_mem;
        }

        self.scanline_params = Box::new(scanline_params);
        self.frame_buffer = frame_buffer;

        self.ly_window = ly_window;
        self.clock = clock;
        self.clock_target = clock_target;
        self.next_stat_mode = next_stat_mode;
        self.disabled_clock = disabled_clock;
        self.frame_done = frame_done;

        self.dirty[0].mark_all();
        self.dirty[1].mark_all();
        self.update_cache();

        Ok(())
    }
}

/// Tiny read cursor over a save-state byte slice. Panics on truncated
/// input: a corrupt or foreign save state is a loud bug, not something to
/// paper over with a default value.
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Cursor { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> &'a [u8] {
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        slice
    }

    fn u8(&mut self) -> u8 {
        self.take(1)[0]
    }

    fn u32(&mut self) -> u32 {
        let bytes = self.take(4);
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    fn i16(&mut self) -> i16 {
        let bytes = self.take(2);
        i16::from_le_bytes([bytes[0], bytes[1]])
    }
}
