//! Per-scanline background/window/sprite compositor.
//!
//! Runs once per line, scheduled from [`crate::ppu::Ppu`]'s mode state
//! machine at HBlank entry, after the tile cache has been rebuilt for any
//! tiles the game wrote to since the previous scanline.

use crate::ppu::register_flags::{AttributeFlags, LcdControl};
use crate::ppu::tilecache::{BG_PRIORITY_FLAG, COL0_FLAG};
use crate::ppu::{Ppu, RESOLUTION_HEIGHT, RESOLUTION_WIDTH};
use itertools::Itertools;

/// Register values in effect while a scanline was rendered, kept around so
/// a frontend debugger can reconstruct exactly what produced a given line.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct ScanlineParams {
    pub scx: u8,
    pub scy: u8,
    pub wx: u8,
    pub wy: u8,
    pub tiledata_unsigned: bool,
}

impl Ppu {
    pub(crate) fn render_scanline(&mut self, y: u8) {
        self.scanline(y);
        if self.lcd_control.contains(LcdControl::SPRITE_DISPLAY_ENABLE) {
            self.scanline_sprites(y);
        }
    }

    fn scanline(&mut self, y: u8) {
        self.scanline_params[y as usize] = ScanlineParams {
            scx: self.scx,
            scy: self.scy,
            wx: self.wx,
            wy: self.wy,
            tiledata_unsigned: self.lcd_control.contains(LcdControl::BG_WINDOW_TILE_SELECT),
        };

        let row_base = y as usize * RESOLUTION_WIDTH;

        if self.model.is_dmg() && !self.lcd_control.contains(LcdControl::BG_WINDOW_PRIORITY) {
            let blank = self.display_colours.get_colour(0).to_packed() | COL0_FLAG;
            self.frame_buffer[row_base..row_base + RESOLUTION_WIDTH].fill(blank);
            return;
        }

        let bg_map_base: u16 = if self.lcd_control.contains(LcdControl::BG_TILE_MAP_SELECT) {
            0x1C00
        } else {
            0x1800
        };
        let window_map_base: u16 = if self.lcd_control.contains(LcdControl::WINDOW_MAP_SELECT) {
            0x1C00
        } else {
            0x1800
        };

        let window_enabled = self.lcd_control.contains(LcdControl::WINDOW_DISPLAY)
            && (self.model.is_cgb() || self.lcd_control.contains(LcdControl::BG_WINDOW_PRIORITY));
        let window_x = self.wx as i16 - 7;
        let window_visible_this_line =
            window_enabled && self.wy <= y && window_x < RESOLUTION_WIDTH as i16;

        if window_visible_this_line {
            self.ly_window += 1;
        }

        for x in 0..RESOLUTION_WIDTH {
            let in_window = window_visible_this_line && x as i16 >= window_x;

            let (map_base, tile_row, tile_col, row_in_tile, col_in_tile) = if in_window {
                let wy_line = self.ly_window as u16;
                let wx_col = (x as i16 - window_x) as u16;
                (window_map_base, wy_line / 8, wx_col / 8, (wy_line % 8) as u8, (wx_col % 8) as u8)
            } else {
                let yy = y.wrapping_add(self.scy) as u16;
                let xx = (x as u8).wrapping_add(self.scx) as u16;
                (bg_map_base, yy / 8, xx / 8, (yy % 8) as u8, (xx % 8) as u8)
            };

            let map_offset = (tile_row.wrapping_mul(32) % 0x400) + (tile_col % 32);
            let map_byte = self.vram[0][(map_base + map_offset) as usize];
            let tile_idx = self.resolve_bg_tile_index(map_byte);

            let pixel = if self.model.is_cgb() {
                let attr = self.bg_attribute_at(map_base + map_offset);
                let bank = attr.uses_bank_1() as usize;
                let palette = attr.bg_palette_numb() as usize;
                let hflip = attr.contains(crate::ppu::cgb_attr::CgbTileAttribute::X_FLIP);
                let vflip = attr.contains(crate::ppu::cgb_attr::CgbTileAttribute::Y_FLIP);
                let xx = if hflip { 7 - col_in_tile } else { col_in_tile };
                let yy = if vflip { 7 - row_in_tile } else { row_in_tile };
                let mut px = self.tile_cache.cgb_bg_tile(bank, palette, tile_idx)[yy as usize * 8 + xx as usize];
                if attr.contains(crate::ppu::cgb_attr::CgbTileAttribute::BG_TO_OAM_PRIORITY) {
                    px |= BG_PRIORITY_FLAG;
                }
                px
            } else {
                self.tile_cache.bg_window_tile(tile_idx)[row_in_tile as usize * 8 + col_in_tile as usize]
            };

            self.frame_buffer[row_base + x] = pixel;
        }

        if y == 143 {
            self.ly_window = -1;
        }
    }

    fn resolve_bg_tile_index(&self, map_byte: u8) -> usize {
        if self.lcd_control.contains(LcdControl::BG_WINDOW_TILE_SELECT) {
            map_byte as usize
        } else {
            ((map_byte ^ 0x80) as usize) + 128
        }
    }

    fn scanline_sprites(&mut self, ly: u8) {
        let tall = self.lcd_control.contains(LcdControl::SPRITE_SIZE);
        let height: u8 = if tall { 16 } else { 8 };
        let row_base = ly as usize * RESOLUTION_WIDTH;

        let selected = self
            .oam
            .iter()
            .enumerate()
            .filter(|(_, sprite)| crate::ppu::oam::is_sprite_on_scanline(sprite.y_pos, ly, height))
            .take(10)
            .collect_vec();

        let ordered: Vec<_> = if self.model.is_cgb() {
            selected
                .into_iter()
                .sorted_by_key(|(idx, _)| std::cmp::Reverse(*idx))
                .collect()
        } else {
            selected
                .into_iter()
                .sorted_by_key(|(idx, sprite)| (sprite.x_pos, *idx))
                .rev()
                .collect()
        };

        for (_oam_index, sprite) in ordered {
            let screen_x = sprite.screen_x();
            let screen_y = sprite.screen_y();
            let x_flip = sprite.attribute_flags.contains(AttributeFlags::X_FLIP);
            let y_flip = sprite.attribute_flags.contains(AttributeFlags::Y_FLIP);
            let behind_bg = sprite.attribute_flags.contains(AttributeFlags::OBJ_TO_BG_PRIORITY);

            let dy = (ly as i16 - screen_y) as u8;
            let yy = if y_flip { height - dy - 1 } else { dy };
            let tile_index = sprite.tile_number_for_height(tall) as usize
                + if tall && yy >= 8 { 1 } else { 0 };
            let yy_in_tile = yy % 8;

            let tile = if self.model.is_cgb() {
                let bank = sprite.attribute_flags.contains(AttributeFlags::TILE_VRAM_BANK) as usize;
                let palette = sprite.attribute_flags.get_cgb_palette_number();
                self.tile_cache.cgb_sprite_tile(bank, palette, tile_index)
            } else {
                let palette = sprite.attribute_flags.dmg_palette_number();
                self.tile_cache.sprite_tile(palette, tile_index)
            };

            for dx in 0..8u8 {
                let xx = if x_flip { 7 - dx } else { dx };
                let px = screen_x + dx as i16;
                if !(0..RESOLUTION_WIDTH as i16).contains(&px) {
                    continue;
                }
                let pixel = tile[yy_in_tile as usize * 8 + xx as usize];
                if pixel & COL0_FLAG != 0 {
                    continue; // transparent
                }

                let idx = row_base + px as usize;
                let bg = self.frame_buffer[idx];

                let sprite_wins = if self.model.is_cgb() {
                    let master_priority = self.lcd_control.contains(LcdControl::BG_WINDOW_PRIORITY);
                    if !master_priority {
                        true
                    } else {
                        let bg_priority = bg & BG_PRIORITY_FLAG != 0;
                        if bg_priority {
                            bg & COL0_FLAG != 0
                        } else if behind_bg {
                            bg & COL0_FLAG != 0
                        } else {
                            true
                        }
                    }
                } else if behind_bg {
                    bg & COL0_FLAG != 0
                } else {
                    true
                };

                if sprite_wins {
                    self.frame_buffer[idx] = pixel;
                }
            }
        }
    }
}

pub(crate) fn default_scanline_params() -> [ScanlineParams; RESOLUTION_HEIGHT] {
    [ScanlineParams::default(); RESOLUTION_HEIGHT]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scanline_params_default_to_zero() {
        let params = default_scanline_params();
        assert_eq!(params[0], ScanlineParams::default());
        assert_eq!(params.len(), RESOLUTION_HEIGHT);
    }
}
