//! Tiles are always indexed using an 8-bit integer, but the addressing
//! method may differ.
//!
//! The "8000 method" uses $8000 as its base pointer with unsigned
//! addressing: tiles 0-127 come from block 0, 128-255 from block 1. The
//! "8800 method" uses $9000 as its base pointer with signed addressing:
//! tiles 0-127 come from block 2, 128-255 from block 1 (block 1 is shared by
//! both addressing methods).
//!
//! Sprites always use 8000 addressing; BG and window pick between the two
//! via LCDC bit 4.

use crate::model::GameBoyModel;
use crate::ppu::palette::{Palette, RGB};
use itertools::Itertools;

pub const TILE_BLOCK_0_START: u16 = 0x8000;
pub const TILE_BLOCK_1_START: u16 = 0x8800;
pub const TILE_BLOCK_2_START: u16 = 0x9000;

pub const TILE_COUNT: usize = 384;
pub const TILE_BYTES: usize = 16;
pub const TILE_AREA_START: u16 = 0x8000;
pub const TILE_AREA_END: u16 = 0x9800;

/// Bit 0 of every baked pixel: set when the source color index was 0. Used
/// for sprite transparency and (on CGB) for the BG/sprite priority rule.
pub const COL0_FLAG: u32 = 0b01;
/// Bit 1: set when the CGB background/window tile-map attribute demanded BG
/// priority over sprites for this pixel.
pub const BG_PRIORITY_FLAG: u32 = 0b10;

/// One decoded 8x8 tile: 64 pixels, each a baked `RGB888 << 8 | flags`
/// value ready to be written straight into the framebuffer.
pub type CachedTile = [u32; 64];

const BLANK_TILE: CachedTile = [0; 64];

/// Decodes the 8 color-index codes (0..=3, not yet palette-applied) making
/// up one 8-pixel tile row from its two VRAM bytes.
fn decode_row(low: u8, high: u8) -> [u8; 8] {
    let mut row = [0u8; 8];
    for (x, slot) in row.iter_mut().enumerate() {
        let bit = 7 - x;
        *slot = ((high >> bit) & 1) << 1 | ((low >> bit) & 1);
    }
    row
}

fn bake_dmg_tile(tile_bytes: &[u8], palette: &Palette) -> CachedTile {
    let mut tile = BLANK_TILE;
    for (row_idx, row_bytes) in tile_bytes.chunks_exact(2).enumerate() {
        let codes = decode_row(row_bytes[0], row_bytes[1]);
        for (x, &code) in codes.iter().enumerate() {
            let rgb = palette.colour(code);
            let flag = if code == 0 { COL0_FLAG } else { 0 };
            tile[row_idx * 8 + x] = rgb.to_packed() | flag;
        }
    }
    tile
}

fn bake_cgb_tile(tile_bytes: &[u8], get_color: impl Fn(usize) -> RGB) -> CachedTile {
    let mut tile = BLANK_TILE;
    for (row_idx, row_bytes) in tile_bytes.chunks_exact(2).enumerate() {
        let codes = decode_row(row_bytes[0], row_bytes[1]);
        for (x, &code) in codes.iter().enumerate() {
            let rgb = get_color(code as usize);
            let flag = if code == 0 { COL0_FLAG } else { 0 };
            tile[row_idx * 8 + x] = rgb.to_packed() | flag;
        }
    }
    tile
}

/// Per-model decoded tile storage, keyed by the same tagged-configuration
/// approach used by [`crate::ppu::Ppu`] itself: one type, a model branch
/// localised to cache layout and lookup.
pub enum TileCache {
    Dmg {
        bg_window: Box<[CachedTile; TILE_COUNT]>,
        sprite_obp0: Box<[CachedTile; TILE_COUNT]>,
        sprite_obp1: Box<[CachedTile; TILE_COUNT]>,
    },
    Cgb {
        /// `bg[bank][palette * TILE_COUNT + tile]`
        bg: [Vec<CachedTile>; 2],
        /// `sprite[bank][palette * TILE_COUNT + tile]`
        sprite: [Vec<CachedTile>; 2],
    },
}

impl TileCache {
    pub fn new(model: GameBoyModel) -> Self {
        match model {
            GameBoyModel::Dmg => TileCache::Dmg {
                bg_window: Box::new([BLANK_TILE; TILE_COUNT]),
                sprite_obp0: Box::new([BLANK_TILE; TILE_COUNT]),
                sprite_obp1: Box::new([BLANK_TILE; TILE_COUNT]),
            },
            GameBoyModel::Cgb => TileCache::Cgb {
                bg: [
                    vec![BLANK_TILE; 8 * TILE_COUNT],
                    vec![BLANK_TILE; 8 * TILE_COUNT],
                ],
                sprite: [
                    vec![BLANK_TILE; 8 * TILE_COUNT],
                    vec![BLANK_TILE; 8 * TILE_COUNT],
                ],
            },
        }
    }

    pub fn bg_window_tile(&self, tile: usize) -> &CachedTile {
        match self {
            TileCache::Dmg { bg_window, .. } => &bg_window[tile],
            TileCache::Cgb { .. } => panic!("DMG bg/window tile lookup used on a CGB cache"),
        }
    }

    pub fn sprite_tile(&self, palette_select: usize, tile: usize) -> &CachedTile {
        match self {
            TileCache::Dmg { sprite_obp0, sprite_obp1, .. } => {
                if palette_select == 0 {
                    &sprite_obp0[tile]
                } else {
                    &sprite_obp1[tile]
                }
            }
            TileCache::Cgb { .. } => panic!("DMG sprite tile lookup used on a CGB cache"),
        }
    }

    pub fn cgb_bg_tile(&self, bank: usize, palette: usize, tile: usize) -> &CachedTile {
        match self {
            TileCache::Cgb { bg, .. } => &bg[bank][palette * TILE_COUNT + tile],
            TileCache::Dmg { .. } => panic!("CGB bg tile lookup used on a DMG cache"),
        }
    }

    pub fn cgb_sprite_tile(&self, bank: usize, palette: usize, tile: usize) -> &CachedTile {
        match self {
            TileCache::Cgb { sprite, .. } => &sprite[bank][palette * TILE_COUNT + tile],
            TileCache::Dmg { .. } => panic!("CGB sprite tile lookup used on a DMG cache"),
        }
    }

    /// Rebuilds every dirty tile named in `dirty` (tile *index*, 0..384) for
    /// `bank`, reading its 16 bytes from `vram_bank`.
    ///
    /// For DMG, decodes once per palette kind (bg/window, OBP0, OBP1). For
    /// CGB, decodes once per row and fans the two color bits out across all
    /// 8 background and 8 sprite palettes in the same pass, rather than
    /// re-reading VRAM per palette.
    pub fn rebuild_dirty(
        &mut self,
        bank: usize,
        vram_bank: &[u8],
        dirty: &[usize],
        dmg_palettes: Option<(&Palette, &Palette, &Palette)>,
        cgb_colors: Option<(&dyn Fn(usize, usize) -> RGB, &dyn Fn(usize, usize) -> RGB)>,
    ) {
        match self {
            TileCache::Dmg { bg_window, sprite_obp0, sprite_obp1 } => {
                let (bgp, obp0, obp1) =
                    dmg_palettes.expect("DMG tile cache rebuild requires DMG palettes");
                for &tile in dirty {
                    let bytes = &vram_bank[tile * TILE_BYTES..tile * TILE_BYTES + TILE_BYTES];
                    bg_window[tile] = bake_dmg_tile(bytes, bgp);
                    sprite_obp0[tile] = bake_dmg_tile(bytes, obp0);
                    sprite_obp1[tile] = bake_dmg_tile(bytes, obp1);
                }
            }
            TileCache::Cgb { bg, sprite } => {
                let (bg_color, obj_color) =
                    cgb_colors.expect("CGB tile cache rebuild requires CGB palette lookups");
                for &tile in dirty {
                    let bytes = &vram_bank[tile * TILE_BYTES..tile * TILE_BYTES + TILE_BYTES];
                    for palette in 0..8 {
                        bg[bank][palette * TILE_COUNT + tile] =
                            bake_cgb_tile(bytes, |code| bg_color(palette, code));
                        sprite[bank][palette * TILE_COUNT + tile] =
                            bake_cgb_tile(bytes, |code| obj_color(palette, code));
                    }
                }
            }
        }
    }
}

/// Tracks tile base addresses whose VRAM bytes changed since the last
/// rebuild, plus a full-invalidate flag for palette changes and loads.
#[derive(Debug, Default, Clone)]
pub struct DirtySet {
    tiles: Vec<usize>,
    clearcache: bool,
}

impl DirtySet {
    pub fn mark_address(&mut self, address_in_vram: u16) {
        if address_in_vram < TILE_AREA_END - TILE_AREA_START {
            let tile = (address_in_vram / TILE_BYTES as u16) as usize;
            if !self.tiles.contains(&tile) {
                self.tiles.push(tile);
            }
        }
    }

    pub fn mark_all(&mut self) {
        self.clearcache = true;
    }

    /// Drains into the list of tile indices that should be rebuilt this
    /// pass: every tile if a full invalidation is pending, otherwise just
    /// the dirty ones. Always empties the set afterwards.
    pub fn drain(&mut self) -> Vec<usize> {
        let tiles = if std::mem::take(&mut self.clearcache) {
            (0..TILE_COUNT).collect_vec()
        } else {
            std::mem::take(&mut self.tiles)
        };
        self.tiles.clear();
        tiles
    }

    pub fn is_empty(&self) -> bool {
        !self.clearcache && self.tiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ppu::palette::DEFAULT_DISPLAY_COLOURS;

    #[test]
    fn decode_row_extracts_2bit_codes() {
        // low = 0b1111_0000, high = 0b1010_1010
        let codes = decode_row(0b1111_0000, 0b1010_1010);
        assert_eq!(codes, [2, 3, 2, 3, 2, 3, 2, 3]);
    }

    #[test]
    fn dmg_tile_bakes_col0_flag_for_color_zero() {
        let palette = Palette::new(0b1110_0100, DEFAULT_DISPLAY_COLOURS);
        let mut bytes = [0u8; 16];
        bytes[0] = 0x00;
        bytes[1] = 0x00; // entire row is color 0
        let tile = bake_dmg_tile(&bytes, &palette);
        for px in &tile[0..8] {
            assert_eq!(px & COL0_FLAG, COL0_FLAG);
        }
    }

    #[test]
    fn dirty_set_drains_only_marked_tiles_when_not_cleared() {
        let mut dirty = DirtySet::default();
        dirty.mark_address(16); // tile 1
        dirty.mark_address(32); // tile 2
        let drained = dirty.drain();
        assert_eq!(drained, vec![1, 2]);
        assert!(dirty.is_empty());
    }

    #[test]
    fn clearcache_forces_full_rebuild_list() {
        let mut dirty = DirtySet::default();
        dirty.mark_all();
        let drained = dirty.drain();
        assert_eq!(drained.len(), TILE_COUNT);
    }
}
