/// Which Game Boy variant the PPU is emulating.
///
/// Carried as a tag on the PPU rather than split into two types: the CGB
/// branches are localised to palette lookup, sprite-priority ordering and
/// attribute-byte handling, so a single renderer checking `self.model` reads
/// better than a parallel DMG/CGB type hierarchy.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameBoyModel {
    Dmg,
    Cgb,
}

impl GameBoyModel {
    pub fn is_dmg(self) -> bool {
        self == GameBoyModel::Dmg
    }

    pub fn is_cgb(self) -> bool {
        self == GameBoyModel::Cgb
    }
}

impl Default for GameBoyModel {
    fn default() -> Self {
        GameBoyModel::Dmg
    }
}
