use bitflags::bitflags;

bitflags! {
    /// The two interrupt sources this crate is responsible for raising.
    ///
    /// Timer, serial and joypad interrupts belong to other hardware modules
    /// and are not represented here; the bits line up with the full
    /// interrupt-flag register so the caller can OR this straight into it.
    #[derive(Default)]
    pub struct InterruptFlags: u8 {
        /// V-Blank, raised once LY reaches 144.
        const VBLANK = 0b0000_0001;
        /// LCD Stat, raised by any enabled STAT interrupt source (LYC match,
        /// or entry into a mode with its interrupt-enable bit set).
        const LCD    = 0b0000_0010;
    }
}

#[cfg(test)]
mod test {
    use super::InterruptFlags;

    #[test]
    fn bits_are_disjoint() {
        assert_eq!(InterruptFlags::VBLANK.bits() & InterruptFlags::LCD.bits(), 0);
    }

    #[test]
    fn empty_has_no_bits_set() {
        assert_eq!(InterruptFlags::empty().bits(), 0);
    }
}
