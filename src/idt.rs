//! Raw interrupt descriptor table.
//!
//! Gates are the 8-byte protected-mode layout: handler offset split into
//! 16-bit halves around the selector and attribute bytes. Unused gates stay
//! all-zero (absent) so a stray vector faults predictably instead of
//! jumping into garbage.

/// One interrupt gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C, packed)]
pub struct IdtEntry {
    offset_low: u16,
    selector: u16,
    /// Always zero in this layout
    zero: u8,
    type_attr: u8,
    offset_high: u16,
}

impl IdtEntry {
    pub const fn absent() -> Self {
        IdtEntry {
            offset_low: 0,
            selector: 0,
            zero: 0,
            type_attr: 0,
            offset_high: 0,
        }
    }

    pub const fn new(handler: u32, selector: u16, type_attr: u8) -> Self {
        IdtEntry {
            offset_low: (handler & 0xFFFF) as u16,
            selector,
            zero: 0,
            type_attr,
            offset_high: ((handler >> 16) & 0xFFFF) as u16,
        }
    }

    pub const fn is_present(&self) -> bool {
        self.type_attr & 0x80 != 0
    }

    pub fn handler(&self) -> u32 {
        (self.offset_high as u32) << 16 | self.offset_low as u32
    }
}

/// Present, ring 0, 32-bit interrupt gate.
pub const GATE_INTERRUPT: u8 = 0x8E;

pub const IDT_SIZE: usize = 256;

/// Value loaded by `lidt`.
#[derive(Debug, Clone, Copy)]
#[repr(C, packed)]
pub struct IdtPointer {
    pub limit: u16,
    pub base: u32,
}

#[repr(C, align(8))]
pub struct Idt {
    entries: [IdtEntry; IDT_SIZE],
}

impl Idt {
    /// All 256 gates absent.
    pub const fn new() -> Self {
        Idt {
            entries: [IdtEntry::absent(); IDT_SIZE],
        }
    }

    pub fn set_gate(&mut self, vector: u8, handler: u32, selector: u16, type_attr: u8) {
        self.entries[vector as usize] = IdtEntry::new(handler, selector, type_attr);
    }

    pub fn entry(&self, vector: u8) -> &IdtEntry {
        &self.entries[vector as usize]
    }

    pub fn pointer(&self) -> IdtPointer {
        IdtPointer {
            limit: (core::mem::size_of::<[IdtEntry; IDT_SIZE]>() - 1) as u16,
            base: self as *const Idt as usize as u32,
        }
    }

    /// Load the interrupt descriptor table register.
    ///
    /// Must happen before any gate can fire; the caller (interrupts::init)
    /// sequences this before unmasking and `sti`.
    #[cfg(target_os = "none")]
    pub unsafe fn load(&'static self) {
        let pointer = self.pointer();
        core::arch::asm!("lidt [{}]", in(reg) &pointer, options(readonly, nostack, preserves_flags));
    }
}

impl Default for Idt {
    fn default() -> Self {
        Idt::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::interrupts::KEYBOARD_VECTOR;
    use crate::constants::segments::KERNEL_CODE_SELECTOR;

    #[test]
    fn fresh_table_has_no_present_gates() {
        let idt = Idt::new();
        for vector in 0..=255u8 {
            assert!(!idt.entry(vector).is_present(), "vector {vector} present");
        }
    }

    #[test]
    fn only_installed_vector_is_present() {
        let mut idt = Idt::new();
        idt.set_gate(KEYBOARD_VECTOR, 0x0010_2030, KERNEL_CODE_SELECTOR, GATE_INTERRUPT);
        for vector in 0..=255u8 {
            if vector == KEYBOARD_VECTOR {
                assert!(idt.entry(vector).is_present());
            } else {
                assert_eq!(*idt.entry(vector), IdtEntry::absent(), "vector {vector}");
            }
        }
    }

    #[test]
    fn offset_splits_into_halves() {
        let gate = IdtEntry::new(0xDEAD_BEEF, KERNEL_CODE_SELECTOR, GATE_INTERRUPT);
        assert_eq!({ gate.offset_low }, 0xBEEF);
        assert_eq!({ gate.offset_high }, 0xDEAD);
        assert_eq!(gate.handler(), 0xDEAD_BEEF);
    }

    #[test]
    fn gate_type_is_ring0_interrupt_gate() {
        let gate = IdtEntry::new(0x1000, KERNEL_CODE_SELECTOR, GATE_INTERRUPT);
        assert!(gate.is_present());
        // DPL 0, type 0xE
        assert_eq!({ gate.type_attr } & 0x60, 0);
        assert_eq!({ gate.type_attr } & 0x0F, 0x0E);
    }

    #[test]
    fn pointer_limit_covers_all_gates() {
        let idt = Idt::new();
        assert_eq!({ idt.pointer().limit }, (256 * 8 - 1) as u16);
    }
}
