//! Boot GDT: flat ring-0 code and data segments for protected mode.
//!
//! The layout is the classic three-descriptor table: a mandatory all-zero
//! null descriptor at index 0, then 4 GiB flat code and data segments. The
//! selectors (0x08, 0x10) are byte offsets into this table and are part of
//! the protected-mode jump and segment reload contract.

/// One 8-byte segment descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C, packed)]
pub struct GdtEntry {
    limit_low: u16,
    base_low: u16,
    base_mid: u8,
    access: u8,
    /// Flags in the high nibble, limit bits 16-19 in the low nibble
    granularity: u8,
    base_high: u8,
}

impl GdtEntry {
    /// The null descriptor. The CPU rejects loads through index 0, so it
    /// must stay all-zero.
    pub const fn null() -> Self {
        GdtEntry {
            limit_low: 0,
            base_low: 0,
            base_mid: 0,
            access: 0,
            granularity: 0,
            base_high: 0,
        }
    }

    /// Encode a descriptor. `limit` is the 20-bit segment limit, `flags`
    /// the high nibble of the granularity byte (granularity/size bits).
    pub const fn new(base: u32, limit: u32, access: u8, flags: u8) -> Self {
        GdtEntry {
            limit_low: (limit & 0xFFFF) as u16,
            base_low: (base & 0xFFFF) as u16,
            base_mid: ((base >> 16) & 0xFF) as u8,
            access,
            granularity: (((limit >> 16) & 0x0F) as u8) | (flags & 0xF0),
            base_high: ((base >> 24) & 0xFF) as u8,
        }
    }

    pub const fn is_present(&self) -> bool {
        self.access & 0x80 != 0
    }

    pub const fn is_null(&self) -> bool {
        self.limit_low == 0
            && self.base_low == 0
            && self.base_mid == 0
            && self.access == 0
            && self.granularity == 0
            && self.base_high == 0
    }
}

/// Access bytes: present, ring 0, code (executable/readable) or data
/// (writable). Without the present bit the CPU faults on segment load.
pub const ACCESS_KERNEL_CODE: u8 = 0x9A;
pub const ACCESS_KERNEL_DATA: u8 = 0x92;

/// Flags nibble: 4 KiB granularity + 32-bit operand size.
pub const FLAGS_4K_32BIT: u8 = 0xC0;

/// Value loaded by `lgdt`: size in bytes minus one, then the linear base.
#[derive(Debug, Clone, Copy)]
#[repr(C, packed)]
pub struct GdtPointer {
    pub limit: u16,
    pub base: u32,
}

#[repr(C, align(8))]
pub struct Gdt {
    entries: [GdtEntry; 3],
}

impl Gdt {
    pub const fn new() -> Self {
        Gdt {
            entries: [
                GdtEntry::null(),
                GdtEntry::new(0, 0xFFFFF, ACCESS_KERNEL_CODE, FLAGS_4K_32BIT),
                GdtEntry::new(0, 0xFFFFF, ACCESS_KERNEL_DATA, FLAGS_4K_32BIT),
            ],
        }
    }

    pub fn entries(&self) -> &[GdtEntry; 3] {
        &self.entries
    }

    pub fn pointer(&self) -> GdtPointer {
        GdtPointer {
            limit: (core::mem::size_of::<[GdtEntry; 3]>() - 1) as u16,
            base: self as *const Gdt as usize as u32,
        }
    }

    /// Load the descriptor table register.
    ///
    /// The table must live for the rest of the boot (it is only ever a
    /// static), and the selectors above must match its layout.
    #[cfg(target_os = "none")]
    pub unsafe fn load(&'static self) {
        let pointer = self.pointer();
        core::arch::asm!("lgdt [{}]", in(reg) &pointer, options(readonly, nostack, preserves_flags));
    }
}

/// The one table used for the real-to-protected transition.
pub static BOOT_GDT: Gdt = Gdt::new();
