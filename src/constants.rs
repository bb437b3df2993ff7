/// System-wide constants to avoid magic numbers

/// VGA text mode constants
pub mod vga {
    /// VGA text buffer physical address
    pub const BUFFER_ADDR: usize = 0xb8000;

    /// VGA text mode dimensions
    pub const BUFFER_HEIGHT: usize = 25;
    pub const BUFFER_WIDTH: usize = 80;
}

/// PS/2 keyboard controller constants
pub mod keyboard {
    /// PS/2 keyboard data port
    pub const DATA_PORT: u16 = 0x60;

    /// PS/2 controller status/command port
    pub const STATUS_COMMAND_PORT: u16 = 0x64;

    /// Status register bit flags
    pub const STATUS_OUTPUT_BUFFER_FULL: u8 = 0x01;
    pub const STATUS_INPUT_BUFFER_FULL: u8 = 0x02;

    /// Controller commands used by the A20 sequence
    pub const CMD_DISABLE_KEYBOARD: u8 = 0xAD;
    pub const CMD_ENABLE_KEYBOARD: u8 = 0xAE;
    pub const CMD_READ_OUTPUT_PORT: u8 = 0xD0;
    pub const CMD_WRITE_OUTPUT_PORT: u8 = 0xD1;

    /// Bit 1 of the controller output port gates the A20 address line
    pub const OUTPUT_PORT_A20_BIT: u8 = 0x02;

    /// Command to pulse the CPU reset line (reboot)
    pub const CMD_RESET_CPU: u8 = 0xFE;
}

/// Interrupt constants
pub mod interrupts {
    /// PIC command/data ports (master and slave)
    pub const PIC_1_COMMAND: u16 = 0x20;
    pub const PIC_1_DATA: u16 = 0x21;
    pub const PIC_2_COMMAND: u16 = 0xA0;
    pub const PIC_2_DATA: u16 = 0xA1;

    /// We remap PIC interrupts to start at 32 so hardware IRQs do not
    /// collide with CPU exception vectors 0-31
    pub const PIC_1_OFFSET: u8 = 32;
    pub const PIC_2_OFFSET: u8 = PIC_1_OFFSET + 8;

    /// PIC initialization command words
    pub const ICW1_INIT: u8 = 0x11;
    pub const ICW3_MASTER_CASCADE: u8 = 0x04;
    pub const ICW3_SLAVE_IDENTITY: u8 = 0x02;
    pub const ICW4_8086_MODE: u8 = 0x01;

    /// End-of-interrupt command
    pub const PIC_EOI: u8 = 0x20;

    /// Masks leaving only IRQ1 (keyboard) unmasked
    pub const MASK_KEYBOARD_ONLY_MASTER: u8 = 0xFD;
    pub const MASK_ALL_SLAVE: u8 = 0xFF;

    /// Keyboard IRQ line on the master PIC and its remapped vector
    pub const KEYBOARD_IRQ: u8 = 1;
    pub const KEYBOARD_VECTOR: u8 = PIC_1_OFFSET + KEYBOARD_IRQ;

    /// Unused port traditionally written to for an I/O delay
    pub const IO_WAIT_PORT: u16 = 0x80;
}

/// Segment selectors defined by the boot GDT
pub mod segments {
    /// Ring-0 flat code segment (GDT index 1)
    pub const KERNEL_CODE_SELECTOR: u16 = 0x08;
    /// Ring-0 flat data segment (GDT index 2)
    pub const KERNEL_DATA_SELECTOR: u16 = 0x10;
}

/// Kernel heap window (no free; bump allocation only)
pub mod heap {
    pub const HEAP_START: usize = 0x20_0000; // 2 MiB
    pub const HEAP_END: usize = 0x40_0000; // 4 MiB
}

/// Serial debug output
pub mod serial {
    /// COM1 base port
    pub const COM1: u16 = 0x3F8;
}
