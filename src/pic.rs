//! 8259 PIC pair: remap, mask policy, end-of-interrupt.
//!
//! The BIOS leaves the PICs delivering IRQs on vectors 8-15, on top of the
//! CPU exception range. Remapping moves the master to 32 and the slave to
//! 40. The initialization command words must be written in exactly this
//! order; the chips interpret data-port writes positionally after ICW1.

use crate::constants::interrupts::{
    ICW1_INIT, ICW3_MASTER_CASCADE, ICW3_SLAVE_IDENTITY, ICW4_8086_MODE, PIC_1_COMMAND,
    PIC_1_DATA, PIC_2_COMMAND, PIC_2_DATA, PIC_EOI,
};
use crate::port::{io_wait, PortBus};

pub struct ChainedPics {
    master_offset: u8,
    slave_offset: u8,
}

impl ChainedPics {
    pub const fn new(master_offset: u8, slave_offset: u8) -> Self {
        ChainedPics {
            master_offset,
            slave_offset,
        }
    }

    /// Run the four-word initialization sequence on both chips.
    ///
    /// Leaves the masks untouched; callers follow up with `set_masks`.
    pub fn remap(&self, bus: &mut dyn PortBus) {
        // ICW1: begin initialization, ICW4 follows
        bus.write(PIC_1_COMMAND, ICW1_INIT);
        io_wait(bus);
        bus.write(PIC_2_COMMAND, ICW1_INIT);
        io_wait(bus);

        // ICW2: vector offsets
        bus.write(PIC_1_DATA, self.master_offset);
        io_wait(bus);
        bus.write(PIC_2_DATA, self.slave_offset);
        io_wait(bus);

        // ICW3: cascade wiring (slave on master IRQ2)
        bus.write(PIC_1_DATA, ICW3_MASTER_CASCADE);
        io_wait(bus);
        bus.write(PIC_2_DATA, ICW3_SLAVE_IDENTITY);
        io_wait(bus);

        // ICW4: 8086/88 mode
        bus.write(PIC_1_DATA, ICW4_8086_MODE);
        io_wait(bus);
        bus.write(PIC_2_DATA, ICW4_8086_MODE);
        io_wait(bus);
    }

    /// Program the interrupt masks. A set bit disables the line.
    pub fn set_masks(&self, bus: &mut dyn PortBus, master: u8, slave: u8) {
        bus.write(PIC_1_DATA, master);
        bus.write(PIC_2_DATA, slave);
    }

    pub fn read_masks(&self, bus: &mut dyn PortBus) -> (u8, u8) {
        (bus.read(PIC_1_DATA), bus.read(PIC_2_DATA))
    }

    /// Acknowledge an IRQ. Lines 8-15 are routed through the slave, which
    /// needs its own EOI; the master always gets one because the cascade
    /// line is raised either way.
    pub fn end_of_interrupt(&self, bus: &mut dyn PortBus, irq: u8) {
        if irq >= 8 {
            bus.write(PIC_2_COMMAND, PIC_EOI);
        }
        bus.write(PIC_1_COMMAND, PIC_EOI);
    }
}
