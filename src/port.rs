use crate::constants::interrupts::IO_WAIT_PORT;

/// Byte-wide port I/O, abstracted so the controller sequencing logic
/// (A20 enable, PIC remap) can be driven against a scripted bus in tests.
pub trait PortBus {
    fn read(&mut self, port: u16) -> u8;
    fn write(&mut self, port: u16, value: u8);
}

/// The real thing: single `in`/`out` instructions.
pub struct Hardware;

impl PortBus for Hardware {
    fn read(&mut self, port: u16) -> u8 {
        let mut port = x86_64::instructions::port::Port::new(port);
        unsafe { port.read() }
    }

    fn write(&mut self, port: u16, value: u8) {
        let mut port = x86_64::instructions::port::Port::new(port);
        unsafe { port.write(value) }
    }
}

/// Delay long enough for an old PIC to latch the previous command.
/// Writing to the unused port 0x80 takes roughly one microsecond.
pub fn io_wait(bus: &mut dyn PortBus) {
    bus.write(IO_WAIT_PORT, 0);
}
