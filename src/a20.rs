//! A20 gate enablement through the PS/2 keyboard controller.
//!
//! Bit 1 of the controller's output port gates the A20 address line; until
//! it is set, physical addresses wrap at 1 MiB. The protocol is a strict
//! read-modify-write of that port with the keyboard held disabled so a
//! keystroke cannot clobber the data port mid-sequence.
//!
//! Every wait is an unbounded busy-poll on the status register. A
//! controller that never acks hangs the boot; there is no timeout and no
//! recovery path (accepted as a fatal hardware condition).

use crate::constants::keyboard::{
    CMD_DISABLE_KEYBOARD, CMD_ENABLE_KEYBOARD, CMD_READ_OUTPUT_PORT, CMD_WRITE_OUTPUT_PORT,
    DATA_PORT, OUTPUT_PORT_A20_BIT, STATUS_COMMAND_PORT, STATUS_INPUT_BUFFER_FULL,
    STATUS_OUTPUT_BUFFER_FULL,
};
use crate::port::PortBus;

/// Spin until the controller has consumed the last command/data byte.
fn wait_input_clear(bus: &mut dyn PortBus) {
    while bus.read(STATUS_COMMAND_PORT) & STATUS_INPUT_BUFFER_FULL != 0 {}
}

/// Spin until the controller has produced a byte for us to read.
fn wait_output_full(bus: &mut dyn PortBus) {
    while bus.read(STATUS_COMMAND_PORT) & STATUS_OUTPUT_BUFFER_FULL == 0 {}
}

/// Unlock memory above 1 MiB.
///
/// Sequence: disable keyboard, read the current output port, write it back
/// with the A20 bit set, re-enable the keyboard. All other output-port bits
/// are preserved.
pub fn enable(bus: &mut dyn PortBus) {
    wait_input_clear(bus);
    bus.write(STATUS_COMMAND_PORT, CMD_DISABLE_KEYBOARD);

    wait_input_clear(bus);
    bus.write(STATUS_COMMAND_PORT, CMD_READ_OUTPUT_PORT);

    wait_output_full(bus);
    let output_port = bus.read(DATA_PORT);

    wait_input_clear(bus);
    bus.write(STATUS_COMMAND_PORT, CMD_WRITE_OUTPUT_PORT);

    wait_input_clear(bus);
    bus.write(DATA_PORT, output_port | OUTPUT_PORT_A20_BIT);

    wait_input_clear(bus);
    bus.write(STATUS_COMMAND_PORT, CMD_ENABLE_KEYBOARD);

    wait_input_clear(bus);
}
