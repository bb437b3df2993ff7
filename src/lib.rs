//! oxos - a minimal x86 boot-to-shell kernel.
//!
//! Everything with logic lives here so the host toolchain can run the test
//! suite; `main.rs` is only the bare-metal entry point. Data flows
//! boot stub -> protected mode -> kernel entry -> IDT/PIC init -> keyboard
//! IRQ -> decoder -> line buffer -> shell -> VGA.

#![cfg_attr(not(test), no_std)]

pub mod a20;
pub mod allocator;
pub mod boot;
pub mod console;
pub mod constants;
pub mod gdt;
pub mod idt;
pub mod interrupts;
pub mod keyboard;
pub mod pic;
pub mod port;
pub mod serial;
pub mod shell;
pub mod vga_buffer;
