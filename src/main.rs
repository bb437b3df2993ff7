//! Bare-metal kernel entry. On a hosted target this collapses to a no-op
//! binary so `cargo test` can build and link the crate normally.

#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

#[cfg(target_os = "none")]
mod kernel {
    use core::panic::PanicInfo;
    use oxos::console::Dispatcher;
    use oxos::vga_buffer::{self, Color, ColorCode, VgaSink};
    use oxos::{allocator, interrupts, println, serial_println, shell};

    /// Protected-mode entry, reached through the boot stub's far jump with
    /// the segments flat and the stack already valid.
    #[no_mangle]
    pub extern "C" fn _start() -> ! {
        vga_buffer::clear_screen();

        vga_buffer::set_color(ColorCode::new(Color::LightGreen, Color::Black));
        println!("Welcome to oxos!");
        println!("================");
        vga_buffer::set_color(vga_buffer::DEFAULT_COLOR);
        println!();
        serial_println!("oxos: protected mode entered, kernel running");

        // IDT, PIC remap, keyboard unmask. `sti` waits until the boot
        // output below is done: the handler takes the WRITER and SHELL
        // locks, so a keystroke arriving while this function still holds
        // them would deadlock with interrupts off.
        interrupts::init();
        println!("Interrupt subsystem initialized.");
        serial_println!("oxos: interrupt subsystem up, keyboard vector wired");

        // The heap has no free; this early allocation is permanent on
        // purpose and proves the window is usable.
        match allocator::kmalloc(64) {
            Ok(ptr) => println!("Heap online ({:#x}).", ptr.as_ptr() as usize),
            Err(e) => panic!("heap unusable at boot: {}", e),
        }
        let stats = allocator::heap_stats();
        println!(
            "Memory: {} bytes available of {}.",
            stats.available(),
            stats.end - stats.start
        );

        println!();
        println!("Type 'help' for available commands.");
        shell::SHELL.lock().show_prompt(&mut VgaSink);

        // All locks released; keystrokes are safe to take from here on.
        interrupts::enable();
        serial_println!("oxos: interrupts enabled, waiting for input");

        // Idle until the next keystroke. The interrupt handler drives the
        // decoder and the shell; this loop never reads the line buffer.
        loop {
            x86_64::instructions::hlt();
        }
    }

    /// Paint the banner, mirror the message to serial, stop forever.
    /// There is no isolation to fall back on, so nothing is recoverable.
    #[panic_handler]
    fn panic(info: &PanicInfo) -> ! {
        vga_buffer::set_color(ColorCode::new(Color::White, Color::Red));
        println!();
        println!("KERNEL PANIC: {}", info);
        println!("System halted.");
        serial_println!("KERNEL PANIC: {}", info);

        x86_64::instructions::interrupts::disable();
        loop {
            x86_64::instructions::hlt();
        }
    }
}

#[cfg(not(target_os = "none"))]
fn main() {}
