//! Interrupt subsystem: IDT construction, PIC bring-up, keyboard IRQ.
//!
//! `init` must complete before interrupts are enabled; the order inside it
//! is load-bearing. An interrupt that fires into an unloaded or
//! half-initialized table does not produce a diagnostic, it produces a
//! triple fault.

use crate::constants::interrupts::{KEYBOARD_IRQ, KEYBOARD_VECTOR, PIC_1_OFFSET, PIC_2_OFFSET};
use crate::constants::keyboard::DATA_PORT;
use crate::constants::segments::KERNEL_CODE_SELECTOR;
use crate::idt::{Idt, GATE_INTERRUPT};
use crate::keyboard::INPUT;
use crate::pic::ChainedPics;
use crate::port::{Hardware, PortBus};
use crate::shell::SHELL;
use crate::vga_buffer::VgaSink;
use spin::Mutex;

/// Programmable Interrupt Controller pair
pub static PICS: Mutex<ChainedPics> =
    Mutex::new(ChainedPics::new(PIC_1_OFFSET, PIC_2_OFFSET));

/// The kernel's interrupt table. Lives in a static so the address handed
/// to `lidt` stays valid forever.
static IDT: Mutex<Idt> = Mutex::new(Idt::new());

/// Build the table: 256 absent gates, then exactly one live interrupt
/// gate for the remapped keyboard IRQ. Split out from `init` so the
/// resulting table can be inspected without loading it.
pub fn keyboard_idt(handler: u32) -> Idt {
    let mut idt = Idt::new();
    idt.set_gate(KEYBOARD_VECTOR, handler, KERNEL_CODE_SELECTOR, GATE_INTERRUPT);
    idt
}

/// Bring up interrupt-driven keyboard input.
///
/// Hard ordering contract (each step is a precondition for the next):
/// gates installed, `lidt`, PIC remap, mask policy. Deliberately does NOT
/// `sti`: the boot path keeps printing through the locked VGA writer after
/// this returns, and a keystroke delivered into the handler while that
/// lock is held would spin forever with interrupts off. The caller issues
/// `enable` once nothing it still holds is needed by the handler.
#[cfg(target_os = "none")]
pub fn init() {
    use crate::constants::interrupts::{MASK_ALL_SLAVE, MASK_KEYBOARD_ONLY_MASTER};

    extern "C" {
        fn keyboard_interrupt_trampoline();
    }

    let mut bus = Hardware;

    // 1-2. Zeroed table with the single keyboard gate
    let mut idt = IDT.lock();
    *idt = keyboard_idt(keyboard_interrupt_trampoline as usize as u32);

    // 3. Point the CPU at it before any vector can fire
    unsafe {
        // The Mutex is static, so the table address is 'static too.
        let table: &'static Idt = &*(&*idt as *const Idt);
        table.load();
    }
    drop(idt);

    // 4. Move hardware IRQs off the exception vectors
    let pics = PICS.lock();
    pics.remap(&mut bus);

    // 5. Everything masked except the keyboard line. The vector is now
    //    fully wired but stays dormant until `enable`.
    pics.set_masks(&mut bus, MASK_KEYBOARD_ONLY_MASTER, MASK_ALL_SLAVE);
}

/// `sti`. Callable only after `init`, and only from a context that holds
/// none of the locks the keyboard handler takes (WRITER, SHELL, INPUT).
#[cfg(target_os = "none")]
pub fn enable() {
    x86_64::instructions::interrupts::enable();
}

/// Low-level keyboard entry point. Context preservation only; everything
/// with semantics lives in `keyboard_irq_entry`. The CPU has already
/// disabled interrupts on the way through the gate, and `iretd` restores
/// that state, so the handler body never runs re-entered.
#[cfg(target_os = "none")]
core::arch::global_asm!(
    r#"
    .code32
    .global keyboard_interrupt_trampoline
keyboard_interrupt_trampoline:
    pushad
    cld
    call keyboard_irq_entry
    popad
    iretd
    .code64
    "#
);

/// Service one keyboard IRQ: read the scancode, run it through the
/// decoder/dispatcher chain, acknowledge the PIC. Nothing here blocks;
/// further keyboard interrupts stay inhibited until `iretd`.
#[no_mangle]
extern "C" fn keyboard_irq_entry() {
    let mut bus = Hardware;
    let scancode = bus.read(DATA_PORT);

    let mut sink = VgaSink;
    let mut shell = SHELL.lock();
    INPUT
        .lock()
        .handle_scancode(scancode, &mut sink, &mut *shell);
    drop(shell);

    PICS.lock().end_of_interrupt(&mut bus, KEYBOARD_IRQ);
}
