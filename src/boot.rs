//! Real-mode to protected-mode transition.
//!
//! This is the stage the boot sector jumps into after the kernel image has
//! been read off disk and the welcome banner printed through the BIOS. The
//! sequence is rigid; every step is a precondition for the one after it:
//!
//! 1. `cli` — a real-mode interrupt firing mid-transition would vector
//!    through a table that is about to stop existing.
//! 2. Enable the A20 line, or addresses above 1 MiB silently wrap.
//! 3. `lgdt` with the flat boot GDT.
//! 4. Set the protection-enable bit in CR0.
//! 5. Far jump through the new code selector. Not stylistic: the jump
//!    flushes real-mode prefetched instructions and forces the CPU to
//!    reload the code-segment descriptor cache. Skipping it leaves stale
//!    segment semantics in place and corrupts later memory accesses.
//!
//! After the jump the stub reloads every data segment register from the
//! flat data descriptor and repoints the stack below 640 KiB before
//! calling the kernel entry, which never returns.
//!
//! Failure model: the A20 handshake busy-waits on the keyboard controller
//! with no timeout. Hardware that never acks hangs the boot right here,
//! by design; there is nothing useful to fall back to.

/// Perform the one-way switch. Called exactly once, from the boot path.
#[cfg(target_os = "none")]
pub unsafe fn enter_protected_mode() -> ! {
    use crate::a20;
    use crate::gdt::BOOT_GDT;
    use crate::port::Hardware;

    extern "C" {
        fn protected_mode_jump() -> !;
    }

    // 1. No interrupts from here on; the kernel re-enables them once the
    //    IDT is in place.
    x86_64::instructions::interrupts::disable();

    // 2. Unlock the address space above 1 MiB.
    a20::enable(&mut Hardware);

    // 3. Descriptor table for the flat segments the jump will select.
    BOOT_GDT.load();

    // 4. Flip CR0.PE. The CPU is now in protected mode but still executing
    //    through the stale real-mode code segment until the far jump.
    use x86_64::registers::control::{Cr0, Cr0Flags};
    Cr0::update(|flags| flags.insert(Cr0Flags::PROTECTED_MODE_ENABLE));

    // 5. Flush and go.
    protected_mode_jump()
}

/// The far jump and segment reload. Kept in assembly because it is the one
/// spot where the instruction stream itself changes meaning: everything
/// after `ljmp` executes under the new code descriptor.
///
/// `_start` is the kernel entry in main.rs.
#[cfg(target_os = "none")]
core::arch::global_asm!(
    r#"
    .code32
    .global protected_mode_jump
protected_mode_jump:
    ljmpl $0x08, $1f
1:
    movw $0x10, %ax
    movw %ax, %ds
    movw %ax, %es
    movw %ax, %fs
    movw %ax, %gs
    movw %ax, %ss
    movl $0x0009FC00, %esp
    calll _start
2:
    hlt
    jmp 2b
    .code64
    "#,
    options(att_syntax)
);
