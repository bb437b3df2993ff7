//! Bump allocator over the fixed 2-4 MiB heap window.
//!
//! Allocation moves a cursor forward and keeps it 4-byte aligned; there is
//! no free and no reuse. Exhaustion is an error value, not a fault — the
//! caller decides whether running dry is fatal.

use crate::constants::heap::{HEAP_END, HEAP_START};
use core::fmt;
use core::ptr::NonNull;
use spin::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfMemory;

impl fmt::Display for OutOfMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("kernel heap exhausted")
    }
}

const ALIGN: usize = 4;

const fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapStats {
    pub start: usize,
    pub end: usize,
    pub current: usize,
}

impl HeapStats {
    pub fn available(&self) -> usize {
        self.end - self.current
    }

    pub fn used(&self) -> usize {
        self.current - self.start
    }
}

pub struct BumpAllocator {
    start: usize,
    end: usize,
    next: usize,
}

impl BumpAllocator {
    /// The region is not touched until something is allocated and written
    /// through; the allocator itself only does address arithmetic.
    pub const fn new(start: usize, end: usize) -> Self {
        BumpAllocator {
            start,
            end,
            next: start,
        }
    }

    pub fn alloc(&mut self, size: usize) -> Result<NonNull<u8>, OutOfMemory> {
        let ptr = self.next;
        let alloc_end = ptr.checked_add(size).ok_or(OutOfMemory)?;
        if alloc_end > self.end {
            return Err(OutOfMemory);
        }
        self.next = align_up(alloc_end, ALIGN);
        NonNull::new(ptr as *mut u8).ok_or(OutOfMemory)
    }

    pub fn stats(&self) -> HeapStats {
        HeapStats {
            start: self.start,
            end: self.end,
            current: self.next,
        }
    }
}

static HEAP: Mutex<BumpAllocator> = Mutex::new(BumpAllocator::new(HEAP_START, HEAP_END));

/// Allocate from the kernel heap. No free.
pub fn kmalloc(size: usize) -> Result<NonNull<u8>, OutOfMemory> {
    HEAP.lock().alloc(size)
}

pub fn heap_stats() -> HeapStats {
    HEAP.lock().stats()
}
