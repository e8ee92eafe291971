//! Global heap allocator.
//!
//! The kernel model itself never allocates on the simulated heap (every PCB,
//! message, and page-table entry lives in a fixed-capacity array, see
//! [`crate::pool`]); this exists because `alloc::{String, Vec, format!}` are
//! used throughout the ambient logging/tracing/snapshot layers, and under
//! `#[cfg(not(any(test, feature = "bin")))]` those need a real global
//! allocator to link.

#[cfg(not(any(test, feature = "bin")))]
use core::alloc::Layout;
#[cfg(not(any(test, feature = "bin")))]
use linked_list_allocator::LockedHeap;

#[cfg(not(any(test, feature = "bin")))]
#[global_allocator]
static ALLOCATOR: LockedHeap = LockedHeap::empty();

#[cfg(not(any(test, feature = "bin")))]
const HEAP_SIZE: usize = 4 * 1024 * 1024;

#[cfg(not(any(test, feature = "bin")))]
#[repr(align(16))]
struct HeapMemory([u8; HEAP_SIZE]);
#[cfg(not(any(test, feature = "bin")))]
static mut HEAP_MEMORY: HeapMemory = HeapMemory([0; HEAP_SIZE]);

/// Initialize the heap. Must be called exactly once, before any allocation,
/// from [`crate::init::boot`]. No-op under `cfg(test)` or `--features bin`,
/// where the host's allocator is used instead.
pub fn init() {
    #[cfg(not(any(test, feature = "bin")))]
    unsafe {
        let base = core::ptr::addr_of_mut!(HEAP_MEMORY) as *mut u8;
        ALLOCATOR.lock().init(base, HEAP_SIZE);
    }
}

#[cfg(not(any(test, feature = "bin")))]
#[alloc_error_handler]
fn alloc_error_handler(layout: Layout) -> ! {
    crate::error!("out of memory: requested {} bytes (align {})", layout.size(), layout.align());
    loop {}
}
