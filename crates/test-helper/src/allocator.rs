use core::{
    ffi::c_void,
    ptr::null_mut,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

use alloc::sync::Arc;

use display_config_provider::memory::{HeapAllocator, NativeAllocator};

/// A heap allocator that counts its allocations and frees, and can be told to fail.
#[derive(Debug, Default)]
pub struct CountingAllocator {
    allocations: AtomicUsize,
    frees: AtomicUsize,
    fail: AtomicBool,
}

impl CountingAllocator {
    /// Creates the allocator along with a handle usable wherever a native allocator is needed.
    pub fn new() -> (Arc<Self>, Arc<dyn NativeAllocator>) {
        let counting = Arc::new(Self::default());
        let allocator = Arc::clone(&counting) as Arc<dyn NativeAllocator>;

        (counting, allocator)
    }

    /// Successful allocations so far.
    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::SeqCst)
    }

    /// Frees so far.
    pub fn frees(&self) -> usize {
        self.frees.load(Ordering::SeqCst)
    }

    /// Allocations that have not been freed.
    pub fn outstanding(&self) -> usize {
        self.allocations() - self.frees()
    }

    /// Makes every following allocation return null.
    pub fn fail_allocations(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl NativeAllocator for CountingAllocator {
    fn allocate(&self, size: usize) -> *mut c_void {
        if self.fail.load(Ordering::SeqCst) {
            return null_mut();
        }

        let address = HeapAllocator.allocate(size);
        if !address.is_null() {
            self.allocations.fetch_add(1, Ordering::SeqCst);
        }

        address
    }

    unsafe fn free(&self, address: *mut c_void) {
        if address.is_null() {
            return;
        }

        self.frees.fetch_add(1, Ordering::SeqCst);
        unsafe { HeapAllocator.free(address) };
    }
}
