use core::{
    alloc::Layout,
    ffi::c_void,
    ptr::{self, null_mut},
};

/// Allocator for memory that crosses the native boundary.
///
/// Native libraries fill buffers from the allocator they were given, and the caller is
/// responsible for returning them.
pub trait NativeAllocator: Send + Sync {
    /// Allocates `size` bytes, returning null on failure.
    fn allocate(&self, size: usize) -> *mut c_void;

    /// Frees an allocation returned by [`NativeAllocator::allocate`].
    ///
    /// # Safety
    /// `address` must come from this allocator and must not have been freed.
    unsafe fn free(&self, address: *mut c_void);
}

/// Allocator backed by the Rust global allocator.
///
/// Each allocation is prefixed with its size so it can be freed from the address alone.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapAllocator;

impl HeapAllocator {
    const HEADER: usize = 16;
}

impl NativeAllocator for HeapAllocator {
    fn allocate(&self, size: usize) -> *mut c_void {
        let Some(total) = size.checked_add(Self::HEADER) else {
            return null_mut();
        };
        let Ok(layout) = Layout::from_size_align(total, Self::HEADER) else {
            return null_mut();
        };

        unsafe {
            let base = alloc::alloc::alloc(layout);
            if base.is_null() {
                return null_mut();
            }

            base.cast::<usize>().write(size);
            base.add(Self::HEADER).cast()
        }
    }

    unsafe fn free(&self, address: *mut c_void) {
        if address.is_null() {
            return;
        }

        unsafe {
            let base = address.cast::<u8>().sub(Self::HEADER);
            let size = ptr::read(base.cast::<usize>());
            let layout = Layout::from_size_align_unchecked(size + Self::HEADER, Self::HEADER);

            alloc::alloc::dealloc(base, layout);
        }
    }
}

/// The COM task allocator, which the ADL2 library is initialised with.
#[cfg(windows)]
#[derive(Debug, Default, Clone, Copy)]
pub struct CoTaskAllocator;

#[cfg(windows)]
impl NativeAllocator for CoTaskAllocator {
    fn allocate(&self, size: usize) -> *mut c_void {
        unsafe { windows::Win32::System::Com::CoTaskMemAlloc(size) }
    }

    unsafe fn free(&self, address: *mut c_void) {
        if address.is_null() {
            return;
        }

        unsafe { windows::Win32::System::Com::CoTaskMemFree(Some(address.cast_const())) };
    }
}
