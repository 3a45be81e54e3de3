use alloc::sync::Arc;
use core::{ffi::c_void, fmt, ptr::null_mut};

use super::{Error, NativeAllocator, NativeRecord, RecordLayout};

/// An owned view over a block of native memory holding `len` records of one layout.
///
/// The allocation is returned to its allocator exactly once, either by [`NativeView::release`]
/// or when the view is dropped.
pub struct NativeView {
    address: *mut c_void,
    layout: RecordLayout,
    len: usize,
    allocator: Option<Arc<dyn NativeAllocator>>,
}

// The view exclusively owns its allocation.
unsafe impl Send for NativeView {}

impl NativeView {
    /// Creates a view that points at nothing.
    pub fn null(layout: RecordLayout) -> Self {
        Self {
            address: null_mut(),
            layout,
            len: 0,
            allocator: None,
        }
    }

    /// Allocates zeroed memory for `count` records of `layout`.
    ///
    /// A `count` of zero returns a null view without touching the allocator.
    pub fn allocate(
        allocator: &Arc<dyn NativeAllocator>,
        layout: RecordLayout,
        count: usize,
    ) -> Result<Self, Error> {
        if count == 0 {
            return Ok(Self::null(layout));
        }

        let bytes = layout
            .size
            .checked_mul(count)
            .ok_or(Error::AllocationFailure { bytes: usize::MAX })?;

        let address = allocator.allocate(bytes);
        if address.is_null() {
            return Err(Error::AllocationFailure { bytes });
        }

        unsafe { address.cast::<u8>().write_bytes(0, bytes) };

        Ok(Self {
            address,
            layout,
            len: count,
            allocator: Some(Arc::clone(allocator)),
        })
    }

    /// Takes ownership of a native allocation.
    ///
    /// # Safety
    /// `address` must be null or have been allocated by `allocator`, hold at least `len` records
    /// of `layout`, and not be owned by anything else. `len` must come from the same native call
    /// that produced `address`.
    pub unsafe fn from_raw(
        allocator: Arc<dyn NativeAllocator>,
        address: *mut c_void,
        layout: RecordLayout,
        len: usize,
    ) -> Self {
        if address.is_null() {
            return Self::null(layout);
        }

        Self {
            address,
            layout,
            len,
            allocator: Some(allocator),
        }
    }

    /// Whether the view points at nothing.
    pub fn is_null(&self) -> bool {
        self.address.is_null()
    }

    /// The number of records in the view.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the view holds no records.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The layout of the records in the view.
    pub fn layout(&self) -> RecordLayout {
        self.layout
    }

    /// The start of the native allocation.
    pub fn as_ptr(&self) -> *const c_void {
        self.address
    }

    /// The start of the native allocation.
    pub fn as_mut_ptr(&mut self) -> *mut c_void {
        self.address
    }

    /// Reads the record at `index`.
    pub fn read<T: NativeRecord>(&self, index: usize) -> Result<T, Error> {
        self.check_access::<T>(index)?;

        Ok(unsafe { self.decode_unchecked(index) })
    }

    /// Copies `record` into the view at `index`.
    pub fn write<T: NativeRecord>(&mut self, index: usize, record: &T) -> Result<(), Error> {
        self.check_access::<T>(index)?;

        unsafe { self.write_bytes_unchecked(index, record.encode()) };

        Ok(())
    }

    /// Returns the allocation to its allocator, the view is null afterwards.
    ///
    /// Releasing a null view does nothing.
    pub fn release(&mut self) {
        if self.address.is_null() {
            return;
        }

        let address = core::mem::replace(&mut self.address, null_mut());
        self.len = 0;

        if let Some(allocator) = self.allocator.take() {
            unsafe { allocator.free(address) };
        }
    }

    pub(crate) fn check_kind<T: NativeRecord>(&self) -> Result<(), Error> {
        if T::KIND != self.layout.kind {
            return Err(Error::TypeMismatch {
                expected: T::KIND.layout().name,
                found: self.layout.name,
            });
        }

        Ok(())
    }

    fn check_access<T: NativeRecord>(&self, index: usize) -> Result<(), Error> {
        if self.is_null() {
            return Err(Error::InvalidHandle);
        }

        self.check_kind::<T>()?;

        if index >= self.len {
            return Err(Error::OutOfBounds {
                index,
                len: self.len,
            });
        }

        Ok(())
    }

    /// # Safety
    /// The view must be non-null, hold `T` records, and `index` must be in bounds.
    pub(crate) unsafe fn decode_unchecked<T: NativeRecord>(&self, index: usize) -> T {
        let bytes = unsafe {
            core::slice::from_raw_parts(
                self.address
                    .cast::<u8>()
                    .add(index * self.layout.size)
                    .cast_const(),
                self.layout.size,
            )
        };

        T::decode(bytes)
    }

    /// # Safety
    /// The view must be non-null, `index` must be in bounds, and `bytes` must be one record.
    pub(crate) unsafe fn write_bytes_unchecked(&mut self, index: usize, bytes: &[u8]) {
        debug_assert_eq!(bytes.len(), self.layout.size);

        unsafe {
            core::ptr::copy_nonoverlapping(
                bytes.as_ptr(),
                self.address.cast::<u8>().add(index * self.layout.size),
                self.layout.size,
            );
        }
    }
}

impl Drop for NativeView {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for NativeView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeView")
            .field("address", &self.address)
            .field("layout", &self.layout.name)
            .field("len", &self.len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;

    use super::NativeView;
    use crate::{
        ffi::{AdlDisplayId, AdlMode},
        memory::{Error, HeapAllocator, NativeAllocator, RecordKind},
    };

    fn allocator() -> Arc<dyn NativeAllocator> {
        Arc::new(HeapAllocator)
    }

    #[test]
    fn write_then_read() {
        let mut view = NativeView::allocate(&allocator(), RecordKind::Mode.layout(), 3).unwrap();
        let mode = AdlMode {
            adapter_index: 2,
            x_res: 2560,
            y_res: 1440,
            ..Default::default()
        };

        view.write(1, &mode).unwrap();

        assert_eq!(view.read::<AdlMode>(1).unwrap(), mode);
        assert_eq!(view.read::<AdlMode>(0).unwrap(), AdlMode::default());
    }

    #[test]
    fn null_view_is_invalid_handle() {
        let view = NativeView::null(RecordKind::I32.layout());

        assert!(view.is_null());
        assert!(matches!(view.read::<i32>(0), Err(Error::InvalidHandle)));
    }

    #[test]
    fn wrong_record_type_is_mismatch() {
        let view = NativeView::allocate(&allocator(), RecordKind::Mode.layout(), 1).unwrap();

        let error = view.read::<AdlDisplayId>(0).unwrap_err();
        assert!(matches!(error, Error::TypeMismatch { .. }), "{error}");
    }

    #[test]
    fn reads_are_bounds_checked() {
        let mut view = NativeView::allocate(&allocator(), RecordKind::I32.layout(), 2).unwrap();

        assert!(matches!(
            view.write(2, &7i32),
            Err(Error::OutOfBounds { index: 2, len: 2 })
        ));
    }

    #[test]
    fn zero_count_allocation_is_null() {
        let view = NativeView::allocate(&allocator(), RecordKind::U64.layout(), 0).unwrap();
        assert!(view.is_null());
    }

    #[test]
    fn release_is_idempotent() {
        let mut view = NativeView::allocate(&allocator(), RecordKind::U32.layout(), 4).unwrap();
        view.write(3, &u32::MAX).unwrap();
        assert_eq!(view.read::<u32>(3).unwrap(), u32::MAX);

        view.release();
        assert!(view.is_null());
        view.release();
    }
}
