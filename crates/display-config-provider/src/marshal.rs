//! Conversion between native record buffers and Rust sequences.
//!
//! Native calls hand back `(count, pointer)` pairs, these are wrapped in a [`NativeView`] at the
//! call site and decoded here. Outbound arrays are built here as well.

use alloc::sync::Arc;
use core::{iter::FusedIterator, marker::PhantomData};

use crate::memory::{Error, ErasedRecord, NativeAllocator, NativeRecord, NativeView, RecordKind};

/// Iterator over a range of records in a [`NativeView`].
///
/// Cloning the iterator restarts iteration from the clone's position.
pub struct Records<'a, T> {
    view: &'a NativeView,
    next: usize,
    end: usize,
    _record: PhantomData<T>,
}

impl<T> Clone for Records<'_, T> {
    fn clone(&self) -> Self {
        Self {
            view: self.view,
            next: self.next,
            end: self.end,
            _record: PhantomData,
        }
    }
}

impl<T: NativeRecord> Iterator for Records<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }

        // Range and kind were checked when the iterator was created.
        let record = unsafe { self.view.decode_unchecked(self.next) };
        self.next += 1;

        Some(record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.next;
        (remaining, Some(remaining))
    }
}

impl<T: NativeRecord> ExactSizeIterator for Records<'_, T> {}
impl<T: NativeRecord> FusedIterator for Records<'_, T> {}

impl NativeView {
    /// Iterates `count` records starting at `start`.
    ///
    /// A null view yields nothing, whatever the range.
    pub fn records<T: NativeRecord>(
        &self,
        start: usize,
        count: usize,
    ) -> Result<Records<'_, T>, Error> {
        if self.is_null() {
            return Ok(Records {
                view: self,
                next: 0,
                end: 0,
                _record: PhantomData,
            });
        }

        self.check_kind::<T>()?;

        let end = start
            .checked_add(count)
            .filter(|end| *end <= self.len())
            .ok_or(Error::OutOfBounds {
                index: start.saturating_add(count),
                len: self.len(),
            })?;

        Ok(Records {
            view: self,
            next: start,
            end,
            _record: PhantomData,
        })
    }

    /// Copies every record out of the view.
    pub fn to_vec<T: NativeRecord>(&self) -> Result<Vec<T>, Error> {
        Ok(self.records(0, self.len())?.collect())
    }

    /// Builds a native array from `records`.
    ///
    /// An empty slice produces a null view.
    pub fn from_records<T: NativeRecord>(
        allocator: &Arc<dyn NativeAllocator>,
        records: &[T],
    ) -> Result<Self, Error> {
        let mut view = Self::allocate(allocator, T::KIND.layout(), records.len())?;

        for (index, record) in records.iter().enumerate() {
            unsafe { view.write_bytes_unchecked(index, record.encode()) };
        }

        Ok(view)
    }

    /// Builds a native array of `kind` records from records whose types are only known at
    /// runtime.
    ///
    /// Every record must be of `kind`. An empty slice produces a null view.
    pub fn from_erased(
        allocator: &Arc<dyn NativeAllocator>,
        kind: RecordKind,
        records: &[&dyn ErasedRecord],
    ) -> Result<Self, Error> {
        let layout = kind.layout();

        let mismatch = records
            .iter()
            .find(|record| record.kind() != kind || record.bytes().len() != layout.size);
        if let Some(record) = mismatch {
            return Err(Error::TypeMismatch {
                expected: layout.name,
                found: record.kind().layout().name,
            });
        }

        let mut view = Self::allocate(allocator, layout, records.len())?;
        for (index, record) in records.iter().enumerate() {
            unsafe { view.write_bytes_unchecked(index, record.bytes()) };
        }

        Ok(view)
    }
}
