use bytemuck::Pod;

use crate::ffi::{
    AdlAdapterInfo, AdlBezelTransientMode, AdlDdcInfo2, AdlDisplayId, AdlDisplayInfo,
    AdlDisplayMap, AdlDisplayTarget, AdlMode, AdlSlsGrid, AdlSlsMap, AdlSlsMode, AdlSlsOffset,
    AdlSlsTarget,
};

/// Identity of every record type that may live in a [`NativeView`](super::NativeView).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordKind {
    I32,
    U32,
    I64,
    U64,
    /// A pointer sized handle.
    Handle,
    AdapterInfo,
    DisplayId,
    Mode,
    DisplayMap,
    DisplayTarget,
    DisplayInfo,
    DdcInfo2,
    SlsGrid,
    SlsMap,
    SlsTarget,
    SlsMode,
    BezelTransientMode,
    SlsOffset,
}

impl RecordKind {
    /// Looks up the layout registered for this kind.
    pub const fn layout(self) -> RecordLayout {
        let (name, size) = match self {
            Self::I32 => ("i32", size_of::<i32>()),
            Self::U32 => ("u32", size_of::<u32>()),
            Self::I64 => ("i64", size_of::<i64>()),
            Self::U64 => ("u64", size_of::<u64>()),
            Self::Handle => ("handle", size_of::<usize>()),
            Self::AdapterInfo => ("AdapterInfo", size_of::<AdlAdapterInfo>()),
            Self::DisplayId => ("ADLDisplayID", size_of::<AdlDisplayId>()),
            Self::Mode => ("ADLMode", size_of::<AdlMode>()),
            Self::DisplayMap => ("ADLDisplayMap", size_of::<AdlDisplayMap>()),
            Self::DisplayTarget => ("ADLDisplayTarget", size_of::<AdlDisplayTarget>()),
            Self::DisplayInfo => ("ADLDisplayInfo", size_of::<AdlDisplayInfo>()),
            Self::DdcInfo2 => ("ADLDDCInfo2", size_of::<AdlDdcInfo2>()),
            Self::SlsGrid => ("ADLSLSGrid", size_of::<AdlSlsGrid>()),
            Self::SlsMap => ("ADLSLSMap", size_of::<AdlSlsMap>()),
            Self::SlsTarget => ("ADLSLSTarget", size_of::<AdlSlsTarget>()),
            Self::SlsMode => ("ADLSLSMode", size_of::<AdlSlsMode>()),
            Self::BezelTransientMode => {
                ("ADLBezelTransientMode", size_of::<AdlBezelTransientMode>())
            }
            Self::SlsOffset => ("ADLSLSOffset", size_of::<AdlSlsOffset>()),
        };

        RecordLayout {
            kind: self,
            name,
            size,
        }
    }

    /// Whether the kind is a plain integer or handle.
    pub const fn is_primitive(self) -> bool {
        matches!(
            self,
            Self::I32 | Self::U32 | Self::I64 | Self::U64 | Self::Handle
        )
    }
}

/// Size and name of a record kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordLayout {
    pub kind: RecordKind,
    pub name: &'static str,
    pub size: usize,
}

/// A fixed-layout record with a registered [`RecordKind`].
pub trait NativeRecord: Pod {
    /// The kind this type is registered as.
    const KIND: RecordKind;

    /// Decodes a record from exactly `size_of::<Self>()` bytes.
    fn decode(bytes: &[u8]) -> Self {
        bytemuck::pod_read_unaligned(bytes)
    }

    /// The record's native bytes.
    fn encode(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

macro_rules! primitive_record {
    ($ty:ty, $kind:ident) => {
        impl NativeRecord for $ty {
            const KIND: RecordKind = RecordKind::$kind;

            #[inline]
            fn decode(bytes: &[u8]) -> Self {
                let mut raw = [0u8; size_of::<$ty>()];
                raw.copy_from_slice(bytes);
                <$ty>::from_ne_bytes(raw)
            }
        }
    };
}

primitive_record!(i32, I32);
primitive_record!(u32, U32);
primitive_record!(i64, I64);
primitive_record!(u64, U64);
primitive_record!(usize, Handle);

macro_rules! adl_record {
    ($ty:ty, $kind:ident) => {
        impl NativeRecord for $ty {
            const KIND: RecordKind = RecordKind::$kind;
        }
    };
}

adl_record!(AdlAdapterInfo, AdapterInfo);
adl_record!(AdlDisplayId, DisplayId);
adl_record!(AdlMode, Mode);
adl_record!(AdlDisplayMap, DisplayMap);
adl_record!(AdlDisplayTarget, DisplayTarget);
adl_record!(AdlDisplayInfo, DisplayInfo);
adl_record!(AdlDdcInfo2, DdcInfo2);
adl_record!(AdlSlsGrid, SlsGrid);
adl_record!(AdlSlsMap, SlsMap);
adl_record!(AdlSlsTarget, SlsTarget);
adl_record!(AdlSlsMode, SlsMode);
adl_record!(AdlBezelTransientMode, BezelTransientMode);
adl_record!(AdlSlsOffset, SlsOffset);

/// A record with its type erased, used to marshal records whose types are only known at runtime.
pub trait ErasedRecord {
    /// The record's kind.
    fn kind(&self) -> RecordKind;

    /// The record's native bytes.
    fn bytes(&self) -> &[u8];
}

impl<T: NativeRecord> ErasedRecord for T {
    fn kind(&self) -> RecordKind {
        T::KIND
    }

    fn bytes(&self) -> &[u8] {
        self.encode()
    }
}

#[cfg(test)]
mod tests {
    use super::{NativeRecord, RecordKind};
    use crate::ffi::{AdlMode, AdlSlsOffset};

    #[test]
    fn layouts_match_types() {
        assert_eq!(RecordKind::Mode.layout().size, size_of::<AdlMode>());
        assert_eq!(RecordKind::SlsOffset.layout().size, size_of::<AdlSlsOffset>());
        assert_eq!(RecordKind::Handle.layout().size, size_of::<usize>());
        assert!(RecordKind::I64.is_primitive());
        assert!(!RecordKind::Mode.is_primitive());
    }

    #[test]
    fn primitives_decode_native_endian() {
        let value: i32 = -123_456;
        assert_eq!(i32::decode(&value.to_ne_bytes()), value);

        let handle: usize = 0xdead_beef;
        assert_eq!(usize::decode(handle.encode()), handle);
    }

    #[test]
    fn records_decode_their_encoding() {
        let mode = AdlMode {
            x_res: 5760,
            y_res: 1080,
            refresh_rate: 59.94,
            ..Default::default()
        };

        assert_eq!(AdlMode::decode(mode.encode()), mode);
    }
}
