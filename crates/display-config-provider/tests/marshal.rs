use display_config_provider::{
    ffi::{AdlDisplayId, AdlMode, AdlSlsTarget},
    memory::{Error, ErasedRecord, NativeView, RecordKind},
};
use test_helper::{allocator::CountingAllocator, backend::mode, logger::init_logger};

fn modes() -> Vec<AdlMode> {
    vec![
        mode(0, 0, 1920, 1080),
        mode(0, 1, 2560, 1440),
        AdlMode {
            refresh_rate: 143.97,
            orientation: 90,
            ..mode(1, 4, 3840, 2160)
        },
    ]
}

#[test]
fn records_survive_a_round_trip() {
    init_logger();
    let (counting, allocator) = CountingAllocator::new();

    let records = modes();
    let view = NativeView::from_records(&allocator, &records).unwrap();
    let decoded: Vec<AdlMode> = view.to_vec().unwrap();
    let again = NativeView::from_records(&allocator, &decoded).unwrap();

    assert_eq!(decoded, records);
    assert_eq!(again.to_vec::<AdlMode>().unwrap(), records);
    assert_eq!(
        bytemuck::cast_slice::<AdlMode, u8>(&decoded),
        bytemuck::cast_slice::<AdlMode, u8>(&records)
    );

    drop(view);
    drop(again);
    assert_eq!(counting.allocations(), 2);
    assert_eq!(counting.outstanding(), 0);
}

#[test]
fn empty_input_is_a_null_view() {
    let (counting, allocator) = CountingAllocator::new();

    let view = NativeView::from_records::<AdlMode>(&allocator, &[]).unwrap();

    assert!(view.is_null());
    assert_eq!(view.len(), 0);
    assert_eq!(counting.allocations(), 0);
}

#[test]
fn null_view_reads_as_empty() {
    let view = NativeView::null(RecordKind::SlsTarget.layout());

    for count in [0, 1, 16, 1024] {
        assert_eq!(view.records::<AdlSlsTarget>(0, count).unwrap().count(), 0);
    }
}

#[test]
fn partial_ranges_are_decoded() {
    let (_counting, allocator) = CountingAllocator::new();
    let records = modes();
    let view = NativeView::from_records(&allocator, &records).unwrap();

    let tail: Vec<AdlMode> = view.records(1, 2).unwrap().collect();
    assert_eq!(tail, records[1..]);

    let result = view.records::<AdlMode>(2, 2);
    assert!(matches!(result, Err(Error::OutOfBounds { .. })));
}

#[test]
fn records_iterator_restarts_when_cloned() {
    let (_counting, allocator) = CountingAllocator::new();
    let view = NativeView::from_records(&allocator, &modes()).unwrap();

    let mut records = view.records::<AdlMode>(0, 3).unwrap();
    let first = records.next().unwrap();
    let restart = records.clone();

    assert_eq!(records.len(), 2);
    assert_eq!(restart.count(), 2);
    assert_eq!(first.x_res, 1920);
}

#[test]
fn reading_the_wrong_kind_is_rejected() {
    let (_counting, allocator) = CountingAllocator::new();
    let view = NativeView::from_records(&allocator, &modes()).unwrap();

    let result = view.to_vec::<AdlDisplayId>();

    assert!(matches!(result, Err(Error::TypeMismatch { .. })));
}

#[test]
fn primitive_arrays_round_trip() {
    let (_counting, allocator) = CountingAllocator::new();
    let values = [7_i32, -1, i32::MAX, 0];

    let view = NativeView::from_records(&allocator, &values).unwrap();

    assert_eq!(view.layout().kind, RecordKind::I32);
    assert_eq!(view.to_vec::<i32>().unwrap(), values);
}

#[test]
fn heterogeneous_records_are_rejected() {
    let (counting, allocator) = CountingAllocator::new();
    let a = mode(0, 0, 1920, 1080);
    let b = AdlDisplayId::default();
    let records: [&dyn ErasedRecord; 2] = [&a, &b];

    let result = NativeView::from_erased(&allocator, RecordKind::Mode, &records);

    assert!(matches!(result, Err(Error::TypeMismatch { .. })));
    assert_eq!(counting.allocations(), 0);
}

#[test]
fn erased_records_of_one_kind_are_marshaled() {
    let (_counting, allocator) = CountingAllocator::new();
    let a = mode(0, 0, 1920, 1080);
    let b = mode(0, 1, 1280, 720);
    let records: [&dyn ErasedRecord; 2] = [&a, &b];

    let view = NativeView::from_erased(&allocator, RecordKind::Mode, &records).unwrap();

    assert_eq!(view.to_vec::<AdlMode>().unwrap(), vec![a, b]);
}

#[test]
fn failed_allocation_is_reported() {
    let (counting, allocator) = CountingAllocator::new();
    counting.fail_allocations(true);

    let result = NativeView::from_records(&allocator, &modes());

    assert!(matches!(result, Err(Error::AllocationFailure { .. })));
}

#[test]
fn release_frees_exactly_once() {
    let (counting, allocator) = CountingAllocator::new();

    let mut null = NativeView::null(RecordKind::Mode.layout());
    null.release();
    null.release();
    assert_eq!(counting.frees(), 0);

    let mut view = NativeView::from_records(&allocator, &modes()).unwrap();
    view.release();
    assert_eq!(counting.frees(), 1);
    assert!(view.is_null());

    view.release();
    drop(view);
    assert_eq!(counting.frees(), 1);
    assert_eq!(counting.outstanding(), 0);
}

#[test]
fn released_view_rejects_reads() {
    let (_counting, allocator) = CountingAllocator::new();
    let mut view = NativeView::from_records(&allocator, &modes()).unwrap();

    view.release();

    assert!(matches!(view.read::<AdlMode>(0), Err(Error::InvalidHandle)));
}
