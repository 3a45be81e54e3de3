use display_config_provider::{
    DisplayConfig, DisplayLibrary, LibraryConfig,
    library::Error,
    snapshot::{HdrConfig, HdrConfigs},
};
use test_helper::{
    allocator::CountingAllocator,
    backend::{Call, SimulatedAdapter, SimulatedBackend, SimulatedSlsMap, SimulatedState, mode},
    logger::init_logger,
};

const HDMI: i32 = 10;
const DISPLAY_PORT: i32 = 15;

fn desk() -> SimulatedState {
    SimulatedState {
        adapters: vec![
            SimulatedAdapter::new(0, 3, "Radeon RX 7900")
                .with_display(0, DISPLAY_PORT, "Left")
                .with_display(1, HDMI, "Right"),
        ],
        next_map_index: 20,
        ..Default::default()
    }
}

fn library(state: SimulatedState) -> (DisplayLibrary<SimulatedBackend>, SimulatedBackend) {
    let backend = SimulatedBackend::new(state);
    let library = DisplayLibrary::from_backend(&LibraryConfig::default(), backend.clone());

    (library, backend)
}

#[test]
fn initialization_takes_a_snapshot() {
    init_logger();
    let (library, _backend) = library(desk());

    assert!(library.is_installed());
    assert_eq!(library.vendor_tag(), "AMD");
    assert_eq!(library.current_display_identifiers().unwrap().len(), 2);
    assert_eq!(library.active_config().unwrap().adapters.len(), 1);
}

#[test]
fn unavailable_library_fails_fast() {
    init_logger();
    let library = DisplayLibrary::<SimulatedBackend>::initialize(&LibraryConfig::default(), |_| {
        Err("atiadlxx.dll not found")
    });
    let desired = DisplayConfig::default();

    assert!(!library.is_installed());
    assert!(matches!(library.refresh(), Err(Error::NotAvailable)));
    assert!(matches!(library.active_config(), Err(Error::NotAvailable)));
    assert!(matches!(
        library.current_display_identifiers(),
        Err(Error::NotAvailable)
    ));
    assert!(matches!(
        library.is_config_possible(&desired),
        Err(Error::NotAvailable)
    ));
    assert!(matches!(
        library.is_config_active(&desired),
        Err(Error::NotAvailable)
    ));
    assert!(matches!(
        library.is_config_valid(&desired),
        Err(Error::NotAvailable)
    ));
    assert!(matches!(library.apply(&desired), Err(Error::NotAvailable)));
}

#[test]
fn possible_when_every_display_is_connected() {
    init_logger();
    let mut state = desk();
    state.adapters[0].displays[1] = state.adapters[0].displays[1].clone().unmapped();
    let (library, _backend) = library(state);

    let active = library.active_config().unwrap();
    let mut desired = active.clone();
    desired.display_identifiers = library.connected_display_identifiers().unwrap();

    assert_eq!(active.display_identifiers.len(), 1);
    assert_eq!(desired.display_identifiers.len(), 2);
    assert!(library.is_config_possible(&active).unwrap());
    assert!(library.is_config_possible(&desired).unwrap());

    desired
        .display_identifiers
        .push("AMD|9|Radeon RX 580|DisplayPort|1|2|Elsewhere".to_string());
    assert!(!library.is_config_possible(&desired).unwrap());
}

#[test]
fn active_config_is_recognised() {
    init_logger();
    let (library, _backend) = library(desk());

    let active = library.active_config().unwrap();
    let mut changed = active.clone();
    changed.hdr = HdrConfigs::default();

    assert!(library.is_config_active(&active).unwrap());
    assert!(!library.is_config_active(&changed).unwrap());
    assert!(library.is_config_valid(&changed).unwrap());
}

#[test]
fn failed_refresh_keeps_the_previous_snapshot() {
    init_logger();
    let (library, backend) = library(desk());
    let before = library.active_config().unwrap();

    backend.update(|state| {
        state.adapters[0].displays.pop();
        state.failures.display_map_config = true;
    });

    assert!(matches!(library.refresh(), Err(Error::Refresh(_))));
    assert_eq!(library.active_config().unwrap(), before);
    assert_eq!(library.connected_display_identifiers().unwrap().len(), 2);

    backend.update(|state| state.failures.display_map_config = false);
    library.refresh().unwrap();

    assert_eq!(library.current_display_identifiers().unwrap().len(), 1);
    assert_eq!(library.connected_display_identifiers().unwrap().len(), 1);
}

#[test]
fn active_config_can_be_replaced() {
    init_logger();
    let (library, _backend) = library(desk());

    library.set_active_config(DisplayConfig::default()).unwrap();

    assert_eq!(library.active_config().unwrap(), DisplayConfig::default());
}

#[test]
fn apply_settles_span_before_hdr() {
    init_logger();
    let mut state = desk();
    for display in &mut state.adapters[0].displays {
        display.mode = mode(0, display.index(), 3840, 1080);
    }
    state
        .sls_maps
        .push(SimulatedSlsMap::new(0, 7, 1, 2, &[0, 1]).with_native_mode(3840, 1080));
    let (library, backend) = library(state);

    let mut desired = library.active_config().unwrap();
    desired.hdr = desired
        .hdr
        .iter()
        .map(|(display_index, hdr)| {
            let enabled = display_index == 0 || hdr.enabled;
            (display_index, HdrConfig { enabled, ..*hdr })
        })
        .collect();
    backend.clear_calls();

    let report = library.apply(&desired).unwrap();

    let calls = backend.calls();
    let span = calls
        .iter()
        .position(|call| matches!(call, Call::SetSlsMapState { .. }))
        .unwrap();
    let hdr = calls
        .iter()
        .position(|call| matches!(call, Call::SetHdrState { .. }))
        .unwrap();

    assert!(span < hdr);
    assert_eq!(report.applied, 2);
    assert!(library.active_config().unwrap().hdr.get(0).unwrap().enabled);
    assert!(library.is_config_active(&desired).unwrap());
}

#[test]
fn span_failure_skips_hdr() {
    init_logger();
    let mut state = desk();
    for display in &mut state.adapters[0].displays {
        display.mode = mode(0, display.index(), 3840, 1080);
    }
    state
        .sls_maps
        .push(SimulatedSlsMap::new(0, 7, 1, 2, &[0, 1]).with_native_mode(3840, 1080));
    let (library, backend) = library(state);

    let desired = library.active_config().unwrap();
    backend.update(|state| {
        state.sls_maps.clear();
        state.failures.validate_sls_map = true;
    });
    backend.clear_calls();

    assert!(matches!(library.apply(&desired), Err(Error::Apply(_))));
    assert!(
        !backend
            .calls()
            .iter()
            .any(|call| matches!(call, Call::SetHdrState { .. }))
    );
}

#[test]
fn hdr_can_be_applied_alone() {
    init_logger();
    let (library, backend) = library(desk());

    let desired: HdrConfigs = [(
        1,
        HdrConfig {
            adapter_index: 0,
            supported: true,
            enabled: true,
        },
    )]
    .into_iter()
    .collect();

    let report = library.apply_hdr(&desired).unwrap();

    assert_eq!(report.applied, 1);
    assert!(library.active_config().unwrap().hdr.get(1).unwrap().enabled);
    assert!(
        !backend
            .calls()
            .iter()
            .any(|call| matches!(call, Call::SetSlsMapState { .. }))
    );
}

#[test]
fn hdr_report_survives_a_failed_final_refresh() {
    init_logger();
    let (library, backend) = library(desk());

    let before = library.active_config().unwrap();
    let mut desired = before.clone();
    desired.hdr = desired
        .hdr
        .iter()
        .map(|(display_index, hdr)| {
            let enabled = display_index == 0 || hdr.enabled;
            (display_index, HdrConfig { enabled, ..*hdr })
        })
        .collect();

    // The refresh after the span step succeeds, the one after HDR does not.
    backend.update(|state| state.failures.adapter_infos_after = Some(2));
    backend.clear_calls();

    let report = library.apply(&desired).unwrap();

    assert_eq!(report.applied, 2);
    assert_eq!(report.failed, 0);
    assert!(backend.calls().contains(&Call::SetHdrState {
        adapter_index: 0,
        display_index: 0,
        enabled: true,
    }));
    assert_eq!(library.active_config().unwrap(), before);
    assert!(matches!(library.refresh(), Err(Error::Refresh(_))));
}

#[test]
fn native_buffers_are_released() {
    init_logger();
    let (counting, allocator) = CountingAllocator::new();
    let backend = SimulatedBackend::with_allocator(desk(), allocator);
    let library = DisplayLibrary::from_backend(&LibraryConfig::default(), backend);

    library.refresh().unwrap();
    library.apply(&library.active_config().unwrap()).unwrap();

    assert!(counting.allocations() > 0);
    assert_eq!(counting.outstanding(), 0);
}

#[test]
fn snapshots_round_trip_through_toml() {
    init_logger();
    let mut state = desk();
    for display in &mut state.adapters[0].displays {
        display.mode = mode(0, display.index(), 3900, 1080);
    }
    state.sls_maps.push(
        SimulatedSlsMap::new(0, 7, 1, 2, &[0, 1])
            .with_native_mode(3840, 1080)
            .with_bezel_mode(3900, 1080),
    );
    let (library, _backend) = library(state);
    let config = library.active_config().unwrap();
    assert!(config.span.enabled);

    let text = toml::to_string(&config).unwrap();
    let parsed: DisplayConfig = toml::from_str(&text).unwrap();

    assert_eq!(parsed, config);
    assert!(library.is_config_active(&parsed).unwrap());
}

#[test]
fn dump_names_every_display() {
    init_logger();
    let (library, _backend) = library(desk());

    let dump = library.active_config().unwrap().to_string();

    for identifier in library.current_display_identifiers().unwrap() {
        assert!(dump.contains(&identifier));
    }
}
