use display_config_provider::{
    builder::{self, build_display_config, connected_display_identifiers},
    snapshot::HdrConfig,
};
use rand::seq::SliceRandom;
use test_helper::{
    backend::{Call, SimulatedAdapter, SimulatedBackend, SimulatedSlsMap, SimulatedState, mode},
    logger::init_logger,
};

const DVI_D: i32 = 2;
const HDMI: i32 = 10;
const DISPLAY_PORT: i32 = 15;

fn single_adapter() -> SimulatedState {
    SimulatedState {
        adapters: vec![
            SimulatedAdapter::new(0, 3, "Radeon RX 7900")
                .with_display(0, DISPLAY_PORT, "Left")
                .with_display(1, HDMI, "Right"),
        ],
        primary_adapter: 0,
        next_map_index: 50,
        ..Default::default()
    }
}

fn span_adapter(displays: i32, x_res: i32, y_res: i32) -> SimulatedState {
    let mut adapter = SimulatedAdapter::new(0, 3, "Radeon RX 7900");
    for index in 0..displays {
        adapter = adapter.with_display(index, DISPLAY_PORT, &format!("Panel {index}"));
    }
    for display in &mut adapter.displays {
        display.mode = mode(0, display.index(), x_res, y_res);
    }

    SimulatedState {
        adapters: vec![adapter],
        ..Default::default()
    }
}

#[test]
fn active_adapter_is_captured() {
    init_logger();
    let backend = SimulatedBackend::new(single_adapter());

    let config = build_display_config(&backend, "AMD").unwrap();

    let adapter = config.adapters.first().unwrap();
    assert_eq!(config.adapters.len(), 1);
    assert!(adapter.is_primary);
    assert_eq!(adapter.device_number, 3);
    assert_eq!(adapter.display_name, "\\\\.\\DISPLAY1");

    assert!(!config.span.enabled);
    assert!(config.span.maps.is_empty());

    assert_eq!(
        config.display_identifiers,
        vec![
            "AMD|3|Radeon RX 7900|DisplayPort|19501|1000|Left".to_string(),
            "AMD|3|Radeon RX 7900|HDMI-A|19501|1001|Right".to_string(),
        ]
    );

    assert_eq!(config.hdr.len(), 2);
    assert_eq!(
        config.hdr.get(1),
        Some(&HdrConfig {
            adapter_index: 0,
            supported: true,
            enabled: false,
        })
    );
}

#[test]
fn equality_ignores_enumeration_order() {
    init_logger();

    let mut state = SimulatedState {
        adapters: vec![
            SimulatedAdapter::new(0, 3, "Radeon RX 7900")
                .with_display(0, DISPLAY_PORT, "Left")
                .with_display(1, HDMI, "Right"),
            SimulatedAdapter::new(1, 4, "Radeon RX 6600")
                .with_display(4, DISPLAY_PORT, "Top")
                .with_display(5, DISPLAY_PORT, "Bottom"),
            SimulatedAdapter::new(2, 5, "Radeon Pro W7600").with_display(8, HDMI, "Side"),
        ],
        primary_adapter: 1,
        ..Default::default()
    };

    for adapter in &mut state.adapters[..2] {
        let adapter_index = adapter.info.adapter_index;
        for display in &mut adapter.displays {
            display.mode = mode(adapter_index, display.index(), 3840, 1080);
        }
    }
    state
        .sls_maps
        .push(SimulatedSlsMap::new(0, 7, 1, 2, &[0, 1]).with_native_mode(3840, 1080));
    state
        .sls_maps
        .push(SimulatedSlsMap::new(1, 9, 1, 2, &[4, 5]).with_native_mode(3840, 1080));

    let expected = build_display_config(&SimulatedBackend::new(state.clone()), "AMD").unwrap();
    assert!(expected.span.enabled);
    assert_eq!(expected.span.maps.len(), 2);
    assert_eq!(expected.span.enabled_display_modes.len(), 4);

    let mut rng = rand::rng();
    for _ in 0..8 {
        state.adapters.shuffle(&mut rng);
        for adapter in &mut state.adapters {
            adapter.displays.shuffle(&mut rng);
        }

        state.adapters.reverse();
        let reversed = build_display_config(&SimulatedBackend::new(state.clone()), "AMD").unwrap();
        assert_eq!(reversed, expected);

        let config = build_display_config(&SimulatedBackend::new(state.clone()), "AMD").unwrap();
        assert_eq!(config, expected);
    }
}

#[test]
fn grid_mismatch_discards_the_map() {
    init_logger();
    let mut state = span_adapter(3, 5760, 1080);
    state.sls_maps.push(
        SimulatedSlsMap::new(0, 7, 2, 2, &[0, 1, 2])
            .with_native_mode(5760, 1080)
            .with_bezel_mode(5900, 1080),
    );
    let backend = SimulatedBackend::new(state);

    let config = build_display_config(&backend, "AMD").unwrap();

    assert!(!config.span.enabled);
    assert!(config.span.maps.is_empty());
    assert!(config.span.enabled_display_modes.is_empty());
    assert!(backend.calls().contains(&Call::SlsMapConfig {
        adapter_index: 0,
        map_index: 7,
    }));
}

#[test]
fn bezel_mode_match_enables_span() {
    init_logger();
    let mut state = span_adapter(2, 3900, 1080);
    state.sls_maps.push(
        SimulatedSlsMap::new(0, 7, 1, 2, &[0, 1])
            .with_native_mode(3840, 1080)
            .with_bezel_mode(3900, 1080),
    );
    let backend = SimulatedBackend::new(state);

    let config = build_display_config(&backend, "AMD").unwrap();

    assert!(config.span.enabled);
    assert_eq!(config.span.maps.len(), 1);
    assert_eq!(config.span.enabled_display_modes.len(), 2);

    let map = &config.span.maps[0];
    assert_eq!(map.map_index(), 7);
    assert!(map.bezel_compensated);
    assert_eq!(map.targets.len(), 2);
    assert_eq!(map.offsets.len(), 2);
    assert!(map.native_mode_offsets.is_empty());
}

#[test]
fn native_mode_match_enables_span() {
    init_logger();
    let mut state = span_adapter(3, 5760, 1080);
    state.sls_maps.push(
        SimulatedSlsMap::new(0, 2, 1, 3, &[0, 1, 2])
            .with_native_mode(5760, 1080)
            .with_bezel_mode(5900, 1080),
    );
    let backend = SimulatedBackend::new(state);

    let config = build_display_config(&backend, "AMD").unwrap();

    assert!(config.span.enabled);
    assert_eq!(config.span.maps.len(), 1);
    assert!(!config.span.maps[0].bezel_compensated);
    assert_eq!(config.span.maps[0].bezel_percent, 0);
}

#[test]
fn unused_map_is_not_recorded() {
    init_logger();
    let mut state = span_adapter(2, 1920, 1080);
    state
        .sls_maps
        .push(SimulatedSlsMap::new(0, 7, 1, 2, &[0, 1]).with_native_mode(3840, 1080));
    let backend = SimulatedBackend::new(state);

    let config = build_display_config(&backend, "AMD").unwrap();

    assert!(!config.span.enabled);
    assert!(config.span.maps.is_empty());
}

#[test]
fn single_target_skips_span_detection() {
    init_logger();
    let mut state = span_adapter(1, 1920, 1080);
    state
        .sls_maps
        .push(SimulatedSlsMap::new(0, 7, 1, 1, &[0]).with_native_mode(1920, 1080));
    let backend = SimulatedBackend::new(state);

    let config = build_display_config(&backend, "AMD").unwrap();

    assert!(!config.span.enabled);
    assert!(!backend.calls().contains(&Call::SlsMapIndex(0)));
}

#[test]
fn connectors_without_color_state_are_skipped() {
    init_logger();
    let mut state = single_adapter();
    state.adapters[0] = state.adapters[0]
        .clone()
        .with_display(2, DVI_D, "Old Panel");
    let backend = SimulatedBackend::new(state);

    let config = build_display_config(&backend, "AMD").unwrap();

    assert_eq!(config.hdr.len(), 2);
    assert!(config.hdr.get(2).is_none());
    assert!(!backend.calls().contains(&Call::HdrState {
        adapter_index: 0,
        display_index: 2,
    }));
    assert_eq!(config.display_identifiers.len(), 3);
}

#[test]
fn failed_hdr_read_skips_the_display() {
    init_logger();
    let mut state = single_adapter();
    state.failures.hdr_state.insert(1);
    let backend = SimulatedBackend::new(state);

    let config = build_display_config(&backend, "AMD").unwrap();

    assert_eq!(config.hdr.len(), 1);
    assert!(config.hdr.get(0).is_some());
}

#[test]
fn failed_edid_read_falls_back_to_driver_names() {
    init_logger();
    let mut state = single_adapter();
    state.failures.ddc_info = true;
    let backend = SimulatedBackend::new(state);

    let config = build_display_config(&backend, "AMD").unwrap();

    assert_eq!(
        config.display_identifiers,
        vec![
            "AMD|3|Radeon RX 7900|DisplayPort|SIM|Left".to_string(),
            "AMD|3|Radeon RX 7900|HDMI-A|SIM|Right".to_string(),
        ]
    );
}

#[test]
fn duplicate_adapter_views_are_collapsed() {
    init_logger();
    let state = SimulatedState {
        adapters: vec![
            SimulatedAdapter::new(0, 3, "Radeon RX 7900").with_display(0, DISPLAY_PORT, "Left"),
            SimulatedAdapter::new(1, 3, "Radeon RX 7900").with_display(0, DISPLAY_PORT, "Left"),
        ],
        ..Default::default()
    };
    let backend = SimulatedBackend::new(state);

    let config = build_display_config(&backend, "AMD").unwrap();

    assert_eq!(config.adapters.len(), 2);
    assert_eq!(config.display_identifiers.len(), 1);
    assert_eq!(config.hdr.len(), 1);
    assert_eq!(config.hdr.get(0).unwrap().adapter_index, 0);
}

#[test]
fn inactive_adapters_are_skipped() {
    init_logger();
    let mut state = single_adapter();
    state.adapters.push(
        SimulatedAdapter::new(1, 4, "Radeon RX 6600").with_display(4, DISPLAY_PORT, "Spare"),
    );
    state.adapters[1].active = false;
    let backend = SimulatedBackend::new(state);

    let config = build_display_config(&backend, "AMD").unwrap();
    let connected = connected_display_identifiers(&backend, "AMD").unwrap();

    assert_eq!(config.adapters.len(), 1);
    assert_eq!(config.display_identifiers.len(), 2);
    assert_eq!(connected.len(), 3);
    assert!(!backend.calls().contains(&Call::DisplayMapConfig(1)));
}

#[test]
fn unmapped_displays_are_only_connected() {
    init_logger();
    let mut state = single_adapter();
    state.adapters[0].displays[1] = state.adapters[0].displays[1].clone().unmapped();
    let backend = SimulatedBackend::new(state);

    let config = build_display_config(&backend, "AMD").unwrap();
    let connected = connected_display_identifiers(&backend, "AMD").unwrap();

    assert_eq!(config.display_identifiers.len(), 1);
    assert_eq!(connected.len(), 2);
    assert!(
        config
            .display_identifiers
            .iter()
            .all(|identifier| connected.contains(identifier))
    );
}

#[test]
fn adapter_enumeration_failure_is_fatal() {
    init_logger();
    let mut state = single_adapter();
    state.failures.adapter_infos = true;
    let backend = SimulatedBackend::new(state);

    let result = build_display_config(&backend, "AMD");

    assert!(matches!(result, Err(builder::Error::Adapters(_))));
}

#[test]
fn display_map_failure_is_fatal() {
    init_logger();
    let mut state = single_adapter();
    state.failures.display_map_config = true;
    let backend = SimulatedBackend::new(state);

    let result = build_display_config(&backend, "AMD");

    assert!(matches!(
        result,
        Err(builder::Error::DisplayMaps {
            adapter_index: 0,
            ..
        })
    ));
}

#[test]
fn missing_primary_adapter_is_soft() {
    init_logger();
    let mut state = single_adapter();
    state.failures.primary_adapter = true;
    let backend = SimulatedBackend::new(state);

    let config = build_display_config(&backend, "AMD").unwrap();

    assert!(config.adapters.iter().all(|adapter| !adapter.is_primary));
}
