//! End-to-end dispatch flow over the built-in wire catalogue.

use emlink::schema::COUNTS_TO_MILLIVOLTS;
use emlink::{
    DecodeError, DecodedMessage, DeviceKey, Dispatcher, RawFrame, Timestamp, encode,
};

fn frame_for(device: &str, data: Vec<u8>) -> RawFrame {
    RawFrame::new(data, DeviceKey::from(device), Timestamp(1.5))
}

#[test]
fn configuration_then_decay_produces_millivolts() {
    let dispatcher = Dispatcher::with_builtin().unwrap();

    let conf = encode::conf_v5(7, 1, 0x0100, 2, 2, 3, 100, 50, &[10, 20, 30, 40]);
    let message = dispatcher.dispatch(&frame_for("d1", conf)).unwrap();
    let DecodedMessage::ConfigStatus(status) = message else {
        panic!("expected config status");
    };
    assert_eq!(status.config_version, 5);
    assert_eq!(status.system_id, 7);
    assert_eq!(status.bin_boundaries, vec![10, 20, 30, 40]);
    assert_eq!(status.received_at.seconds(), 1.5);

    let counts: [i16; 4] = [100, -50, 0, 32767];
    let decay = encode::decay_v2(0b0010_0110, 9, &counts);
    let message = dispatcher.dispatch(&frame_for("d1", decay)).unwrap();
    let DecodedMessage::DecaySample(sample) = message else {
        panic!("expected decay sample");
    };
    assert_eq!(sample.fiducial, 9);
    assert_eq!(sample.counts, counts);
    let expected: Vec<f64> = counts.iter().map(|&c| c as f64 * COUNTS_TO_MILLIVOLTS).collect();
    assert_eq!(sample.millivolts, expected);

    // Reshape against the recorded configuration.
    let config = dispatcher.session().config_for(&DeviceKey::from("d1")).unwrap();
    let named = sample.named_bins(&config);
    assert_eq!(named.named.len(), 4);
    assert!(named.unknown_field.is_empty());
    assert_eq!(named.named["bin_00010us"], 100.0 * COUNTS_TO_MILLIVOLTS);
}

#[test]
fn decay_before_any_configuration_is_rejected() {
    let dispatcher = Dispatcher::with_builtin().unwrap();
    let decay = encode::decay_v2(0, 9, &[1, 2, 3, 4]);
    let err = dispatcher.dispatch(&frame_for("d1", decay)).unwrap_err();
    assert!(matches!(err, DecodeError::MissingContext { .. }));
}

#[test]
fn device_contexts_are_independent() {
    let dispatcher = Dispatcher::with_builtin().unwrap();

    let conf = encode::conf_v5(7, 1, 1, 2, 2, 3, 100, 50, &[10, 20]);
    dispatcher.dispatch(&frame_for("d1", conf)).unwrap();

    // d2 never sent a configuration; its decay frames cannot be sized.
    let decay = encode::decay_v2(0, 9, &[1, 2]);
    let err = dispatcher.dispatch(&frame_for("d2", decay.clone())).unwrap_err();
    assert!(matches!(err, DecodeError::MissingContext { .. }));
    dispatcher.dispatch(&frame_for("d1", decay)).unwrap();
}

#[test]
fn v3_and_v5_configurations_both_decode() {
    let dispatcher = Dispatcher::with_builtin().unwrap();

    let v3 = encode::conf_v3(7, 1, 1, 2, 2, 3, 100, 50, &[10, 20, 30]);
    let DecodedMessage::ConfigStatus(status) =
        dispatcher.dispatch(&frame_for("d1", v3)).unwrap()
    else {
        panic!("expected config status");
    };
    assert_eq!(status.config_version, 3);
    assert_eq!(status.checksum_version, None);

    let v5 = encode::conf_v5(7, 2, 1, 2, 2, 3, 100, 50, &[10, 20, 30, 40]);
    let DecodedMessage::ConfigStatus(status) =
        dispatcher.dispatch(&frame_for("d1", v5)).unwrap()
    else {
        panic!("expected config status");
    };
    assert_eq!(status.config_version, 5);
    assert_eq!(status.checksum_version, Some(1));
    // The newer configuration replaced the bin table.
    assert_eq!(dispatcher.session().bin_count_for(&DeviceKey::from("d1")), Some(4));
}

#[test]
fn reconfiguration_resizes_later_decay_frames() {
    let dispatcher = Dispatcher::with_builtin().unwrap();

    dispatcher
        .dispatch(&frame_for("d1", encode::conf_v5(7, 1, 1, 2, 2, 3, 100, 50, &[10, 20])))
        .unwrap();
    dispatcher.dispatch(&frame_for("d1", encode::decay_v2(0, 1, &[1, 2]))).unwrap();

    dispatcher
        .dispatch(&frame_for("d1", encode::conf_v5(7, 2, 1, 2, 2, 3, 100, 50, &[10, 20, 30])))
        .unwrap();
    // The old two-bin frame shape no longer fits.
    let err = dispatcher.dispatch(&frame_for("d1", encode::decay_v2(0, 2, &[1, 2]))).unwrap_err();
    assert!(matches!(err, DecodeError::TooShort { .. }));
    dispatcher.dispatch(&frame_for("d1", encode::decay_v2(0, 3, &[1, 2, 3]))).unwrap();
}

#[test]
fn every_single_byte_corruption_is_rejected() {
    let dispatcher = Dispatcher::with_builtin().unwrap();
    let conf = encode::conf_v5(7, 1, 1, 2, 2, 3, 100, 50, &[10, 20, 30, 40]);

    for i in 0..conf.len() {
        let mut corrupted = conf.clone();
        corrupted[i] ^= 0x01;
        // Never a successful decode, never a panic.
        let result = dispatcher.dispatch(&frame_for("fresh", corrupted));
        assert!(result.is_err(), "byte {} corruption went undetected", i);
    }
    // The pristine frame still decodes.
    dispatcher.dispatch(&frame_for("fresh", conf)).unwrap();
}

#[test]
fn corruption_in_checksum_coverage_reports_checksum_mismatch() {
    let dispatcher = Dispatcher::with_builtin().unwrap();
    let conf = encode::conf_v5(7, 1, 1, 2, 2, 3, 100, 50, &[10, 20, 30, 40]);

    // Flip a boundary byte: covered by the checksum, not by any shape check.
    let mut corrupted = conf.clone();
    let idx = conf.len() - 3;
    corrupted[idx] ^= 0xFF;
    let err = dispatcher.dispatch(&frame_for("d1", corrupted)).unwrap_err();
    assert!(matches!(err, DecodeError::ChecksumMismatch { schema: "conf_v5", .. }));
    assert!(err.is_corruption());
}
