//! Wind vane sampling and the direction task step.

use weatherstation::error::{Error, SensorError};
use weatherstation::sensors::{VANE_CALIBRATION, WindVane, classify};
use weatherstation::tasks::sample_direction;

use crate::mock_hw::{RecordingSink, ScriptedAdc};

const TOPIC: &str = "homeassistant/sensor/weatherstation_wind_dir/state";

#[test]
fn every_calibration_point_classifies_to_itself() {
    for (label, level) in VANE_CALIBRATION {
        assert_eq!(classify(&VANE_CALIBRATION, level), label);
    }
}

#[test]
fn readings_between_levels_pick_the_nearest() {
    assert_eq!(classify(&VANE_CALIBRATION, 2000), "SSW");
    assert_eq!(classify(&VANE_CALIBRATION, 3950), "W");
    assert_eq!(classify(&VANE_CALIBRATION, 0), "ESE");
    assert_eq!(classify(&VANE_CALIBRATION, 4095), "W");
}

#[test]
fn samples_publish_in_order_and_failures_are_skipped() {
    let adc = ScriptedAdc::new([
        Ok(3716),
        Err(SensorError::AdcReadFailed),
        Ok(936),
    ]);
    let mut vane = WindVane::new(adc);
    let mut sink = RecordingSink::new();

    assert_eq!(sample_direction(&mut vane, &mut sink, TOPIC).unwrap().direction, "N");
    assert_eq!(
        sample_direction(&mut vane, &mut sink, TOPIC),
        Err(Error::Sensor(SensorError::AdcReadFailed))
    );
    assert_eq!(sample_direction(&mut vane, &mut sink, TOPIC).unwrap().direction, "E");

    assert_eq!(sink.payloads_for(TOPIC), vec!["N", "E"]);
}

