fn main() {
    // Build-time settings baked into the firmware image.
    for var in [
        "WIFI_SSID",
        "WIFI_PASSWORD",
        "MQTT_HOST",
        "MQTT_CLIENT_ID",
        "MQTT_USER",
        "MQTT_PASSWORD",
        "WEATHERSTATION_CONFIG",
    ] {
        println!("cargo:rerun-if-env-changed={var}");
    }

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
