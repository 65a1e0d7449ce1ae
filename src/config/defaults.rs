use super::*;

impl Default for MeterConfig {
    fn default() -> Self {
        // SMA Sunny Tripower, GridMs.TotW
        Self {
            name: "inverter".to_string(),
            host: "192.168.178.36".to_string(),
            port: 502,
            unit_id: 3,
            register: 30775,
            format: RegisterFormat::S32,
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            lat: 50.766,
            lon: 6.611,
            base_url: "http://api.openweathermap.org/data/2.5/onecall".to_string(),
            timeout_seconds: 10,
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            gpio_pin: 27,
            sysfs_root: "/sys/class/gpio".to_string(),
            dry_run: false,
        }
    }
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self {
            file: "daily-scaling.txt".to_string(),
        }
    }
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            counter_reset: CounterResetPolicy::Daily,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            console_level: None,
            file_level: None,
            file: "/tmp/pv-switcher.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for CycleLogConfig {
    fn default() -> Self {
        Self {
            file: "pv-switching-log.txt".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threshold_watts: 1200,
            interval_minutes: 0.2,
            minimum_on_time_minutes: 1.0,
            maximum_on_time_minutes: 5.0,
            meters: vec![MeterConfig::default()],
            weather: WeatherConfig::default(),
            relay: RelayConfig::default(),
            scaling: ScalingConfig::default(),
            controls: ControlsConfig::default(),
            logging: LoggingConfig::default(),
            cycle_log: CycleLogConfig::default(),
            timezone: "local".to_string(),
            debug: false,
        }
    }
}
