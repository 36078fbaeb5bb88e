//! Late-blight (tizón tardío) monitoring stations around Castro.
//!
//! There is no live station network yet; readings are derived from the
//! dashboard's current weather. A real INIA integration would replace
//! [`station_readings`] while keeping the same shape.

use chrono::Utc;

use crate::model::{RiskLevel, StationReading, StationStatus, WeatherReading};

/// Station name and locality, fixed for the program area.
pub const STATIONS: [(&str, &str); 3] =
    [("PIDPID", "Castro"), ("QUILQUICO", "Castro"), ("ISLA CHELIN", "Castro")];

/// Served when no weather reading exists at all.
const FALLBACK_TEMPERATURE_C: i32 = 18;
const FALLBACK_HUMIDITY_PCT: u8 = 85;

/// Pure derivation: every station copies temperature and humidity from the
/// latest weather reading at call time. No network access.
pub fn station_readings(latest: Option<&WeatherReading>) -> Vec<StationReading> {
    let (temperature_c, humidity_pct) = match latest {
        Some(reading) => (reading.temperature_c, reading.humidity_pct),
        None => (FALLBACK_TEMPERATURE_C, FALLBACK_HUMIDITY_PCT),
    };
    let now = Utc::now();

    STATIONS
        .iter()
        .map(|(station, location)| StationReading {
            station: (*station).to_string(),
            location: (*location).to_string(),
            status: StationStatus::Green,
            risk: RiskLevel::Low,
            temperature_c,
            humidity_pct,
            last_update: now,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::weather::fallback_reading;

    #[test]
    fn three_fixed_stations_all_green_low() {
        let readings = station_readings(None);

        assert_eq!(readings.len(), 3);
        let names: Vec<&str> = readings.iter().map(|r| r.station.as_str()).collect();
        assert_eq!(names, ["PIDPID", "QUILQUICO", "ISLA CHELIN"]);
        assert!(readings.iter().all(|r| r.status == StationStatus::Green));
        assert!(readings.iter().all(|r| r.risk == RiskLevel::Low));
    }

    #[test]
    fn stations_copy_latest_weather_values() {
        let mut weather = fallback_reading();
        weather.temperature_c = 23;
        weather.humidity_pct = 61;

        let readings = station_readings(Some(&weather));

        assert!(readings.iter().all(|r| r.temperature_c == 23));
        assert!(readings.iter().all(|r| r.humidity_pct == 61));
    }

    #[test]
    fn stations_fall_back_to_canonical_values_without_weather() {
        let readings = station_readings(None);

        assert!(readings.iter().all(|r| r.temperature_c == 18));
        assert!(readings.iter().all(|r| r.humidity_pct == 85));
    }
}
