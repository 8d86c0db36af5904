use core::fmt;

use crate::compensation::Reading;
use crate::units;

pub const CSV_HEADER: &str = "temperature_c,pressure_mbar,depth_m,altitude_m,fresh\r\n";

/// One reading in engineering units, as streamed to the host.
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BaroData {
    pub temperature: f32, // °C
    pub pressure: f32,    // mbar
    pub depth: f32,       // m
    pub altitude: f32,    // m
}

impl BaroData {
    pub fn from_reading(reading: &Reading, fluid_density: f32) -> Self {
        let mbar = reading.mbar();
        Self {
            temperature: reading.celsius(),
            pressure: mbar,
            depth: units::depth(mbar * 100.0, fluid_density),
            altitude: units::altitude(mbar),
        }
    }
}

/// CSV line for one packet, matching [`CSV_HEADER`].
pub struct CsvRow<'a> {
    pub data: &'a BaroData,
    pub fresh: bool,
}

impl fmt::Display for CsvRow<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2},{:.1},{:.3},{:.1},{}\r\n",
            self.data.temperature,
            self.data.pressure,
            self.data.depth,
            self.data.altitude,
            self.fresh as u8,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::Calibration;
    use crate::calibration::tests::PROM_30BA;
    use crate::compensation::{RawSample, compensate};
    use crate::ms5837::Model;

    fn bar30_sample() -> Reading {
        let cal = Calibration::load(PROM_30BA).unwrap();
        compensate(Model::Bar30, &cal, RawSample::new(6_465_444, 8_077_636))
    }

    #[test]
    fn header_has_one_column_per_field() {
        let data = BaroData::default();
        let row = CsvRow { data: &data, fresh: false }.to_string();
        assert_eq!(CSV_HEADER.split(',').count(), row.split(',').count());
        assert!(CSV_HEADER.starts_with("temperature_c,pressure_mbar,depth_m,altitude_m"));
        assert!(row.ends_with("\r\n"));
    }

    #[test]
    fn row_from_reading() {
        let data = BaroData::from_reading(&bar30_sample(), units::DENSITY_SALTWATER);
        assert!((data.temperature - 58.93).abs() < 1e-4);
        assert!((data.pressure - 15_145.4).abs() < 0.01);
        // (1514540 - 101300) Pa over 1029 * 9.80665
        assert!((data.depth - 140.049).abs() < 1e-3, "depth {}", data.depth);
        assert!(data.altitude < 0.0);

        let row = CsvRow { data: &data, fresh: true }.to_string();
        assert!(row.starts_with("58.93,15145.4,140.049,"), "row {row}");
        assert!(row.ends_with(",1\r\n"));
    }

    #[test]
    fn stale_rows_are_flagged() {
        let data = BaroData::from_reading(&bar30_sample(), units::DENSITY_FRESHWATER);
        let row = CsvRow { data: &data, fresh: false }.to_string();
        assert!(row.ends_with(",0\r\n"));
    }
}
