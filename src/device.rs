use crate::calibration::Calibration;
use crate::compensation::{Reading, compensate};
use crate::error::Error;
use crate::ms5837::{Model, Oversampling};
use crate::transport::Transport;
use crate::units::{self, DENSITY_FRESHWATER, PressureUnit};

/// Sensor setup chosen by the application.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub model: Model,
    pub fluid_density: f32, // kg/m^3, for depth
    // PROM reads before giving up on a CRC mismatch, zero counts as one
    pub prom_attempts: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self::bar30()
    }
}

impl Config {
    pub const fn bar02() -> Self {
        Self {
            model: Model::Bar02,
            fluid_density: DENSITY_FRESHWATER,
            prom_attempts: 1,
        }
    }

    pub const fn bar30() -> Self {
        Self {
            model: Model::Bar30,
            fluid_density: DENSITY_FRESHWATER,
            prom_attempts: 1,
        }
    }

    pub const fn with_fluid_density(mut self, density: f32) -> Self {
        self.fluid_density = density;
        self
    }

    pub const fn with_prom_attempts(mut self, attempts: u8) -> Self {
        self.prom_attempts = attempts;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Measurement {
    pub temperature: f32, // °C
    pub pressure: f32,    // unit that was asked for
}

/// An initialized MS5837.
pub struct Ms5837<T> {
    transport: T,
    model: Model,
    calibration: Calibration,
    fluid_density: f32,
    last: Option<Reading>,
}

impl<T: Transport> Ms5837<T> {
    /// Reset the sensor and load its calibration.
    ///
    /// Fails if the bus fails or if every PROM read attempt fails its CRC.
    pub fn initialize(mut transport: T, config: Config) -> Result<Self, Error<T::Error>> {
        transport.reset().map_err(Error::I2c)?;

        let attempts = config.prom_attempts.max(1);
        let mut attempt = 1;
        let calibration = loop {
            let words = transport.read_calibration_words().map_err(Error::I2c)?;
            match Calibration::load(words) {
                Ok(cal) => break cal,
                Err(_) if attempt < attempts => {
                    warn!("PROM attempt {=u8} of {=u8} failed", attempt, attempts);
                    attempt += 1;
                }
                Err(e) => return Err(Error::Integrity(e)),
            }
        };

        info!("{=str} initialized, PROM CRC {=u8:#x}", config.model.name(), calibration.crc());

        Ok(Self {
            transport,
            model: config.model,
            calibration,
            fluid_density: config.fluid_density,
            last: None,
        })
    }

    /// Take a fresh reading and compensate it.
    pub fn read_raw(&mut self, osr: Oversampling) -> Result<Reading, Error<T::Error>> {
        let raw = self.transport.read_raw_sample(osr).map_err(Error::I2c)?;
        let reading = compensate(self.model, &self.calibration, raw);
        self.last = Some(reading);
        Ok(reading)
    }

    /// Temperature in °C and pressure in `unit`.
    pub fn read(
        &mut self,
        unit: PressureUnit,
        osr: Oversampling,
    ) -> Result<Measurement, Error<T::Error>> {
        let reading = self.read_raw(osr)?;
        Ok(Measurement {
            temperature: reading.celsius(),
            pressure: reading.pressure_in(unit),
        })
    }

    /// Same as [`read`](Self::read) with the oversampling as an index, 0 (256)
    /// through 5 (8192). Nothing is sent to the sensor for a bad index.
    pub fn read_indexed(
        &mut self,
        unit: PressureUnit,
        osr_index: u8,
    ) -> Result<Measurement, Error<T::Error>> {
        let osr = Oversampling::try_from(osr_index)?;
        self.read(unit, osr)
    }

    pub fn read_temperature(&mut self, osr: Oversampling) -> Result<f32, Error<T::Error>> {
        Ok(self.read_raw(osr)?.celsius())
    }

    pub fn read_pressure(
        &mut self,
        unit: PressureUnit,
        osr: Oversampling,
    ) -> Result<f32, Error<T::Error>> {
        Ok(self.read_raw(osr)?.pressure_in(unit))
    }

    /// Depth in metres below the surface of the configured fluid.
    pub fn depth(&mut self, osr: Oversampling) -> Result<f32, Error<T::Error>> {
        let pa = self.read_pressure(PressureUnit::Pa, osr)?;
        Ok(units::depth(pa, self.fluid_density))
    }

    /// Altitude in metres above mean sea level.
    pub fn altitude(&mut self, osr: Oversampling) -> Result<f32, Error<T::Error>> {
        let mbar = self.read_pressure(PressureUnit::Mbar, osr)?;
        Ok(units::altitude(mbar))
    }
}

impl<T> Ms5837<T> {
    pub fn last_reading(&self) -> Option<Reading> {
        self.last
    }

    pub fn model(&self) -> Model {
        self.model
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn fluid_density(&self) -> f32 {
        self.fluid_density
    }

    pub fn set_fluid_density(&mut self, density: f32) {
        self.fluid_density = density;
    }

    pub fn release(self) -> T {
        self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::tests::PROM_30BA;
    use crate::compensation::RawSample;
    use crate::ms5837::PROM_WORDS;
    use crate::transport::I2cTransport;
    use crate::transport::tests::{prom_transactions, sample_transactions};
    use crate::units::DENSITY_SALTWATER;
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};
    use std::vec::Vec;

    // D1 = 6465444, D2 = 8077636
    const D1_BYTES: [u8; 3] = [0x62, 0xA7, 0xA4];
    const D2_BYTES: [u8; 3] = [0x7B, 0x41, 0x44];

    /// Transport that replays canned PROM dumps and samples.
    struct FakeTransport {
        proms: Vec<[u16; PROM_WORDS]>,
        samples: Vec<RawSample>,
        resets: usize,
    }

    impl FakeTransport {
        fn new(proms: &[[u16; PROM_WORDS]], samples: &[RawSample]) -> Self {
            Self {
                proms: proms.iter().rev().copied().collect(),
                samples: samples.iter().rev().copied().collect(),
                resets: 0,
            }
        }
    }

    impl Transport for FakeTransport {
        type Error = ErrorKind;

        fn reset(&mut self) -> Result<(), Self::Error> {
            self.resets += 1;
            Ok(())
        }

        fn read_calibration_words(&mut self) -> Result<[u16; PROM_WORDS], Self::Error> {
            self.proms.pop().ok_or(ErrorKind::Other)
        }

        fn read_raw_sample(&mut self, _osr: Oversampling) -> Result<RawSample, Self::Error> {
            self.samples.pop().ok_or(ErrorKind::Other)
        }
    }

    fn corrupted() -> [u16; PROM_WORDS] {
        let mut prom = PROM_30BA;
        prom[3] ^= 0x0100;
        prom
    }

    #[test]
    fn sample_bytes_match_golden_inputs() {
        assert_eq!(RawSample::adc_value(D1_BYTES), 6_465_444);
        assert_eq!(RawSample::adc_value(D2_BYTES), 8_077_636);
    }

    #[test]
    fn initialize_and_read_over_i2c() {
        let mut expectations = vec![I2cTransaction::write(0x76, vec![0x1E])];
        expectations.extend(prom_transactions(&PROM_30BA));
        expectations.extend(sample_transactions(Oversampling::Osr8192, D1_BYTES, D2_BYTES));
        let i2c = I2cMock::new(&expectations);

        let transport = I2cTransport::new(i2c, NoopDelay::new());
        let mut sensor = Ms5837::initialize(transport, Config::bar30()).unwrap();
        assert_eq!(sensor.model(), Model::Bar30);
        assert_eq!(sensor.calibration().crc(), 0xA);
        assert_eq!(sensor.last_reading(), None);

        let m = sensor.read(PressureUnit::Mbar, Oversampling::Osr8192).unwrap();
        assert!((m.temperature - 58.93).abs() < 1e-4);
        assert!((m.pressure - 15_145.4).abs() < 1e-2);

        let last = sensor.last_reading().unwrap();
        assert_eq!(last.temperature, 5893);
        assert_eq!(last.pressure, 151_454);

        let (mut i2c, _) = sensor.release().release();
        i2c.done();
    }

    #[test]
    fn initialize_fails_on_corrupted_prom() {
        let mut expectations = vec![I2cTransaction::write(0x76, vec![0x1E])];
        expectations.extend(prom_transactions(&corrupted()));
        let mut i2c = I2cMock::new(&expectations);

        // The transport is consumed on failure, keep a handle to check it.
        let transport = I2cTransport::new(i2c.clone(), NoopDelay::new());
        match Ms5837::initialize(transport, Config::bar30()) {
            Err(Error::Integrity(e)) => assert_eq!(e.transmitted, 0xA),
            Err(e) => panic!("unexpected error {e:?}"),
            Ok(_) => panic!("corrupted PROM accepted"),
        }
        i2c.done();
    }

    #[test]
    fn reset_failure_is_a_bus_error() {
        let mut i2c = I2cMock::new(&[
            I2cTransaction::write(0x76, vec![0x1E]).with_error(ErrorKind::NoAcknowledge(
                embedded_hal::i2c::NoAcknowledgeSource::Address,
            )),
        ]);
        let transport = I2cTransport::new(i2c.clone(), NoopDelay::new());
        assert!(matches!(
            Ms5837::initialize(transport, Config::bar30()),
            Err(Error::I2c(ErrorKind::NoAcknowledge(_)))
        ));
        i2c.done();
    }

    #[test]
    fn prom_is_reread_when_retries_are_allowed() {
        let transport = FakeTransport::new(&[corrupted(), PROM_30BA], &[]);
        let sensor =
            Ms5837::initialize(transport, Config::bar30().with_prom_attempts(2)).unwrap();
        assert_eq!(sensor.calibration().c3(), 20328);
        let transport = sensor.release();
        assert_eq!(transport.resets, 1);
        assert!(transport.proms.is_empty());
    }

    #[test]
    fn retries_are_bounded() {
        let transport = FakeTransport::new(&[corrupted(), corrupted(), PROM_30BA], &[]);
        let result = Ms5837::initialize(transport, Config::bar30().with_prom_attempts(2));
        assert!(matches!(result, Err(Error::Integrity(_))));
    }

    #[test]
    fn zero_attempts_still_reads_once() {
        let transport = FakeTransport::new(&[PROM_30BA], &[]);
        let config = Config::bar02().with_prom_attempts(0);
        let sensor = Ms5837::initialize(transport, config).unwrap();
        assert_eq!(sensor.model(), Model::Bar02);
    }

    #[test]
    fn each_read_replaces_the_last_reading() {
        let samples = [
            RawSample::new(6_465_444, 8_077_636),
            RawSample::new(6_465_444, 6_500_000),
        ];
        let transport = FakeTransport::new(&[PROM_30BA], &samples);
        let mut sensor = Ms5837::initialize(transport, Config::bar30()).unwrap();

        let t = sensor.read_temperature(Oversampling::Osr256).unwrap();
        assert!((t - 58.93).abs() < 1e-4);
        assert_eq!(sensor.last_reading().unwrap().temperature, 5893);

        let p = sensor.read_pressure(PressureUnit::Pa, Oversampling::Osr256).unwrap();
        assert!((p - 1_377_720.0).abs() < 1.0);
        assert_eq!(sensor.last_reading().unwrap().temperature, 963);

        // Out of samples: the error surfaces and the cache is left alone.
        assert!(matches!(
            sensor.read_raw(Oversampling::Osr256),
            Err(Error::I2c(ErrorKind::Other))
        ));
        assert_eq!(sensor.last_reading().unwrap().pressure, 137_772);
    }

    #[test]
    fn read_by_oversampling_index() {
        let transport = FakeTransport::new(&[PROM_30BA], &[RawSample::new(6_465_444, 8_077_636)]);
        let mut sensor = Ms5837::initialize(transport, Config::bar30()).unwrap();

        assert_eq!(
            sensor.read_indexed(PressureUnit::Mbar, 6),
            Err(Error::InvalidOversampling(6))
        );
        assert!(sensor.last_reading().is_none());
        // The bad index did not consume the queued sample.
        let m = sensor.read_indexed(PressureUnit::Mbar, 5).unwrap();
        assert!((m.pressure - 15_145.4).abs() < 0.01);
        assert!((m.temperature - 58.93).abs() < 1e-4);
    }

    #[test]
    fn depth_uses_configured_density() {
        // 15145.4 mbar, 1514540 Pa
        let reading = RawSample::new(6_465_444, 8_077_636);
        let transport = FakeTransport::new(&[PROM_30BA], &[reading, reading]);
        let config = Config::bar30().with_fluid_density(DENSITY_SALTWATER);
        let mut sensor = Ms5837::initialize(transport, config).unwrap();
        assert_eq!(sensor.fluid_density(), DENSITY_SALTWATER);

        let salt = sensor.depth(Oversampling::Osr8192).unwrap();
        let expected = (1_514_540.0 - 101_300.0) / (DENSITY_SALTWATER * 9.80665);
        assert!((salt - expected).abs() < 1e-2, "depth {salt}");

        sensor.set_fluid_density(DENSITY_FRESHWATER);
        let fresh = sensor.depth(Oversampling::Osr8192).unwrap();
        assert!(fresh > salt);
    }

    #[test]
    fn altitude_reads_pressure() {
        let transport = FakeTransport::new(&[PROM_30BA], &[RawSample::new(6_465_444, 8_077_636)]);
        let mut sensor = Ms5837::initialize(transport, Config::bar30()).unwrap();
        // 15 bar is far below sea level.
        assert!(sensor.altitude(Oversampling::Osr8192).unwrap() < 0.0);
        assert!(sensor.last_reading().is_some());
    }
}
