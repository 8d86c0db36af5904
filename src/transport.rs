//! Bus access to the sensor.
//!
//! [`Transport`] is what the device handle needs from the bus: the PROM words
//! and pairs of raw samples. [`I2cTransport`] implements it over any
//! `embedded-hal` I2C bus.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::compensation::RawSample;
use crate::ms5837::{
    ADC_READ_CMD, MS5837_ADDRESS, Oversampling, PROM_WORDS, RESET_CMD, RESET_DELAY_MS,
    prom_read_cmd,
};

/// Source of calibration words and raw samples.
pub trait Transport {
    type Error;

    /// Reload the PROM into the sensor's internal registers.
    fn reset(&mut self) -> Result<(), Self::Error>;

    /// The seven PROM words, CRC nibble still in word 0.
    fn read_calibration_words(&mut self) -> Result<[u16; PROM_WORDS], Self::Error>;

    /// Convert and read D1 then D2.
    fn read_raw_sample(&mut self, osr: Oversampling) -> Result<RawSample, Self::Error>;
}

/// MS5837 on an I2C bus.
pub struct I2cTransport<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
}

impl<I2C, D> I2cTransport<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self {
            i2c,
            delay,
            address: MS5837_ADDRESS,
        }
    }

    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    fn read_word(&mut self, cmd: u8) -> Result<u16, I2C::Error> {
        let mut buf = [0u8; 2];
        self.i2c.write_read(self.address, &[cmd], &mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    fn convert_and_read(&mut self, cmd: u8, osr: Oversampling) -> Result<u32, I2C::Error> {
        self.i2c.write(self.address, &[cmd])?;
        self.delay.delay_us(osr.conversion_time_us());

        let mut buf = [0u8; 3];
        self.i2c.write_read(self.address, &[ADC_READ_CMD], &mut buf)?;
        Ok(RawSample::adc_value(buf))
    }
}

impl<I2C, D> Transport for I2cTransport<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    type Error = I2C::Error;

    fn reset(&mut self) -> Result<(), Self::Error> {
        self.i2c.write(self.address, &[RESET_CMD])?;
        self.delay.delay_ms(RESET_DELAY_MS);
        Ok(())
    }

    fn read_calibration_words(&mut self) -> Result<[u16; PROM_WORDS], Self::Error> {
        let mut prom = [0u16; PROM_WORDS];
        for (i, word) in prom.iter_mut().enumerate() {
            *word = self.read_word(prom_read_cmd(i as u8))?;
        }
        debug!("PROM: {:#06x}", prom);
        Ok(prom)
    }

    fn read_raw_sample(&mut self, osr: Oversampling) -> Result<RawSample, Self::Error> {
        let d1 = self.convert_and_read(osr.convert_pressure_cmd(), osr)?;
        let d2 = self.convert_and_read(osr.convert_temperature_cmd(), osr)?;
        trace!("D1={=u32:#08x} D2={=u32:#08x}", d1, d2);
        Ok(RawSample { d1, d2 })
    }
}
