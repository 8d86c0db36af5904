//! First and second order temperature compensation.
//!
//! All arithmetic is 64-bit integer, following the datasheet. Rust's `/` on
//! signed integers truncates toward zero, which is what the reference
//! formulas expect; shifts would floor negative intermediates instead and are
//! deliberately not used here.

use crate::calibration::Calibration;
use crate::ms5837::Model;
use crate::units::PressureUnit;

/// Raw 24-bit ADC results of one reading.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample {
    pub d1: u32,
    pub d2: u32,
}

impl RawSample {
    pub const fn new(d1: u32, d2: u32) -> Self {
        Self { d1, d2 }
    }

    /// Big-endian 24-bit ADC value as clocked out by the sensor.
    pub const fn adc_value(bytes: [u8; 3]) -> u32 {
        (bytes[0] as u32) << 16 | (bytes[1] as u32) << 8 | bytes[2] as u32
    }
}

/// First order intermediates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirstOrder {
    /// Difference between actual and reference temperature.
    pub dt: i64,
    /// Actual temperature, 0.01 °C.
    pub temp: i64,
    pub off: i64,
    pub sens: i64,
    /// Temperature compensated pressure before second order correction.
    pub pressure: i64,
}

impl FirstOrder {
    pub fn compute(model: Model, cal: &Calibration, raw: RawSample) -> Self {
        let k = model.constants();
        let d1 = raw.d1 as i64;
        let d2 = raw.d2 as i64;

        let dt = d2 - cal.c5() as i64 * 256;
        let temp = 2000 + dt * cal.c6() as i64 / 8_388_608;
        let sens = cal.c1() as i64 * k.sens_t1 + (cal.c3() as i64 * dt) / k.tcs;
        let off = cal.c2() as i64 * k.off_t1 + (cal.c4() as i64 * dt) / k.tco;
        let pressure = (d1 * sens / 2_097_152 - off) / k.pressure;

        Self {
            dt,
            temp,
            off,
            sens,
            pressure,
        }
    }
}

/// Second order corrections, subtracted from TEMP, OFF and SENS.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SecondOrder {
    pub ti: i64,
    pub offi: i64,
    pub sensi: i64,
}

impl SecondOrder {
    pub fn compute(model: Model, dt: i64, temp: i64) -> Self {
        match model {
            Model::Bar02 => Self::bar02(dt, temp),
            Model::Bar30 => Self::bar30(dt, temp),
        }
    }

    // The 02BA only corrects below 20 °C. There is no high or very low
    // temperature branch for this part.
    fn bar02(dt: i64, temp: i64) -> Self {
        if temp < 2000 {
            let t = temp - 2000;
            Self {
                ti: 11 * dt * dt / 34_359_738_368,
                offi: 31 * t * t / 8,
                sensi: 63 * t * t / 32,
            }
        } else {
            Self::default()
        }
    }

    fn bar30(dt: i64, temp: i64) -> Self {
        if temp < 2000 {
            let t = temp - 2000;
            let mut corr = Self {
                ti: 3 * dt * dt / 8_589_934_592,
                offi: 3 * t * t / 2,
                sensi: 5 * t * t / 8,
            };
            if temp < -1500 {
                let v = temp + 1500;
                corr.offi += 7 * v * v;
                corr.sensi += 4 * v * v;
            }
            corr
        } else {
            let t = temp - 2000;
            Self {
                ti: 2 * dt * dt / 137_438_953_472,
                offi: t * t / 16,
                sensi: 0,
            }
        }
    }
}

/// A compensated reading in the sensor's native fixed point units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reading {
    /// 0.01 °C.
    pub temperature: i32,
    /// 0.01 mbar on the 02BA, 0.1 mbar on the 30BA.
    pub pressure: i32,
    pub model: Model,
}

impl Reading {
    pub fn celsius(&self) -> f32 {
        self.temperature as f32 / 100.0
    }

    pub fn fahrenheit(&self) -> f32 {
        self.celsius() * 1.8 + 32.0
    }

    pub fn kelvin(&self) -> f32 {
        self.celsius() + 273.15
    }

    pub fn mbar(&self) -> f32 {
        self.pressure as f32 / self.model.constants().counts_per_mbar
    }

    pub fn pressure_in(&self, unit: PressureUnit) -> f32 {
        self.mbar() * unit.multiplier()
    }
}

/// Compensate one raw sample against a validated calibration.
pub fn compensate(model: Model, cal: &Calibration, raw: RawSample) -> Reading {
    let first = FirstOrder::compute(model, cal, raw);
    let second = SecondOrder::compute(model, first.dt, first.temp);

    let off2 = first.off - second.offi;
    let sens2 = first.sens - second.sensi;
    let temp = first.temp - second.ti;
    let pressure = (raw.d1 as i64 * sens2 / 2_097_152 - off2) / model.constants().pressure;

    trace!(
        "dT={=i64} TEMP={=i64} Ti={=i64} OFFi={=i64} SENSi={=i64}",
        first.dt, first.temp, second.ti, second.offi, second.sensi
    );

    Reading {
        temperature: temp as i32,
        pressure: pressure as i32,
        model,
    }
}
