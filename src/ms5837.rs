use crate::error::InvalidOversampling;

// address
pub const MS5837_ADDRESS: u8 = 0x76; // fixed, no CSB pin

// commands
pub const RESET_CMD: u8 = 0x1E;
pub const PROM_READ_CMD: u8 = 0xA0;
pub const ADC_READ_CMD: u8 = 0x00;
pub const CONVERT_PRESSURE_CMD: u8 = 0x40;
pub const CONVERT_TEMP_CMD: u8 = 0x50;

pub const PROM_WORDS: usize = 7; // CRC word included
pub const RESET_DELAY_MS: u32 = 10; // datasheet max is 2.8 ms

/// Which MS5837 variant is on the bus. Fixed for the life of the handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Model {
    Bar02, // 0 to 2 bar, pressure in 0.01 mbar
    Bar30, // 0 to 30 bar, pressure in 0.1 mbar
}

// scaling of the first order formulas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelConstants {
    pub sens_t1: i64, // C1 * x
    pub off_t1: i64,  // C2 * x
    pub tcs: i64,     // C3 * dT / x
    pub tco: i64,     // C4 * dT / x
    pub pressure: i64,
    pub counts_per_mbar: f32,
}

const BAR02: ModelConstants = ModelConstants {
    sens_t1: 65_536,
    off_t1: 131_072,
    tcs: 128,
    tco: 64,
    pressure: 32_768,
    counts_per_mbar: 100.0,
};

const BAR30: ModelConstants = ModelConstants {
    sens_t1: 32_768,
    off_t1: 65_536,
    tcs: 256,
    tco: 128,
    pressure: 8_192,
    counts_per_mbar: 10.0,
};

impl Model {
    pub const fn constants(self) -> &'static ModelConstants {
        match self {
            Model::Bar02 => &BAR02,
            Model::Bar30 => &BAR30,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Model::Bar02 => "MS5837-02BA",
            Model::Bar30 => "MS5837-30BA",
        }
    }
}

/// ADC oversampling ratio. Higher ratios are slower and less noisy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Oversampling {
    Osr256 = 0,
    Osr512 = 1,
    Osr1024 = 2,
    Osr2048 = 3,
    Osr4096 = 4,
    Osr8192 = 5,
}

impl Oversampling {
    pub const fn convert_pressure_cmd(self) -> u8 {
        CONVERT_PRESSURE_CMD + 2 * self as u8
    }

    pub const fn convert_temperature_cmd(self) -> u8 {
        CONVERT_TEMP_CMD + 2 * self as u8
    }

    // datasheet max is about 2.2 us per sample, wait 2.5
    pub const fn conversion_time_us(self) -> u32 {
        (1u32 << (8 + self as u32)) * 5 / 2
    }

    pub const fn ratio(self) -> u16 {
        1 << (8 + self as u16)
    }
}

impl TryFrom<u8> for Oversampling {
    type Error = InvalidOversampling;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Ok(match index {
            0 => Oversampling::Osr256,
            1 => Oversampling::Osr512,
            2 => Oversampling::Osr1024,
            3 => Oversampling::Osr2048,
            4 => Oversampling::Osr4096,
            5 => Oversampling::Osr8192,
            _ => return Err(InvalidOversampling(index)),
        })
    }
}

pub const fn prom_read_cmd(index: u8) -> u8 {
    PROM_READ_CMD + 2 * index
}
