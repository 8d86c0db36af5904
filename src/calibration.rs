use core::fmt;

use crate::ms5837::PROM_WORDS;

/// CRC4 over the PROM contents, as given in the MS5837 datasheet.
///
/// The CRC nibble in the top of word 0 is masked off and a zero word is
/// appended before the remainder is computed.
pub fn crc4(prom: &[u16; PROM_WORDS]) -> u8 {
    let mut n_prom = [0u16; PROM_WORDS + 1];
    n_prom[..PROM_WORDS].copy_from_slice(prom);
    n_prom[0] &= 0x0FFF;

    let mut n_rem: u16 = 0x00;

    for i in 0..16 {
        let word = n_prom[i >> 1];
        if i % 2 == 1 {
            n_rem ^= word & 0x00FF;
        } else {
            n_rem ^= word >> 8;
        }
        for _ in 0..8 {
            if (n_rem & 0x8000) != 0 {
                n_rem = (n_rem << 1) ^ 0x3000;
            } else {
                n_rem <<= 1;
            }
        }
    }

    ((n_rem >> 12) & 0xF) as u8 // final 4-bit CRC
}

/// PROM failed its CRC4 check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IntegrityError {
    /// CRC read from the top nibble of word 0.
    pub transmitted: u8,
    /// CRC computed over the words that were read.
    pub computed: u8,
}

impl fmt::Display for IntegrityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PROM read error, CRC failed (transmitted {:#x}, computed {:#x})",
            self.transmitted, self.computed
        )
    }
}

impl core::error::Error for IntegrityError {}

/// Factory calibration that passed its CRC check.
///
/// The only way to get one is [`Calibration::load`], so holding a
/// `Calibration` means the coefficients are good to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Calibration {
    /// Coefficients in PROM order, CRC nibble cleared from word 0.
    c: [u16; PROM_WORDS],
    crc: u8,
}

impl Calibration {
    /// Validate the seven raw PROM words.
    pub fn load(raw: [u16; PROM_WORDS]) -> Result<Self, IntegrityError> {
        let transmitted = ((raw[0] & 0xF000) >> 12) as u8;
        let computed = crc4(&raw);
        if transmitted != computed {
            warn!(
                "PROM CRC mismatch: transmitted {=u8:#x}, computed {=u8:#x}",
                transmitted, computed
            );
            return Err(IntegrityError {
                transmitted,
                computed,
            });
        }

        let mut c = raw;
        c[0] &= 0x0FFF;
        Ok(Self { c, crc: transmitted })
    }

    /// Coefficient `index`, `None` past word 6. Word 0 has its CRC nibble cleared.
    pub fn coefficient(&self, index: usize) -> Option<u16> {
        self.c.get(index).copied()
    }

    pub fn words(&self) -> &[u16; PROM_WORDS] {
        &self.c
    }

    pub fn crc(&self) -> u8 {
        self.crc
    }

    /// Word 0 without the CRC nibble (factory defined bits).
    pub fn factory(&self) -> u16 {
        self.c[0]
    }

    // SENS_T1
    pub fn c1(&self) -> u16 {
        self.c[1]
    }

    // OFF_T1
    pub fn c2(&self) -> u16 {
        self.c[2]
    }

    // TCS
    pub fn c3(&self) -> u16 {
        self.c[3]
    }

    // TCO
    pub fn c4(&self) -> u16 {
        self.c[4]
    }

    // T_REF
    pub fn c5(&self) -> u16 {
        self.c[5]
    }

    // TEMPSENS
    pub fn c6(&self) -> u16 {
        self.c[6]
    }
}
