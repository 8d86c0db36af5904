// kg/m^3
pub const DENSITY_FRESHWATER: f32 = 997.0;
pub const DENSITY_SALTWATER: f32 = 1029.0;

pub const GRAVITY: f32 = 9.80665; // m/s^2
pub const SURFACE_PRESSURE_PA: f32 = 101_300.0; // depth zero
pub const SEA_LEVEL_MBAR: f32 = 1013.25;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PressureUnit {
    Pa,
    HPa,
    KPa,
    Mbar,
    Bar,
    Atm,
    Torr,
    #[default]
    Psi,
}

impl PressureUnit {
    /// Factor to go from mbar to this unit.
    pub const fn multiplier(self) -> f32 {
        match self {
            PressureUnit::Pa => 100.0,
            PressureUnit::HPa => 1.0,
            PressureUnit::KPa => 0.1,
            PressureUnit::Mbar => 1.0,
            PressureUnit::Bar => 0.001,
            PressureUnit::Atm => 0.000986923,
            PressureUnit::Torr => 0.750062,
            PressureUnit::Psi => 0.014503773773022,
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            PressureUnit::Pa => "Pa",
            PressureUnit::HPa => "hPa",
            PressureUnit::KPa => "kPa",
            PressureUnit::Mbar => "mbar",
            PressureUnit::Bar => "bar",
            PressureUnit::Atm => "atm",
            PressureUnit::Torr => "Torr",
            PressureUnit::Psi => "psi",
        }
    }
}

/// Depth below the surface in metres for a fluid of `density` kg/m^3.
pub fn depth(pressure_pa: f32, density: f32) -> f32 {
    (pressure_pa - SURFACE_PRESSURE_PA) / (density * GRAVITY)
}

/// Altitude above mean sea level in metres, international barometric formula.
pub fn altitude(pressure_mbar: f32) -> f32 {
    // 145366.45 ft converted to metres
    (1.0 - libm::powf(pressure_mbar / SEA_LEVEL_MBAR, 0.190284)) * 145_366.45 * 0.3048
}
