//! International Standard Atmosphere model.
//!
//! Expected page output is derived from the altitude that gets typed into the
//! calculator instead of being hard-coded, so the numbers here must match the
//! calculator's own model constant for constant: a troposphere with a linear
//! lapse rate up to 11 km and an isothermal layer above it.
//!
//! Formatting follows the page as well: [`to_fixed`] reproduces the fixed-point
//! rendering used for every value in the readout.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::result::{ProbeError, ProbeResult};

/// Sea level temperature (K)
pub const SEA_LEVEL_TEMPERATURE: f64 = 288.15;
/// Sea level pressure (Pa)
pub const SEA_LEVEL_PRESSURE: f64 = 101_325.0;
/// Gravitational acceleration (m/s²)
pub const GRAVITY: f64 = 9.80665;
/// Specific gas constant for air (J/(kg·K))
pub const GAS_CONSTANT: f64 = 287.05;
/// Temperature lapse rate in the troposphere (K/m)
pub const LAPSE_RATE: f64 = -0.0065;
/// Ratio of specific heats for air
pub const HEAT_CAPACITY_RATIO: f64 = 1.4;
/// Altitude of the tropopause (m)
pub const TROPOPAUSE_ALTITUDE: f64 = 11_000.0;
/// Offset between Kelvin and Celsius
pub const KELVIN_OFFSET: f64 = 273.15;

/// Atmospheric state at a given altitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Atmosphere {
    /// Temperature (K)
    pub temperature_k: f64,
    /// Pressure (Pa)
    pub pressure_pa: f64,
    /// Density (kg/m³)
    pub density: f64,
    /// Speed of sound (m/s)
    pub speed_of_sound: f64,
}

impl Atmosphere {
    /// Temperature in degrees Celsius
    #[must_use]
    pub fn temperature_c(&self) -> f64 {
        self.temperature_k - KELVIN_OFFSET
    }
}

fn pressure_exponent() -> f64 {
    -GRAVITY / (LAPSE_RATE * GAS_CONSTANT)
}

fn tropopause_temperature() -> f64 {
    SEA_LEVEL_TEMPERATURE + LAPSE_RATE * TROPOPAUSE_ALTITUDE
}

/// Compute the standard atmosphere at `altitude_m` meters.
///
/// Altitudes at or below the tropopause use the linear lapse rate; above it
/// the temperature is held at the tropopause value and pressure decays
/// exponentially. Negative altitudes extrapolate the troposphere.
pub fn standard_atmosphere(altitude_m: f64) -> ProbeResult<Atmosphere> {
    if !altitude_m.is_finite() {
        return Err(ProbeError::InvalidAltitude {
            message: format!("{altitude_m} is not a finite altitude"),
        });
    }

    let (temperature_k, pressure_pa) = if altitude_m <= TROPOPAUSE_ALTITUDE {
        let t = SEA_LEVEL_TEMPERATURE + LAPSE_RATE * altitude_m;
        let p = SEA_LEVEL_PRESSURE * (t / SEA_LEVEL_TEMPERATURE).powf(pressure_exponent());
        (t, p)
    } else {
        let t_trop = tropopause_temperature();
        let p_trop =
            SEA_LEVEL_PRESSURE * (t_trop / SEA_LEVEL_TEMPERATURE).powf(pressure_exponent());
        let decay = -GRAVITY / (GAS_CONSTANT * t_trop);
        (
            t_trop,
            p_trop * (decay * (altitude_m - TROPOPAUSE_ALTITUDE)).exp(),
        )
    };

    let density = pressure_pa / (GAS_CONSTANT * temperature_k);
    let speed_of_sound = (HEAT_CAPACITY_RATIO * GAS_CONSTANT * temperature_k).sqrt();

    Ok(Atmosphere {
        temperature_k,
        pressure_pa,
        density,
        speed_of_sound,
    })
}

// Extra digits printed past the requested precision to see whether the
// remainder is exactly one half.
const GUARD: usize = 40;

/// Format `value` with exactly `digits` fractional digits, the way the page does.
///
/// Exact halfway cases round away from zero and the sign is kept for negative
/// values that round to zero (`-0.04` → `"-0.0"`), while negative zero itself
/// prints unsigned. Magnitudes of `1e21` and above switch to exponent
/// notation (`6.5e+22`), as `toFixed` does.
#[must_use]
pub fn to_fixed(value: f64, digits: usize) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let sign = if value < 0.0 { "-" } else { "" };
    let magnitude = value.abs();
    if magnitude >= 1e21 {
        // Shortest round-trip digits, with the exponent sign spelled out.
        let exponent = format!("{magnitude:e}").replacen('e', "e+", 1);
        return format!("{sign}{exponent}");
    }

    let wide = format!("{magnitude:.prec$}", prec = digits + GUARD);
    let (head, tail) = wide.split_at(wide.len() - GUARD);
    let is_tie = tail.starts_with('5') && tail[1..].bytes().all(|b| b == b'0');

    let body = if is_tie {
        increment_last_digit(head.trim_end_matches('.'))
    } else {
        format!("{magnitude:.digits$}")
    };

    format!("{sign}{body}")
}

fn increment_last_digit(number: &str) -> String {
    let mut bytes = number.as_bytes().to_vec();
    let mut idx = bytes.len();
    loop {
        if idx == 0 {
            bytes.insert(0, b'1');
            break;
        }
        idx -= 1;
        match bytes[idx] {
            b'.' => continue,
            b'9' => bytes[idx] = b'0',
            digit => {
                bytes[idx] = digit + 1;
                break;
            }
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

/// The strings the calculator renders for an atmospheric state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Readout {
    /// Temperature in Kelvin, 2 decimals
    pub temperature_k: String,
    /// Temperature in Celsius, 1 decimal
    pub temperature_c: String,
    /// Pressure in hPa, 2 decimals
    pub pressure_hpa: String,
    /// Pressure in Pa, no decimals
    pub pressure_pa: String,
    /// Density in kg/m³, 4 decimals
    pub density: String,
    /// Speed of sound in m/s, 1 decimal
    pub speed_of_sound: String,
}

impl Readout {
    /// Render an atmospheric state
    #[must_use]
    pub fn of(atmosphere: &Atmosphere) -> Self {
        Self {
            temperature_k: to_fixed(atmosphere.temperature_k, 2),
            temperature_c: to_fixed(atmosphere.temperature_c(), 1),
            pressure_hpa: to_fixed(atmosphere.pressure_pa / 100.0, 2),
            pressure_pa: to_fixed(atmosphere.pressure_pa, 0),
            density: to_fixed(atmosphere.density, 4),
            speed_of_sound: to_fixed(atmosphere.speed_of_sound, 1),
        }
    }
}

/// An altitude as typed into the page, together with its numeric value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Altitude {
    text: String,
    meters: f64,
}

impl Altitude {
    /// Parse an altitude the way the calculator accepts it.
    ///
    /// Surrounding whitespace is ignored; empty input and non-finite values are
    /// rejected. Negative altitudes are allowed.
    pub fn parse(input: &str) -> ProbeResult<Self> {
        let text = input.trim();
        if text.is_empty() {
            return Err(ProbeError::InvalidAltitude {
                message: "altitude is empty".to_string(),
            });
        }
        if !is_valid_float(text) {
            return Err(ProbeError::InvalidAltitude {
                message: format!("{text:?} is not a number the altitude input accepts"),
            });
        }
        let meters: f64 = text.parse().map_err(|_| ProbeError::InvalidAltitude {
            message: format!("{text:?} is not a number"),
        })?;
        if !meters.is_finite() {
            return Err(ProbeError::InvalidAltitude {
                message: format!("{text:?} is not a finite altitude"),
            });
        }
        Ok(Self {
            text: text.to_string(),
            meters,
        })
    }

    /// Text typed into the input
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Altitude in meters
    #[must_use]
    pub const fn meters(&self) -> f64 {
        self.meters
    }

    /// Expected page readout for this altitude
    pub fn readout(&self) -> ProbeResult<Readout> {
        standard_atmosphere(self.meters).map(|atm| Readout::of(&atm))
    }
}

/// Whether `text` is a valid floating-point number as a number input sees it.
///
/// The grammar is an optional `-`, then digits and/or `.` followed by digits,
/// then an optional exponent. Anything else (`+5000`, `5000.`, `1_000`) is
/// cleared by the browser before the page can read it.
fn is_valid_float(text: &str) -> bool {
    fn digits(bytes: &[u8]) -> usize {
        bytes.iter().take_while(|b| b.is_ascii_digit()).count()
    }

    let bytes = text.strip_prefix('-').unwrap_or(text).as_bytes();
    let int_len = digits(bytes);
    let mut rest = &bytes[int_len..];
    let mut frac_len = 0;
    if let Some(after_dot) = rest.strip_prefix(b".") {
        frac_len = digits(after_dot);
        if frac_len == 0 {
            return false;
        }
        rest = &after_dot[frac_len..];
    }
    if int_len == 0 && frac_len == 0 {
        return false;
    }
    if let Some(exponent) = rest.strip_prefix(b"e").or_else(|| rest.strip_prefix(b"E")) {
        let exponent = exponent
            .strip_prefix(b"-")
            .or_else(|| exponent.strip_prefix(b"+"))
            .unwrap_or(exponent);
        let exp_len = digits(exponent);
        return exp_len > 0 && exp_len == exponent.len();
    }
    rest.is_empty()
}

/// Parse user input into an [`Altitude`]
pub fn parse_altitude(input: &str) -> ProbeResult<Altitude> {
    Altitude::parse(input)
}

impl Default for Altitude {
    fn default() -> Self {
        Self {
            text: "5000".to_string(),
            meters: 5000.0,
        }
    }
}

impl FromStr for Altitude {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Altitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} m", self.text)
    }
}

/// Preset buttons offered next to the altitude input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AltitudePreset {
    /// Button caption
    pub label: &'static str,
    /// Value the button puts into the input
    pub value: &'static str,
}

impl AltitudePreset {
    /// Accessible name of the preset button
    #[must_use]
    pub fn aria_label(&self) -> String {
        format!("Set altitude to {}", self.label)
    }
}

/// The calculator's presets, in page order
pub const ALTITUDE_PRESETS: [AltitudePreset; 4] = [
    AltitudePreset {
        label: "Sea Level",
        value: "0",
    },
    AltitudePreset {
        label: "1,000 m",
        value: "1000",
    },
    AltitudePreset {
        label: "5,000 m",
        value: "5000",
    },
    AltitudePreset {
        label: "Cruise (11 km)",
        value: "11000",
    },
];
