//! Physical constants.
//!
//! The gravity and accretion engines work in astronomical units: lengths in
//! AU, masses in solar masses, time in years. SI values are provided for
//! converting results for reporting.

use std::f64::consts::PI;

/// Gravitational constant in AU³ / (M☉ · yr²).
pub const G_ASTRO: f64 = 4.0 * PI * PI;

/// Gravitational constant in m³ / (kg · s²).
pub const G_SI: f64 = 6.674_30e-11;

/// Astronomical unit in metres.
pub const AU: f64 = 1.495_978_707e11;

/// Solar mass in kilograms.
pub const SOLAR_MASS: f64 = 1.988_47e30;

/// Earth mass in kilograms.
pub const EARTH_MASS: f64 = 5.972_2e24;

/// Earth mass in solar masses.
pub const EARTH_MASS_SOLAR: f64 = EARTH_MASS / SOLAR_MASS;

/// Earth radius in metres.
pub const EARTH_RADIUS: f64 = 6.371e6;

/// Jupiter radius in metres.
pub const JUPITER_RADIUS: f64 = 6.991_1e7;

/// Solar radius in metres.
pub const SOLAR_RADIUS: f64 = 6.957e8;

/// Solar luminosity in watts.
pub const SOLAR_LUMINOSITY: f64 = 3.828e26;

/// Julian year in seconds.
pub const YEAR: f64 = 3.155_76e7;

/// Density of rock (kg/m³), used as the default body density.
pub const ROCK_DENSITY: f64 = 3000.0;

/// Converts a density in kg/m³ to M☉/AU³.
pub fn density_to_astro(kg_per_m3: f64) -> f64 {
    kg_per_m3 * AU * AU * AU / SOLAR_MASS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_astro_g_matches_si() {
        // G in SI converted to AU³/(M☉·yr²) should agree with 4π² within 0.1%
        let converted = G_SI * SOLAR_MASS * YEAR * YEAR / (AU * AU * AU);
        assert!((converted - G_ASTRO).abs() / G_ASTRO < 1e-3);
    }

    #[test]
    fn test_density_conversion_positive() {
        assert!(density_to_astro(ROCK_DENSITY) > 0.0);
    }
}
