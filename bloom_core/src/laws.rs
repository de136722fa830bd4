//! Closed-form physical and ecological laws.
//!
//! Pure functions only: no state, no RNG. The engines call these instead of
//! inlining formulas so each relation lives in exactly one place.
//! Gravity-related laws take `g` explicitly so callers pick their unit system
//! (`constants::G_ASTRO` for AU / M☉ / yr).

use std::f64::consts::PI;

// =============================================================================
// ORBITAL MECHANICS
// =============================================================================

/// Circular orbital speed `√(G·M / r)`.
pub fn circular_velocity(g: f64, central_mass: f64, radius: f64) -> f64 {
    (g * central_mass / radius).sqrt()
}

/// Periapsis speed of an ellipse with eccentricity `e`: `v_c·√((1+e)/(1−e))`.
pub fn periapsis_velocity(g: f64, central_mass: f64, radius: f64, eccentricity: f64) -> f64 {
    circular_velocity(g, central_mass, radius) * ((1.0 + eccentricity) / (1.0 - eccentricity)).sqrt()
}

/// Escape speed `√(2·G·M / r)`.
pub fn escape_velocity(g: f64, mass: f64, radius: f64) -> f64 {
    (2.0 * g * mass / radius).sqrt()
}

/// Hill radius `a·(m / 3M)^(1/3)`.
pub fn hill_radius(semi_major_axis: f64, mass: f64, central_mass: f64) -> f64 {
    semi_major_axis * (mass / (3.0 * central_mass)).cbrt()
}

/// Orbital period in years for `a` in AU and `M` in solar masses (Kepler III).
pub fn orbital_period_years(semi_major_axis: f64, central_mass: f64) -> f64 {
    (semi_major_axis.powi(3) / central_mass).sqrt()
}

/// Radius of a uniform sphere of the given mass and density.
pub fn sphere_radius(mass: f64, density: f64) -> f64 {
    (3.0 * mass / (4.0 * PI * density)).cbrt()
}

// =============================================================================
// STELLAR / DISK
// =============================================================================

/// Water-ice frost line in AU for a star of the given luminosity (L☉).
pub fn frost_line(luminosity: f64) -> f64 {
    2.7 * luminosity.sqrt()
}

/// Main-sequence luminosity estimate (L☉) from mass (M☉), `L ∝ M^3.5`.
pub fn main_sequence_luminosity(mass: f64) -> f64 {
    mass.powf(3.5)
}

// =============================================================================
// ECOLOGY
// =============================================================================

/// Logistic growth rate `r·N·(1 − N/K)`.
///
/// Negative above capacity (density-dependent suppression).
pub fn logistic_growth(rate: f64, population: f64, capacity: f64) -> f64 {
    rate * population * (1.0 - population / capacity)
}

/// Mass-action predation flux `a·N·P`.
pub fn predation_flux(rate: f64, prey: f64, predators: f64) -> f64 {
    rate * prey * predators
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use bloom_env::constants::G_ASTRO;

    #[test]
    fn test_earth_orbit() {
        // 1 AU around 1 M☉: v = 2π AU/yr, period = 1 yr
        assert_relative_eq!(circular_velocity(G_ASTRO, 1.0, 1.0), 2.0 * PI, epsilon = 1e-12);
        assert_relative_eq!(orbital_period_years(1.0, 1.0), 1.0);
        assert_relative_eq!(escape_velocity(G_ASTRO, 1.0, 1.0), 2.0 * PI * 2f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_periapsis_reduces_to_circular() {
        assert_relative_eq!(
            periapsis_velocity(G_ASTRO, 1.0, 2.0, 0.0),
            circular_velocity(G_ASTRO, 1.0, 2.0)
        );
    }

    #[test]
    fn test_hill_radius_earth() {
        // Earth's Hill sphere is ~0.01 AU
        let r = hill_radius(1.0, bloom_env::constants::EARTH_MASS_SOLAR, 1.0);
        assert!((r - 0.01).abs() < 0.001, "r_H = {}", r);
    }

    #[test]
    fn test_sphere_radius_round_trip() {
        let r = sphere_radius(4.0 / 3.0 * PI * 8.0, 1.0);
        assert_relative_eq!(r, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_logistic_sign() {
        assert!(logistic_growth(1.0, 50.0, 100.0) > 0.0);
        assert_eq!(logistic_growth(1.0, 100.0, 100.0), 0.0);
        assert!(logistic_growth(1.0, 150.0, 100.0) < 0.0);
    }

    #[test]
    fn test_frost_line_sun() {
        assert_relative_eq!(frost_line(1.0), 2.7);
        assert_relative_eq!(main_sequence_luminosity(1.0), 1.0);
    }
}
