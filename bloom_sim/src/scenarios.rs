//! Verification scenarios for the genesis engines.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// GEN-001: Same seed twice, identical world
    Determinism,

    /// GEN-002: Uniform, normal and Poisson sample moments
    RngMoments,

    /// GEN-003: Octave noise stays within [-1, 1]
    NoiseBounds,

    /// GEN-004: Zero-noise Lotka-Volterra against an RK4 reference
    LotkaVolterra,

    /// GEN-005: Extinction is absorbing
    Extinction,

    /// GEN-006: Two bodies at rest fall together and merge
    TwoBodyMerge,

    /// GEN-007: Empty and fully ejected disks are valid outcomes
    SterileSystem,

    /// GEN-008: Full disk → orbits → terrain → ecology pipeline
    Genesis,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::Determinism,
            ScenarioId::RngMoments,
            ScenarioId::NoiseBounds,
            ScenarioId::LotkaVolterra,
            ScenarioId::Extinction,
            ScenarioId::TwoBodyMerge,
            ScenarioId::SterileSystem,
            ScenarioId::Genesis,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::Determinism => "determinism",
            ScenarioId::RngMoments => "rng_moments",
            ScenarioId::NoiseBounds => "noise_bounds",
            ScenarioId::LotkaVolterra => "lotka_volterra",
            ScenarioId::Extinction => "extinction",
            ScenarioId::TwoBodyMerge => "two_body_merge",
            ScenarioId::SterileSystem => "sterile_system",
            ScenarioId::Genesis => "genesis",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::Determinism => "Run genesis twice on one seed; fingerprints must match",
            ScenarioId::RngMoments => "10,000 draws: uniform, normal(0,1) and poisson(5) moments",
            ScenarioId::NoiseBounds => "Sample a 64x64 fBm grid and check every value is in [-1, 1]",
            ScenarioId::LotkaVolterra => "1000 noise-free steps of 0.01 from (100, 10) versus fine-step RK4",
            ScenarioId::Extinction => "Drive predators to zero and verify they never return",
            ScenarioId::TwoBodyMerge => "Two bodies at rest merge with summed mass and zero momentum",
            ScenarioId::SterileSystem => "Empty disk and all-ejected disk integrate without error",
            ScenarioId::Genesis => "Full pipeline: mass never grows, populations stay non-negative",
        }
    }

    /// Returns true for scenarios that drive the full genesis pipeline.
    pub fn uses_world(&self) -> bool {
        matches!(self, ScenarioId::Determinism | ScenarioId::Genesis)
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "determinism" | "gen-001" => Ok(ScenarioId::Determinism),
            "rng_moments" | "rngmoments" | "rng" | "gen-002" => Ok(ScenarioId::RngMoments),
            "noise_bounds" | "noisebounds" | "noise" | "gen-003" => Ok(ScenarioId::NoiseBounds),
            "lotka_volterra" | "lotkavolterra" | "lv" | "gen-004" => Ok(ScenarioId::LotkaVolterra),
            "extinction" | "gen-005" => Ok(ScenarioId::Extinction),
            "two_body_merge" | "twobodymerge" | "merge" | "gen-006" => Ok(ScenarioId::TwoBodyMerge),
            "sterile_system" | "sterilesystem" | "sterile" | "gen-007" => Ok(ScenarioId::SterileSystem),
            "genesis" | "gen-008" => Ok(ScenarioId::Genesis),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}
