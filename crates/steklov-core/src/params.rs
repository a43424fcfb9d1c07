//! Run parameters read from the JSON parameter file.
//!
//! Every section and field has a default, so a parameter file only needs to
//! list the values it changes:
//!
//! ```json
//! { "fem": { "adjoint_type": 1, "cg_tolerance": 1e-10 }, "time": { "n_time_steps": 50 } }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::block::AdjointType;
use crate::error::{Error, Result};

/// Material and forcing data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicalProperties {
    /// Fluid density.
    pub rho_f: f64,
    /// Structure density.
    pub rho_s: f64,
    /// Fluid dynamic viscosity.
    pub viscosity: f64,
    /// Structure shear modulus.
    pub shear_modulus: f64,
    /// Peak velocity of the driving wall.
    pub inflow_amplitude: f64,
    /// Oscillation frequency of the driving wall (Hz).
    pub inflow_frequency: f64,
}

impl Default for PhysicalProperties {
    fn default() -> Self {
        Self {
            rho_f: 1.0,
            rho_s: 1.0,
            viscosity: 0.1,
            shear_modulus: 10.0,
            inflow_amplitude: 1.0,
            inflow_frequency: 1.0,
        }
    }
}

/// Discretization and coupling-algorithm settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FemProperties {
    /// Coupling variable flag: 1 = displacement matching, otherwise velocity.
    pub adjoint_type: u32,
    /// Relative tolerance of the interface GMRES.
    pub cg_tolerance: f64,
    /// Absolute tolerance on the interface jump that ends a timestep.
    pub jump_tolerance: f64,
    /// Outer (restart) iterations allowed per GMRES call.
    pub max_optimization_iterations: usize,
    /// GMRES calls allowed per timestep.
    pub max_coupling_iterations: usize,
    /// Krylov dimension between restarts.
    pub restart: usize,
    /// Start GMRES from a random interface stress instead of a constant one.
    pub random_initial_guess: bool,
    /// Seed for the random initial guess.
    pub seed: u64,
}

impl Default for FemProperties {
    fn default() -> Self {
        Self {
            adjoint_type: 0,
            cg_tolerance: 1e-8,
            jump_tolerance: 1e-7,
            max_optimization_iterations: 50,
            max_coupling_iterations: 5,
            restart: 3,
            random_initial_guess: false,
            seed: 0,
        }
    }
}

impl FemProperties {
    /// Decoded coupling variable.
    pub fn adjoint_type(&self) -> AdjointType {
        AdjointType::from_flag(self.adjoint_type)
    }
}

/// Time discretization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeProperties {
    /// Step size.
    pub time_step: f64,
    /// Number of steps to run.
    pub n_time_steps: usize,
}

impl Default for TimeProperties {
    fn default() -> Self {
        Self {
            time_step: 0.01,
            n_time_steps: 20,
        }
    }
}

/// Structured mesh of the fluid channel and the elastic layer above it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshProperties {
    /// Cells along the interface.
    pub nx: usize,
    /// Cells across the fluid layer.
    pub ny_fluid: usize,
    /// Cells across the structure layer.
    pub ny_structure: usize,
    /// Interface length.
    pub length: f64,
    /// Fluid layer height.
    pub fluid_height: f64,
    /// Structure layer height.
    pub structure_height: f64,
}

impl Default for MeshProperties {
    fn default() -> Self {
        Self {
            nx: 8,
            ny_fluid: 4,
            ny_structure: 4,
            length: 1.0,
            fluid_height: 0.5,
            structure_height: 0.25,
        }
    }
}

/// All run parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    pub physical: PhysicalProperties,
    pub fem: FemProperties,
    pub time: TimeProperties,
    pub mesh: MeshProperties,
}

impl Parameters {
    /// Parse and validate parameters from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let params: Parameters = serde_json::from_str(text)?;
        params.validate()?;
        Ok(params)
    }

    /// Read, parse and validate a parameter file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check ranges and consistency.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("physical.rho_f", self.physical.rho_f),
            ("physical.rho_s", self.physical.rho_s),
            ("physical.viscosity", self.physical.viscosity),
            ("physical.shear_modulus", self.physical.shear_modulus),
            ("fem.cg_tolerance", self.fem.cg_tolerance),
            ("fem.jump_tolerance", self.fem.jump_tolerance),
            ("time.time_step", self.time.time_step),
            ("mesh.length", self.mesh.length),
            ("mesh.fluid_height", self.mesh.fluid_height),
            ("mesh.structure_height", self.mesh.structure_height),
        ];
        for (name, value) in positive {
            if !(value > 0.0 && value.is_finite()) {
                return Err(Error::InvalidParameter(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }

        let counts = [
            ("fem.restart", self.fem.restart),
            ("fem.max_coupling_iterations", self.fem.max_coupling_iterations),
            ("mesh.nx", self.mesh.nx),
            ("mesh.ny_fluid", self.mesh.ny_fluid),
            ("mesh.ny_structure", self.mesh.ny_structure),
        ];
        for (name, value) in counts {
            if value == 0 {
                return Err(Error::InvalidParameter(format!("{name} must be at least 1")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let params = Parameters::from_json_str("{}").unwrap();
        assert_eq!(params, Parameters::default());
        assert_eq!(params.fem.restart, 3);
        assert_eq!(params.fem.adjoint_type(), AdjointType::Velocity);
    }

    #[test]
    fn partial_sections_override_defaults() {
        let params = Parameters::from_json_str(
            r#"{ "fem": { "adjoint_type": 1, "cg_tolerance": 1e-10 }, "mesh": { "nx": 16 } }"#,
        )
        .unwrap();

        assert_eq!(params.fem.adjoint_type(), AdjointType::Displacement);
        assert!((params.fem.cg_tolerance - 1e-10).abs() < 1e-20);
        assert_eq!(params.fem.max_optimization_iterations, 50);
        assert_eq!(params.mesh.nx, 16);
        assert_eq!(params.mesh.ny_fluid, 4);
    }

    #[test]
    fn negative_time_step_is_rejected() {
        let result = Parameters::from_json_str(r#"{ "time": { "time_step": -0.1 } }"#);
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn zero_restart_is_rejected() {
        let result = Parameters::from_json_str(r#"{ "fem": { "restart": 0 } }"#);
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let result = Parameters::from_json_str("{ fem: ");
        assert!(matches!(result, Err(Error::Parse(_))));
    }
}
