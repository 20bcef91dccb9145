//! Dynamic threshold policies.
//!
//! Every node's threshold is recomputed each step from its local activity
//! (mean state of its neighbors) and the global activity of the previous
//! state. The policy is chosen once per run.

use crate::error::{ConfigError, Result, SparsenetError};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Number of initial steps during which `ρ` is inverted for the rho and sine
/// policies, relaxing the threshold while the network leaves its initial state.
pub const RELAXATION_STEPS: usize = 20;

/// The five threshold functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThresholdKind {
    /// Linear ramp from θ down to −θ across `[a, 1 − a]`, zero outside.
    #[serde(alias = "l")]
    Linear,
    /// Step function whose height is scaled by ρ depending on global activity.
    #[serde(alias = "r")]
    Rho,
    /// θ below half local activity, −θ above, zero when silent.
    #[serde(alias = "s")]
    Step,
    /// `θ sin(2π·la)`.
    #[serde(alias = "t")]
    Sine,
    /// Step function cut to zero outside `[a, 1 − a]`.
    #[serde(alias = "c")]
    StepCut,
}

impl ThresholdKind {
    pub fn code(&self) -> char {
        match self {
            ThresholdKind::Linear => 'l',
            ThresholdKind::Rho => 'r',
            ThresholdKind::Step => 's',
            ThresholdKind::Sine => 't',
            ThresholdKind::StepCut => 'c',
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ThresholdKind::Linear => "linear",
            ThresholdKind::Rho => "rho",
            ThresholdKind::Step => "step",
            ThresholdKind::Sine => "sine",
            ThresholdKind::StepCut => "step-cut",
        }
    }
}

impl fmt::Display for ThresholdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ThresholdKind {
    type Err = SparsenetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "l" | "linear" => Ok(ThresholdKind::Linear),
            "r" | "rho" => Ok(ThresholdKind::Rho),
            "s" | "step" | "square" => Ok(ThresholdKind::Step),
            "t" | "sine" => Ok(ThresholdKind::Sine),
            "c" | "step-cut" | "squarecut" => Ok(ThresholdKind::StepCut),
            other => Err(ConfigError::UnsupportedThreshold(other.to_string()).into()),
        }
    }
}

/// A configured threshold function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdPolicy {
    kind: ThresholdKind,
    /// θ
    theta: f64,
    /// ρ
    rho: f64,
    /// Expected pattern activity `a`.
    sparseness: f64,
    /// Slope of the linear policy, `−2θ / (1 − 2a)`.
    slope: f64,
}

impl ThresholdPolicy {
    pub fn new(kind: ThresholdKind, theta: f64, rho: f64, sparseness: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&sparseness) {
            return Err(SparsenetError::out_of_range("sparseness", 0.0, 1.0, sparseness));
        }
        if !theta.is_finite() {
            return Err(SparsenetError::invalid_config("threshold", theta, "must be finite"));
        }
        let uses_rho = matches!(kind, ThresholdKind::Rho | ThresholdKind::Sine);
        if uses_rho && !(rho > 0.0 && rho.is_finite()) {
            return Err(SparsenetError::invalid_config(
                "rho",
                rho,
                format!("{kind} threshold needs a positive rho"),
            ));
        }
        if kind == ThresholdKind::Linear && sparseness == 0.5 {
            return Err(SparsenetError::invalid_config(
                "sparseness",
                sparseness,
                "linear threshold slope is undefined at 0.5",
            ));
        }

        Ok(Self {
            kind,
            theta,
            rho,
            sparseness,
            slope: -2.0 * theta / (1.0 - 2.0 * sparseness),
        })
    }

    pub fn kind(&self) -> ThresholdKind {
        self.kind
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }

    pub fn rho(&self) -> f64 {
        self.rho
    }

    pub fn sparseness(&self) -> f64 {
        self.sparseness
    }

    /// Effective ρ at `step`: `1/ρ` during the relaxation window, `ρ` after.
    pub fn effective_rho(&self, step: usize) -> f64 {
        if step < RELAXATION_STEPS {
            1.0 / self.rho
        } else {
            self.rho
        }
    }

    /// Threshold for a node with local activity `local` when the previous
    /// state had global activity `global`.
    pub fn compute(&self, local: f64, global: f64, step: usize) -> f64 {
        let a = self.sparseness;
        match self.kind {
            ThresholdKind::Linear => {
                if local < a || local > 1.0 - a {
                    0.0
                } else {
                    self.slope * (local - a) + self.theta
                }
            }
            ThresholdKind::Rho => {
                let rho1 = self.effective_rho(step);
                let theta = if global > (a + 0.5) / 2.0 {
                    rho1 * self.theta
                } else {
                    self.theta / rho1
                };
                step_threshold(local, theta)
            }
            ThresholdKind::Step => step_threshold(local, self.theta),
            ThresholdKind::Sine => {
                let theta = self.theta / self.effective_rho(step);
                theta * (2.0 * PI * local).sin()
            }
            ThresholdKind::StepCut => {
                if local < a || local > 1.0 - a {
                    0.0
                } else {
                    step_threshold(local, self.theta)
                }
            }
        }
    }
}

fn step_threshold(local: f64, theta: f64) -> f64 {
    if local == 0.0 {
        0.0
    } else if local < 0.5 {
        theta
    } else {
        -theta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(kind: ThresholdKind) -> ThresholdPolicy {
        ThresholdPolicy::new(kind, 0.6, 0.7, 0.2).unwrap()
    }

    #[test]
    fn step_has_three_regions() {
        let p = policy(ThresholdKind::Step);
        assert_eq!(p.compute(0.0, 0.2, 0), 0.0);
        assert_eq!(p.compute(0.3, 0.2, 0), 0.6);
        assert_eq!(p.compute(0.5, 0.2, 0), -0.6);
        assert_eq!(p.compute(0.9, 0.2, 0), -0.6);
    }

    #[test]
    fn linear_ramps_between_cut_points() {
        let p = policy(ThresholdKind::Linear);
        assert_eq!(p.compute(0.1, 0.0, 0), 0.0);
        assert_eq!(p.compute(0.85, 0.0, 0), 0.0);
        assert!((p.compute(0.2, 0.0, 0) - 0.6).abs() < 1e-12);
        assert!(p.compute(0.5, 0.0, 0).abs() < 1e-12);
        assert!((p.compute(0.75, 0.0, 0) + 0.5).abs() < 1e-12);
    }

    #[test]
    fn rho_relaxes_during_first_steps() {
        let p = policy(ThresholdKind::Rho);
        // Low global activity: θ / ρ1. Early ρ1 = 1/ρ so θ·ρ.
        assert!((p.compute(0.3, 0.1, 0) - 0.6 * 0.7).abs() < 1e-12);
        // After relaxation ρ1 = ρ: θ / ρ.
        assert!((p.compute(0.3, 0.1, RELAXATION_STEPS) - 0.6 / 0.7).abs() < 1e-12);
        // High global activity: ρ1 · θ, sign flipped above half.
        assert!((p.compute(0.7, 0.5, RELAXATION_STEPS) + 0.7 * 0.6).abs() < 1e-12);
        assert_eq!(p.compute(0.0, 0.5, 0), 0.0);
    }

    #[test]
    fn sine_scales_by_effective_rho() {
        let p = policy(ThresholdKind::Sine);
        let early = p.compute(0.25, 0.0, 0);
        let late = p.compute(0.25, 0.0, 50);
        assert!((early - 0.6 * 0.7).abs() < 1e-12);
        assert!((late - 0.6 / 0.7).abs() < 1e-12);
        assert!((p.compute(0.75, 0.0, 50) + 0.6 / 0.7).abs() < 1e-12);
    }

    #[test]
    fn step_cut_zeroes_outside_band() {
        let p = policy(ThresholdKind::StepCut);
        assert_eq!(p.compute(0.1, 0.0, 0), 0.0);
        assert_eq!(p.compute(0.9, 0.0, 0), 0.0);
        assert_eq!(p.compute(0.3, 0.0, 0), 0.6);
        assert_eq!(p.compute(0.6, 0.0, 0), -0.6);
    }

    #[test]
    fn codes_round_trip_through_from_str() {
        for kind in [
            ThresholdKind::Linear,
            ThresholdKind::Rho,
            ThresholdKind::Step,
            ThresholdKind::Sine,
            ThresholdKind::StepCut,
        ] {
            assert_eq!(kind.code().to_string().parse::<ThresholdKind>().unwrap(), kind);
            assert_eq!(kind.name().parse::<ThresholdKind>().unwrap(), kind);
        }
        assert!("z".parse::<ThresholdKind>().is_err());
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(ThresholdPolicy::new(ThresholdKind::Rho, 0.6, 0.0, 0.2).is_err());
        assert!(ThresholdPolicy::new(ThresholdKind::Linear, 0.6, 1.0, 0.5).is_err());
        assert!(ThresholdPolicy::new(ThresholdKind::Step, 0.6, 1.0, 1.5).is_err());
        assert!(ThresholdPolicy::new(ThresholdKind::Step, 0.6, 0.0, 0.2).is_ok());
    }
}
