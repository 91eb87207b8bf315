use crate::error::{Result, RidgeError};

use super::model::ChannelSeries;

// ---------------------------------------------------------------------------
// Gate: an inclusive range on the plotted channel
// ---------------------------------------------------------------------------

/// Inclusive `(lower, upper)` restriction of the x-axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gate {
    pub lower: f64,
    pub upper: f64,
}

impl Gate {
    /// Both bounds must be finite and `lower < upper`.
    pub fn new(lower: f64, upper: f64) -> Result<Self> {
        if !lower.is_finite() || !upper.is_finite() || lower >= upper {
            return Err(RidgeError::InvalidGate { lower, upper });
        }
        Ok(Gate { lower, upper })
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    /// Values inside the gate, in their original order.
    pub fn apply(&self, values: &[f64]) -> Vec<f64> {
        values.iter().copied().filter(|&v| self.contains(v)).collect()
    }
}

/// Apply a gate to every time point.
///
/// A time point whose events all fall outside the gate keeps its place
/// with no values.
pub fn gate_series(series: &[ChannelSeries], gate: &Gate) -> Vec<ChannelSeries> {
    series
        .iter()
        .map(|s| {
            let values = gate.apply(&s.values);
            if values.is_empty() && !s.values.is_empty() {
                log::warn!(
                    "Gate [{}, {}] removes every event of time point {}",
                    gate.lower,
                    gate.upper,
                    s.label
                );
            }
            ChannelSeries {
                label: s.label.clone(),
                values,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_validation() {
        assert!(Gate::new(1.5e6, 7.0e6).is_ok());
        assert!(matches!(Gate::new(5.0, 5.0), Err(RidgeError::InvalidGate { .. })));
        assert!(matches!(Gate::new(7.0, 1.0), Err(RidgeError::InvalidGate { .. })));
        assert!(Gate::new(f64::NAN, 1.0).is_err());
        assert!(Gate::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_gate_is_inclusive() {
        let gate = Gate::new(1.0, 3.0).unwrap();
        assert_eq!(gate.apply(&[0.5, 1.0, 2.0, 3.0, 3.5, f64::NAN]), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_gate_series_keeps_empty_time_points() {
        let gate = Gate::new(10.0, 20.0).unwrap();
        let series = vec![
            ChannelSeries { label: "0".into(), values: vec![1.0, 2.0] },
            ChannelSeries { label: "6".into(), values: vec![15.0, 25.0] },
        ];
        let gated = gate_series(&series, &gate);
        assert_eq!(gated.len(), 2);
        assert!(gated[0].values.is_empty());
        assert_eq!(gated[1].values, vec![15.0]);
    }
}
