use crate::{Error, Result};

/// An implementation of a time-decaying value
pub trait Decay {
    /// Calculate value at time `t`
    fn evaluate(&self, t: f32) -> f32;
}

/// A constant value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constant {
    value: f32,
}

impl Constant {
    pub fn new(value: f32) -> Self {
        Self { value }
    }
}

impl Decay for Constant {
    fn evaluate(&self, _t: f32) -> f32 {
        self.value
    }
}

/// v(t) = max(v<sub>i</sub> * r<sup>t</sup>, v<sub>f</sub>)
///
/// Evaluated at integer `t` this is the value obtained by multiplying `vi` by `rate`
/// once per step and clamping at the floor `vf`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometric {
    rate: f32,
    vi: f32,
    vf: f32,
}

impl Geometric {
    /// **Errors** if `rate` is not in `(0,1]` or if `vi` is below the floor `vf`
    pub fn new(rate: f32, vi: f32, vf: f32) -> Result<Self> {
        if !(rate > 0.0 && rate <= 1.0) {
            return Err(Error::config(format!(
                "decay rate is {rate}, must be in the interval (0, 1]"
            )));
        }
        if !(vi >= vf) {
            return Err(Error::config(format!(
                "initial value {vi} must not be below the floor {vf}"
            )));
        }
        Ok(Self { rate, vi, vf })
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn floor(&self) -> f32 {
        self.vf
    }
}

impl Decay for Geometric {
    fn evaluate(&self, t: f32) -> f32 {
        let &Self { rate, vi, vf } = self;
        (vi * rate.powf(t)).max(vf)
    }
}
