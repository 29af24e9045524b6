//! The parameter triple that defines the filter.
//!
//! `ParameterSet` is the single value every dispatch carries. The UI edits one
//! field at a time; the native entry point always receives all three.

use serde::{Deserialize, Serialize};

/// Neutral factor for every parameter.
pub const NEUTRAL: f32 = 0.5;

/// Identifies one of the three filter parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Parameter {
    Hue,
    Saturation,
    Intensity,
}

impl Parameter {
    /// Human-readable label for slider captions and log lines.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Hue => "Hue",
            Self::Saturation => "Saturation",
            Self::Intensity => "Intensity",
        }
    }

    pub fn all() -> &'static [Self] {
        const ALL: [Parameter; 3] = [Parameter::Hue, Parameter::Saturation, Parameter::Intensity];
        &ALL
    }
}

/// Hue, saturation and intensity factors, each in `[0.0, 1.0]`.
///
/// `0.5` is the neutral value for every factor, so the default set leaves
/// the image unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    pub hue: f32,
    pub saturation: f32,
    pub intensity: f32,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            hue: NEUTRAL,
            saturation: NEUTRAL,
            intensity: NEUTRAL,
        }
    }
}

impl ParameterSet {
    /// Build a set from raw values, clamping each into `[0.0, 1.0]`.
    ///
    /// `NaN` components fall back to [`NEUTRAL`].
    pub fn new(hue: f32, saturation: f32, intensity: f32) -> Self {
        let unit = |v: f32| clamp_unit(v).unwrap_or(NEUTRAL);
        Self {
            hue: unit(hue),
            saturation: unit(saturation),
            intensity: unit(intensity),
        }
    }

    pub fn get(&self, param: Parameter) -> f32 {
        match param {
            Parameter::Hue => self.hue,
            Parameter::Saturation => self.saturation,
            Parameter::Intensity => self.intensity,
        }
    }

    /// Copy of `self` with one field replaced.
    ///
    /// Returns `None` when `value` is `NaN`; otherwise the value is clamped.
    pub fn with(self, param: Parameter, value: f32) -> Option<Self> {
        let value = clamp_unit(value)?;
        let mut next = self;
        match param {
            Parameter::Hue => next.hue = value,
            Parameter::Saturation => next.saturation = value,
            Parameter::Intensity => next.intensity = value,
        }
        Some(next)
    }

    /// Bit-for-bit equality on all three fields.
    ///
    /// Stricter than `==`: `0.0` and `-0.0` differ here.
    pub fn same_bits(&self, other: &Self) -> bool {
        self.hue.to_bits() == other.hue.to_bits()
            && self.saturation.to_bits() == other.saturation.to_bits()
            && self.intensity.to_bits() == other.intensity.to_bits()
    }

    /// `[hue, saturation, intensity]`, the argument order of the native call.
    pub const fn as_array(&self) -> [f32; 3] {
        [self.hue, self.saturation, self.intensity]
    }
}

/// Clamp `v` into `[0.0, 1.0]`.
///
/// Infinities saturate to the nearest bound. `NaN` has no meaningful
/// position on a slider and yields `None`.
pub fn clamp_unit(v: f32) -> Option<f32> {
    if v.is_nan() {
        return None;
    }
    Some(v.clamp(0.0, 1.0))
}

/// One published snapshot of the store.
///
/// `seq` counts publications: `0` is the store's initial triple and every
/// accepted edit increments it by one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub seq: u64,
    pub params: ParameterSet,
}
