use std::{f32::consts::PI, str::FromStr};

use derive_more::Display;

use crate::{
    error::GraphError,
    types::{GraphFunction, Value},
};

/// Identifies one entry of the function catalog.
///
/// The catalog is closed: every variant resolves to exactly one [`GraphFunction`].
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FunctionKind {
    Line,
    Squared,
    Cubed,
    #[default]
    Wave,
    MultiWave,
    MultiWave2,
    Ripple,
    Ripple2,
}

impl FunctionKind {
    /// Every catalog entry, in declaration order.
    pub const ALL: [FunctionKind; 8] = [
        FunctionKind::Line,
        FunctionKind::Squared,
        FunctionKind::Cubed,
        FunctionKind::Wave,
        FunctionKind::MultiWave,
        FunctionKind::MultiWave2,
        FunctionKind::Ripple,
        FunctionKind::Ripple2,
    ];

    /// Returns the surface function for this identifier.
    #[inline]
    pub fn resolve(self) -> GraphFunction {
        match self {
            FunctionKind::Line => line,
            FunctionKind::Squared => squared,
            FunctionKind::Cubed => cubed,
            FunctionKind::Wave => wave,
            FunctionKind::MultiWave => multi_wave,
            FunctionKind::MultiWave2 => multi_wave_2,
            FunctionKind::Ripple => ripple,
            FunctionKind::Ripple2 => ripple_2,
        }
    }

    /// Evaluates this function at `(x, z, t)`.
    #[inline]
    pub fn evaluate(self, x: Value, z: Value, t: Value) -> Value {
        self.resolve()(x, z, t)
    }

    /// The next catalog entry, wrapping from the last back to the first.
    pub fn next(self) -> Self {
        let i = self.position();
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    /// The previous catalog entry, wrapping from the first to the last.
    pub fn previous(self) -> Self {
        let i = self.position();
        Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    // ALL is in declaration order
    fn position(self) -> usize {
        self as usize
    }
}

impl FromStr for FunctionKind {
    type Err = GraphError;

    /// Parses a catalog name, ignoring ASCII case and `-`/`_` separators.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_'))
            .collect::<String>()
            .to_ascii_lowercase();

        Self::ALL
            .into_iter()
            .find(|kind| kind.to_string().to_ascii_lowercase() == normalized)
            .ok_or_else(|| GraphError::UnknownFunction(s.to_owned()))
    }
}

/// Total lookup from identifier to surface function.
#[inline]
pub fn resolve(kind: FunctionKind) -> GraphFunction {
    kind.resolve()
}

pub fn line(x: Value, _z: Value, _t: Value) -> Value {
    x
}

pub fn squared(x: Value, _z: Value, _t: Value) -> Value {
    x * x
}

pub fn cubed(x: Value, _z: Value, _t: Value) -> Value {
    x * x * x
}

pub fn wave(x: Value, z: Value, t: Value) -> Value {
    (PI * (x + z + t)).sin()
}

/// Two sines along `x` and `z`, normalized by their peak amplitude of `1.5`.
pub fn multi_wave(x: Value, z: Value, t: Value) -> Value {
    let mut y = (PI * (x + t)).sin();
    y += (2. * PI * (z + t)).sin() * 0.5;
    y * (2. / 3.)
}

/// Three sines, normalized by their peak amplitude of `2.5`.
pub fn multi_wave_2(x: Value, z: Value, t: Value) -> Value {
    let mut y = (PI * (x + 0.5 * t)).sin();
    y += (2. * PI * (z + t)).sin() * 0.5;
    y += (PI * (x + z + 0.25 + t)).sin() * 0.5;
    y * (1. / 2.5)
}

/// Radial wave whose amplitude decays with distance from the origin.
pub fn ripple(x: Value, z: Value, t: Value) -> Value {
    let d = (x * x + z * z).sqrt();
    decaying_wave(d, t)
}

/// Like [`ripple`], but the distance is measured along `x` only.
pub fn ripple_2(x: Value, _z: Value, t: Value) -> Value {
    decaying_wave(x.abs(), t)
}

// d >= 0, so the denominator never drops below 1
#[inline]
fn decaying_wave(d: Value, t: Value) -> Value {
    (PI * (4. * d - t)).sin() / (1. + 10. * d)
}
