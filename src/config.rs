use std::str::FromStr;

use bevy::prelude::Resource;
use derive_more::Display;

use crate::{
    error::{GraphError, Result},
    library::FunctionKind,
    types::Value,
};

/// Smallest accepted number of samples per axis.
pub const MIN_RESOLUTION: u32 = 1;

/// Largest accepted number of samples per axis. A volumetric grid at this resolution holds
/// `MAX_RESOLUTION²` points.
pub const MAX_RESOLUTION: u32 = 100;

/// Layout of the sampled points.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dimension {
    /// A single row of `resolution` points along X, at `z = 0`.
    Planar,
    /// A `resolution × resolution` square of points over X and Z.
    #[default]
    Volumetric,
}

impl Dimension {
    pub fn toggled(self) -> Self {
        match self {
            Dimension::Planar => Dimension::Volumetric,
            Dimension::Volumetric => Dimension::Planar,
        }
    }
}

impl FromStr for Dimension {
    type Err = GraphError;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "planar" | "2d" | "two" => Ok(Dimension::Planar),
            "volumetric" | "3d" | "three" => Ok(Dimension::Volumetric),
            _ => Err(GraphError::UnknownDimension(s.to_owned())),
        }
    }
}

/// A validated number of samples along one axis.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
#[display("{_0}")]
pub struct Resolution(u32);

impl Resolution {
    /// Returns [`GraphError::InvalidResolution`] unless `MIN_RESOLUTION <= value <= MAX_RESOLUTION`.
    pub fn new(value: u32) -> Result<Self> {
        if (MIN_RESOLUTION..=MAX_RESOLUTION).contains(&value) {
            Ok(Self(value))
        } else {
            Err(GraphError::InvalidResolution(value))
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Distance between neighbouring samples over the `[-1, 1]` domain: `2 / resolution`.
    ///
    /// Also used as the uniform scale of every point, so neighbours just touch.
    #[inline]
    pub fn step(self) -> Value {
        2. / self.0 as Value
    }
}

/// Runtime configuration of the surface graph.
///
/// Inserted as a resource by [`SurfaceGraphPlugin`](crate::plugin::SurfaceGraphPlugin).
/// Modify it at any time; the graph picks up the change on its next frame:
///
/// ```rust,ignore
/// fn cycle_function(mut config: ResMut<GraphConfig>) {
///     config.function = config.function.next();
/// }
/// ```
///
/// An invalid `resolution` is rejected with a warning and the current grid is kept.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct GraphConfig {
    /// Samples per axis. Must lie within `MIN_RESOLUTION..=MAX_RESOLUTION`. Default: `50`.
    pub resolution: u32,
    /// Surface function being sampled. Default: [`FunctionKind::Wave`].
    pub function: FunctionKind,
    /// Point layout. Default: [`Dimension::Volumetric`].
    pub dimension: Dimension,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            resolution: 50,
            function: FunctionKind::default(),
            dimension: Dimension::default(),
        }
    }
}

impl GraphConfig {
    pub fn validate(&self) -> Result<Resolution> {
        Resolution::new(self.resolution)
    }

    /// Parses positional `[function] [dimension] [resolution]` arguments.
    ///
    /// Trailing arguments may be omitted; missing values keep their defaults.
    ///
    /// ```text
    /// ripple            → Ripple,  Volumetric, 50
    /// wave 2d           → Wave,    Planar,     50
    /// multi-wave 3d 80  → MultiWave, Volumetric, 80
    /// ```
    pub fn from_args<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut config = Self::default();
        let mut args = args.into_iter();

        if let Some(function) = args.next() {
            config.function = function.as_ref().parse()?;
        }
        if let Some(dimension) = args.next() {
            config.dimension = dimension.as_ref().parse()?;
        }
        if let Some(resolution) = args.next() {
            let resolution = resolution.as_ref();
            config.resolution = resolution
                .trim()
                .parse::<u32>()
                .map_err(|_| GraphError::MalformedResolution(resolution.to_owned()))?;
        }

        config.validate()?;
        Ok(config)
    }
}
