use nalgebra::Point3;

/// Scalar value used for coordinates, heights, scales and time.
pub type Value = f32;

/// A 3D point with [`Value`] components.
pub type Point = Point3<Value>;

/// A surface function: maps `(x, z, t)` to a height `y`.
pub type GraphFunction = fn(Value, Value, Value) -> Value;
