use crate::types::{Point, Value};

/// Owner of the visual markers that represent grid points.
///
/// [`SurfaceGrid`](crate::grid::SurfaceGrid) only talks to the sink through these four
/// operations and never inspects what a handle refers to. Handles passed to
/// [`destroy`](PointSink::destroy) are consumed and must not be used again.
pub trait PointSink {
    type Handle;

    /// Acquires a new marker.
    fn create(&mut self) -> Self::Handle;

    /// Releases a marker.
    fn destroy(&mut self, handle: Self::Handle);

    fn set_position(&mut self, handle: &Self::Handle, position: Point);

    /// Scales a marker equally on all axes.
    fn set_uniform_scale(&mut self, handle: &Self::Handle, scale: Value);
}
