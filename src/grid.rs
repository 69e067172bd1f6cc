use ndarray::Array2;
use tracing::debug;

use crate::{
    config::{Dimension, GraphConfig, Resolution},
    error::Result,
    library::FunctionKind,
    sink::PointSink,
    types::{Point, Value},
};

/// Lifecycle of a [`SurfaceGrid`].
///
/// ```text
/// Uninitialized ──init / first tick──▶ Stable ◀──rebuild──┐
///                                        │                 │
///                                        └─ layout change ─▶ Rebuilding
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridState {
    /// No points have been created yet.
    Uninitialized,
    /// Points match the configured layout and are animated in place every tick.
    Stable,
    /// The layout changed; the next tick destroys every point and creates a fresh set.
    Rebuilding,
}

/// One sampled location of the surface.
///
/// `x`, `z` and the scale are fixed when the point is created; only `y` changes afterwards.
#[derive(Debug, Clone)]
pub struct GridPoint<H> {
    handle: H,
    position: Point,
    scale: Value,
}

impl<H> GridPoint<H> {
    /// Handle of the marker owned by the [`PointSink`].
    pub fn handle(&self) -> &H {
        &self.handle
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn scale(&self) -> Value {
        self.scale
    }
}

/// Number of points in a grid of the given layout: `r` for planar, `r²` for volumetric.
#[inline]
pub fn point_count(resolution: Resolution, dimension: Dimension) -> usize {
    let r = resolution.get() as usize;
    match dimension {
        Dimension::Planar => r,
        Dimension::Volumetric => r * r,
    }
}

/// Fixed `(x, z)` of the point at flattened `index`.
///
/// Points are laid out row-major, `index = row * resolution + col`, with every sample
/// centred in its cell of the `[-1, 1]` domain:
///
/// ```text
/// step = 2 / r
/// x = (col + 0.5) * step - 1
/// z = (row + 0.5) * step - 1     (volumetric)
/// z = 0                          (planar)
/// ```
#[inline]
pub fn grid_coordinates(index: usize, resolution: Resolution, dimension: Dimension) -> (Value, Value) {
    let r = resolution.get() as usize;
    let step = resolution.step();
    match dimension {
        Dimension::Planar => ((index as Value + 0.5) * step - 1., 0.),
        Dimension::Volumetric => {
            let col = index % r;
            let row = index / r;
            (
                (col as Value + 0.5) * step - 1.,
                (row as Value + 0.5) * step - 1.,
            )
        }
    }
}

/// An animated grid of points sampling a [`FunctionKind`] over `[-1, 1]`.
///
/// The grid exclusively owns its points. Every handle comes from a [`PointSink`] and goes
/// back to it when the layout changes, before any replacement is created.
///
/// ```rust,ignore
/// let mut grid = SurfaceGrid::new(GraphConfig::default())?;
/// grid.init(&mut sink, 0.);
/// loop {
///     grid.tick(&mut sink, clock.elapsed());
/// }
/// ```
#[derive(Debug)]
pub struct SurfaceGrid<H> {
    resolution: Resolution,
    function: FunctionKind,
    dimension: Dimension,
    /// Layout the current points were built for. `None` until the first rebuild.
    previous_dimension: Option<Dimension>,
    previous_resolution: Option<Resolution>,
    points: Vec<GridPoint<H>>,
    needs_rebuild: bool,
}

impl<H> SurfaceGrid<H> {
    /// Validates `config` and returns an uninitialized grid. No points are created until
    /// [`init`](SurfaceGrid::init) or the first [`tick`](SurfaceGrid::tick).
    pub fn new(config: GraphConfig) -> Result<Self> {
        let resolution = config.validate()?;
        Ok(Self {
            resolution,
            function: config.function,
            dimension: config.dimension,
            previous_dimension: None,
            previous_resolution: None,
            points: Vec::new(),
            needs_rebuild: true,
        })
    }

    pub fn state(&self) -> GridState {
        if self.previous_dimension.is_none() {
            GridState::Uninitialized
        } else if self.needs_rebuild {
            GridState::Rebuilding
        } else {
            GridState::Stable
        }
    }

    pub fn points(&self) -> &[GridPoint<H>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn function(&self) -> FunctionKind {
        self.function
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// The configuration the grid is currently targeting.
    pub fn config(&self) -> GraphConfig {
        GraphConfig {
            resolution: self.resolution.get(),
            function: self.function,
            dimension: self.dimension,
        }
    }

    /// Current heights as a `rows × resolution` matrix, where `rows` is `1` for planar grids.
    ///
    /// Returns an empty matrix until the grid has been built.
    pub fn heights(&self) -> Array2<Value> {
        let cols = self.previous_resolution.map_or(0, |r| r.get() as usize);
        let rows = if cols == 0 { 0 } else { self.points.len() / cols };
        Array2::from_shape_fn((rows, cols), |(row, col)| {
            self.points[row * cols + col].position.y
        })
    }

    /// Applies a whole configuration.
    ///
    /// The resolution is validated first; on error nothing changes.
    pub fn configure(&mut self, config: GraphConfig) -> Result<()> {
        let resolution = config.validate()?;
        self.function = config.function;
        self.dimension = config.dimension;
        self.resolution = resolution;
        self.refresh_rebuild_flag();
        debug!(
            function = %self.function,
            dimension = %self.dimension,
            resolution = resolution.get(),
            "surface graph reconfigured"
        );
        Ok(())
    }

    /// Selects the function sampled from the next tick on. Never triggers a rebuild.
    pub fn set_function(&mut self, function: FunctionKind) {
        self.function = function;
    }

    pub fn set_dimension(&mut self, dimension: Dimension) {
        self.dimension = dimension;
        self.refresh_rebuild_flag();
    }

    /// Rejects values outside `MIN_RESOLUTION..=MAX_RESOLUTION`, keeping the current grid.
    pub fn set_resolution(&mut self, resolution: u32) -> Result<()> {
        self.resolution = Resolution::new(resolution)?;
        self.refresh_rebuild_flag();
        Ok(())
    }

    fn refresh_rebuild_flag(&mut self) {
        self.needs_rebuild = self.previous_dimension != Some(self.dimension)
            || self.previous_resolution != Some(self.resolution);
    }

    /// Builds the initial grid, whatever the current state.
    pub fn init<S>(&mut self, sink: &mut S, time: Value)
    where
        S: PointSink<Handle = H>,
    {
        self.needs_rebuild = true;
        self.switch_dimension(sink, time);
    }

    /// Advances the animation to `time`.
    ///
    /// A pending rebuild is carried out first and already places every point at its height
    /// for `time`. Otherwise every point's `y` is re-evaluated in place and pushed to the
    /// sink in index order.
    pub fn tick<S>(&mut self, sink: &mut S, time: Value)
    where
        S: PointSink<Handle = H>,
    {
        if self.needs_rebuild {
            self.switch_dimension(sink, time);
            return;
        }

        let function = self.function.resolve();
        for point in &mut self.points {
            point.position.y = function(point.position.x, point.position.z, time);
            sink.set_position(&point.handle, point.position);
        }
    }

    /// Destroys every point, then creates a fresh set for the configured layout.
    pub fn switch_dimension<S>(&mut self, sink: &mut S, time: Value)
    where
        S: PointSink<Handle = H>,
    {
        self.destroy_points(sink);

        let function = self.function.resolve();
        let step = self.resolution.step();
        let count = point_count(self.resolution, self.dimension);
        self.points.reserve_exact(count);

        for index in 0..count {
            let (x, z) = grid_coordinates(index, self.resolution, self.dimension);
            let position = Point::new(x, function(x, z, time), z);

            let handle = sink.create();
            sink.set_uniform_scale(&handle, step);
            sink.set_position(&handle, position);

            self.points.push(GridPoint {
                handle,
                position,
                scale: step,
            });
        }

        self.previous_dimension = Some(self.dimension);
        self.previous_resolution = Some(self.resolution);
        self.needs_rebuild = false;

        debug!(
            points = count,
            dimension = %self.dimension,
            resolution = self.resolution.get(),
            "surface grid rebuilt"
        );
    }

    /// Destroys every point and returns the grid to [`GridState::Uninitialized`].
    pub fn release<S>(&mut self, sink: &mut S)
    where
        S: PointSink<Handle = H>,
    {
        self.destroy_points(sink);
        self.previous_dimension = None;
        self.previous_resolution = None;
        self.needs_rebuild = true;
    }

    fn destroy_points<S>(&mut self, sink: &mut S)
    where
        S: PointSink<Handle = H>,
    {
        for point in self.points.drain(..) {
            sink.destroy(point.handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::{config::MAX_RESOLUTION, error::GraphError};

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Marker {
        position: Option<Point>,
        scale: Option<Value>,
    }

    /// In-memory sink that records what the grid asks of it.
    #[derive(Default)]
    struct RecordingSink {
        next_id: u32,
        live: HashMap<u32, Marker>,
        created: usize,
        destroyed: usize,
        peak_live: usize,
        position_writes: Vec<u32>,
    }

    impl PointSink for RecordingSink {
        type Handle = u32;

        fn create(&mut self) -> u32 {
            let id = self.next_id;
            self.next_id += 1;
            self.live.insert(
                id,
                Marker {
                    position: None,
                    scale: None,
                },
            );
            self.created += 1;
            self.peak_live = self.peak_live.max(self.live.len());
            id
        }

        fn destroy(&mut self, handle: u32) {
            assert!(self.live.remove(&handle).is_some(), "double destroy of {handle}");
            self.destroyed += 1;
        }

        fn set_position(&mut self, handle: &u32, position: Point) {
            let marker = self.live.get_mut(handle).expect("position on dead handle");
            marker.position = Some(position);
            self.position_writes.push(*handle);
        }

        fn set_uniform_scale(&mut self, handle: &u32, scale: Value) {
            let marker = self.live.get_mut(handle).expect("scale on dead handle");
            marker.scale = Some(scale);
        }
    }

    fn config(resolution: u32, function: FunctionKind, dimension: Dimension) -> GraphConfig {
        GraphConfig {
            resolution,
            function,
            dimension,
        }
    }

    fn built(config: GraphConfig, sink: &mut RecordingSink, time: Value) -> SurfaceGrid<u32> {
        let mut grid = SurfaceGrid::new(config).unwrap();
        grid.init(sink, time);
        grid
    }

    #[test]
    fn new_grid_is_uninitialized() {
        let grid: SurfaceGrid<u32> = SurfaceGrid::new(GraphConfig::default()).unwrap();
        assert_eq!(grid.state(), GridState::Uninitialized);
        assert!(grid.is_empty());
        assert_eq!(grid.heights().dim(), (0, 0));
    }

    #[test]
    fn zero_resolution_is_rejected_up_front() {
        let result = SurfaceGrid::<u32>::new(config(0, FunctionKind::Wave, Dimension::Planar));
        assert_eq!(result.err(), Some(GraphError::InvalidResolution(0)));

        let result = SurfaceGrid::<u32>::new(config(
            MAX_RESOLUTION + 1,
            FunctionKind::Wave,
            Dimension::Planar,
        ));
        assert!(result.is_err());
    }

    #[test]
    fn first_tick_initializes() {
        let mut sink = RecordingSink::default();
        let mut grid = SurfaceGrid::new(config(10, FunctionKind::Line, Dimension::Planar)).unwrap();
        grid.tick(&mut sink, 0.);
        assert_eq!(grid.state(), GridState::Stable);
        assert_eq!(grid.len(), 10);
        assert_eq!(sink.live.len(), 10);
    }

    #[test]
    fn planar_points_are_evenly_spaced() {
        for r in [1, 2, 7, 20, 100] {
            let mut sink = RecordingSink::default();
            let grid = built(config(r, FunctionKind::Line, Dimension::Planar), &mut sink, 0.);
            let step = 2. / r as Value;

            assert_eq!(grid.len(), r as usize);
            let xs: Vec<Value> = grid.points().iter().map(|p| p.position().x).collect();
            assert!((xs[0] - (-1. + step / 2.)).abs() < 1e-6);
            assert!((xs[xs.len() - 1] - (1. - step / 2.)).abs() < 1e-5);
            for pair in xs.windows(2) {
                assert!(pair[1] > pair[0]);
                assert!((pair[1] - pair[0] - step).abs() < 1e-5);
            }
            assert!(grid.points().iter().all(|p| p.position().z == 0.));
        }
    }

    #[test]
    fn volumetric_points_are_row_major() {
        let r = 13;
        let mut sink = RecordingSink::default();
        let grid = built(config(r, FunctionKind::Wave, Dimension::Volumetric), &mut sink, 0.);
        let step = 2. / r as Value;

        assert_eq!(grid.len(), (r * r) as usize);
        for (i, point) in grid.points().iter().enumerate() {
            let r = r as usize;
            let x = ((i % r) as Value + 0.5) * step - 1.;
            let z = ((i / r) as Value + 0.5) * step - 1.;
            assert_eq!(point.position().x, x);
            assert_eq!(point.position().z, z);
        }
    }

    #[test]
    fn points_are_scaled_by_step_and_pushed_to_the_sink() {
        let mut sink = RecordingSink::default();
        let grid = built(config(20, FunctionKind::Ripple, Dimension::Volumetric), &mut sink, 0.5);

        for point in grid.points() {
            assert_eq!(point.scale(), 0.1);
            let marker = sink.live[point.handle()];
            assert_eq!(marker.scale, Some(0.1));
            assert_eq!(marker.position, Some(point.position()));
        }
    }

    #[test]
    fn rebuild_evaluates_the_first_frame() {
        let mut sink = RecordingSink::default();
        let grid = built(config(8, FunctionKind::Wave, Dimension::Volumetric), &mut sink, 0.3);
        for point in grid.points() {
            let p = point.position();
            assert_eq!(p.y, FunctionKind::Wave.evaluate(p.x, p.z, 0.3));
        }
    }

    #[test]
    fn tick_only_moves_y() {
        let mut sink = RecordingSink::default();
        let mut grid = built(config(10, FunctionKind::MultiWave2, Dimension::Volumetric), &mut sink, 0.);
        let before: Vec<Point> = grid.points().iter().map(|p| p.position()).collect();

        grid.tick(&mut sink, 1.25);

        for (point, old) in grid.points().iter().zip(&before) {
            let p = point.position();
            assert_eq!(p.x, old.x);
            assert_eq!(p.z, old.z);
            assert_eq!(p.y, FunctionKind::MultiWave2.evaluate(p.x, p.z, 1.25));
            assert_eq!(point.scale(), 0.2);
            assert_eq!(sink.live[point.handle()].position, Some(p));
        }
        assert_eq!(sink.created, 100);
        assert_eq!(sink.destroyed, 0);
    }

    #[test]
    fn tick_writes_positions_in_index_order() {
        let mut sink = RecordingSink::default();
        let mut grid = built(config(7, FunctionKind::Wave, Dimension::Volumetric), &mut sink, 0.);
        sink.position_writes.clear();

        grid.tick(&mut sink, 0.6);

        let handles: Vec<u32> = grid.points().iter().map(|p| *p.handle()).collect();
        assert_eq!(sink.position_writes, handles);
    }

    #[test]
    fn tick_is_idempotent_for_the_same_time() {
        let mut sink = RecordingSink::default();
        let mut grid = built(config(15, FunctionKind::Ripple, Dimension::Volumetric), &mut sink, 0.);

        grid.tick(&mut sink, 2.5);
        let first: Vec<Point> = grid.points().iter().map(|p| p.position()).collect();
        grid.tick(&mut sink, 2.5);
        let second: Vec<Point> = grid.points().iter().map(|p| p.position()).collect();

        assert_eq!(first, second);
    }

    #[test]
    fn switching_dimension_replaces_every_point() {
        let mut sink = RecordingSink::default();
        let mut grid = built(config(20, FunctionKind::Wave, Dimension::Planar), &mut sink, 0.);
        let old_handles: Vec<u32> = grid.points().iter().map(|p| *p.handle()).collect();
        assert_eq!(old_handles.len(), 20);

        grid.set_dimension(Dimension::Volumetric);
        assert_eq!(grid.state(), GridState::Rebuilding);
        grid.tick(&mut sink, 0.1);

        assert_eq!(grid.state(), GridState::Stable);
        assert_eq!(sink.destroyed, 20);
        assert_eq!(sink.created, 20 + 400);
        assert_eq!(grid.len(), 400);
        assert_eq!(sink.live.len(), 400);
        // old set is released before the new one is acquired
        assert_eq!(sink.peak_live, 400);
        for handle in old_handles {
            assert!(!sink.live.contains_key(&handle));
            assert!(grid.points().iter().all(|p| *p.handle() != handle));
        }
    }

    #[test]
    fn switching_back_and_forth_restores_layout() {
        let mut sink = RecordingSink::default();
        let mut grid = built(config(6, FunctionKind::Line, Dimension::Volumetric), &mut sink, 0.);
        grid.set_dimension(Dimension::Planar);
        grid.set_dimension(Dimension::Volumetric);
        assert_eq!(grid.state(), GridState::Stable);

        grid.tick(&mut sink, 0.);
        assert_eq!(sink.created, 36);
    }

    #[test]
    fn function_change_applies_without_rebuild() {
        let mut sink = RecordingSink::default();
        let mut grid = built(config(10, FunctionKind::Line, Dimension::Planar), &mut sink, 0.);

        grid.set_function(FunctionKind::Cubed);
        assert_eq!(grid.state(), GridState::Stable);
        grid.tick(&mut sink, 0.);

        assert_eq!(sink.created, 10);
        for point in grid.points() {
            let x = point.position().x;
            assert_eq!(point.position().y, x * x * x);
        }
    }

    #[test]
    fn invalid_resolution_keeps_the_grid() {
        let mut sink = RecordingSink::default();
        let mut grid = built(config(12, FunctionKind::Wave, Dimension::Volumetric), &mut sink, 0.);
        let before: Vec<(u32, Point)> = grid
            .points()
            .iter()
            .map(|p| (*p.handle(), p.position()))
            .collect();

        assert_eq!(grid.set_resolution(0), Err(GraphError::InvalidResolution(0)));
        assert_eq!(
            grid.configure(config(0, FunctionKind::Ripple, Dimension::Planar)),
            Err(GraphError::InvalidResolution(0))
        );
        assert_eq!(grid.state(), GridState::Stable);
        assert_eq!(grid.function(), FunctionKind::Wave);
        assert_eq!(grid.dimension(), Dimension::Volumetric);

        let after: Vec<(u32, Point)> = grid
            .points()
            .iter()
            .map(|p| (*p.handle(), p.position()))
            .collect();
        assert_eq!(before, after);
        assert_eq!(sink.destroyed, 0);
    }

    #[test]
    fn resolution_change_rebuilds() {
        let mut sink = RecordingSink::default();
        let mut grid = built(config(10, FunctionKind::Wave, Dimension::Volumetric), &mut sink, 0.);

        grid.configure(config(30, FunctionKind::Wave, Dimension::Volumetric))
            .unwrap();
        grid.tick(&mut sink, 0.);

        assert_eq!(grid.len(), 900);
        assert_eq!(sink.destroyed, 100);
        assert_eq!(grid.points()[0].scale(), 2. / 30.);
    }

    #[test]
    fn heights_match_points() {
        let mut sink = RecordingSink::default();
        let grid = built(config(5, FunctionKind::Squared, Dimension::Volumetric), &mut sink, 0.);
        let heights = grid.heights();

        assert_eq!(heights.dim(), (5, 5));
        for ((row, col), &y) in heights.indexed_iter() {
            assert_eq!(y, grid.points()[row * 5 + col].position().y);
        }

        let mut sink = RecordingSink::default();
        let grid = built(config(5, FunctionKind::Squared, Dimension::Planar), &mut sink, 0.);
        assert_eq!(grid.heights().dim(), (1, 5));
    }

    #[test]
    fn release_returns_every_handle() {
        let mut sink = RecordingSink::default();
        let mut grid = built(config(9, FunctionKind::Wave, Dimension::Volumetric), &mut sink, 0.);
        grid.release(&mut sink);

        assert_eq!(grid.state(), GridState::Uninitialized);
        assert!(sink.live.is_empty());
        assert_eq!(sink.destroyed, 81);
    }

    #[test]
    fn point_count_and_coordinates() {
        let r = Resolution::new(4).unwrap();
        assert_eq!(point_count(r, Dimension::Planar), 4);
        assert_eq!(point_count(r, Dimension::Volumetric), 16);
        assert_eq!(grid_coordinates(0, r, Dimension::Volumetric), (-0.75, -0.75));
        assert_eq!(grid_coordinates(5, r, Dimension::Volumetric), (-0.25, -0.25));
        assert_eq!(grid_coordinates(3, r, Dimension::Planar), (0.75, 0.));
    }
}
