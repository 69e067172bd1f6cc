use std::collections::HashMap;

use bevy::prelude::*;
use tracing::warn;

use crate::{
    config::{Dimension, GraphConfig},
    grid::SurfaceGrid,
    library::FunctionKind,
    sink::PointSink,
    types::{Point, Value},
};

/// System sets for the surface graph.
///
/// Order your own configuration systems before [`SurfaceGraphSet::Animate`] so changes
/// show up in the same frame:
///
/// ```rust,ignore
/// app.add_systems(Update, handle_input.before(SurfaceGraphSet::Animate));
/// ```
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SurfaceGraphSet {
    /// Applies [`GraphConfig`] changes, rebuilds the grid if needed and moves every point.
    Animate,
}

/// Marker component on every entity spawned for a grid point.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct GraphPoint;

/// Mesh and material shared by all point entities.
///
/// Only created when the render asset stores exist, so the plugin also runs headless.
#[derive(Resource, Clone)]
pub struct PointAssets {
    pub mesh: Handle<Mesh>,
    pub material: Handle<StandardMaterial>,
}

/// Owns the [`SurfaceGrid`] whose handles are point entities.
///
/// `None` until a valid [`GraphConfig`] has been seen.
#[derive(Resource, Default)]
pub struct GraphState {
    grid: Option<SurfaceGrid<Entity>>,
}

impl GraphState {
    pub fn grid(&self) -> Option<&SurfaceGrid<Entity>> {
        self.grid.as_ref()
    }

    /// Hands `config` to the grid, creating it on first use.
    ///
    /// A rejected configuration is logged and the current grid is kept as is.
    fn apply(&mut self, config: GraphConfig) {
        let result = match self.grid.as_mut() {
            Some(grid) => grid.configure(config),
            None => SurfaceGrid::new(config).map(|grid| {
                self.grid = Some(grid);
            }),
        };

        if let Err(err) = result {
            warn!(%err, ?config, "rejected surface graph configuration, keeping current grid");
        }
    }
}

/// Bevy plugin that animates a grid of points sampling a surface function.
///
/// With the `auto_animate` feature enabled, the grid is built on the first frame and
/// re-evaluated every [`Update`] using [`Time::elapsed_secs`]:
///
/// ```text
/// GraphConfig changed?
///   → SurfaceGrid::configure          (invalid resolution: warn, keep grid)
/// SurfaceGrid::tick(elapsed)
///   → layout changed: despawn all GraphPoint entities, spawn the new set
///   → otherwise:      write Transform::translation.y of every point
/// ```
pub struct SurfaceGraphPlugin {
    /// Initial value for [`GraphConfig::resolution`].
    pub resolution: u32,
    /// Initial value for [`GraphConfig::function`].
    pub function: FunctionKind,
    /// Initial value for [`GraphConfig::dimension`].
    pub dimension: Dimension,
}

impl Default for SurfaceGraphPlugin {
    fn default() -> Self {
        GraphConfig::default().into()
    }
}

impl From<GraphConfig> for SurfaceGraphPlugin {
    fn from(config: GraphConfig) -> Self {
        Self {
            resolution: config.resolution,
            function: config.function,
            dimension: config.dimension,
        }
    }
}

impl Plugin for SurfaceGraphPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(GraphConfig {
            resolution: self.resolution,
            function: self.function,
            dimension: self.dimension,
        })
        .init_resource::<GraphState>()
        .add_systems(Startup, create_point_assets);

        #[cfg(feature = "auto_animate")]
        app.add_systems(Update, animate_graph.in_set(SurfaceGraphSet::Animate));
    }
}

/// Inserts [`PointAssets`]: a unit cube, scaled per point to the grid step.
fn create_point_assets(
    mut commands: Commands,
    meshes: Option<ResMut<Assets<Mesh>>>,
    materials: Option<ResMut<Assets<StandardMaterial>>>,
) {
    let (Some(mut meshes), Some(mut materials)) = (meshes, materials) else {
        return;
    };

    commands.insert_resource(PointAssets {
        mesh: meshes.add(Cuboid::new(1., 1., 1.)),
        material: materials.add(StandardMaterial {
            base_color: Color::srgb(0.95, 0.55, 0.15),
            ..default()
        }),
    });
}

/// Applies configuration changes and advances the grid to the current elapsed time.
pub fn animate_graph(
    mut commands: Commands,
    config: Res<GraphConfig>,
    time: Res<Time>,
    assets: Option<Res<PointAssets>>,
    mut state: ResMut<GraphState>,
    mut transforms: Query<&mut Transform, With<GraphPoint>>,
) {
    if config.is_changed() {
        state.apply(*config);
    }

    let Some(grid) = state.grid.as_mut() else {
        return;
    };

    let mut sink = EntitySink {
        commands: &mut commands,
        transforms: &mut transforms,
        assets: assets.as_deref(),
        spawned: HashMap::new(),
    };
    grid.tick(&mut sink, time.elapsed_secs());
    sink.flush();
}

/// [`PointSink`] backed by ECS entities.
///
/// Entities spawned this frame only exist once commands are applied, so their transforms
/// are staged in `spawned` and inserted by [`flush`](EntitySink::flush). Existing entities
/// are written through the query directly.
struct EntitySink<'a, 'w, 's, 'qw, 'qs, 't> {
    commands: &'a mut Commands<'w, 's>,
    transforms: &'a mut Query<'qw, 'qs, &'t mut Transform, With<GraphPoint>>,
    assets: Option<&'a PointAssets>,
    spawned: HashMap<Entity, Transform>,
}

impl EntitySink<'_, '_, '_, '_, '_, '_> {
    fn transform_mut(&mut self, entity: Entity, apply: impl FnOnce(&mut Transform)) {
        if let Some(transform) = self.spawned.get_mut(&entity) {
            apply(transform);
        } else if let Ok(mut transform) = self.transforms.get_mut(entity) {
            apply(&mut transform);
        }
    }

    fn flush(self) {
        for (entity, transform) in self.spawned {
            self.commands.entity(entity).insert(transform);
        }
    }
}

impl PointSink for EntitySink<'_, '_, '_, '_, '_, '_> {
    type Handle = Entity;

    fn create(&mut self) -> Entity {
        let mut entity = self
            .commands
            .spawn((GraphPoint, Transform::default(), Visibility::default()));
        if let Some(assets) = self.assets {
            entity.insert((
                Mesh3d(assets.mesh.clone()),
                MeshMaterial3d(assets.material.clone()),
            ));
        }

        let id = entity.id();
        self.spawned.insert(id, Transform::default());
        id
    }

    fn destroy(&mut self, entity: Entity) {
        self.spawned.remove(&entity);
        self.commands.entity(entity).despawn();
    }

    fn set_position(&mut self, entity: &Entity, position: Point) {
        let translation = Vec3::new(position.x, position.y, position.z);
        self.transform_mut(*entity, |transform| transform.translation = translation);
    }

    fn set_uniform_scale(&mut self, entity: &Entity, scale: Value) {
        self.transform_mut(*entity, |transform| transform.scale = Vec3::splat(scale));
    }
}
