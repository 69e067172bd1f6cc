//! Interactive surface graph.
//!
//! ```text
//! cargo run --example graph -- [function] [dimension] [resolution]
//! cargo run --example graph -- ripple 3d 80
//! ```
//!
//! Keys: `F` / `Shift+F` cycle the function, `Space` toggles 2D/3D,
//! `Up` / `Down` change the resolution by 10, `H` logs the current height range.

use bevy::prelude::*;
use bevy_infinite_grid::{InfiniteGridBundle, InfiniteGridPlugin, InfiniteGridSettings};
use bevy_panorbit_camera::{PanOrbitCamera, PanOrbitCameraPlugin};
use bevy_surface_graph::{
    GraphConfig, SurfaceGraphPlugin,
    config::{MAX_RESOLUTION, MIN_RESOLUTION},
    plugin::{GraphState, SurfaceGraphSet},
};

fn main() {
    let config = match GraphConfig::from_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            eprintln!("usage: graph [function] [planar|volumetric] [resolution]");
            std::process::exit(2);
        }
    };

    App::new()
        .add_plugins((
            DefaultPlugins,
            SurfaceGraphPlugin::from(config),
            PanOrbitCameraPlugin,
            InfiniteGridPlugin,
        ))
        .add_systems(Startup, setup)
        .add_systems(
            Update,
            (
                handle_input.before(SurfaceGraphSet::Animate),
                log_height_range.after(SurfaceGraphSet::Animate),
            ),
        )
        .run();
}

fn setup(mut commands: Commands) {
    commands.spawn(InfiniteGridBundle {
        settings: InfiniteGridSettings {
            fadeout_distance: 20.0,
            ..Default::default()
        },
        ..Default::default()
    });

    commands.spawn((
        Camera3d::default(),
        PanOrbitCamera::default(),
        Transform::from_xyz(-2.2, 1.8, -2.2).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: light_consts::lux::FULL_DAYLIGHT,
            ..Default::default()
        },
        Transform::default().with_rotation(Quat::from_rotation_x(-45.0_f32.to_radians())),
    ));
}

fn handle_input(keyboard: Res<ButtonInput<KeyCode>>, mut config: ResMut<GraphConfig>) {
    let shift = keyboard.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]);

    if keyboard.just_pressed(KeyCode::KeyF) {
        config.function = if shift {
            config.function.previous()
        } else {
            config.function.next()
        };
        info!("function: {}", config.function);
    }

    if keyboard.just_pressed(KeyCode::Space) {
        config.dimension = config.dimension.toggled();
        info!("dimension: {}", config.dimension);
    }

    if keyboard.just_pressed(KeyCode::ArrowUp) {
        config.resolution = (config.resolution + 10).min(MAX_RESOLUTION);
        info!("resolution: {}", config.resolution);
    }

    if keyboard.just_pressed(KeyCode::ArrowDown) {
        config.resolution = config.resolution.saturating_sub(10).max(MIN_RESOLUTION);
        info!("resolution: {}", config.resolution);
    }
}

fn log_height_range(keyboard: Res<ButtonInput<KeyCode>>, state: Res<GraphState>) {
    if !keyboard.just_pressed(KeyCode::KeyH) {
        return;
    }
    let Some(grid) = state.grid() else {
        return;
    };

    let heights = grid.heights();
    let min = heights.fold(f32::INFINITY, |acc, &y| acc.min(y));
    let max = heights.fold(f32::NEG_INFINITY, |acc, &y| acc.max(y));
    info!(
        "{} {:?}: y in [{min:.3}, {max:.3}] over {} rows",
        grid.function(),
        grid.dimension(),
        heights.nrows()
    );
}
