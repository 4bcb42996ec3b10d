// Backdrops shared by the kitchen and beach steps.

use bevy::color::Alpha;
use bevy::prelude::*;

use crate::stage::{CENTER, STAGE_SIZE, block, palette, place};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backdrop {
    Kitchen,
    Beach,
}

impl Backdrop {
    pub fn base_color(self) -> Color {
        match self {
            Backdrop::Kitchen => palette::KITCHEN,
            Backdrop::Beach => palette::SKY_BLUE,
        }
    }
}

/// Paints the backdrop layers behind everything else on the stage.
pub fn spawn_backdrop(parent: &mut ChildSpawnerCommands, backdrop: Backdrop) {
    match backdrop {
        Backdrop::Kitchen => {
            parent.spawn((
                place(Vec2::new(CENTER.x, 900.0), Vec2::new(STAGE_SIZE.x, 400.0)),
                BackgroundColor(palette::COUNTER),
            ));
            parent.spawn((
                place(Vec2::new(1400.0, 300.0), Vec2::new(300.0, 400.0)),
                BackgroundColor(palette::SKY_BLUE.with_alpha(0.3)),
            ));
            parent.spawn((
                place(Vec2::new(1400.0, 200.0), Vec2::splat(300.0)),
                BackgroundColor(palette::GOLD.with_alpha(0.2)),
            ));
        }
        Backdrop::Beach => {
            parent.spawn((
                place(Vec2::new(CENTER.x, 700.0), Vec2::new(STAGE_SIZE.x, 400.0)),
                BackgroundColor(palette::OCEAN_BLUE),
            ));
            for i in 0..12 {
                parent.spawn((
                    place(Vec2::new(i as f32 * 180.0, 620.0), Vec2::new(160.0, 25.0)),
                    BackgroundColor(Color::WHITE.with_alpha(0.2)),
                ));
            }
            parent.spawn((
                place(Vec2::new(CENTER.x, 950.0), Vec2::new(STAGE_SIZE.x, 260.0)),
                BackgroundColor(palette::SAND),
            ));
            parent.spawn(block(
                Vec2::new(300.0, 200.0),
                Vec2::splat(160.0),
                palette::SUNSET_ORANGE,
                palette::GOLD,
            ));
        }
    }
}

/// A little crab: shell, two eyes and two claws.
pub fn spawn_crab_body(parent: &mut ChildSpawnerCommands, size: Vec2) {
    let claw = Vec2::splat(size.y * 0.45);
    parent.spawn((
        place(Vec2::new(-claw.x * 0.3, size.y * 0.2), claw),
        BackgroundColor(palette::ALERT_ORANGE),
    ));
    parent.spawn((
        place(Vec2::new(size.x + claw.x * 0.3, size.y * 0.2), claw),
        BackgroundColor(palette::ALERT_ORANGE),
    ));
    let eye = Vec2::splat(size.y * 0.18);
    for x in [0.35, 0.65] {
        parent.spawn((
            place(Vec2::new(size.x * x, size.y * 0.3), eye),
            BackgroundColor(Color::BLACK),
        ));
    }
}
