// Mini-game title and instructions. The title stays, the instructions fade away.

use bevy::color::Alpha;
use bevy::prelude::*;

use crate::stage::{CENTER, caption, palette};
use crate::steps::StepId;

pub struct BannerPlugin;

impl Plugin for BannerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, fade_instructions);
    }
}

const FADE_IN: f32 = 0.2;
const HOLD: f32 = 3.3;
const FADE_OUT: f32 = 1.0;
const TOTAL: f32 = FADE_IN + HOLD + FADE_OUT;

fn heading(step: StepId) -> Option<(&'static str, &'static str)> {
    match step {
        StepId::CoffeeBeans => Some((
            "Coffee Bean Collection",
            "Drag all 5 coffee beans into the grinder!",
        )),
        StepId::MilkPour => Some((
            "Perfect Milk Pour",
            "Click to start pouring, then click again when the meter is in the yellow zone!",
        )),
        StepId::BeachDiscovery => Some((
            "Beach Discovery",
            "Click the shells to find the caramel pistachio ingredient!",
        )),
        StepId::CrabPhotography => Some((
            "Crab Photography Challenge",
            "Click the crab to take a perfect photo and get the ingredient back!",
        )),
        StepId::Brewing => Some((
            "Brewing the Perfect Coffee",
            "Drag all 3 ingredients into the cup to brew your coffee!",
        )),
        _ => None,
    }
}

#[derive(Component)]
struct Instructions {
    age: f32,
}

/// Adds the step's title and fading instructions to its stage.
pub fn spawn_banner(parent: &mut ChildSpawnerCommands, step: StepId) {
    let Some((title, instructions)) = heading(step) else {
        return;
    };

    caption(parent, Vec2::new(CENTER.x, 100.0), title, 48.0, palette::INK);
    let line = caption(
        parent,
        Vec2::new(CENTER.x, 250.0),
        instructions,
        28.0,
        palette::COFFEE_BROWN.with_alpha(0.0),
    );
    parent.commands().entity(line).insert(Instructions { age: 0.0 });
}

/// Opacity of the instructions `age` seconds after they appear, or `None` once gone.
fn instructions_alpha(age: f32) -> Option<f32> {
    if age >= TOTAL {
        None
    } else if age < FADE_IN {
        Some(age / FADE_IN)
    } else if age < FADE_IN + HOLD {
        Some(1.0)
    } else {
        Some(1.0 - (age - FADE_IN - HOLD) / FADE_OUT)
    }
}

fn fade_instructions(
    mut commands: Commands,
    time: Res<Time>,
    mut lines: Query<(Entity, &mut Instructions, &Children)>,
    mut texts: Query<&mut TextColor>,
) {
    for (entity, mut line, children) in &mut lines {
        line.age += time.delta_secs();
        let Some(alpha) = instructions_alpha(line.age) else {
            commands.entity(entity).despawn();
            continue;
        };
        for child in children.iter() {
            if let Ok(mut color) = texts.get_mut(child) {
                color.0 = palette::COFFEE_BROWN.with_alpha(alpha);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_minigame_has_a_heading() {
        use strum::IntoEnumIterator;
        for step in StepId::iter() {
            assert_eq!(
                heading(step).is_some(),
                step.kind() == crate::steps::StepKind::MiniGame,
                "{step}"
            );
        }
    }

    #[test]
    fn instructions_fade_in_hold_then_vanish() {
        assert_eq!(instructions_alpha(0.0), Some(0.0));
        assert_eq!(instructions_alpha(1.0), Some(1.0));
        let fading = instructions_alpha(FADE_IN + HOLD + FADE_OUT / 2.0).unwrap();
        assert!((fading - 0.5).abs() < 1e-4);
        assert_eq!(instructions_alpha(TOTAL), None);
    }
}
