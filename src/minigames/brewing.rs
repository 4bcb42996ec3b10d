// Brewing: the three ingredients go into the cup, then a stir and a bit of foam art.

use std::time::Duration;

use bevy::color::Alpha;
use bevy::prelude::*;
use rand::Rng;

use super::drag::{DragReleased, Draggable, within};
use super::{Feedback, announce};
use crate::banner::spawn_banner;
use crate::effects::Burst;
use crate::scenery::{Backdrop, spawn_backdrop};
use crate::sections::Sections;
use crate::sound::AudioCue;
use crate::stage::{StageRoot, block, caption_with, move_to, palette, place, spawn_stage, text};
use crate::steps::StepId;
use crate::transition::Pulse;

pub struct BrewingPlugin;

impl Plugin for BrewingPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(Sections::Step(StepId::Brewing)), setup_brewing)
            .add_systems(
                Update,
                (add_ingredients, run_brew, stir_spoon, rise_bubbles, show_fill)
                    .chain()
                    .run_if(in_state(Sections::Step(StepId::Brewing))),
            );
    }
}

pub const CUP: Vec2 = Vec2::new(960.0, 600.0);
pub const DROP_RADIUS: f32 = 150.0;
pub const INGREDIENTS: usize = 3;

const CUP_SIZE: Vec2 = Vec2::new(200.0, 250.0);
const FILL_MAX: f32 = 240.0;
const INGREDIENT_SIZE: Vec2 = Vec2::new(120.0, 80.0);
const SETTLE: Duration = Duration::from_millis(800);
const STIR: Duration = Duration::from_secs(6);
const FOAM: Duration = Duration::from_millis(1500);
const STIR_TURNS: f32 = 3.0;
const BUBBLE_EVERY: Duration = Duration::from_millis(400);
const BUBBLES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
enum BrewPhase {
    Gathering,
    Settling(Duration),
    Stirring(Duration),
    Foaming(Duration),
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrewEvent {
    StirStarted,
    FoamArt,
    Finished,
}

/// Progress through the brew.
#[derive(Resource, Debug, Clone)]
pub struct Brew {
    added: usize,
    phase: BrewPhase,
}

impl Default for Brew {
    fn default() -> Self {
        Self {
            added: 0,
            phase: BrewPhase::Gathering,
        }
    }
}

impl Brew {
    pub fn added(&self) -> usize {
        self.added
    }

    /// Counts one ingredient into the cup. Returns `true` when it was the last.
    pub fn add(&mut self) -> bool {
        if self.phase != BrewPhase::Gathering {
            return false;
        }
        self.added += 1;
        if self.added >= INGREDIENTS {
            self.phase = BrewPhase::Settling(SETTLE);
            return true;
        }
        false
    }

    /// Fraction of the stir done, if stirring.
    pub fn stir_progress(&self) -> Option<f32> {
        match self.phase {
            BrewPhase::Stirring(remaining) => {
                Some(1.0 - remaining.as_secs_f32() / STIR.as_secs_f32())
            }
            _ => None,
        }
    }

    pub fn tick(&mut self, dt: Duration) -> Option<BrewEvent> {
        let (remaining, next, event) = match self.phase {
            BrewPhase::Settling(remaining) => (
                remaining,
                BrewPhase::Stirring(STIR),
                BrewEvent::StirStarted,
            ),
            BrewPhase::Stirring(remaining) => {
                (remaining, BrewPhase::Foaming(FOAM), BrewEvent::FoamArt)
            }
            BrewPhase::Foaming(remaining) => (remaining, BrewPhase::Done, BrewEvent::Finished),
            BrewPhase::Gathering | BrewPhase::Done => return None,
        };

        let remaining = remaining.saturating_sub(dt);
        if remaining.is_zero() {
            self.phase = next;
            return Some(event);
        }
        self.phase = match self.phase {
            BrewPhase::Settling(_) => BrewPhase::Settling(remaining),
            BrewPhase::Stirring(_) => BrewPhase::Stirring(remaining),
            _ => BrewPhase::Foaming(remaining),
        };
        None
    }
}

#[derive(Component)]
struct Ingredient;

#[derive(Component)]
struct CoffeeFill;

#[derive(Component)]
struct BrewProgress;

#[derive(Component)]
struct DropZone;

#[derive(Component)]
struct Spoon;

#[derive(Component)]
struct Bubble {
    x: f32,
    pulse: Pulse,
}

#[derive(Component)]
struct BubbleTimer {
    next: Duration,
    left: usize,
}

fn setup_brewing(mut commands: Commands) {
    commands.insert_resource(Brew::default());

    let stage = spawn_stage(&mut commands, StepId::Brewing, palette::CREAM);
    commands.entity(stage).with_children(|parent| {
        spawn_backdrop(parent, Backdrop::Kitchen);
        spawn_banner(parent, StepId::Brewing);

        parent.spawn((
            DropZone,
            Node {
                border: UiRect::all(Val::Px(3.0)),
                ..place(CUP, Vec2::splat(DROP_RADIUS * 2.0))
            },
            BackgroundColor(palette::GOLD.with_alpha(0.1)),
            BorderColor::all(palette::GOLD.with_alpha(0.5)),
        ));
        parent.spawn(block(CUP, CUP_SIZE, Color::srgb(0.545, 0.271, 0.075), Color::BLACK));
        parent.spawn((
            CoffeeFill,
            place(CUP + Vec2::new(0.0, CUP_SIZE.y / 2.0), Vec2::new(190.0, 0.0)),
            BackgroundColor(palette::COFFEE_BROWN),
        ));
        caption_with(
            parent,
            CUP + Vec2::new(0.0, 180.0),
            28.0,
            (
                BrewProgress,
                text(format!("0 / {INGREDIENTS} ingredients"), 28.0, palette::INK),
            ),
        );

        let ingredients = [
            (Vec2::new(300.0, 400.0), "Coffee\nBeans", palette::COFFEE_BROWN, Color::WHITE),
            (Vec2::new(960.0, 350.0), "Milk", palette::CREAM, palette::INK),
            (
                Vec2::new(1600.0, 400.0),
                "Caramel\nPistachio",
                palette::CARAMEL,
                Color::WHITE,
            ),
        ];
        for (home, label, fill, ink) in ingredients {
            parent
                .spawn((
                    Ingredient,
                    Draggable::new(home, INGREDIENT_SIZE),
                    block(home, INGREDIENT_SIZE, fill, Color::BLACK),
                    ZIndex(10),
                ))
                .with_children(|item| {
                    item.spawn(text(label, 18.0, ink));
                });
        }
    });
}

fn add_ingredients(
    mut commands: Commands,
    mut released: MessageReader<DragReleased>,
    mut items: Query<&mut Draggable, With<Ingredient>>,
    mut brew: ResMut<Brew>,
    mut labels: Query<&mut Text, With<BrewProgress>>,
    mut feedback: Feedback,
) {
    for drop in released.read() {
        let Ok(mut item) = items.get_mut(drop.entity) else {
            continue;
        };
        if !within(drop.at, CUP, DROP_RADIUS) {
            item.send_home();
            continue;
        }

        commands.entity(drop.entity).despawn();
        feedback.cue(AudioCue::Pour);
        feedback.burst(Burst::sparkle(CUP, 15));
        if brew.add() {
            info!("All {INGREDIENTS} ingredients in the cup");
        }
        for mut label in &mut labels {
            label.0 = format!("{} / {INGREDIENTS} ingredients", Brew::added(&brew));
        }
    }
}

fn run_brew(
    mut commands: Commands,
    time: Res<Time>,
    mut brew: ResMut<Brew>,
    zones: Query<Entity, With<DropZone>>,
    spoons: Query<Entity, With<Spoon>>,
    stages: Query<Entity, With<StageRoot>>,
    mut feedback: Feedback,
) {
    let Some(event) = brew.tick(time.delta()) else {
        return;
    };
    let Ok(stage) = stages.single() else {
        return;
    };

    match event {
        BrewEvent::StirStarted => {
            for zone in &zones {
                commands.entity(zone).despawn();
            }
            commands.entity(stage).with_children(|parent| {
                parent.spawn((
                    Spoon,
                    block(CUP, Vec2::new(20.0, 120.0), palette::SILVER, Color::BLACK),
                    ZIndex(20),
                ));
            });
            commands.spawn((
                BubbleTimer {
                    next: Duration::ZERO,
                    left: BUBBLES,
                },
                DespawnOnExit(Sections::Step(StepId::Brewing)),
            ));
        }
        BrewEvent::FoamArt => {
            for spoon in &spoons {
                commands.entity(spoon).despawn();
            }
            commands.entity(stage).with_children(|parent| {
                let foam = Vec2::new(CUP.x, 475.0);
                parent.spawn((
                    block(foam, Vec2::new(190.0, 60.0), palette::CREAM, Color::BLACK),
                    ZIndex(25),
                ));
                for eye in [-30.0, 30.0] {
                    parent.spawn((
                        place(foam + Vec2::new(eye, -8.0), Vec2::splat(10.0)),
                        BackgroundColor(palette::COFFEE_BROWN),
                        ZIndex(26),
                    ));
                }
                parent.spawn((
                    place(foam + Vec2::new(0.0, 12.0), Vec2::new(50.0, 4.0)),
                    BackgroundColor(palette::COFFEE_BROWN),
                    ZIndex(26),
                ));
            });
            feedback.burst(Burst::hearts(Vec2::new(CUP.x, 400.0)));
        }
        BrewEvent::Finished => {
            info!("Coffee brewed");
            feedback.flash(palette::GOLD);
            feedback.cue(AudioCue::Success);
            feedback.complete(StepId::Brewing);
            announce(&mut commands, stage, "Perfect Coffee!\nReady to celebrate!");
        }
    }
}

/// The spoon circles the rim while stirring.
fn stir_spoon(brew: Res<Brew>, mut spoons: Query<&mut Node, With<Spoon>>) {
    let Some(progress) = brew.stir_progress() else {
        return;
    };
    let angle = progress * STIR_TURNS * std::f32::consts::TAU;
    let center = Vec2::new(CUP.x, 550.0) + Vec2::new(angle.cos(), angle.sin() * 0.3) * 80.0;
    for mut node in &mut spoons {
        move_to(&mut node, center, Vec2::new(20.0, 120.0));
    }
}

fn rise_bubbles(
    mut commands: Commands,
    time: Res<Time>,
    mut timers: Query<(Entity, &mut BubbleTimer)>,
    mut bubbles: Query<(Entity, &mut Bubble, &mut Node, &mut BackgroundColor)>,
    stages: Query<Entity, With<StageRoot>>,
) {
    for (entity, mut timer) in &mut timers {
        timer.next = timer.next.saturating_sub(time.delta());
        if !timer.next.is_zero() {
            continue;
        }
        if timer.left == 0 {
            commands.entity(entity).despawn();
            continue;
        }
        timer.left -= 1;
        timer.next = BUBBLE_EVERY;
        let Ok(stage) = stages.single() else {
            continue;
        };
        let mut rng = rand::rng();
        let x = CUP.x + rng.random_range(-60.0..=60.0);
        let size = rng.random_range(10.0..=20.0);
        commands.entity(stage).with_children(|parent| {
            parent.spawn((
                Bubble {
                    x,
                    pulse: Pulse::new(Duration::from_secs(1)),
                },
                place(Vec2::new(x, 620.0), Vec2::splat(size)),
                BackgroundColor(palette::CREAM.with_alpha(0.6)),
                ZIndex(22),
            ));
        });
    }

    for (entity, mut bubble, mut node, mut color) in &mut bubbles {
        if bubble.pulse.advance(time.delta()) {
            commands.entity(entity).despawn();
            continue;
        }
        let strength = bubble.pulse.strength();
        let size = match node.width {
            Val::Px(width) => width,
            _ => 10.0,
        };
        let y = 500.0 + 120.0 * strength;
        move_to(&mut node, Vec2::new(bubble.x, y), Vec2::splat(size));
        color.0 = color.0.with_alpha(0.6 * strength);
    }
}

fn show_fill(brew: Res<Brew>, mut fills: Query<&mut Node, With<CoffeeFill>>) {
    if !brew.is_changed() {
        return;
    }
    let height = FILL_MAX / INGREDIENTS as f32 * Brew::added(&brew) as f32;
    let bottom = CUP.y + CUP_SIZE.y / 2.0;
    for mut node in &mut fills {
        *node = place(
            Vec2::new(CUP.x, bottom - height / 2.0),
            Vec2::new(190.0, height),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_cup(brew: &mut Brew) {
        assert!(!brew.add());
        assert!(!brew.add());
        assert!(brew.add());
    }

    #[test]
    fn third_ingredient_starts_the_brew() {
        let mut brew = Brew::default();
        assert_eq!(brew.tick(STIR), None);
        fill_cup(&mut brew);
        assert_eq!(brew.added(), INGREDIENTS);
        // Extra drops are ignored.
        assert!(!brew.add());
        assert_eq!(brew.added(), INGREDIENTS);
    }

    #[test]
    fn stir_then_foam_then_finish() {
        let mut brew = Brew::default();
        fill_cup(&mut brew);

        assert_eq!(brew.tick(Duration::from_millis(500)), None);
        assert_eq!(brew.tick(Duration::from_millis(300)), Some(BrewEvent::StirStarted));
        assert_eq!(brew.stir_progress(), Some(0.0));

        assert_eq!(brew.tick(STIR / 2), None);
        let halfway = brew.stir_progress().unwrap_or_default();
        assert!((halfway - 0.5).abs() < 1e-4);

        assert_eq!(brew.tick(STIR / 2), Some(BrewEvent::FoamArt));
        assert_eq!(brew.stir_progress(), None);
        assert_eq!(brew.tick(Duration::from_millis(1499)), None);
        assert_eq!(brew.tick(Duration::from_millis(1)), Some(BrewEvent::Finished));
        assert_eq!(brew.tick(FOAM), None);
    }
}
