// Milk pour: stop the meter inside the target zone three times to fill the glass.

use std::time::Duration;

use bevy::color::Alpha;
use bevy::prelude::*;

use super::{Feedback, announce};
use crate::banner::spawn_banner;
use crate::effects::Burst;
use crate::progression::accepting_input;
use crate::scenery::{Backdrop, spawn_backdrop};
use crate::sections::Sections;
use crate::sound::AudioCue;
use crate::stage::{StageRoot, block, caption_with, palette, place, spawn_stage, text};
use crate::steps::StepId;

pub struct PourPlugin;

impl Plugin for PourPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(Sections::Step(StepId::MilkPour)), setup_pour)
            .add_systems(
                Update,
                (
                    click_to_pour.run_if(accepting_input),
                    run_pour,
                    paint_pour,
                )
                    .chain()
                    .run_if(in_state(Sections::Step(StepId::MilkPour))),
            );
    }
}

pub const POUR_RATE: f32 = 0.25;
pub const TARGET_ZONE: (f32, f32) = (0.45, 0.65);
pub const ROUNDS: usize = 3;
const COOLDOWN: Duration = Duration::from_millis(1500);

const METER_CENTER: Vec2 = Vec2::new(960.0, 550.0);
const METER_SIZE: Vec2 = Vec2::new(400.0, 60.0);
const CUP_CENTER: Vec2 = Vec2::new(1520.0, 825.0);
const CUP_SIZE: Vec2 = Vec2::new(120.0, 150.0);
const CUP_FILL_MAX: f32 = 140.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PourOutcome {
    Perfect,
    Missed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PourState {
    Ready,
    Pouring,
    Settling {
        outcome: PourOutcome,
        remaining: Duration,
    },
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PourEvent {
    Started,
    Stopped(PourOutcome),
    NextRound,
    Retry,
    Full,
}

#[derive(Resource, Debug, Clone)]
pub struct PourGame {
    fill: f32,
    round: usize,
    state: PourState,
}

impl Default for PourGame {
    fn default() -> Self {
        Self {
            fill: 0.0,
            round: 0,
            state: PourState::Ready,
        }
    }
}

pub fn in_target(fill: f32) -> bool {
    (TARGET_ZONE.0..=TARGET_ZONE.1).contains(&fill)
}

impl PourGame {
    pub fn fill(&self) -> f32 {
        self.fill
    }

    /// Successful pours so far.
    pub fn round(&self) -> usize {
        self.round
    }

    pub fn is_pouring(&self) -> bool {
        self.state == PourState::Pouring
    }

    /// How full the glass looks, counting the pour in progress.
    pub fn glass_level(&self) -> f32 {
        let pending = match self.state {
            PourState::Pouring
            | PourState::Settling {
                outcome: PourOutcome::Missed,
                ..
            } => self.fill,
            _ => 0.0,
        };
        ((self.round as f32 + pending) / ROUNDS as f32).min(1.0)
    }

    /// First click starts the pour, second click stops it.
    pub fn click(&mut self) -> Option<PourEvent> {
        match self.state {
            PourState::Ready => {
                self.state = PourState::Pouring;
                Some(PourEvent::Started)
            }
            PourState::Pouring => Some(self.stop()),
            PourState::Settling { .. } | PourState::Full => None,
        }
    }

    pub fn tick(&mut self, dt: Duration) -> Option<PourEvent> {
        match self.state {
            PourState::Pouring => {
                self.fill = (self.fill + POUR_RATE * dt.as_secs_f32()).min(1.0);
                // Overflowing spills and counts as a miss.
                (self.fill >= 1.0).then(|| self.stop())
            }
            PourState::Settling { outcome, remaining } => {
                let remaining = remaining.saturating_sub(dt);
                if !remaining.is_zero() {
                    self.state = PourState::Settling { outcome, remaining };
                    return None;
                }
                if outcome == PourOutcome::Perfect && self.round >= ROUNDS {
                    self.state = PourState::Full;
                    return Some(PourEvent::Full);
                }
                self.fill = 0.0;
                self.state = PourState::Ready;
                Some(match outcome {
                    PourOutcome::Perfect => PourEvent::NextRound,
                    PourOutcome::Missed => PourEvent::Retry,
                })
            }
            PourState::Ready | PourState::Full => None,
        }
    }

    fn stop(&mut self) -> PourEvent {
        let outcome = if in_target(self.fill) {
            self.round += 1;
            PourOutcome::Perfect
        } else {
            PourOutcome::Missed
        };
        self.state = PourState::Settling {
            outcome,
            remaining: COOLDOWN,
        };
        PourEvent::Stopped(outcome)
    }
}

#[derive(Component)]
struct MeterFill;

#[derive(Component)]
struct MeterLabel;

#[derive(Component)]
struct CupFill;

#[derive(Component)]
struct RoundLabel;

const IDLE_PROMPT: &str = "Click to pour... click again to stop!";

fn setup_pour(mut commands: Commands) {
    commands.insert_resource(PourGame::default());

    let stage = spawn_stage(&mut commands, StepId::MilkPour, palette::CREAM);
    commands.entity(stage).with_children(|parent| {
        spawn_backdrop(parent, Backdrop::Kitchen);
        spawn_banner(parent, StepId::MilkPour);

        caption_with(
            parent,
            METER_CENTER - Vec2::new(0.0, 50.0),
            22.0,
            (MeterLabel, text(IDLE_PROMPT, 22.0, palette::INK)),
        );

        parent
            .spawn(block(
                METER_CENTER,
                METER_SIZE,
                Color::srgb(0.2, 0.2, 0.2),
                Color::BLACK,
            ))
            .with_children(|meter| {
                meter.spawn((
                    MeterFill,
                    Node {
                        position_type: PositionType::Absolute,
                        left: Val::Px(0.0),
                        top: Val::Px(0.0),
                        width: Val::Percent(0.0),
                        height: Val::Percent(100.0),
                        ..default()
                    },
                    BackgroundColor(palette::SUCCESS_GREEN),
                ));
                meter.spawn((
                    Node {
                        position_type: PositionType::Absolute,
                        left: Val::Percent(TARGET_ZONE.0 * 100.0),
                        top: Val::Px(0.0),
                        width: Val::Percent((TARGET_ZONE.1 - TARGET_ZONE.0) * 100.0),
                        height: Val::Percent(100.0),
                        border: UiRect::all(Val::Px(3.0)),
                        ..default()
                    },
                    BackgroundColor(palette::WARNING_YELLOW.with_alpha(0.3)),
                    BorderColor::all(palette::WARNING_YELLOW.with_alpha(0.8)),
                ));
            });

        parent.spawn((
            place(CUP_CENTER, CUP_SIZE),
            BackgroundColor(Color::WHITE.with_alpha(0.3)),
        ));
        parent.spawn((
            CupFill,
            place(CUP_CENTER + Vec2::new(0.0, CUP_SIZE.y / 2.0), Vec2::new(110.0, 0.0)),
            BackgroundColor(palette::CREAM),
        ));
        caption_with(
            parent,
            CUP_CENTER - Vec2::new(0.0, 150.0),
            28.0,
            (
                RoundLabel,
                text(format!("Pour 1/{ROUNDS}"), 28.0, palette::COFFEE_BROWN),
            ),
        );
    });
}

fn click_to_pour(
    mouse: Res<ButtonInput<MouseButton>>,
    mut game: ResMut<PourGame>,
    mut labels: Query<(&mut Text, &mut TextColor), With<MeterLabel>>,
    mut feedback: Feedback,
) {
    if !mouse.just_pressed(MouseButton::Left) {
        return;
    }
    let Some(event) = game.click() else {
        return;
    };
    react(event, &game, &mut labels, &mut feedback);
}

fn run_pour(
    mut commands: Commands,
    time: Res<Time>,
    mut game: ResMut<PourGame>,
    mut labels: Query<(&mut Text, &mut TextColor), With<MeterLabel>>,
    mut rounds: Query<&mut Text, (With<RoundLabel>, Without<MeterLabel>)>,
    stages: Query<Entity, With<StageRoot>>,
    mut feedback: Feedback,
) {
    let Some(event) = game.tick(time.delta()) else {
        return;
    };
    react(event, &game, &mut labels, &mut feedback);

    match event {
        PourEvent::NextRound => {
            for mut label in &mut rounds {
                label.0 = format!("Pour {}/{ROUNDS}", game.round() + 1);
            }
        }
        PourEvent::Full => {
            info!("Glass full after {ROUNDS} pours");
            feedback.cue(AudioCue::Success);
            feedback.complete(StepId::MilkPour);
            if let Ok(stage) = stages.single() {
                announce(
                    &mut commands,
                    stage,
                    "Glass is Full!\nPerfect milk pour!\nMilk added to coffee!",
                );
            }
        }
        _ => {}
    }
}

fn react(
    event: PourEvent,
    game: &PourGame,
    labels: &mut Query<(&mut Text, &mut TextColor), With<MeterLabel>>,
    feedback: &mut Feedback,
) {
    let prompt = match event {
        PourEvent::Started => {
            feedback.cue(AudioCue::Pour);
            Some(("Click to STOP!", palette::ERROR_RED))
        }
        PourEvent::Stopped(PourOutcome::Perfect) => {
            feedback.cue(AudioCue::Click);
            feedback.burst(Burst::sparkle(CUP_CENTER, 20));
            feedback.flash(palette::SUCCESS_GREEN);
            debug!("Perfect pour {} of {ROUNDS}", game.round());
            Some(("Perfect pour!", Color::srgb(0.0, 0.6, 0.0)))
        }
        PourEvent::Stopped(PourOutcome::Missed) => {
            feedback.cue(AudioCue::Fail);
            feedback.shake(0.005);
            Some(("Try again!", palette::ERROR_RED))
        }
        PourEvent::NextRound | PourEvent::Retry => Some((IDLE_PROMPT, palette::INK)),
        PourEvent::Full => None,
    };

    if let Some((message, color)) = prompt {
        for (mut label, mut label_color) in labels.iter_mut() {
            label.0 = message.to_string();
            label_color.0 = color;
        }
    }
}

fn paint_pour(
    game: Res<PourGame>,
    mut meters: Query<(&mut Node, &mut BackgroundColor), (With<MeterFill>, Without<CupFill>)>,
    mut cups: Query<&mut Node, (With<CupFill>, Without<MeterFill>)>,
) {
    for (mut node, mut color) in &mut meters {
        node.width = Val::Percent(game.fill() * 100.0);
        color.0 = if in_target(game.fill()) || game.fill() == 0.0 {
            palette::SUCCESS_GREEN
        } else {
            palette::ERROR_RED
        };
    }

    let height = CUP_FILL_MAX * game.glass_level();
    let bottom = CUP_CENTER.y + CUP_SIZE.y / 2.0;
    for mut node in &mut cups {
        *node = place(
            Vec2::new(CUP_CENTER.x, bottom - height / 2.0),
            Vec2::new(110.0, height),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pour_for(game: &mut PourGame, secs: f32) -> Option<PourEvent> {
        game.click();
        game.tick(Duration::from_secs_f32(secs));
        game.click()
    }

    #[test]
    fn stopping_inside_zone_is_perfect() {
        let mut game = PourGame::default();
        // 2.2 s at 0.25/s lands at 0.55.
        assert_eq!(
            pour_for(&mut game, 2.2),
            Some(PourEvent::Stopped(PourOutcome::Perfect))
        );
        assert_eq!(game.round(), 1);
    }

    #[test]
    fn stopping_early_misses_and_retries_same_round() {
        let mut game = PourGame::default();
        assert_eq!(
            pour_for(&mut game, 1.0),
            Some(PourEvent::Stopped(PourOutcome::Missed))
        );
        // Clicks are ignored while settling.
        assert_eq!(game.click(), None);
        assert_eq!(game.tick(COOLDOWN), Some(PourEvent::Retry));
        assert_eq!(game.round(), 0);
        assert_eq!(game.fill(), 0.0);
        assert_eq!(game.click(), Some(PourEvent::Started));
    }

    #[test]
    fn overflow_stops_the_pour_as_a_miss() {
        let mut game = PourGame::default();
        game.click();
        assert_eq!(
            game.tick(Duration::from_secs(5)),
            Some(PourEvent::Stopped(PourOutcome::Missed))
        );
        assert!(!game.is_pouring());
        assert_eq!(game.fill(), 1.0);
    }

    #[test]
    fn three_perfect_pours_fill_the_glass() {
        let mut game = PourGame::default();
        for round in 1..=ROUNDS {
            assert_eq!(
                pour_for(&mut game, 2.2),
                Some(PourEvent::Stopped(PourOutcome::Perfect))
            );
            let expected = if round == ROUNDS {
                PourEvent::Full
            } else {
                PourEvent::NextRound
            };
            assert_eq!(game.tick(COOLDOWN), Some(expected));
        }
        assert_eq!(game.glass_level(), 1.0);
        assert_eq!(game.click(), None);
        assert_eq!(game.tick(COOLDOWN), None);
    }

    #[test]
    fn zone_edges_count() {
        assert!(in_target(0.45));
        assert!(in_target(0.65));
        assert!(!in_target(0.44));
        assert!(!in_target(1.0));
    }
}
