// Full-screen fades between steps, plus flash and shake feedback.

use std::time::Duration;

use bevy::color::Alpha;
use bevy::prelude::*;
use rand::Rng;

use crate::progression::Progression;
use crate::stage::StageRoot;
use crate::steps::StepId;

pub struct TransitionPlugin;

impl Plugin for TransitionPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<Flash>()
            .add_message::<Shake>()
            .init_resource::<ActiveShake>()
            .add_systems(Startup, spawn_gate_overlay)
            .add_systems(
                Update,
                (paint_gate, spawn_flashes, fade_flashes, start_shakes, apply_shake),
            );
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum GatePhase {
    Covered,
    FadingIn {
        elapsed: Duration,
        duration: Duration,
    },
    Open,
    FadingOut {
        elapsed: Duration,
        duration: Duration,
        next: Option<StepId>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateEvent {
    /// The screen is fully covered and the caller must switch to this step now.
    /// Fade-in has been queued and makes no progress before the next tick.
    Switch(StepId),
    Covered,
    Revealed,
}

/// Fade choreography between steps. Starts fully covered.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionGate {
    phase: GatePhase,
}

impl Default for TransitionGate {
    fn default() -> Self {
        Self {
            phase: GatePhase::Covered,
        }
    }
}

impl TransitionGate {
    /// How much of the screen is blacked out, from 0.0 (open) to 1.0 (covered).
    pub fn coverage(&self) -> f32 {
        match self.phase {
            GatePhase::Covered => 1.0,
            GatePhase::Open => 0.0,
            GatePhase::FadingIn { elapsed, duration } => 1.0 - progress(elapsed, duration),
            GatePhase::FadingOut {
                elapsed, duration, ..
            } => progress(elapsed, duration),
        }
    }

    pub fn is_covered(&self) -> bool {
        self.phase == GatePhase::Covered
    }

    pub fn is_open(&self) -> bool {
        self.phase == GatePhase::Open
    }

    /// Whether the visible step may take input.
    pub fn is_interactive(&self) -> bool {
        matches!(self.phase, GatePhase::Open | GatePhase::FadingIn { .. })
    }

    pub fn is_fading_out(&self) -> bool {
        matches!(self.phase, GatePhase::FadingOut { .. })
    }

    pub fn fade_out(&mut self, duration: Duration) {
        self.begin_fade_out(duration, None);
    }

    /// Fade out, switch to `next` once covered, then fade back in.
    pub fn transition_to(&mut self, next: StepId, duration: Duration) {
        self.begin_fade_out(duration, Some(next));
    }

    pub fn fade_in(&mut self, duration: Duration) {
        // Resume from the current coverage so an interrupted fade does not pop.
        let elapsed = duration.mul_f32(1.0 - self.coverage());
        self.phase = GatePhase::FadingIn { elapsed, duration };
    }

    fn begin_fade_out(&mut self, duration: Duration, next: Option<StepId>) {
        let elapsed = duration.mul_f32(self.coverage());
        self.phase = GatePhase::FadingOut {
            elapsed,
            duration,
            next,
        };
    }

    pub fn tick(&mut self, dt: Duration) -> Option<GateEvent> {
        match self.phase {
            GatePhase::FadingOut {
                elapsed,
                duration,
                next,
            } => {
                let elapsed = elapsed + dt;
                if elapsed < duration {
                    self.phase = GatePhase::FadingOut {
                        elapsed,
                        duration,
                        next,
                    };
                    return None;
                }
                match next {
                    Some(step) => {
                        self.phase = GatePhase::FadingIn {
                            elapsed: Duration::ZERO,
                            duration,
                        };
                        Some(GateEvent::Switch(step))
                    }
                    None => {
                        self.phase = GatePhase::Covered;
                        Some(GateEvent::Covered)
                    }
                }
            }
            GatePhase::FadingIn { elapsed, duration } => {
                let elapsed = elapsed + dt;
                if elapsed < duration {
                    self.phase = GatePhase::FadingIn { elapsed, duration };
                    return None;
                }
                self.phase = GatePhase::Open;
                Some(GateEvent::Revealed)
            }
            GatePhase::Covered | GatePhase::Open => None,
        }
    }
}

fn progress(elapsed: Duration, duration: Duration) -> f32 {
    if duration.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f32() / duration.as_secs_f32()).min(1.0)
}

/// A fixed-length cosmetic effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pulse {
    elapsed: Duration,
    duration: Duration,
}

impl Pulse {
    pub fn new(duration: Duration) -> Self {
        Self {
            elapsed: Duration::ZERO,
            duration,
        }
    }

    /// Returns `true` once the pulse has run its course.
    pub fn advance(&mut self, dt: Duration) -> bool {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        self.elapsed >= self.duration
    }

    /// 1.0 at the start, falling linearly to 0.0 at the end.
    pub fn strength(&self) -> f32 {
        1.0 - progress(self.elapsed, self.duration)
    }
}

#[derive(Message, Debug, Clone, Copy)]
pub struct Flash {
    pub color: Color,
    pub duration: Duration,
}

impl Flash {
    pub fn new(color: Color) -> Self {
        Self {
            color,
            duration: Duration::from_millis(300),
        }
    }
}

#[derive(Message, Debug, Clone, Copy)]
pub struct Shake {
    /// Peak offset as a fraction of the stage width.
    pub intensity: f32,
    pub duration: Duration,
}

impl Shake {
    pub fn new(intensity: f32) -> Self {
        Self {
            intensity,
            duration: Duration::from_millis(300),
        }
    }
}

#[derive(Component)]
struct GateOverlay;

#[derive(Component)]
struct FlashOverlay {
    color: Color,
    pulse: Pulse,
}

#[derive(Resource, Default)]
struct ActiveShake(Option<(Shake, Pulse)>);

const GATE_Z: i32 = 500;
const FLASH_Z: i32 = 400;
const FLASH_PEAK_ALPHA: f32 = 0.8;

fn full_screen() -> Node {
    Node {
        width: Val::Percent(100.0),
        height: Val::Percent(100.0),
        position_type: PositionType::Absolute,
        ..default()
    }
}

fn spawn_gate_overlay(mut commands: Commands) {
    commands.spawn((
        GateOverlay,
        full_screen(),
        BackgroundColor(Color::BLACK),
        GlobalZIndex(GATE_Z),
    ));
}

fn paint_gate(
    progression: Option<Res<Progression>>,
    mut overlay: Query<&mut BackgroundColor, With<GateOverlay>>,
) {
    let Some(progression) = progression else {
        return;
    };
    let Ok(mut background) = overlay.single_mut() else {
        return;
    };
    background.0 = Color::BLACK.with_alpha(progression.gate().coverage());
}

fn spawn_flashes(mut commands: Commands, mut flashes: MessageReader<Flash>) {
    for flash in flashes.read() {
        commands.spawn((
            FlashOverlay {
                color: flash.color,
                pulse: Pulse::new(flash.duration),
            },
            full_screen(),
            BackgroundColor(flash.color.with_alpha(FLASH_PEAK_ALPHA)),
            GlobalZIndex(FLASH_Z),
        ));
    }
}

fn fade_flashes(
    mut commands: Commands,
    time: Res<Time>,
    mut flashes: Query<(Entity, &mut FlashOverlay, &mut BackgroundColor)>,
) {
    for (entity, mut flash, mut background) in &mut flashes {
        if flash.pulse.advance(time.delta()) {
            commands.entity(entity).despawn();
            continue;
        }
        background.0 = flash
            .color
            .with_alpha(FLASH_PEAK_ALPHA * flash.pulse.strength());
    }
}

fn start_shakes(mut shakes: MessageReader<Shake>, mut active: ResMut<ActiveShake>) {
    if let Some(shake) = shakes.read().last() {
        active.0 = Some((*shake, Pulse::new(shake.duration)));
    }
}

fn apply_shake(
    time: Res<Time>,
    mut active: ResMut<ActiveShake>,
    mut stages: Query<&mut Node, With<StageRoot>>,
) {
    let Some((shake, pulse)) = active.0.as_mut() else {
        return;
    };

    let done = pulse.advance(time.delta());
    let offset = if done {
        Vec2::ZERO
    } else {
        let reach = shake.intensity * crate::stage::STAGE_SIZE.x * pulse.strength();
        let mut rng = rand::rng();
        Vec2::new(
            rng.random_range(-1.0..=1.0),
            rng.random_range(-1.0..=1.0),
        ) * reach
    };

    for mut node in &mut stages {
        node.left = Val::Px(offset.x);
        node.top = Val::Px(offset.y);
    }

    if done {
        active.0 = None;
    }
}
