// Sparkles, hearts and confetti: short-lived UI particles on the stage.

use std::f32::consts::TAU;
use std::time::Duration;

use bevy::color::Alpha;
use bevy::prelude::*;
use rand::Rng;

use crate::sound::AudioCue;
use crate::stage::{StageRoot, palette, place};
use crate::transition::Pulse;

pub struct EffectsPlugin;

impl Plugin for EffectsPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<Burst>()
            .add_systems(Update, (spawn_bursts, animate_particles).chain());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurstKind {
    Sparkle,
    Hearts,
    Confetti,
}

/// Emit `count` particles of `kind` at a stage position.
#[derive(Message, Debug, Clone, Copy)]
pub struct Burst {
    pub kind: BurstKind,
    pub at: Vec2,
    pub count: usize,
}

impl Burst {
    pub fn sparkle(at: Vec2, count: usize) -> Self {
        Self {
            kind: BurstKind::Sparkle,
            at,
            count,
        }
    }

    pub fn hearts(at: Vec2) -> Self {
        Self {
            kind: BurstKind::Hearts,
            at,
            count: 8,
        }
    }

    pub fn confetti(at: Vec2) -> Self {
        Self {
            kind: BurstKind::Confetti,
            at,
            count: 75,
        }
    }
}

struct Recipe {
    speed: (f32, f32),
    /// Emission angle range in radians, y pointing down.
    angle: (f32, f32),
    gravity: f32,
    lifespan: Duration,
    size: f32,
}

impl BurstKind {
    fn recipe(self) -> Recipe {
        match self {
            BurstKind::Sparkle => Recipe {
                speed: (50.0, 150.0),
                angle: (0.0, TAU),
                gravity: 50.0,
                lifespan: Duration::from_secs(1),
                size: 14.0,
            },
            BurstKind::Hearts => Recipe {
                speed: (20.0, 50.0),
                angle: (260f32.to_radians(), 280f32.to_radians()),
                gravity: -100.0,
                lifespan: Duration::from_secs(2),
                size: 18.0,
            },
            BurstKind::Confetti => Recipe {
                speed: (200.0, 400.0),
                angle: (0.0, TAU),
                gravity: 300.0,
                lifespan: Duration::from_secs(2),
                size: 12.0,
            },
        }
    }

    fn color(self, index: usize) -> Color {
        const CONFETTI: [Color; 5] = [
            palette::PINK,
            palette::GOLD,
            palette::SKY_BLUE,
            Color::srgb(0.902, 0.902, 0.980),
            Color::srgb(0.596, 1.0, 0.596),
        ];
        match self {
            BurstKind::Sparkle => palette::GOLD,
            BurstKind::Hearts => palette::PINK,
            BurstKind::Confetti => CONFETTI[index % CONFETTI.len()],
        }
    }
}

#[derive(Component)]
struct Particle {
    position: Vec2,
    velocity: Vec2,
    gravity: f32,
    size: f32,
    color: Color,
    life: Pulse,
}

impl Particle {
    /// Advances the particle and returns `false` once it has faded out.
    fn step(&mut self, dt: Duration) -> bool {
        let secs = dt.as_secs_f32();
        self.velocity.y += self.gravity * secs;
        self.position += self.velocity * secs;
        !self.life.advance(dt)
    }
}

fn scatter(kind: BurstKind, at: Vec2, count: usize, rng: &mut impl Rng) -> Vec<Particle> {
    let recipe = kind.recipe();
    (0..count)
        .map(|i| {
            let angle = rng.random_range(recipe.angle.0..=recipe.angle.1);
            let speed = rng.random_range(recipe.speed.0..=recipe.speed.1);
            Particle {
                position: at,
                velocity: Vec2::from_angle(angle) * speed,
                gravity: recipe.gravity,
                size: recipe.size,
                color: kind.color(i),
                life: Pulse::new(recipe.lifespan),
            }
        })
        .collect()
}

fn spawn_bursts(
    mut commands: Commands,
    mut bursts: MessageReader<Burst>,
    stages: Query<Entity, With<StageRoot>>,
    mut cues: MessageWriter<AudioCue>,
) {
    let Ok(stage) = stages.single() else {
        bursts.clear();
        return;
    };

    let mut rng = rand::rng();
    for burst in bursts.read() {
        if burst.kind == BurstKind::Sparkle {
            cues.write(AudioCue::Sparkle);
        }
        for particle in scatter(burst.kind, burst.at, burst.count, &mut rng) {
            let size = Vec2::splat(particle.size);
            commands.spawn((
                place(particle.position, size),
                BackgroundColor(particle.color),
                ZIndex(50),
                particle,
                ChildOf(stage),
            ));
        }
    }
}

fn animate_particles(
    mut commands: Commands,
    time: Res<Time>,
    mut particles: Query<(Entity, &mut Particle, &mut Node, &mut BackgroundColor)>,
) {
    for (entity, mut particle, mut node, mut background) in &mut particles {
        if !particle.step(time.delta()) {
            commands.entity(entity).despawn();
            continue;
        }
        let size = Vec2::splat(particle.size * (0.3 + 0.7 * particle.life.strength()));
        *node = place(particle.position, size);
        background.0 = particle.color.with_alpha(particle.life.strength());
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn hearts_float_upward() {
        let mut rng = StdRng::seed_from_u64(7);
        for mut heart in scatter(BurstKind::Hearts, Vec2::ZERO, 8, &mut rng) {
            assert!(heart.velocity.y < 0.0);
            heart.step(Duration::from_millis(500));
            assert!(heart.position.y < 0.0);
        }
    }

    #[test]
    fn particles_expire_after_lifespan() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut sparks = scatter(BurstKind::Sparkle, Vec2::new(100.0, 100.0), 3, &mut rng);
        assert_eq!(sparks.len(), 3);
        for spark in &mut sparks {
            assert!(spark.step(Duration::from_millis(900)));
            assert!(!spark.step(Duration::from_millis(100)));
        }
    }

    #[test]
    fn confetti_cycles_colours() {
        assert_eq!(BurstKind::Confetti.color(0), BurstKind::Confetti.color(5));
        assert_ne!(BurstKind::Confetti.color(0), BurstKind::Confetti.color(1));
    }
}
