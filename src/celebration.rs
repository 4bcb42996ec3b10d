// The finale on the beach: stickers orbit the avatar and the finished coffee is ready to sip.

use std::f32::consts::{PI, TAU};
use std::time::Duration;

use bevy::color::Alpha;
use bevy::prelude::*;
use rand::Rng;

use crate::effects::Burst;
use crate::minigames::Feedback;
use crate::progression::{Phase, Progression};
use crate::scenery::{Backdrop, spawn_backdrop, spawn_crab_body};
use crate::sections::Sections;
use crate::sound::AudioCue;
use crate::stage::{block, caption, caption_with, move_to, palette, place, spawn_stage, text};
use crate::stickers::badge;
use crate::steps::StepId;
use crate::transition::Pulse;

pub struct CelebrationPlugin;

impl Plugin for CelebrationPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            OnEnter(Sections::Step(StepId::Celebration)),
            setup_celebration,
        )
        .add_systems(
            Update,
            (
                sip_coffee,
                play_again,
                festivities,
                dance,
                orbit_stickers,
                parade_crabs,
                flutter_butterflies,
                reveal_message,
                offer_replay,
            )
                .chain()
                .run_if(in_state(Sections::Step(StepId::Celebration))),
        );
    }
}

const AVATAR: Vec2 = Vec2::new(760.0, 850.0);
const AVATAR_SIZE: Vec2 = Vec2::new(90.0, 160.0);
const CUP: Vec2 = Vec2::new(1160.0, 800.0);
const CUP_SIZE: Vec2 = Vec2::new(100.0, 120.0);
const ORBIT_RADIUS: f32 = 120.0;
/// Radians per second.
const ORBIT_SPEED: f32 = 0.9375;
const STICKER_SIZE: f32 = 70.0;
const SPARKLE_EVERY: Duration = Duration::from_secs(1);
const CONFETTI_DELAY: Duration = Duration::from_millis(1500);
const TRAIL_SPARKLES: usize = 5;
const TRAIL_EVERY: Duration = Duration::from_millis(200);
const MESSAGE_DELAY: f32 = 1.0;
const MESSAGE_FADE: f32 = 2.0;
const CRAB_SIZE: Vec2 = Vec2::new(70.0, 50.0);
const CRAB_CROSSING: f32 = 8.0;

const MESSAGE: &str = "You did it! The perfect caramel pistachio coffee is ready.\n\
The sweet aroma fills the air, and the beach sparkles in celebration just for you.\n\n\
Tiny crabs scuttle happily across the sand.\n\
Butterflies dance in the warm breeze.\n\
Your stickers float around like birthday stars.\n\n\
Take a sip, the world feels brighter, lighter, full of joy.\n\n\
Today is all about YOU!";

/// Where each of `count` stickers sits on the orbit at rotation `angle`.
pub fn orbit_positions(center: Vec2, count: usize, angle: f32, radius: f32) -> Vec<Vec2> {
    let step = TAU / count.max(1) as f32;
    (0..count)
        .map(|i| {
            let theta = step * i as f32 + angle;
            center + Vec2::new(theta.cos(), theta.sin()) * radius
        })
        .collect()
}

/// Timed sparkles and confetti, and the sip count.
#[derive(Resource, Debug)]
pub struct Festivities {
    elapsed: Duration,
    ambient: Duration,
    confetti: Option<Duration>,
    trail: usize,
    trail_next: Duration,
    sips: u32,
}

impl Default for Festivities {
    fn default() -> Self {
        Self {
            elapsed: Duration::ZERO,
            ambient: SPARKLE_EVERY,
            confetti: Some(CONFETTI_DELAY),
            trail: 0,
            trail_next: Duration::ZERO,
            sips: 0,
        }
    }
}

impl Festivities {
    /// Records a sip. Returns `true` for the very first.
    pub fn sip(&mut self) -> bool {
        self.sips += 1;
        self.trail = TRAIL_SPARKLES;
        self.trail_next = Duration::ZERO;
        self.sips == 1
    }

    pub fn sips(&self) -> u32 {
        self.sips
    }

    /// Opacity of the birthday message.
    pub fn message_alpha(&self) -> f32 {
        ((self.elapsed.as_secs_f32() - MESSAGE_DELAY) / MESSAGE_FADE).clamp(0.0, 1.0)
    }

    pub fn tick(&mut self, dt: Duration, rng: &mut impl Rng) -> Vec<Burst> {
        let mut bursts = Vec::new();
        self.elapsed += dt;

        self.ambient = self.ambient.saturating_sub(dt);
        if self.ambient.is_zero() {
            self.ambient = SPARKLE_EVERY;
            let at = Vec2::new(
                rng.random_range(200.0..=1720.0),
                rng.random_range(100.0..=900.0),
            );
            bursts.push(Burst::sparkle(at, 8));
        }

        if let Some(remaining) = self.confetti {
            let remaining = remaining.saturating_sub(dt);
            if remaining.is_zero() {
                self.confetti = None;
                bursts.push(Burst::confetti(Vec2::new(960.0, 400.0)));
            } else {
                self.confetti = Some(remaining);
            }
        }

        if self.trail > 0 {
            self.trail_next = self.trail_next.saturating_sub(dt);
            if self.trail_next.is_zero() {
                self.trail -= 1;
                self.trail_next = TRAIL_EVERY;
                let at = AVATAR
                    + Vec2::new(
                        rng.random_range(-150.0..=150.0),
                        rng.random_range(-150.0..=50.0),
                    );
                bursts.push(Burst::sparkle(at, 10));
            }
        }

        bursts
    }
}

#[derive(Component)]
struct Avatar {
    hop: Option<Pulse>,
}

#[derive(Component)]
struct Cup;

#[derive(Component)]
struct CupGlow;

#[derive(Component)]
struct OrbitingSticker;

#[derive(Component)]
struct ParadeCrab {
    lane: f32,
    delay: f32,
}

#[derive(Component)]
struct Butterfly {
    base: Vec2,
    phase: f32,
}

#[derive(Component)]
struct BirthdayMessage;

#[derive(Component)]
struct PlayAgain;

fn setup_celebration(
    mut commands: Commands,
    progression: Option<Res<Progression>>,
    mut cues: MessageWriter<AudioCue>,
) {
    commands.insert_resource(Festivities::default());
    cues.write(AudioCue::Celebration);

    let stickers: Vec<_> = progression
        .map(|progression| progression.ledger().unlocked().to_vec())
        .unwrap_or_default();
    info!("Celebrating with {} stickers", stickers.len());

    let mut rng = rand::rng();
    let stage = spawn_stage(&mut commands, StepId::Celebration, palette::SKY_BLUE);
    commands.entity(stage).with_children(|parent| {
        spawn_backdrop(parent, Backdrop::Beach);

        caption(parent, Vec2::new(960.0, 80.0), "Happy Birthday!", 64.0, palette::GOLD);
        caption_with(
            parent,
            Vec2::new(960.0, 260.0),
            22.0,
            (BirthdayMessage, text(MESSAGE, 22.0, Color::WHITE.with_alpha(0.0))),
        );

        for i in 0..5 {
            let base = Vec2::new(
                rng.random_range(200.0..=1720.0),
                rng.random_range(100.0..=400.0),
            );
            parent.spawn((
                Butterfly {
                    base,
                    phase: rng.random_range(0.0..TAU),
                },
                place(base, Vec2::new(40.0, 24.0)),
                BackgroundColor(if i % 2 == 0 { palette::PINK } else { palette::GOLD }),
            ));
        }

        for lane in 0..3 {
            parent
                .spawn((
                    ParadeCrab {
                        lane: 900.0 + lane as f32 * 30.0,
                        delay: lane as f32 * 1.5 + rng.random_range(0.0..3.0),
                    },
                    place(Vec2::new(-100.0, 900.0), CRAB_SIZE),
                    BackgroundColor(palette::ERROR_RED),
                ))
                .with_children(|crab| spawn_crab_body(crab, CRAB_SIZE));
        }

        // Avatar: party hat, face, dress.
        parent
            .spawn((Avatar { hop: None }, place(AVATAR, AVATAR_SIZE), ZIndex(10)))
            .with_children(|avatar| {
                avatar.spawn((
                    place(Vec2::new(45.0, 10.0), Vec2::new(30.0, 30.0)),
                    BackgroundColor(palette::PINK),
                ));
                avatar.spawn(block(
                    Vec2::new(45.0, 50.0),
                    Vec2::splat(56.0),
                    Color::srgb(1.0, 0.86, 0.7),
                    Color::BLACK,
                ));
                avatar.spawn(block(
                    Vec2::new(45.0, 120.0),
                    Vec2::new(80.0, 80.0),
                    palette::SKY_BLUE,
                    Color::BLACK,
                ));
            });

        for (key, at) in stickers
            .iter()
            .zip(orbit_positions(orbit_center(), stickers.len(), 0.0, ORBIT_RADIUS))
        {
            parent
                .spawn((
                    OrbitingSticker,
                    place(at, Vec2::splat(STICKER_SIZE)),
                    ZIndex(15),
                ))
                .with_children(|holder| {
                    holder.spawn(badge(*key, STICKER_SIZE));
                });
        }

        parent.spawn((
            CupGlow,
            place(CUP, Vec2::splat(160.0)),
            BackgroundColor(palette::GOLD.with_alpha(0.3)),
        ));
        parent
            .spawn((
                Cup,
                Button,
                block(CUP, CUP_SIZE, palette::COFFEE_BROWN, Color::BLACK),
                ZIndex(10),
            ))
            .with_children(|cup| {
                cup.spawn(block(
                    Vec2::new(CUP_SIZE.x / 2.0, 0.0),
                    Vec2::new(105.0, 30.0),
                    palette::CREAM,
                    Color::BLACK,
                ));
            });
        caption(
            parent,
            CUP + Vec2::new(0.0, 110.0),
            "Click to sip!",
            22.0,
            palette::INK,
        );

        parent
            .spawn((
                PlayAgain,
                Button,
                Node {
                    display: Display::None,
                    border: UiRect::all(Val::Px(3.0)),
                    ..place(Vec2::new(1600.0, 1000.0), Vec2::new(260.0, 70.0))
                },
                BackgroundColor(palette::COFFEE_BROWN),
                BorderColor::all(palette::GOLD),
                ZIndex(50),
            ))
            .with_children(|button| {
                button.spawn(text("Play again", 30.0, Color::WHITE));
            });
    });
}

fn orbit_center() -> Vec2 {
    AVATAR - Vec2::new(0.0, 80.0)
}

fn sip_coffee(
    cups: Query<&Interaction, (Changed<Interaction>, With<Cup>)>,
    progression: Option<Res<Progression>>,
    mut festivities: ResMut<Festivities>,
    mut avatars: Query<&mut Avatar>,
    mut feedback: Feedback,
) {
    if !cups.iter().any(|i| *i == Interaction::Pressed) {
        return;
    }
    if !progression.is_some_and(|progression| progression.gate().is_interactive()) {
        return;
    }

    feedback.cue(AudioCue::Sip);
    feedback.burst(Burst::sparkle(AVATAR - Vec2::new(0.0, 50.0), 30));
    feedback.burst(Burst::hearts(AVATAR - Vec2::new(0.0, 100.0)));
    feedback.flash(palette::GOLD);
    for mut avatar in &mut avatars {
        avatar.hop = Some(Pulse::new(Duration::from_millis(400)));
    }

    if festivities.sip() {
        info!("First sip taken");
        feedback.complete(StepId::Celebration);
    } else {
        debug!("Sip number {}", festivities.sips());
    }
}

fn play_again(
    buttons: Query<&Interaction, (Changed<Interaction>, With<PlayAgain>)>,
    progression: Option<ResMut<Progression>>,
    mut cues: MessageWriter<AudioCue>,
) {
    if !buttons.iter().any(|i| *i == Interaction::Pressed) {
        return;
    }
    let Some(mut progression) = progression else {
        return;
    };
    if progression.phase() != Phase::Finished {
        return;
    }
    info!("Starting the adventure again");
    cues.write(AudioCue::Click);
    progression.reset();
}

fn festivities(
    time: Res<Time>,
    mut festivities: ResMut<Festivities>,
    mut bursts: MessageWriter<Burst>,
) {
    let mut rng = rand::rng();
    for burst in festivities.tick(time.delta(), &mut rng) {
        bursts.write(burst);
    }
}

fn dance(
    time: Res<Time>,
    mut avatars: Query<(&mut Avatar, &mut Node)>,
    mut glows: Query<&mut BackgroundColor, With<CupGlow>>,
) {
    let t = time.elapsed_secs();
    for (mut avatar, mut node) in &mut avatars {
        let bounce = ((t * PI / 0.6).sin() * 0.5 + 0.5) * 20.0;
        let hop = match avatar.hop.as_mut() {
            Some(pulse) => {
                let done = pulse.advance(time.delta());
                let height = (pulse.strength() * PI).sin() * 50.0;
                if done {
                    avatar.hop = None;
                }
                height
            }
            None => 0.0,
        };
        move_to(&mut node, AVATAR - Vec2::new(0.0, bounce + hop), AVATAR_SIZE);
    }

    let glow = 0.2 + 0.1 * (t * PI / 1.5).cos();
    for mut color in &mut glows {
        color.0 = color.0.with_alpha(glow);
    }
}

fn orbit_stickers(time: Res<Time>, mut stickers: Query<&mut Node, With<OrbitingSticker>>) {
    let count = stickers.iter().count();
    let angle = time.elapsed_secs() * ORBIT_SPEED;
    let spots = orbit_positions(orbit_center(), count, angle, ORBIT_RADIUS);
    for (mut node, at) in stickers.iter_mut().zip(spots) {
        move_to(&mut node, at, Vec2::splat(STICKER_SIZE));
    }
}

fn parade_crabs(time: Res<Time>, mut crabs: Query<(&ParadeCrab, &mut Node)>) {
    let t = time.elapsed_secs();
    for (crab, mut node) in &mut crabs {
        let since = t - crab.delay;
        let x = if since < 0.0 {
            -100.0
        } else {
            -100.0 + 2100.0 * (since % CRAB_CROSSING) / CRAB_CROSSING
        };
        move_to(&mut node, Vec2::new(x, crab.lane), CRAB_SIZE);
    }
}

fn flutter_butterflies(time: Res<Time>, mut butterflies: Query<(&Butterfly, &mut Node)>) {
    let t = time.elapsed_secs();
    for (butterfly, mut node) in &mut butterflies {
        let drift = Vec2::new(
            (t * 0.8 + butterfly.phase).sin() * 60.0,
            (t * 1.3 + butterfly.phase).cos() * 30.0,
        );
        let flap = 24.0 + (t * 12.0 + butterfly.phase).sin().abs() * 16.0;
        let size = Vec2::new(flap, 24.0);
        move_to(&mut node, butterfly.base + drift, size);
        node.width = Val::Px(size.x);
    }
}

fn reveal_message(
    festivities: Res<Festivities>,
    mut messages: Query<&mut TextColor, With<BirthdayMessage>>,
) {
    let alpha = festivities.message_alpha();
    for mut color in &mut messages {
        color.0 = color.0.with_alpha(alpha);
    }
}

fn offer_replay(
    progression: Option<Res<Progression>>,
    mut buttons: Query<&mut Node, With<PlayAgain>>,
) {
    let finished = progression.is_some_and(|progression| progression.phase() == Phase::Finished);
    let display = if finished {
        Display::Flex
    } else {
        Display::None
    };
    for mut node in &mut buttons {
        if node.display != display {
            node.display = display;
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::effects::BurstKind;

    #[test]
    fn orbit_spreads_stickers_evenly() {
        let spots = orbit_positions(Vec2::ZERO, 4, 0.0, 100.0);
        assert_eq!(spots.len(), 4);
        for spot in &spots {
            assert!((spot.length() - 100.0).abs() < 1e-3);
        }
        assert!(spots[0].distance(Vec2::new(100.0, 0.0)) < 1e-3);
        assert!(spots[2].distance(Vec2::new(-100.0, 0.0)) < 1e-3);
        assert!(orbit_positions(Vec2::ZERO, 0, 1.0, 100.0).is_empty());
    }

    #[test]
    fn only_the_first_sip_counts() {
        let mut festivities = Festivities::default();
        assert!(festivities.sip());
        assert!(!festivities.sip());
        assert_eq!(festivities.sips(), 2);
    }

    #[test]
    fn confetti_once_and_sparkles_every_second() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut festivities = Festivities::default();

        let first = festivities.tick(Duration::from_secs(1), &mut rng);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].kind, BurstKind::Sparkle);

        let second = festivities.tick(Duration::from_millis(500), &mut rng);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].kind, BurstKind::Confetti);

        let later = festivities.tick(Duration::from_secs(1), &mut rng);
        assert!(later.iter().all(|b| b.kind == BurstKind::Sparkle));
    }

    #[test]
    fn sip_trails_five_sparkles() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut festivities = Festivities::default();
        festivities.confetti = None;
        festivities.sip();

        let mut trail = 0;
        for _ in 0..10 {
            trail += festivities
                .tick(Duration::from_millis(100), &mut rng)
                .iter()
                .filter(|b| b.count == 10)
                .count();
        }
        assert_eq!(trail, TRAIL_SPARKLES);
    }

    #[test]
    fn message_fades_in_after_a_beat() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut festivities = Festivities::default();
        assert_eq!(festivities.message_alpha(), 0.0);
        festivities.tick(Duration::from_secs(2), &mut rng);
        assert!((festivities.message_alpha() - 0.5).abs() < 1e-4);
        festivities.tick(Duration::from_secs(5), &mut rng);
        assert_eq!(festivities.message_alpha(), 1.0);
    }
}
