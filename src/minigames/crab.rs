// Crab photography: catch the scuttling crab on camera.

use std::f32::consts::PI;
use std::time::Duration;

use bevy::color::Alpha;
use bevy::prelude::*;
use rand::Rng;

use super::{Feedback, announce};
use crate::banner::spawn_banner;
use crate::effects::Burst;
use crate::progression::accepting_input;
use crate::scenery::{Backdrop, spawn_backdrop, spawn_crab_body};
use crate::sections::Sections;
use crate::sound::AudioCue;
use crate::stage::{CENTER, StageRoot, move_to, palette, place, spawn_stage};
use crate::steps::StepId;

pub struct CrabPlugin;

impl Plugin for CrabPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            OnEnter(Sections::Step(StepId::CrabPhotography)),
            setup_crab,
        )
        .add_systems(
            Update,
            (
                snap_photo.run_if(accepting_input),
                scuttle,
                pulse_viewfinder,
            )
                .chain()
                .run_if(in_state(Sections::Step(StepId::CrabPhotography))),
        );
    }
}

const CRAB_SIZE: Vec2 = Vec2::new(100.0, 70.0);
const START: Vec2 = Vec2::new(960.0, 700.0);
const WARM_UP: Duration = Duration::from_secs(1);
const SCUTTLE_SOUND_EVERY: Duration = Duration::from_secs(2);
const PHOTO_DELAY: Duration = Duration::from_millis(500);

/// Random leg destination inside the sand band.
fn waypoint(rng: &mut impl Rng) -> (Vec2, Duration) {
    let to = Vec2::new(
        rng.random_range(200.0..=1720.0),
        rng.random_range(600.0..=900.0),
    );
    let leg = Duration::from_millis(rng.random_range(1500..=2500));
    (to, leg)
}

fn sine_in_out(t: f32) -> f32 {
    (1.0 - (PI * t).cos()) / 2.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrabEvent {
    Scuttled,
    PhotoDeveloped,
}

#[derive(Debug, Clone, Copy)]
struct Leg {
    from: Vec2,
    to: Vec2,
    elapsed: Duration,
    duration: Duration,
}

/// The crab's wandering and the photo attempt.
#[derive(Resource, Debug, Clone)]
pub struct CrabChase {
    position: Vec2,
    warm_up: Duration,
    leg: Option<Leg>,
    sound: Duration,
    photographed: bool,
    developing: Option<Duration>,
}

impl CrabChase {
    pub fn new(start: Vec2) -> Self {
        Self {
            position: start,
            warm_up: WARM_UP,
            leg: None,
            sound: SCUTTLE_SOUND_EVERY,
            photographed: false,
            developing: None,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn is_moving(&self) -> bool {
        self.leg.is_some()
    }

    /// Takes the photo. Only the first click counts.
    pub fn snap(&mut self) -> bool {
        if self.photographed {
            return false;
        }
        self.photographed = true;
        self.leg = None;
        self.developing = Some(PHOTO_DELAY);
        true
    }

    pub fn tick(&mut self, dt: Duration, rng: &mut impl Rng) -> Option<CrabEvent> {
        if let Some(remaining) = self.developing {
            let remaining = remaining.saturating_sub(dt);
            if remaining.is_zero() {
                self.developing = None;
                return Some(CrabEvent::PhotoDeveloped);
            }
            self.developing = Some(remaining);
            return None;
        }
        if self.photographed {
            return None;
        }

        if !self.warm_up.is_zero() {
            self.warm_up = self.warm_up.saturating_sub(dt);
            if self.warm_up.is_zero() {
                self.start_leg(rng);
            }
            return None;
        }

        if let Some(leg) = self.leg.as_mut() {
            leg.elapsed = (leg.elapsed + dt).min(leg.duration);
            let t = leg.elapsed.as_secs_f32() / leg.duration.as_secs_f32();
            self.position = leg.from.lerp(leg.to, sine_in_out(t));
            if leg.elapsed >= leg.duration {
                self.start_leg(rng);
            }
        }

        self.sound = self.sound.saturating_sub(dt);
        if self.sound.is_zero() {
            self.sound = SCUTTLE_SOUND_EVERY;
            return Some(CrabEvent::Scuttled);
        }
        None
    }

    fn start_leg(&mut self, rng: &mut impl Rng) {
        let (to, duration) = waypoint(rng);
        self.leg = Some(Leg {
            from: self.position,
            to,
            elapsed: Duration::ZERO,
            duration,
        });
    }
}

#[derive(Component)]
struct Crab;

#[derive(Component)]
struct Viewfinder;

fn setup_crab(mut commands: Commands) {
    commands.insert_resource(CrabChase::new(START));

    let stage = spawn_stage(&mut commands, StepId::CrabPhotography, palette::SKY_BLUE);
    commands.entity(stage).with_children(|parent| {
        spawn_backdrop(parent, Backdrop::Beach);
        spawn_banner(parent, StepId::CrabPhotography);

        // Corner brackets of the camera frame.
        let size = 150.0;
        for corner in [
            Vec2::new(-1.0, -1.0),
            Vec2::new(1.0, -1.0),
            Vec2::new(-1.0, 1.0),
            Vec2::new(1.0, 1.0),
        ] {
            let tip = CENTER + corner * size;
            parent.spawn((
                Viewfinder,
                place(tip - Vec2::new(corner.x * 20.0, 0.0), Vec2::new(40.0, 3.0)),
                BackgroundColor(Color::WHITE.with_alpha(0.6)),
            ));
            parent.spawn((
                Viewfinder,
                place(tip - Vec2::new(0.0, corner.y * 20.0), Vec2::new(3.0, 40.0)),
                BackgroundColor(Color::WHITE.with_alpha(0.6)),
            ));
        }

        parent
            .spawn((
                Crab,
                Button,
                place(START, CRAB_SIZE),
                BackgroundColor(palette::ERROR_RED),
                ZIndex(20),
            ))
            .with_children(|crab| spawn_crab_body(crab, CRAB_SIZE));
    });
}

fn snap_photo(
    mut commands: Commands,
    mut chase: ResMut<CrabChase>,
    crabs: Query<&Interaction, (Changed<Interaction>, With<Crab>)>,
    stages: Query<Entity, With<StageRoot>>,
    mut feedback: Feedback,
) {
    if !crabs.iter().any(|i| *i == Interaction::Pressed) || !chase.snap() {
        return;
    }
    info!("Crab photographed at {}", chase.position());
    feedback.cue(AudioCue::Camera);
    feedback.flash(Color::WHITE);
    feedback.burst(Burst::sparkle(chase.position(), 15));
    if let Ok(stage) = stages.single() {
        announce(
            &mut commands,
            stage,
            "Perfect shot!\nIngredient retrieved!",
        );
    }
}

fn scuttle(
    time: Res<Time>,
    mut chase: ResMut<CrabChase>,
    mut crabs: Query<&mut Node, With<Crab>>,
    mut feedback: Feedback,
) {
    let mut rng = rand::rng();
    match chase.tick(time.delta(), &mut rng) {
        Some(CrabEvent::Scuttled) => feedback.cue(AudioCue::CrabScuttle),
        Some(CrabEvent::PhotoDeveloped) => feedback.complete(StepId::CrabPhotography),
        None => {}
    }
    for mut node in &mut crabs {
        move_to(&mut node, chase.position(), CRAB_SIZE);
    }
}

fn pulse_viewfinder(time: Res<Time>, mut brackets: Query<&mut BackgroundColor, With<Viewfinder>>) {
    let alpha = 0.5 + 0.1 * (time.elapsed_secs() * PI).cos();
    for mut color in &mut brackets {
        color.0 = color.0.with_alpha(alpha);
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    const FRAME: Duration = Duration::from_millis(16);

    #[test]
    fn crab_waits_then_wanders_inside_the_sand() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut chase = CrabChase::new(START);
        chase.tick(WARM_UP / 2, &mut rng);
        assert!(!chase.is_moving());
        assert_eq!(chase.position(), START);

        chase.tick(WARM_UP, &mut rng);
        assert!(chase.is_moving());
        for _ in 0..1000 {
            chase.tick(FRAME, &mut rng);
            let p = chase.position();
            assert!((199.9..=1720.1).contains(&p.x), "x out of range: {p}");
            assert!((599.9..=900.1).contains(&p.y), "y out of range: {p}");
        }
    }

    #[test]
    fn scuttle_sound_repeats() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut chase = CrabChase::new(START);
        chase.tick(WARM_UP, &mut rng);
        assert_eq!(chase.tick(SCUTTLE_SOUND_EVERY, &mut rng), Some(CrabEvent::Scuttled));
        assert_eq!(chase.tick(FRAME, &mut rng), None);
    }

    #[test]
    fn only_the_first_photo_counts() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut chase = CrabChase::new(START);
        chase.tick(WARM_UP, &mut rng);
        chase.tick(Duration::from_millis(700), &mut rng);

        assert!(chase.snap());
        assert!(!chase.snap());
        assert!(!chase.is_moving());
        let frozen = chase.position();

        assert_eq!(chase.tick(Duration::from_millis(300), &mut rng), None);
        assert_eq!(
            chase.tick(Duration::from_millis(200), &mut rng),
            Some(CrabEvent::PhotoDeveloped)
        );
        assert_eq!(chase.tick(PHOTO_DELAY, &mut rng), None);
        assert_eq!(chase.position(), frozen);
    }

    #[test]
    fn easing_hits_both_ends() {
        assert_eq!(sine_in_out(0.0), 0.0);
        assert!((sine_in_out(1.0) - 1.0).abs() < 1e-6);
        assert!((sine_in_out(0.5) - 0.5).abs() < 1e-6);
    }
}
