// Coffee beans: drag all five into the grinder.

use bevy::prelude::*;
use fast_poisson::Poisson2D;
use rand::Rng;
use rand::seq::SliceRandom;

use super::drag::{DragReleased, Draggable, within};
use super::{Feedback, announce};
use crate::banner::spawn_banner;
use crate::effects::Burst;
use crate::scenery::{Backdrop, spawn_backdrop};
use crate::sections::Sections;
use crate::sound::AudioCue;
use crate::stage::{StageRoot, block, caption_with, palette, spawn_stage, text};
use crate::steps::StepId;

pub struct BeansPlugin;

impl Plugin for BeansPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(Sections::Step(StepId::CoffeeBeans)), setup_beans)
            .add_systems(
                Update,
                (collect_beans, show_progress)
                    .chain()
                    .run_if(in_state(Sections::Step(StepId::CoffeeBeans))),
            );
    }
}

pub const BEANS_REQUIRED: usize = 5;
pub const GRINDER: Vec2 = Vec2::new(960.0, 600.0);
pub const DROP_RADIUS: f32 = 120.0;
const BEAN_SIZE: Vec2 = Vec2::new(60.0, 40.0);

/// Where beans may start: a band across the upper counter, clear of the grinder.
const FIELD_ORIGIN: Vec2 = Vec2::new(200.0, 330.0);
const FIELD_SIZE: [f32; 2] = [1520.0, 140.0];
const MIN_SPACING: f32 = 150.0;
const GRINDER_CLEARANCE: f32 = 260.0;
const FALLBACK: [Vec2; BEANS_REQUIRED] = [
    Vec2::new(300.0, 400.0),
    Vec2::new(500.0, 350.0),
    Vec2::new(700.0, 420.0),
    Vec2::new(1400.0, 380.0),
    Vec2::new(1600.0, 430.0),
];

/// Beans collected so far in this run of the step.
#[derive(Resource, Debug, Default)]
struct BeanCount {
    collected: usize,
    done: bool,
}

impl BeanCount {
    /// Counts one bean. Returns `true` exactly when the last one lands.
    fn collect(&mut self) -> bool {
        if self.done {
            return false;
        }
        self.collected += 1;
        self.done = self.collected >= BEANS_REQUIRED;
        self.done
    }
}

#[derive(Component)]
struct Bean;

#[derive(Component)]
struct BeanProgress;

/// Blue-noise starting spots for the beans, never overlapping or crowding the grinder.
fn bean_spots(seed: u64, rng: &mut impl Rng) -> Vec<Vec2> {
    let mut spots: Vec<Vec2> = Poisson2D::new()
        .with_dimensions(FIELD_SIZE, MIN_SPACING)
        .with_seed(seed)
        .generate()
        .into_iter()
        .map(|[x, y]| FIELD_ORIGIN + Vec2::new(x, y))
        .filter(|spot| (spot.x - GRINDER.x).abs() > GRINDER_CLEARANCE)
        .collect();

    if spots.len() < BEANS_REQUIRED {
        return FALLBACK.to_vec();
    }
    spots.shuffle(rng);
    spots.truncate(BEANS_REQUIRED);
    spots
}

fn setup_beans(mut commands: Commands) {
    commands.insert_resource(BeanCount::default());

    let mut rng = rand::rng();
    let spots = bean_spots(rng.random(), &mut rng);

    let stage = spawn_stage(&mut commands, StepId::CoffeeBeans, palette::KITCHEN);
    commands.entity(stage).with_children(|parent| {
        spawn_backdrop(parent, Backdrop::Kitchen);
        spawn_banner(parent, StepId::CoffeeBeans);

        // Grinder: base, hopper and crank.
        parent.spawn(block(
            GRINDER + Vec2::new(0.0, 40.0),
            Vec2::new(180.0, 120.0),
            palette::WOOD,
            Color::BLACK,
        ));
        parent.spawn(block(
            GRINDER - Vec2::new(0.0, 60.0),
            Vec2::new(140.0, 80.0),
            Color::srgb(0.627, 0.322, 0.176),
            Color::BLACK,
        ));
        parent.spawn(block(
            GRINDER + Vec2::new(90.0, -60.0),
            Vec2::new(60.0, 15.0),
            Color::srgb(0.396, 0.263, 0.129),
            Color::BLACK,
        ));

        caption_with(
            parent,
            GRINDER + Vec2::new(0.0, 130.0),
            32.0,
            (
                BeanProgress,
                text(format!("0 / {BEANS_REQUIRED}"), 32.0, palette::INK),
            ),
        );

        for spot in spots {
            parent.spawn((
                Bean,
                Draggable::new(spot, BEAN_SIZE),
                block(spot, BEAN_SIZE, palette::COFFEE_BROWN, Color::BLACK),
                ZIndex(10),
            ));
        }
    });
}

fn collect_beans(
    mut commands: Commands,
    mut released: MessageReader<DragReleased>,
    mut beans: Query<&mut Draggable, With<Bean>>,
    mut count: ResMut<BeanCount>,
    stages: Query<Entity, With<StageRoot>>,
    mut feedback: Feedback,
) {
    for drop in released.read() {
        let Ok(mut bean) = beans.get_mut(drop.entity) else {
            continue;
        };
        if !within(drop.at, GRINDER, DROP_RADIUS) {
            bean.send_home();
            continue;
        }

        commands.entity(drop.entity).despawn();
        feedback.cue(AudioCue::Grind);
        feedback.burst(Burst::sparkle(GRINDER - Vec2::new(0.0, 50.0), 15));

        if count.collect() {
            info!("All {BEANS_REQUIRED} beans ground");
            feedback.flash(palette::GOLD);
            feedback.cue(AudioCue::Success);
            feedback.complete(StepId::CoffeeBeans);
            if let Ok(stage) = stages.single() {
                announce(&mut commands, stage, "All beans collected!\nGrinding complete!");
            }
        }
    }
}

fn show_progress(count: Res<BeanCount>, mut labels: Query<&mut Text, With<BeanProgress>>) {
    if !count.is_changed() {
        return;
    }
    for mut label in &mut labels {
        label.0 = format!("{} / {BEANS_REQUIRED}", count.collected);
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn five_beans_complete_once() {
        let mut count = BeanCount::default();
        for _ in 0..BEANS_REQUIRED - 1 {
            assert!(!count.collect());
        }
        assert!(count.collect());
        assert!(!count.collect());
        assert_eq!(count.collected, BEANS_REQUIRED);
    }

    #[test]
    fn bean_spots_are_spread_out_and_clear_of_grinder() {
        let mut rng = StdRng::seed_from_u64(3);
        for seed in 0..20 {
            let spots = bean_spots(seed, &mut rng);
            assert_eq!(spots.len(), BEANS_REQUIRED);
            for (i, a) in spots.iter().enumerate() {
                assert!(!within(*a, GRINDER, DROP_RADIUS));
                for b in &spots[i + 1..] {
                    assert!(a.distance(*b) >= 60.0);
                }
            }
        }
    }
}
