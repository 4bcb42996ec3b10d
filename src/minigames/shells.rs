// Beach discovery: open shells until the hidden ingredient turns up.

use std::time::Duration;

use bevy::color::Alpha;
use bevy::prelude::*;
use rand::Rng;

use super::Feedback;
use crate::banner::spawn_banner;
use crate::effects::Burst;
use crate::progression::accepting_input;
use crate::scenery::{Backdrop, spawn_backdrop};
use crate::sections::Sections;
use crate::sound::AudioCue;
use crate::stage::{StageRoot, block, caption, move_to, palette, spawn_stage, text};
use crate::steps::StepId;
use crate::transition::Pulse;

pub struct ShellsPlugin;

impl Plugin for ShellsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            OnEnter(Sections::Step(StepId::BeachDiscovery)),
            setup_shells,
        )
        .add_systems(
            Update,
            (
                open_shells.run_if(accepting_input),
                reveal_ingredient,
                bob_shells,
                float_labels,
                steal_ingredient,
            )
                .chain()
                .run_if(in_state(Sections::Step(StepId::BeachDiscovery))),
        );
    }
}

const SPOTS: [Vec2; 5] = [
    Vec2::new(400.0, 700.0),
    Vec2::new(700.0, 750.0),
    Vec2::new(960.0, 680.0),
    Vec2::new(1250.0, 730.0),
    Vec2::new(1550.0, 700.0),
];
const SHELL_SIZE: Vec2 = Vec2::splat(90.0);
const REVEAL_DELAY: Duration = Duration::from_millis(800);
const BOTTLE_SIZE: Vec2 = Vec2::new(40.0, 70.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellContents {
    Empty,
    Ingredient,
}

/// Which shell hides the ingredient and which have been opened.
#[derive(Resource, Debug, Clone)]
pub struct ShellSearch {
    lucky: usize,
    opened: Vec<bool>,
    reveal: Option<Duration>,
    found: bool,
}

impl ShellSearch {
    pub fn new(count: usize, lucky: usize) -> Self {
        Self {
            lucky,
            opened: vec![false; count],
            reveal: None,
            found: false,
        }
    }

    pub fn random(count: usize, rng: &mut impl Rng) -> Self {
        Self::new(count, rng.random_range(0..count))
    }

    pub fn is_opened(&self, index: usize) -> bool {
        self.opened.get(index).copied().unwrap_or(true)
    }

    /// Opens a shell. Each shell opens only once.
    pub fn open(&mut self, index: usize) -> Option<ShellContents> {
        if self.is_opened(index) {
            return None;
        }
        self.opened[index] = true;
        if index == self.lucky {
            self.reveal = Some(REVEAL_DELAY);
            Some(ShellContents::Ingredient)
        } else {
            Some(ShellContents::Empty)
        }
    }

    /// Returns `true` once, when the ingredient has been on show long enough.
    pub fn tick(&mut self, dt: Duration) -> bool {
        let Some(remaining) = self.reveal else {
            return false;
        };
        let remaining = remaining.saturating_sub(dt);
        if remaining.is_zero() {
            self.reveal = None;
            self.found = true;
            return true;
        }
        self.reveal = Some(remaining);
        false
    }

    pub fn found(&self) -> bool {
        self.found
    }
}

#[derive(Component)]
struct Shell {
    index: usize,
    rest: Vec2,
    period: f32,
}

/// Short-lived text that drifts upward and fades.
#[derive(Component)]
struct FloatingLabel {
    origin: Vec2,
    pulse: Pulse,
}

#[derive(Component)]
struct Ingredient {
    from: Vec2,
    stolen: Option<Pulse>,
}

fn setup_shells(mut commands: Commands) {
    let mut rng = rand::rng();
    let search = ShellSearch::random(SPOTS.len(), &mut rng);
    debug!("Ingredient hidden under shell {}", search.lucky);

    let stage = spawn_stage(&mut commands, StepId::BeachDiscovery, palette::SKY_BLUE);
    commands.entity(stage).with_children(|parent| {
        spawn_backdrop(parent, Backdrop::Beach);
        spawn_banner(parent, StepId::BeachDiscovery);

        for (index, spot) in SPOTS.into_iter().enumerate() {
            parent
                .spawn((
                    Shell {
                        index,
                        rest: spot,
                        period: rng.random_range(2.4..3.2),
                    },
                    Button,
                    block(spot, SHELL_SIZE, palette::PINK, Color::BLACK),
                    ZIndex(10),
                ))
                .with_children(|shell| {
                    if index == search.lucky {
                        shell.spawn(text("*", 24.0, palette::GOLD));
                    }
                });
        }
    });

    commands.insert_resource(search);
}

fn open_shells(
    mut commands: Commands,
    mut search: ResMut<ShellSearch>,
    mut shells: Query<(&Interaction, &Shell, &mut BackgroundColor), Changed<Interaction>>,
    stages: Query<Entity, With<StageRoot>>,
    mut feedback: Feedback,
) {
    let Ok(stage) = stages.single() else {
        return;
    };
    for (interaction, shell, mut color) in &mut shells {
        if *interaction != Interaction::Pressed {
            continue;
        }
        let Some(contents) = search.open(shell.index) else {
            continue;
        };
        feedback.cue(AudioCue::Click);
        color.0 = palette::PINK.with_alpha(0.5);

        match contents {
            ShellContents::Empty => {
                let origin = shell.rest - Vec2::new(0.0, 60.0);
                commands.entity(stage).with_children(|parent| {
                    let label = caption(parent, origin, "Empty!", 20.0, Color::srgb(0.4, 0.4, 0.4));
                    parent.commands().entity(label).insert((
                        FloatingLabel {
                            origin,
                            pulse: Pulse::new(Duration::from_secs(1)),
                        },
                        ZIndex(20),
                    ));
                });
            }
            ShellContents::Ingredient => {
                info!("Found the caramel pistachio syrup");
                feedback.burst(Burst::sparkle(shell.rest, 20));
                commands.entity(stage).with_children(|parent| {
                    parent
                        .spawn((
                            Ingredient {
                                from: shell.rest,
                                stolen: None,
                            },
                            block(shell.rest, BOTTLE_SIZE, palette::CARAMEL, Color::BLACK),
                            ZIndex(30),
                        ))
                        .with_children(|bottle| {
                            bottle.spawn(text("CP", 18.0, Color::WHITE));
                        });
                });
            }
        }
    }
}

fn reveal_ingredient(
    mut commands: Commands,
    time: Res<Time>,
    mut search: ResMut<ShellSearch>,
    mut ingredients: Query<&mut Ingredient>,
    stages: Query<Entity, With<StageRoot>>,
    mut feedback: Feedback,
) {
    if !search.tick(time.delta()) {
        return;
    }
    feedback.complete(StepId::BeachDiscovery);
    for mut ingredient in &mut ingredients {
        ingredient.stolen = Some(Pulse::new(Duration::from_millis(1500)));
    }
    if let Ok(stage) = stages.single() {
        commands.entity(stage).with_children(|parent| {
            let line = caption(
                parent,
                Vec2::new(960.0, 400.0),
                "Oh no! A crab grabbed it!",
                36.0,
                palette::ALERT_ORANGE,
            );
            parent.commands().entity(line).insert(ZIndex(60));
        });
    }
}

fn bob_shells(time: Res<Time>, mut shells: Query<(&Shell, &mut Node)>) {
    let t = time.elapsed_secs();
    for (shell, mut node) in &mut shells {
        let offset = (t * std::f32::consts::TAU / shell.period).sin() * 4.0 - 4.0;
        move_to(&mut node, shell.rest + Vec2::new(0.0, offset), SHELL_SIZE);
    }
}

fn float_labels(
    mut commands: Commands,
    time: Res<Time>,
    mut labels: Query<(Entity, &mut FloatingLabel, &mut Node, &Children)>,
    mut colors: Query<&mut TextColor>,
) {
    for (entity, mut label, mut node, children) in &mut labels {
        if label.pulse.advance(time.delta()) {
            commands.entity(entity).despawn();
            continue;
        }
        let strength = label.pulse.strength();
        let rise = (1.0 - strength) * 30.0;
        node.top = Val::Px(label.origin.y - rise - 40.0);
        for child in children.iter() {
            if let Ok(mut color) = colors.get_mut(child) {
                color.0 = color.0.with_alpha(strength);
            }
        }
    }
}

/// The crab runs off with the bottle towards the bottom-left corner.
fn steal_ingredient(time: Res<Time>, mut ingredients: Query<(&mut Ingredient, &mut Node)>) {
    let target = Vec2::new(-200.0, 900.0);
    for (mut ingredient, mut node) in &mut ingredients {
        let from = ingredient.from;
        let Some(pulse) = ingredient.stolen.as_mut() else {
            continue;
        };
        pulse.advance(time.delta());
        let t = 1.0 - pulse.strength();
        let eased = 1.0 - (1.0 - t).powi(2);
        move_to(&mut node, from.lerp(target, eased), BOTTLE_SIZE);
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn each_shell_opens_once() {
        let mut search = ShellSearch::new(5, 2);
        assert_eq!(search.open(0), Some(ShellContents::Empty));
        assert_eq!(search.open(0), None);
        assert!(search.is_opened(0));
        assert!(!search.is_opened(1));
        // Out of range shells never open.
        assert_eq!(search.open(9), None);
    }

    #[test]
    fn lucky_shell_completes_after_the_reveal() {
        let mut search = ShellSearch::new(5, 3);
        assert!(!search.tick(REVEAL_DELAY));
        assert_eq!(search.open(3), Some(ShellContents::Ingredient));
        assert!(!search.tick(Duration::from_millis(500)));
        assert!(search.tick(Duration::from_millis(300)));
        assert!(search.found());
        assert!(!search.tick(REVEAL_DELAY));
    }

    #[test]
    fn random_search_hides_exactly_one_ingredient() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let mut search = ShellSearch::random(SPOTS.len(), &mut rng);
            let found = (0..SPOTS.len())
                .filter(|&i| search.open(i) == Some(ShellContents::Ingredient))
                .count();
            assert_eq!(found, 1);
        }
    }
}
