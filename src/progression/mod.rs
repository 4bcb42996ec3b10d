/// Drives the adventure from step to step and keeps the sticker ledger.
mod controller;

pub use controller::{Directive, Phase, ProgressionController, Signal, Timings};

use bevy::prelude::*;

use crate::sections::Sections;
use crate::steps::{RewardKey, StepId, StepList};

pub struct ProgressionPlugin;

impl Plugin for ProgressionPlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<Sections>()
            .init_resource::<Timings>()
            .add_message::<StepComplete>()
            .add_message::<RewardUnlocked>()
            .add_systems(Startup, start_session)
            .add_systems(
                Update,
                (receive_completions, advance)
                    .chain()
                    .in_set(ProgressionSystems),
            );
    }
}

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgressionSystems;

/// Written by a step when its win condition fires.
#[derive(Message, Debug, Clone, Copy)]
pub struct StepComplete {
    pub step: StepId,
}

/// A sticker was granted for the first time this session.
#[derive(Message, Debug, Clone, Copy)]
pub struct RewardUnlocked(pub RewardKey);

#[derive(Resource, Deref, DerefMut)]
pub struct Progression(ProgressionController);

/// Run condition: the active step is visible and still playing.
pub fn accepting_input(progression: Option<Res<Progression>>) -> bool {
    progression.is_some_and(|progression| progression.accepts_input())
}

fn start_session(mut commands: Commands, timings: Res<Timings>) -> Result {
    let steps = StepList::standard()?;
    info!("Adventure ready with {} steps", steps.len());
    commands.insert_resource(Progression(ProgressionController::new(
        steps,
        timings.clone(),
    )));
    Ok(())
}

fn receive_completions(
    mut completions: MessageReader<StepComplete>,
    progression: Option<ResMut<Progression>>,
    mut unlocked: MessageWriter<RewardUnlocked>,
) {
    let Some(mut progression) = progression else {
        return;
    };

    for &StepComplete { step } in completions.read() {
        match progression.signal_complete(step) {
            Signal::Accepted { newly_unlocked } => {
                info!("Step {step} complete");
                if let Some(key) = newly_unlocked {
                    info!("Unlocked {key}");
                    unlocked.write(RewardUnlocked(key));
                }
            }
            Signal::Ignored => debug!("Ignoring stale completion of {step}"),
        }
    }
}

fn advance(
    time: Res<Time>,
    progression: Option<ResMut<Progression>>,
    mut next_state: ResMut<NextState<Sections>>,
) {
    let Some(mut progression) = progression else {
        return;
    };

    match progression.tick(time.delta()) {
        Some(Directive::Initialize(step)) => {
            info!("Entering step {step}");
            next_state.set(Sections::Step(step));
        }
        Some(Directive::Finish) => {
            let stickers = progression.ledger().unlocked().len();
            info!("Adventure finished with {stickers} stickers");
        }
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bevy::ecs::message::Messages;
    use bevy::state::app::StatesPlugin;
    use bevy::time::TimeUpdateStrategy;

    use super::*;

    fn headless_app() -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, StatesPlugin, ProgressionPlugin));
        app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(
            100,
        )));
        app
    }

    fn current(app: &App) -> Sections {
        *app.world().resource::<State<Sections>>().get()
    }

    fn run_until_section(app: &mut App, section: Sections) {
        for _ in 0..200 {
            if current(app) == section {
                return;
            }
            app.update();
        }
        panic!("never reached {section:?}, stuck in {:?}", current(app));
    }

    fn complete(app: &mut App, step: StepId) {
        app.world_mut()
            .resource_mut::<Messages<StepComplete>>()
            .write(StepComplete { step });
    }

    #[test]
    fn boots_into_welcome_step() {
        let mut app = headless_app();
        assert_eq!(current(&app), Sections::Boot);
        run_until_section(&mut app, Sections::Step(StepId::Welcome));
        let progression = app.world().resource::<Progression>();
        assert_eq!(progression.running_step(), Some(StepId::Welcome));
    }

    #[test]
    fn completion_messages_move_through_sections() {
        let mut app = headless_app();
        run_until_section(&mut app, Sections::Step(StepId::Welcome));

        complete(&mut app, StepId::Welcome);
        complete(&mut app, StepId::Welcome);
        run_until_section(&mut app, Sections::Step(StepId::Opening));

        complete(&mut app, StepId::Opening);
        run_until_section(&mut app, Sections::Step(StepId::CoffeeBeans));

        complete(&mut app, StepId::CoffeeBeans);
        complete(&mut app, StepId::CoffeeBeans);
        app.update();

        let progression = app.world().resource::<Progression>();
        assert_eq!(progression.ledger().unlocked(), &[RewardKey::Bean]);
        assert_eq!(
            progression.ledger().completed_steps(),
            &[StepId::Welcome, StepId::Opening, StepId::CoffeeBeans]
        );
        assert_eq!(progression.phase(), Phase::Completing);
    }
}
