/// The five ingredient challenges and the helpers they share.
pub mod beans;
pub mod brewing;
pub mod crab;
pub mod drag;
pub mod pour;
pub mod shells;

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::effects::Burst;
use crate::progression::StepComplete;
use crate::sound::AudioCue;
use crate::stage::{CENTER, caption, palette};
use crate::steps::StepId;
use crate::transition::{Flash, Shake};

pub struct MiniGamesPlugin;

impl Plugin for MiniGamesPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            drag::DragPlugin,
            beans::BeansPlugin,
            pour::PourPlugin,
            shells::ShellsPlugin,
            crab::CrabPlugin,
            brewing::BrewingPlugin,
        ));
    }
}

/// Everything a running step may poke besides its own entities.
#[derive(SystemParam)]
pub struct Feedback<'w> {
    flashes: MessageWriter<'w, Flash>,
    shakes: MessageWriter<'w, Shake>,
    bursts: MessageWriter<'w, Burst>,
    cues: MessageWriter<'w, AudioCue>,
    completions: MessageWriter<'w, StepComplete>,
}

impl Feedback<'_> {
    pub fn flash(&mut self, color: Color) {
        self.flashes.write(Flash::new(color));
    }

    pub fn shake(&mut self, intensity: f32) {
        self.shakes.write(Shake::new(intensity));
    }

    pub fn burst(&mut self, burst: Burst) {
        self.bursts.write(burst);
    }

    pub fn cue(&mut self, cue: AudioCue) {
        self.cues.write(cue);
    }

    pub fn complete(&mut self, step: StepId) {
        self.completions.write(StepComplete { step });
    }
}

/// Big gold success line across the middle of the stage.
pub fn announce(commands: &mut Commands, stage: Entity, message: &str) {
    let message = message.to_string();
    commands.entity(stage).with_children(|parent| {
        let line = caption(parent, CENTER, message, 42.0, palette::GOLD);
        parent.commands().entity(line).insert(ZIndex(60));
    });
}
