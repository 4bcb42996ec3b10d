// Main
mod banner;
mod celebration;
mod cutscene;
mod dialogue;
mod effects;
mod ledger;
mod minigames;
mod progression;
mod scenery;
mod sections;
mod sound;
mod stage;
mod steps;
mod stickers;
mod transition;
mod welcome;

use bevy::prelude::*;
use banner::BannerPlugin;
use celebration::CelebrationPlugin;
use cutscene::CutscenePlugin;
use effects::EffectsPlugin;
use minigames::MiniGamesPlugin;
use progression::ProgressionPlugin;
use sound::SoundPlugin;
use stage::StagePlugin;
use stickers::StickersPlugin;
use transition::TransitionPlugin;
use welcome::WelcomePlugin;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins)
        .add_plugins((
            StagePlugin,
            ProgressionPlugin,
            TransitionPlugin,
            SoundPlugin,
            EffectsPlugin,
            BannerPlugin,
            StickersPlugin,
            WelcomePlugin,
            CutscenePlugin,
            MiniGamesPlugin,
            CelebrationPlugin,
        ))
        .run();
}
