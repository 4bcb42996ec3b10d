// Named sound cues. Any cue whose file is missing is skipped silently.

use bevy::platform::collections::HashMap;
use bevy::prelude::*;
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};

pub struct SoundPlugin;

impl Plugin for SoundPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<AudioCue>()
            .add_systems(Startup, load_sounds)
            .add_systems(Update, play_cues);
    }
}

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum AudioCue {
    Click,
    Grind,
    Pour,
    Success,
    Fail,
    Camera,
    CrabScuttle,
    Sip,
    Sparkle,
    Celebration,
}

impl AudioCue {
    fn path(self) -> String {
        let name: &'static str = self.into();
        format!("audio/{name}.ogg")
    }
}

#[derive(Resource, Default)]
struct SoundBank(HashMap<AudioCue, Handle<AudioSource>>);

const VOLUME: f32 = 0.6;

fn load_sounds(mut commands: Commands, asset_server: Res<AssetServer>) {
    let bank = AudioCue::iter()
        .map(|cue| (cue, asset_server.load(cue.path())))
        .collect();
    commands.insert_resource(SoundBank(bank));
}

fn play_cues(
    mut commands: Commands,
    mut cues: MessageReader<AudioCue>,
    bank: Option<Res<SoundBank>>,
    asset_server: Res<AssetServer>,
) {
    let Some(bank) = bank else {
        cues.clear();
        return;
    };

    for &cue in cues.read() {
        let Some(handle) = bank.0.get(&cue) else {
            continue;
        };
        if !asset_server.is_loaded(handle) {
            debug!("Sound {cue:?} unavailable, skipping");
            continue;
        }
        commands.spawn((
            AudioPlayer::new(handle.clone()),
            PlaybackSettings::DESPAWN.with_volume(bevy::audio::Volume::Linear(VOLUME)),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cue_paths_are_kebab_case() {
        assert_eq!(AudioCue::CrabScuttle.path(), "audio/crab-scuttle.ogg");
        assert_eq!(AudioCue::Sip.path(), "audio/sip.ogg");
    }
}
