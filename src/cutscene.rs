// Story beats between mini-games: a backdrop, a few props and a typed-out conversation.

use std::time::Duration;

use bevy::color::Alpha;
use bevy::prelude::*;
use strum::IntoEnumIterator;

use crate::dialogue::{DialogueEvent, DialogueLine, DialogueSequencer, Tone};
use crate::effects::Burst;
use crate::progression::{StepComplete, accepting_input};
use crate::scenery::{Backdrop, spawn_backdrop, spawn_crab_body};
use crate::sections::{Sections, in_cutscene};
use crate::sound::AudioCue;
use crate::stage::{CENTER, block, palette, place, spawn_stage, text};
use crate::steps::StepId;

pub struct CutscenePlugin;

impl Plugin for CutscenePlugin {
    fn build(&self, app: &mut App) {
        for step in StepId::iter().filter(|step| step.is_cutscene()) {
            app.add_systems(
                OnEnter(Sections::Step(step)),
                move |commands: Commands, bursts: MessageWriter<Burst>| {
                    setup_cutscene(commands, bursts, step)
                },
            );
        }
        app.add_systems(
            Update,
            (
                skip_typing.run_if(accepting_input),
                play_dialogue,
                paint_bubble,
            )
                .chain()
                .run_if(in_cutscene),
        );
    }
}

/// Wait after the backdrop appears before the first line.
const START_DELAY: Duration = Duration::from_millis(500);
const BUBBLE_CENTER: Vec2 = Vec2::new(960.0, 900.0);
const BUBBLE_SIZE: Vec2 = Vec2::new(800.0, 140.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prop {
    Sun,
    Wave,
    Shell,
    Crab,
    Sparkles,
}

struct Script {
    backdrop: Backdrop,
    props: Vec<(Prop, Vec2)>,
    lines: &'static [DialogueLine],
}

const OPENING: &[DialogueLine] = &[
    DialogueLine::new("Good morning, beautiful", 2000),
    DialogueLine::new(
        "Today feels special... the kind of day that starts with a *perfect* cup of coffee.",
        2500,
    ),
    DialogueLine::new("Oh no! Some of the ingredients are missing!", 2000).tone(Tone::Worried),
    DialogueLine::new(
        "Don't worry, let's go on a tiny adventure and find them together",
        2000,
    ),
];

const AFTER_BEANS: &[DialogueLine] = &[
    DialogueLine::new("Perfect! These beans smell amazing already!", 2000),
    DialogueLine::new("Now let's add some creamy goodness...", 1500),
];

const AFTER_MILK: &[DialogueLine] = &[
    DialogueLine::new("Just right! So smooth", 2000),
    DialogueLine::new("But wait... we need that special ingredient!", 2000).tone(Tone::Worried),
];

const BEACH_ARRIVAL: &[DialogueLine] = &[
    DialogueLine::new(
        "Hmm... I think the last ingredient drifted somewhere warm and sandy...",
        2500,
    ),
    DialogueLine::new("Ahhh... the beach. Look at the shells!", 2000),
];

const CRAB_STEAL: &[DialogueLine] = &[
    DialogueLine::new("Yes! Caramel pistachio!! That's the one!", 1500),
    DialogueLine::new("Hey!! Wait!", 1000)
        .tone(Tone::Alarmed)
        .interrupting(),
    DialogueLine::new("Oh no! A sneaky little crab stole it!", 2000).tone(Tone::Worried),
    DialogueLine::new("Looks like it's time for a photo challenge", 2000),
];

const AFTER_CRAB: &[DialogueLine] = &[
    DialogueLine::new("Got him!! That's a perfect photo!", 2000),
    DialogueLine::new("Let's head back and make something wonderful.", 2000),
];

const BEFORE_BREWING: &[DialogueLine] = &[DialogueLine::new(
    "Time to put it all together... just the way you like it",
    2500,
)];

fn script(step: StepId) -> Option<Script> {
    let script = match step {
        StepId::Opening => Script {
            backdrop: Backdrop::Kitchen,
            props: vec![(Prop::Sun, Vec2::new(1400.0, 200.0))],
            lines: OPENING,
        },
        StepId::AfterBeans => Script {
            backdrop: Backdrop::Kitchen,
            props: Vec::new(),
            lines: AFTER_BEANS,
        },
        StepId::AfterMilk => Script {
            backdrop: Backdrop::Kitchen,
            props: Vec::new(),
            lines: AFTER_MILK,
        },
        StepId::BeachArrival => Script {
            backdrop: Backdrop::Beach,
            props: vec![
                (Prop::Wave, Vec2::new(300.0, 600.0)),
                (Prop::Shell, Vec2::new(1600.0, 700.0)),
            ],
            lines: BEACH_ARRIVAL,
        },
        StepId::CrabSteal => Script {
            backdrop: Backdrop::Beach,
            props: vec![(Prop::Crab, CENTER)],
            lines: CRAB_STEAL,
        },
        StepId::AfterCrab => Script {
            backdrop: Backdrop::Beach,
            props: Vec::new(),
            lines: AFTER_CRAB,
        },
        StepId::BeforeBrewing => Script {
            backdrop: Backdrop::Kitchen,
            props: vec![(Prop::Sparkles, CENTER)],
            lines: BEFORE_BREWING,
        },
        _ => return None,
    };
    Some(script)
}

fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Plain => palette::INK,
        Tone::Worried => palette::ALERT_ORANGE,
        Tone::Alarmed => palette::ERROR_RED,
    }
}

#[derive(Resource)]
struct Cutscene {
    step: StepId,
    delay: Duration,
    lines: &'static [DialogueLine],
    sequencer: DialogueSequencer,
    started: bool,
    done: bool,
}

#[derive(Component)]
struct Bubble;

#[derive(Component)]
struct BubbleText;

fn setup_cutscene(mut commands: Commands, mut bursts: MessageWriter<Burst>, step: StepId) {
    let Some(script) = script(step) else {
        warn!("No script for cutscene {step}");
        return;
    };

    let stage = spawn_stage(&mut commands, step, script.backdrop.base_color());
    commands.entity(stage).with_children(|parent| {
        spawn_backdrop(parent, script.backdrop);

        for &(prop, at) in &script.props {
            match prop {
                Prop::Sun => {
                    parent.spawn(block(at, Vec2::splat(120.0), palette::GOLD, palette::SUNSET_ORANGE));
                }
                Prop::Wave => {
                    parent.spawn((
                        place(at, Vec2::new(220.0, 40.0)),
                        BackgroundColor(Color::WHITE.with_alpha(0.6)),
                    ));
                }
                Prop::Shell => {
                    parent.spawn(block(at, Vec2::new(90.0, 70.0), palette::PINK, palette::WOOD));
                }
                Prop::Crab => {
                    let size = Vec2::new(160.0, 100.0);
                    parent
                        .spawn(block(at, size, palette::SUNSET_ORANGE, palette::ALERT_ORANGE))
                        .with_children(|crab| spawn_crab_body(crab, size));
                }
                Prop::Sparkles => {
                    bursts.write(Burst::sparkle(at, 30));
                }
            }
        }

        parent
            .spawn((
                Bubble,
                block(BUBBLE_CENTER, BUBBLE_SIZE, Color::WHITE, Color::srgb(0.878, 0.878, 0.878)),
                ZIndex(100),
            ))
            .with_children(|bubble| {
                bubble.spawn((BubbleText, text("", 28.0, palette::INK)));
            });
    });

    commands.insert_resource(Cutscene {
        step,
        delay: START_DELAY,
        lines: script.lines,
        sequencer: DialogueSequencer::default(),
        started: false,
        done: false,
    });
}

fn skip_typing(
    mouse: Res<ButtonInput<MouseButton>>,
    keys: Res<ButtonInput<KeyCode>>,
    cutscene: Option<ResMut<Cutscene>>,
    mut cues: MessageWriter<AudioCue>,
) {
    let Some(mut cutscene) = cutscene else {
        return;
    };
    let pressed = mouse.just_pressed(MouseButton::Left)
        || keys.just_pressed(KeyCode::Space)
        || keys.just_pressed(KeyCode::Enter);
    if pressed && cutscene.sequencer.skip() {
        cues.write(AudioCue::Click);
    }
}

fn play_dialogue(
    time: Res<Time>,
    cutscene: Option<ResMut<Cutscene>>,
    mut complete: MessageWriter<StepComplete>,
) {
    let Some(mut cutscene) = cutscene else {
        return;
    };
    if cutscene.done {
        return;
    }

    let mut dt = time.delta();
    if !cutscene.started {
        if dt < cutscene.delay {
            cutscene.delay -= dt;
            return;
        }
        dt -= cutscene.delay;
        cutscene.delay = Duration::ZERO;
        cutscene.started = true;
        let lines = cutscene.lines.to_vec();
        cutscene.sequencer.show_sequence(lines);
    }

    for event in cutscene.sequencer.tick(dt) {
        match event {
            DialogueEvent::LineStarted(index) => debug!("{} line {index}", cutscene.step),
            DialogueEvent::Finished => {
                cutscene.done = true;
                complete.write(StepComplete { step: cutscene.step });
            }
            DialogueEvent::Revealed(_) | DialogueEvent::LineDismissed(_) => {}
        }
    }
}

fn paint_bubble(
    cutscene: Option<Res<Cutscene>>,
    mut bubbles: Query<(&mut BackgroundColor, &mut BorderColor), With<Bubble>>,
    mut texts: Query<(&mut Text, &mut TextColor), With<BubbleText>>,
) {
    let Some(cutscene) = cutscene else {
        return;
    };
    let alpha = cutscene.sequencer.bubble_alpha();
    let tone = cutscene
        .sequencer
        .current_line()
        .map_or(Tone::Plain, |line| line.tone);

    for (mut background, mut border) in &mut bubbles {
        background.0 = Color::WHITE.with_alpha(0.95 * alpha);
        *border = BorderColor::all(Color::srgb(0.878, 0.878, 0.878).with_alpha(alpha));
    }
    for (mut content, mut color) in &mut texts {
        let visible = cutscene.sequencer.visible_text();
        if content.0 != visible {
            content.0 = visible.to_string();
        }
        color.0 = tone_color(tone).with_alpha(alpha);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_cutscene_step_has_a_script() {
        for step in StepId::iter() {
            assert_eq!(script(step).is_some(), step.is_cutscene(), "{step}");
        }
    }

    #[test]
    fn only_the_crab_steal_interrupts() {
        let interrupting: Vec<_> = StepId::iter()
            .filter_map(script)
            .flat_map(|script| script.lines.iter())
            .filter(|line| line.interrupts)
            .map(|line| line.text)
            .collect();
        assert_eq!(interrupting, ["Hey!! Wait!"]);
    }

    #[test]
    fn crab_steal_plays_through_to_completion() {
        let mut sequencer = DialogueSequencer::default();
        sequencer.show_sequence(CRAB_STEAL.to_vec());
        let mut finished = false;
        for _ in 0..2000 {
            if sequencer
                .tick(Duration::from_millis(16))
                .contains(&DialogueEvent::Finished)
            {
                finished = true;
                break;
            }
        }
        assert!(finished);
    }
}
