// Welcome screen

use bevy::prelude::*;

use crate::minigames::Feedback;
use crate::progression::accepting_input;
use crate::sections::Sections;
use crate::sound::AudioCue;
use crate::stage::{CENTER, caption, palette, place, spawn_stage, text};
use crate::steps::StepId;

pub struct WelcomePlugin;

impl Plugin for WelcomePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(Sections::Step(StepId::Welcome)), setup_welcome)
            .add_systems(
                Update,
                (button_visuals, button_actions.run_if(accepting_input))
                    .run_if(in_state(Sections::Step(StepId::Welcome))),
            );
    }
}

const NORMAL_BUTTON: Color = palette::PINK;
const HOVERED_BUTTON: Color = palette::SUNSET_ORANGE;
const PRESSED_BUTTON: Color = Color::srgb(0.9, 0.55, 0.2);

const INSTRUCTIONS: &str = "Help brew the perfect caramel pistachio coffee!\n\n\
Collect ingredients through fun mini-games,\n\
then celebrate with dancing and sparkles!";

#[derive(Component)]
enum WelcomeButton {
    Start,
    #[cfg(not(target_arch = "wasm32"))]
    Exit,
}

fn setup_welcome(mut commands: Commands) {
    let stage = spawn_stage(&mut commands, StepId::Welcome, palette::SKY_BLUE);
    commands.entity(stage).with_children(|parent| {
        caption(
            parent,
            CENTER - Vec2::new(0.0, 200.0),
            "Coffee Adventure Quest",
            64.0,
            palette::GOLD,
        );
        caption(
            parent,
            CENTER - Vec2::new(0.0, 100.0),
            "A Birthday Game",
            36.0,
            Color::WHITE,
        );
        caption(
            parent,
            CENTER + Vec2::new(0.0, 50.0),
            INSTRUCTIONS,
            24.0,
            palette::INK,
        );

        spawn_button(
            parent,
            CENTER + Vec2::new(0.0, 250.0),
            "Start Game!",
            WelcomeButton::Start,
        );

        // Exit button (native only).
        #[cfg(not(target_arch = "wasm32"))]
        spawn_button(
            parent,
            CENTER + Vec2::new(0.0, 360.0),
            "Exit",
            WelcomeButton::Exit,
        );
    });
}

fn spawn_button(parent: &mut ChildSpawnerCommands, center: Vec2, label: &str, marker: WelcomeButton) {
    parent
        .spawn((
            marker,
            Button,
            Node {
                border: UiRect::all(Val::Px(4.0)),
                ..place(center, Vec2::new(300.0, 80.0))
            },
            BorderColor::all(palette::GOLD),
            BackgroundColor(NORMAL_BUTTON),
        ))
        .with_children(|btn| {
            btn.spawn(text(label, 32.0, Color::WHITE));
        });
}

fn button_visuals(
    mut query: Query<
        (&Interaction, &mut BackgroundColor, &mut BorderColor),
        (Changed<Interaction>, With<WelcomeButton>),
    >,
) {
    for (interaction, mut bg, mut border) in &mut query {
        match *interaction {
            Interaction::Pressed => {
                *bg = PRESSED_BUTTON.into();
                *border = BorderColor::all(Color::WHITE);
            }
            Interaction::Hovered => {
                *bg = HOVERED_BUTTON.into();
                *border = BorderColor::all(Color::WHITE);
            }
            Interaction::None => {
                *bg = NORMAL_BUTTON.into();
                *border = BorderColor::all(palette::GOLD);
            }
        }
    }
}

fn button_actions(
    query: Query<(&Interaction, &WelcomeButton), Changed<Interaction>>,
    mut feedback: Feedback,
    #[cfg(not(target_arch = "wasm32"))] mut exit: MessageWriter<AppExit>,
) {
    for (interaction, button) in &query {
        if *interaction != Interaction::Pressed {
            continue;
        }
        match button {
            WelcomeButton::Start => {
                info!("Starting the adventure");
                feedback.cue(AudioCue::Click);
                feedback.complete(StepId::Welcome);
            }
            #[cfg(not(target_arch = "wasm32"))]
            WelcomeButton::Exit => {
                exit.write(AppExit::Success);
            }
        }
    }
}
