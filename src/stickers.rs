// "Sticker Unlocked!" card shown whenever the ledger grants a new sticker.

use std::time::Duration;

use bevy::color::Alpha;
use bevy::prelude::*;

use crate::effects::Burst;
use crate::progression::RewardUnlocked;
use crate::stage::{CENTER, palette, text};
use crate::steps::RewardKey;
use crate::transition::Pulse;

pub struct StickersPlugin;

impl Plugin for StickersPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (show_popups, dismiss_on_click, animate_popups).chain(),
        );
    }
}

const AUTO_DISMISS: Duration = Duration::from_millis(1500);
const SLIDE_IN: Duration = Duration::from_millis(600);
const SLIDE_OUT: Duration = Duration::from_millis(400);
const SLIDE_DISTANCE: f32 = 1000.0;
const OVERLAY_ALPHA: f32 = 0.7;

pub fn sticker_color(key: RewardKey) -> Color {
    match key {
        RewardKey::Bean => palette::COFFEE_BROWN,
        RewardKey::Milk => palette::CREAM,
        RewardKey::Shell => palette::PINK,
        RewardKey::Crab => palette::SUNSET_ORANGE,
        RewardKey::Cup => palette::CARAMEL,
    }
}

/// A sticker badge.
pub fn badge(key: RewardKey, diameter: f32) -> impl Bundle {
    (
        Node {
            width: Val::Px(diameter),
            height: Val::Px(diameter),
            border: UiRect::all(Val::Px(4.0)),
            ..default()
        },
        BackgroundColor(sticker_color(key)),
        BorderColor::all(Color::BLACK),
    )
}

#[derive(Component, Debug)]
struct Popup {
    shown: Duration,
    leaving: Option<Pulse>,
}

impl Popup {
    fn new() -> Self {
        Self {
            shown: Duration::ZERO,
            leaving: None,
        }
    }

    /// Starts the exit slide. Repeated calls keep the first one.
    fn dismiss(&mut self) {
        if self.leaving.is_none() {
            self.leaving = Some(Pulse::new(SLIDE_OUT));
        }
    }

    /// Returns `false` once the popup has fully left.
    fn advance(&mut self, dt: Duration) -> bool {
        if let Some(leaving) = self.leaving.as_mut() {
            return !leaving.advance(dt);
        }
        self.shown += dt;
        if self.shown >= AUTO_DISMISS {
            self.dismiss();
        }
        true
    }

    fn opacity(&self) -> f32 {
        self.leaving.map_or(1.0, |leaving| leaving.strength())
    }

    /// Vertical offset of the card, negative meaning above its resting place.
    fn card_offset(&self) -> f32 {
        if let Some(leaving) = self.leaving {
            return -SLIDE_DISTANCE * (1.0 - leaving.strength());
        }
        let t = (self.shown.as_secs_f32() / SLIDE_IN.as_secs_f32()).min(1.0);
        let eased = 1.0 - (1.0 - t).powi(3);
        -SLIDE_DISTANCE * (1.0 - eased)
    }
}

#[derive(Component)]
struct PopupCard;

fn show_popups(
    mut commands: Commands,
    mut unlocked: MessageReader<RewardUnlocked>,
    mut bursts: MessageWriter<Burst>,
) {
    for &RewardUnlocked(key) in unlocked.read() {
        commands
            .spawn((
                Popup::new(),
                Button,
                Node {
                    width: Val::Percent(100.0),
                    height: Val::Percent(100.0),
                    justify_content: JustifyContent::Center,
                    align_items: AlignItems::Center,
                    position_type: PositionType::Absolute,
                    ..default()
                },
                BackgroundColor(Color::BLACK.with_alpha(OVERLAY_ALPHA)),
                GlobalZIndex(300),
            ))
            .with_children(|overlay| {
                overlay
                    .spawn((
                        PopupCard,
                        Node {
                            width: Val::Px(400.0),
                            height: Val::Px(300.0),
                            flex_direction: FlexDirection::Column,
                            justify_content: JustifyContent::SpaceEvenly,
                            align_items: AlignItems::Center,
                            border: UiRect::all(Val::Px(8.0)),
                            top: Val::Px(-SLIDE_DISTANCE),
                            ..default()
                        },
                        BackgroundColor(Color::WHITE),
                        BorderColor::all(palette::GOLD),
                    ))
                    .with_children(|card| {
                        card.spawn(text("Sticker Unlocked!", 32.0, palette::GOLD));
                        card.spawn(badge(key, 80.0));
                        card.spawn(text(key.display_name(), 24.0, palette::INK));
                    });
            });

        bursts.write(Burst::sparkle(CENTER - Vec2::X * 150.0, 10));
        bursts.write(Burst::sparkle(CENTER + Vec2::X * 150.0, 10));
    }
}

fn dismiss_on_click(mut popups: Query<(&Interaction, &mut Popup), Changed<Interaction>>) {
    for (interaction, mut popup) in &mut popups {
        if *interaction == Interaction::Pressed {
            popup.dismiss();
        }
    }
}

fn animate_popups(
    mut commands: Commands,
    time: Res<Time>,
    mut popups: Query<(Entity, &mut Popup, &mut BackgroundColor, &Children)>,
    mut cards: Query<&mut Node, With<PopupCard>>,
) {
    for (entity, mut popup, mut background, children) in &mut popups {
        if !popup.advance(time.delta()) {
            commands.entity(entity).despawn();
            continue;
        }
        background.0 = Color::BLACK.with_alpha(OVERLAY_ALPHA * popup.opacity());
        for child in children.iter() {
            if let Ok(mut card) = cards.get_mut(child) {
                card.top = Val::Px(popup.card_offset());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn popup_slides_in_then_auto_dismisses() {
        let mut popup = Popup::new();
        assert_eq!(popup.card_offset(), -SLIDE_DISTANCE);
        assert!(popup.advance(SLIDE_IN));
        assert_eq!(popup.card_offset(), 0.0);
        assert_eq!(popup.opacity(), 1.0);

        assert!(popup.advance(AUTO_DISMISS - SLIDE_IN));
        assert!(popup.leaving.is_some());
        assert!(!popup.advance(SLIDE_OUT));
    }

    #[test]
    fn click_dismisses_once() {
        let mut popup = Popup::new();
        popup.advance(Duration::from_millis(100));
        popup.dismiss();
        popup.advance(Duration::from_millis(200));
        let halfway = popup.opacity();
        popup.dismiss();
        assert_eq!(popup.opacity(), halfway);
        assert!(!popup.advance(Duration::from_millis(200)));
    }

    #[test]
    fn every_sticker_has_a_distinct_colour() {
        use strum::IntoEnumIterator;
        let colors: Vec<_> = RewardKey::iter().map(sticker_color).collect();
        for (i, a) in colors.iter().enumerate() {
            assert!(colors[i + 1..].iter().all(|b| b != a));
        }
    }
}
