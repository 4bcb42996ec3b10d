// Fixed 1920x1080 design stage, scaled to fit the window, plus UI placement helpers.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy::ui::UiScale;
use bevy::window::PrimaryWindow;

use crate::sections::Sections;
use crate::steps::StepId;

pub struct StagePlugin;

impl Plugin for StagePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ClearColor(Color::BLACK))
            .add_systems(Startup, spawn_camera)
            .add_systems(Update, fit_stage);
    }
}

pub const STAGE_SIZE: Vec2 = Vec2::new(1920.0, 1080.0);
pub const CENTER: Vec2 = Vec2::new(960.0, 540.0);

pub mod palette {
    use bevy::prelude::Color;

    pub const COFFEE_BROWN: Color = Color::srgb(0.435, 0.306, 0.216);
    pub const CREAM: Color = Color::srgb(1.0, 0.992, 0.816);
    pub const PINK: Color = Color::srgb(1.0, 0.714, 0.757);
    pub const SKY_BLUE: Color = Color::srgb(0.529, 0.808, 0.922);
    pub const SAND: Color = Color::srgb(0.957, 0.643, 0.376);
    pub const OCEAN_BLUE: Color = Color::srgb(0.290, 0.565, 0.886);
    pub const SUNSET_ORANGE: Color = Color::srgb(1.0, 0.702, 0.278);
    pub const GOLD: Color = Color::srgb(1.0, 0.843, 0.0);
    pub const SILVER: Color = Color::srgb(0.753, 0.753, 0.753);
    pub const SUCCESS_GREEN: Color = Color::srgb(0.0, 1.0, 0.0);
    pub const ERROR_RED: Color = Color::srgb(1.0, 0.0, 0.0);
    pub const WARNING_YELLOW: Color = Color::srgb(1.0, 1.0, 0.0);
    pub const ALERT_ORANGE: Color = Color::srgb(1.0, 0.4, 0.0);
    pub const COUNTER: Color = Color::srgb(0.627, 0.510, 0.427);
    pub const KITCHEN: Color = Color::srgb(1.0, 0.973, 0.906);
    pub const CARAMEL: Color = Color::srgb(0.824, 0.412, 0.118);
    pub const WOOD: Color = Color::srgb(0.545, 0.271, 0.075);
    pub const INK: Color = Color::srgb(0.2, 0.2, 0.2);
}

/// Marks the design-space container every step spawns its content into.
#[derive(Component)]
pub struct StageRoot;

fn spawn_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}

fn fit_stage(
    windows: Query<&Window, (With<PrimaryWindow>, Changed<Window>)>,
    mut ui_scale: ResMut<UiScale>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let scale = fit_scale(window.size());
    if scale > 0.0 && scale != ui_scale.0 {
        ui_scale.0 = scale;
    }
}

/// Largest scale at which the whole stage fits inside `window`.
pub fn fit_scale(window: Vec2) -> f32 {
    (window.x / STAGE_SIZE.x).min(window.y / STAGE_SIZE.y)
}

/// Maps a logical window position onto stage coordinates, accounting for letterboxing.
pub fn to_stage(cursor: Vec2, window: Vec2, scale: f32) -> Vec2 {
    let offset = (window - STAGE_SIZE * scale) / 2.0;
    (cursor - offset) / scale
}

/// Cursor position in stage coordinates.
#[derive(SystemParam)]
pub struct StageCursor<'w, 's> {
    windows: Query<'w, 's, &'static Window, With<PrimaryWindow>>,
    scale: Res<'w, UiScale>,
}

impl StageCursor<'_, '_> {
    pub fn position(&self) -> Option<Vec2> {
        let window = self.windows.single().ok()?;
        let cursor = window.cursor_position()?;
        Some(to_stage(cursor, window.size(), self.scale.0))
    }
}

/// Spawns the letterboxed stage for `step` and returns the stage entity.
/// Everything under it is despawned when the step is left.
pub fn spawn_stage(commands: &mut Commands, step: StepId, background: Color) -> Entity {
    let frame = commands
        .spawn((
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                position_type: PositionType::Absolute,
                ..default()
            },
            DespawnOnExit(Sections::Step(step)),
        ))
        .id();

    commands
        .spawn((
            StageRoot,
            Node {
                width: Val::Px(STAGE_SIZE.x),
                height: Val::Px(STAGE_SIZE.y),
                overflow: Overflow::clip(),
                ..default()
            },
            BackgroundColor(background),
            ChildOf(frame),
        ))
        .id()
}

/// Absolutely positioned node centred on `center`.
pub fn place(center: Vec2, size: Vec2) -> Node {
    Node {
        position_type: PositionType::Absolute,
        left: Val::Px(center.x - size.x / 2.0),
        top: Val::Px(center.y - size.y / 2.0),
        width: Val::Px(size.x),
        height: Val::Px(size.y),
        justify_content: JustifyContent::Center,
        align_items: AlignItems::Center,
        ..default()
    }
}

pub fn move_to(node: &mut Node, center: Vec2, size: Vec2) {
    node.left = Val::Px(center.x - size.x / 2.0);
    node.top = Val::Px(center.y - size.y / 2.0);
}

/// Filled rectangle with an outline.
pub fn block(center: Vec2, size: Vec2, fill: Color, outline: Color) -> impl Bundle {
    (
        Node {
            border: UiRect::all(Val::Px(4.0)),
            ..place(center, size)
        },
        BackgroundColor(fill),
        BorderColor::all(outline),
    )
}

pub fn text(content: impl Into<String>, font_size: f32, color: Color) -> impl Bundle {
    (
        Text::new(content),
        TextFont {
            font_size,
            ..default()
        },
        TextColor(color),
    )
}

/// A single line of text centred on a point of the stage.
pub fn caption(
    parent: &mut ChildSpawnerCommands,
    center: Vec2,
    content: impl Into<String>,
    font_size: f32,
    color: Color,
) -> Entity {
    caption_with(parent, center, font_size, text(content, font_size, color))
}

/// Like [`caption`], but the text entity carries `label` so it can be queried directly.
pub fn caption_with(
    parent: &mut ChildSpawnerCommands,
    center: Vec2,
    font_size: f32,
    label: impl Bundle,
) -> Entity {
    parent
        .spawn(place(center, Vec2::new(STAGE_SIZE.x, font_size * 4.0)))
        .with_children(|row| {
            row.spawn(label);
        })
        .id()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_scale_letterboxes_wide_windows() {
        assert_eq!(fit_scale(Vec2::new(1920.0, 1080.0)), 1.0);
        assert_eq!(fit_scale(Vec2::new(1920.0, 540.0)), 0.5);
        assert_eq!(fit_scale(Vec2::new(960.0, 1080.0)), 0.5);
    }

    #[test]
    fn cursor_maps_through_letterbox() {
        let window = Vec2::new(1920.0, 540.0);
        let scale = fit_scale(window);
        // Stage is 960 wide, centred: starts at x = 480.
        assert_eq!(to_stage(Vec2::new(480.0, 0.0), window, scale), Vec2::ZERO);
        assert_eq!(to_stage(Vec2::new(960.0, 270.0), window, scale), CENTER);
    }

    #[test]
    fn place_centres_node() {
        let node = place(Vec2::new(100.0, 50.0), Vec2::new(40.0, 20.0));
        assert_eq!(node.left, Val::Px(80.0));
        assert_eq!(node.top, Val::Px(40.0));
        assert_eq!(node.width, Val::Px(40.0));
    }
}
