// Mouse drag-and-drop for stage items.

use std::time::Duration;

use bevy::prelude::*;

use crate::progression::accepting_input;
use crate::sound::AudioCue;
use crate::stage::{StageCursor, move_to};
use crate::transition::Pulse;

pub struct DragPlugin;

impl Plugin for DragPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<DragReleased>().add_systems(
            Update,
            (
                (pick_up, follow_cursor, drop_held)
                    .chain()
                    .run_if(accepting_input),
                return_home,
                sync_nodes,
            )
                .chain(),
        );
    }
}

const RETURN_TIME: Duration = Duration::from_millis(300);

/// An item that can be picked up with the mouse. Positions are stage-space centres.
#[derive(Component, Debug, Clone)]
pub struct Draggable {
    pub home: Vec2,
    pub position: Vec2,
    pub size: Vec2,
    grab_offset: Option<Vec2>,
    returning: Option<(Vec2, Pulse)>,
}

impl Draggable {
    pub fn new(home: Vec2, size: Vec2) -> Self {
        Self {
            home,
            position: home,
            size,
            grab_offset: None,
            returning: None,
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        let half = self.size / 2.0;
        (point - self.position).abs().cmple(half).all()
    }

    pub fn is_held(&self) -> bool {
        self.grab_offset.is_some()
    }

    /// Picks the item up if `cursor` is over it.
    pub fn grab(&mut self, cursor: Vec2) -> bool {
        if !self.contains(cursor) {
            return false;
        }
        self.returning = None;
        self.grab_offset = Some(self.position - cursor);
        true
    }

    pub fn drag_to(&mut self, cursor: Vec2) {
        if let Some(offset) = self.grab_offset {
            self.position = cursor + offset;
        }
    }

    /// Lets go and returns where the item was dropped.
    pub fn release(&mut self) -> Option<Vec2> {
        self.grab_offset.take().map(|_| self.position)
    }

    /// Slides back to `home` over a short ease-out.
    pub fn send_home(&mut self) {
        self.returning = Some((self.position, Pulse::new(RETURN_TIME)));
    }

    fn advance_return(&mut self, dt: Duration) {
        let Some((from, pulse)) = self.returning.as_mut() else {
            return;
        };
        let done = pulse.advance(dt);
        let t = 1.0 - pulse.strength();
        let eased = 1.0 - (1.0 - t).powi(2);
        self.position = from.lerp(self.home, eased);
        if done {
            self.position = self.home;
            self.returning = None;
        }
    }
}

pub fn within(point: Vec2, target: Vec2, radius: f32) -> bool {
    point.distance(target) < radius
}

/// Written when a held item is let go.
#[derive(Message, Debug, Clone, Copy)]
pub struct DragReleased {
    pub entity: Entity,
    pub at: Vec2,
}

fn pick_up(
    mouse: Res<ButtonInput<MouseButton>>,
    cursor: StageCursor,
    mut items: Query<&mut Draggable>,
    mut cues: MessageWriter<AudioCue>,
) {
    if !mouse.just_pressed(MouseButton::Left) {
        return;
    }
    let Some(point) = cursor.position() else {
        return;
    };
    // One item per click.
    if let Some(mut item) = items.iter_mut().find(|item| item.contains(point)) {
        item.grab(point);
        cues.write(AudioCue::Click);
    }
}

fn follow_cursor(cursor: StageCursor, mut items: Query<&mut Draggable>) {
    let Some(point) = cursor.position() else {
        return;
    };
    for mut item in &mut items {
        if item.is_held() {
            item.drag_to(point);
        }
    }
}

fn drop_held(
    mouse: Res<ButtonInput<MouseButton>>,
    mut items: Query<(Entity, &mut Draggable)>,
    mut released: MessageWriter<DragReleased>,
) {
    if !mouse.just_released(MouseButton::Left) {
        return;
    }
    for (entity, mut item) in &mut items {
        if let Some(at) = item.release() {
            released.write(DragReleased { entity, at });
        }
    }
}

fn return_home(time: Res<Time>, mut items: Query<&mut Draggable>) {
    for mut item in &mut items {
        if item.returning.is_some() {
            item.advance_return(time.delta());
        }
    }
}

fn sync_nodes(mut items: Query<(&Draggable, &mut Node), Changed<Draggable>>) {
    for (item, mut node) in &mut items {
        move_to(&mut node, item.position, item.size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grab_keeps_offset_under_cursor() {
        let mut bean = Draggable::new(Vec2::new(300.0, 400.0), Vec2::new(60.0, 40.0));
        assert!(!bean.grab(Vec2::new(400.0, 400.0)));
        assert!(bean.grab(Vec2::new(310.0, 405.0)));
        bean.drag_to(Vec2::new(910.0, 605.0));
        assert_eq!(bean.position, Vec2::new(900.0, 600.0));
        assert_eq!(bean.release(), Some(Vec2::new(900.0, 600.0)));
        assert!(!bean.is_held());
        assert_eq!(bean.release(), None);
    }

    #[test]
    fn drag_without_grab_does_nothing() {
        let mut bean = Draggable::new(Vec2::ZERO, Vec2::splat(10.0));
        bean.drag_to(Vec2::splat(100.0));
        assert_eq!(bean.position, Vec2::ZERO);
    }

    #[test]
    fn send_home_eases_back() {
        let home = Vec2::new(100.0, 100.0);
        let mut bean = Draggable::new(home, Vec2::splat(40.0));
        bean.grab(home);
        bean.drag_to(Vec2::new(500.0, 100.0));
        bean.release();
        bean.send_home();

        bean.advance_return(RETURN_TIME / 2);
        assert!(bean.position.x > home.x && bean.position.x < 500.0);
        bean.advance_return(RETURN_TIME);
        assert_eq!(bean.position, home);
        assert!(bean.returning.is_none());
    }

    #[test]
    fn within_is_a_strict_radius() {
        let grinder = Vec2::new(960.0, 600.0);
        assert!(within(Vec2::new(1000.0, 600.0), grinder, 120.0));
        assert!(!within(Vec2::new(1080.0, 600.0), grinder, 120.0));
    }
}
