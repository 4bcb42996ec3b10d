/// Typewriter dialogue: one line at a time, each entering, typing, holding and leaving.
use std::time::Duration;

pub const ENTER: Duration = Duration::from_millis(300);
pub const TYPE_INTERVAL: Duration = Duration::from_millis(40);
pub const LEAVE: Duration = Duration::from_millis(250);

/// Colour family for a line's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    #[default]
    Plain,
    Worried,
    Alarmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialogueLine {
    pub text: &'static str,
    pub pause_after: Duration,
    /// Cut the previous bubble off instead of letting it fade.
    pub interrupts: bool,
    pub tone: Tone,
}

impl DialogueLine {
    pub const fn new(text: &'static str, pause_ms: u64) -> Self {
        Self {
            text,
            pause_after: Duration::from_millis(pause_ms),
            interrupts: false,
            tone: Tone::Plain,
        }
    }

    pub const fn tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }

    pub const fn interrupting(mut self) -> Self {
        self.interrupts = true;
        self
    }

    fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueEvent {
    LineStarted(usize),
    /// The whole line is on screen, either typed out or skipped to.
    Revealed(usize),
    LineDismissed(usize),
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinePhase {
    Entering,
    Typing,
    Holding,
    Leaving,
}

#[derive(Debug, Clone, Copy)]
struct Cursor {
    line: usize,
    phase: LinePhase,
    elapsed: Duration,
    shown: usize,
}

impl Cursor {
    fn at(line: usize) -> Self {
        Self {
            line,
            phase: LinePhase::Entering,
            elapsed: Duration::ZERO,
            shown: 0,
        }
    }
}

#[derive(Debug, Default)]
pub struct DialogueSequencer {
    lines: Vec<DialogueLine>,
    cursor: Option<Cursor>,
    pending: Vec<DialogueEvent>,
}

impl DialogueSequencer {
    /// Drops whatever was playing and starts over with `lines`.
    pub fn show_sequence(&mut self, lines: Vec<DialogueLine>) {
        self.pending.clear();
        self.cursor = None;
        self.lines = lines;
        self.start_line(0);
    }

    pub fn is_playing(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn current_line(&self) -> Option<&DialogueLine> {
        self.cursor.and_then(|cursor| self.lines.get(cursor.line))
    }

    /// The part of the current line typed so far.
    pub fn visible_text(&self) -> &str {
        let (Some(cursor), Some(line)) = (self.cursor, self.current_line()) else {
            return "";
        };
        match line.text.char_indices().nth(cursor.shown) {
            Some((end, _)) => &line.text[..end],
            None => line.text,
        }
    }

    /// Bubble opacity: rising while entering, falling while leaving.
    pub fn bubble_alpha(&self) -> f32 {
        let Some(cursor) = self.cursor else {
            return 0.0;
        };
        match cursor.phase {
            LinePhase::Entering => fraction(cursor.elapsed, ENTER),
            LinePhase::Leaving => 1.0 - fraction(cursor.elapsed, LEAVE),
            LinePhase::Typing | LinePhase::Holding => 1.0,
        }
    }

    /// Reveals the rest of the line if it is still typing. Returns whether
    /// anything happened; the hold that follows always runs in full.
    pub fn skip(&mut self) -> bool {
        let Some(cursor) = self.cursor.as_mut() else {
            return false;
        };
        if cursor.phase != LinePhase::Typing {
            return false;
        }
        let Some(line) = self.lines.get(cursor.line) else {
            return false;
        };
        cursor.shown = line.char_count();
        cursor.phase = LinePhase::Holding;
        cursor.elapsed = Duration::ZERO;
        self.pending.push(DialogueEvent::Revealed(cursor.line));
        true
    }

    pub fn tick(&mut self, dt: Duration) -> Vec<DialogueEvent> {
        let mut events = std::mem::take(&mut self.pending);
        let mut budget = dt;

        while let Some(mut cursor) = self.cursor {
            let Some(line) = self.lines.get(cursor.line).copied() else {
                self.cursor = None;
                break;
            };
            let limit = match cursor.phase {
                LinePhase::Entering => ENTER,
                LinePhase::Typing => TYPE_INTERVAL * line.char_count() as u32,
                LinePhase::Holding => line.pause_after,
                LinePhase::Leaving => LEAVE,
            };

            let available = cursor.elapsed + budget;
            if available < limit {
                cursor.elapsed = available;
                if cursor.phase == LinePhase::Typing {
                    let typed = available.as_nanos() / TYPE_INTERVAL.as_nanos();
                    cursor.shown = (typed as usize).min(line.char_count());
                }
                self.cursor = Some(cursor);
                break;
            }
            budget = available - limit;
            cursor.elapsed = Duration::ZERO;

            match cursor.phase {
                LinePhase::Entering => {
                    cursor.phase = LinePhase::Typing;
                    self.cursor = Some(cursor);
                }
                LinePhase::Typing => {
                    cursor.shown = line.char_count();
                    cursor.phase = LinePhase::Holding;
                    self.cursor = Some(cursor);
                    events.push(DialogueEvent::Revealed(cursor.line));
                }
                LinePhase::Holding => {
                    let next_interrupts = self
                        .lines
                        .get(cursor.line + 1)
                        .is_some_and(|next| next.interrupts);
                    if next_interrupts {
                        events.push(DialogueEvent::LineDismissed(cursor.line));
                        self.start_line(cursor.line + 1);
                        events.append(&mut self.pending);
                    } else {
                        cursor.phase = LinePhase::Leaving;
                        self.cursor = Some(cursor);
                    }
                }
                LinePhase::Leaving => {
                    events.push(DialogueEvent::LineDismissed(cursor.line));
                    self.start_line(cursor.line + 1);
                    events.append(&mut self.pending);
                }
            }
        }

        events
    }

    fn start_line(&mut self, index: usize) {
        if index < self.lines.len() {
            self.cursor = Some(Cursor::at(index));
            self.pending.push(DialogueEvent::LineStarted(index));
        } else {
            self.cursor = None;
            self.pending.push(DialogueEvent::Finished);
        }
    }
}

fn fraction(elapsed: Duration, total: Duration) -> f32 {
    if total.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f32() / total.as_secs_f32()).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_millis(16);

    fn play_out(sequencer: &mut DialogueSequencer) -> Vec<DialogueEvent> {
        let mut events = Vec::new();
        for _ in 0..10_000 {
            let batch = sequencer.tick(FRAME);
            let done = batch.contains(&DialogueEvent::Finished);
            events.extend(batch);
            if done {
                return events;
            }
        }
        panic!("sequence never finished");
    }

    #[test]
    fn lines_start_strictly_in_order() {
        let mut sequencer = DialogueSequencer::default();
        sequencer.show_sequence(vec![
            DialogueLine::new("A", 100),
            DialogueLine::new("Bee", 100),
            DialogueLine::new("Sea", 100),
        ]);
        let events = play_out(&mut sequencer);

        let started: Vec<_> = events
            .iter()
            .filter_map(|event| match event {
                DialogueEvent::LineStarted(i) => Some(*i),
                _ => None,
            })
            .collect();
        assert_eq!(started, [0, 1, 2]);

        // Each line is dismissed before the next starts.
        let line_events: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, DialogueEvent::LineStarted(_) | DialogueEvent::LineDismissed(_)))
            .copied()
            .collect();
        assert_eq!(
            line_events,
            [
                DialogueEvent::LineStarted(0),
                DialogueEvent::LineDismissed(0),
                DialogueEvent::LineStarted(1),
                DialogueEvent::LineDismissed(1),
                DialogueEvent::LineStarted(2),
                DialogueEvent::LineDismissed(2),
            ]
        );
        assert_eq!(events.last(), Some(&DialogueEvent::Finished));
        assert!(!sequencer.is_playing());
    }

    #[test]
    fn typing_reveals_one_character_per_interval() {
        let mut sequencer = DialogueSequencer::default();
        sequencer.show_sequence(vec![DialogueLine::new("Hello", 500)]);
        sequencer.tick(ENTER);
        assert_eq!(sequencer.visible_text(), "");
        sequencer.tick(TYPE_INTERVAL * 2);
        assert_eq!(sequencer.visible_text(), "He");
        let events = sequencer.tick(TYPE_INTERVAL * 3);
        assert_eq!(sequencer.visible_text(), "Hello");
        assert_eq!(events, [DialogueEvent::Revealed(0)]);
    }

    #[test]
    fn skip_while_typing_reveals_full_line_and_holds() {
        let line = DialogueLine::new("Good morning, beautiful", 2000);
        let mut sequencer = DialogueSequencer::default();
        sequencer.show_sequence(vec![line]);
        sequencer.tick(ENTER + TYPE_INTERVAL);
        assert_eq!(sequencer.visible_text(), "G");

        assert!(sequencer.skip());
        assert_eq!(sequencer.visible_text(), line.text);
        assert_eq!(sequencer.tick(Duration::ZERO), [DialogueEvent::Revealed(0)]);

        // The hold is not shortened.
        assert!(sequencer.tick(line.pause_after - FRAME).is_empty());
        assert_eq!(sequencer.bubble_alpha(), 1.0);
        assert_eq!(
            sequencer.tick(FRAME + LEAVE),
            [DialogueEvent::LineDismissed(0), DialogueEvent::Finished]
        );
    }

    #[test]
    fn skip_outside_typing_does_nothing() {
        let mut sequencer = DialogueSequencer::default();
        assert!(!sequencer.skip());
        sequencer.show_sequence(vec![DialogueLine::new("Hi", 1000)]);
        // Still entering.
        assert!(!sequencer.skip());
        sequencer.tick(ENTER + TYPE_INTERVAL * 2);
        // Holding.
        assert!(!sequencer.skip());
        assert!(sequencer.tick(Duration::from_millis(500)).is_empty());
    }

    #[test]
    fn interrupting_line_cuts_previous_bubble() {
        let mut sequencer = DialogueSequencer::default();
        sequencer.show_sequence(vec![
            DialogueLine::new("Yes!", 100),
            DialogueLine::new("Hey!! Wait!", 100).interrupting(),
        ]);
        sequencer.tick(ENTER + TYPE_INTERVAL * 4);
        let events = sequencer.tick(Duration::from_millis(100));
        assert_eq!(
            events,
            [DialogueEvent::LineDismissed(0), DialogueEvent::LineStarted(1)]
        );
        // No leaving fade happened.
        assert_eq!(sequencer.bubble_alpha(), 0.0);
        assert_eq!(sequencer.current_line().map(|l| l.text), Some("Hey!! Wait!"));
    }

    #[test]
    fn empty_sequence_finishes_immediately() {
        let mut sequencer = DialogueSequencer::default();
        sequencer.show_sequence(Vec::new());
        assert_eq!(sequencer.tick(FRAME), [DialogueEvent::Finished]);
        assert!(sequencer.tick(FRAME).is_empty());
    }

    #[test]
    fn show_sequence_discards_previous_run() {
        let mut sequencer = DialogueSequencer::default();
        sequencer.show_sequence(vec![DialogueLine::new("First", 100)]);
        sequencer.tick(ENTER);
        sequencer.show_sequence(vec![DialogueLine::new("Second", 100)]);
        assert_eq!(sequencer.tick(Duration::ZERO), [DialogueEvent::LineStarted(0)]);
        assert_eq!(sequencer.current_line().map(|l| l.text), Some("Second"));
        assert_eq!(sequencer.visible_text(), "");
    }
}
