/// Top-level app state: which step's entities are currently alive.
use bevy::prelude::*;

use crate::steps::{StepId, StepKind};

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States)]
pub enum Sections {
    /// Before the first step is initialized.
    #[default]
    Boot,
    Step(StepId),
}

impl Sections {
    pub fn step(self) -> Option<StepId> {
        match self {
            Sections::Boot => None,
            Sections::Step(step) => Some(step),
        }
    }
}

/// Run condition: the active step is a dialogue cutscene.
pub fn in_cutscene(section: Res<State<Sections>>) -> bool {
    section
        .get()
        .step()
        .is_some_and(|step| step.kind() == StepKind::Cutscene)
}
