// Linear step sequencing: completion signals in, initialize/finish directives out.

use std::time::Duration;

use bevy::prelude::*;

use crate::ledger::RewardLedger;
use crate::steps::{RewardKey, StepId, StepKind, StepList};
use crate::transition::{GateEvent, TransitionGate};

/// Fade length and how long each kind of step lingers after completing, so its
/// success feedback can play out.
#[derive(Resource, Debug, Clone)]
pub struct Timings {
    pub fade: Duration,
    pub title_linger: Duration,
    pub cutscene_linger: Duration,
    pub minigame_linger: Duration,
    pub finale_linger: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            fade: Duration::from_millis(500),
            title_linger: Duration::ZERO,
            cutscene_linger: Duration::from_millis(500),
            minigame_linger: Duration::from_millis(2500),
            finale_linger: Duration::ZERO,
        }
    }
}

impl Timings {
    pub fn linger_for(&self, kind: StepKind) -> Duration {
        match kind {
            StepKind::Title => self.title_linger,
            StepKind::Cutscene => self.cutscene_linger,
            StepKind::MiniGame => self.minigame_linger,
            StepKind::Finale => self.finale_linger,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Between steps; the active step has not been initialized yet.
    Idle,
    Running,
    /// The active step reported done and is waiting out its linger and fade.
    Completing,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Accepted {
        newly_unlocked: Option<RewardKey>,
    },
    /// Stale, duplicate or arriving in the wrong phase.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Tear down whatever is on screen and set this step up. Always issued while
    /// the gate fully covers the screen.
    Initialize(StepId),
    Finish,
}

#[derive(Debug, Clone)]
pub struct ProgressionController {
    steps: StepList,
    timings: Timings,
    ledger: RewardLedger,
    gate: TransitionGate,
    active: usize,
    phase: Phase,
    linger: Duration,
    transition_requested: bool,
}

impl ProgressionController {
    pub fn new(steps: StepList, timings: Timings) -> Self {
        Self {
            steps,
            timings,
            ledger: RewardLedger::default(),
            gate: TransitionGate::default(),
            active: 0,
            phase: Phase::Idle,
            linger: Duration::ZERO,
            transition_requested: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn ledger(&self) -> &RewardLedger {
        &self.ledger
    }

    pub fn gate(&self) -> &TransitionGate {
        &self.gate
    }

    pub fn steps(&self) -> &StepList {
        &self.steps
    }

    pub fn active_step(&self) -> Option<StepId> {
        self.steps.get(self.active).map(|step| step.id)
    }

    /// The step currently taking input, if any.
    pub fn running_step(&self) -> Option<StepId> {
        match self.phase {
            Phase::Running => self.active_step(),
            _ => None,
        }
    }

    pub fn accepts_input(&self) -> bool {
        self.phase == Phase::Running && self.gate.is_interactive()
    }

    /// The active step reports that its win condition fired.
    pub fn signal_complete(&mut self, step: StepId) -> Signal {
        if self.phase != Phase::Running {
            return Signal::Ignored;
        }
        let Some(descriptor) = self.steps.get(self.active).copied() else {
            return Signal::Ignored;
        };
        if descriptor.id != step {
            return Signal::Ignored;
        }

        let newly_unlocked = self.ledger.mark_step_complete(step, descriptor.reward);
        self.phase = Phase::Completing;
        self.linger = self.timings.linger_for(step.kind());
        self.transition_requested = false;
        Signal::Accepted { newly_unlocked }
    }

    pub fn tick(&mut self, dt: Duration) -> Option<Directive> {
        if let Some(GateEvent::Switch(next)) = self.gate.tick(dt) {
            let index = self.steps.index_of(next)?;
            self.active = index;
            self.phase = Phase::Idle;
            return self.begin();
        }

        match self.phase {
            Phase::Idle if self.gate.is_covered() => {
                self.gate.fade_in(self.timings.fade);
                self.begin()
            }
            Phase::Completing if !self.transition_requested => {
                self.linger = self.linger.saturating_sub(dt);
                if !self.linger.is_zero() {
                    return None;
                }
                let next = self.steps.get(self.active).and_then(|step| step.next);
                match next {
                    Some(next) => {
                        self.gate.transition_to(next, self.timings.fade);
                        self.transition_requested = true;
                        None
                    }
                    None => {
                        self.phase = Phase::Finished;
                        Some(Directive::Finish)
                    }
                }
            }
            _ => None,
        }
    }

    /// Starts a fresh session from the first step with an empty ledger.
    pub fn reset(&mut self) {
        self.ledger = RewardLedger::default();
        self.active = 0;
        self.phase = Phase::Idle;
        self.linger = Duration::ZERO;
        self.transition_requested = false;
        let first = self.steps.first().id;
        self.gate.transition_to(first, self.timings.fade);
    }

    fn begin(&mut self) -> Option<Directive> {
        let step = self.active_step()?;
        self.phase = Phase::Running;
        Some(Directive::Initialize(step))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(50);

    fn reward_steps() -> StepList {
        StepList::chain(&[
            (StepId::CoffeeBeans, Some(RewardKey::Bean)),
            (StepId::MilkPour, Some(RewardKey::Milk)),
            (StepId::BeachDiscovery, Some(RewardKey::Shell)),
            (StepId::CrabPhotography, Some(RewardKey::Crab)),
            (StepId::Brewing, Some(RewardKey::Cup)),
        ])
        .unwrap()
    }

    /// Ticks until a directive comes out, recording gate coverage at that moment.
    fn run_until_directive(controller: &mut ProgressionController) -> (Directive, f32) {
        for _ in 0..1000 {
            if let Some(directive) = controller.tick(TICK) {
                return (directive, controller.gate().coverage());
            }
        }
        panic!("controller never produced a directive");
    }

    fn keys(controller: &ProgressionController) -> Vec<&'static str> {
        controller
            .ledger()
            .unlocked()
            .iter()
            .map(|key| key.as_str())
            .collect()
    }

    #[test]
    fn first_tick_initializes_first_step_under_cover() {
        let mut controller = ProgressionController::new(reward_steps(), Timings::default());
        assert_eq!(controller.phase(), Phase::Idle);
        assert_eq!(controller.running_step(), None);
        assert_eq!(
            controller.tick(TICK),
            Some(Directive::Initialize(StepId::CoffeeBeans))
        );
        assert_eq!(controller.gate().coverage(), 1.0);
        assert_eq!(controller.running_step(), Some(StepId::CoffeeBeans));
    }

    #[test]
    fn full_adventure_unlocks_every_sticker_once_in_order() {
        let mut controller = ProgressionController::new(reward_steps(), Timings::default());
        controller.tick(TICK);

        assert_eq!(
            controller.signal_complete(StepId::CoffeeBeans),
            Signal::Accepted {
                newly_unlocked: Some(RewardKey::Bean)
            }
        );
        assert_eq!(keys(&controller), ["sticker-bean"]);
        assert_eq!(controller.signal_complete(StepId::CoffeeBeans), Signal::Ignored);
        assert_eq!(keys(&controller), ["sticker-bean"]);

        for step in [
            StepId::MilkPour,
            StepId::BeachDiscovery,
            StepId::CrabPhotography,
            StepId::Brewing,
        ] {
            let (directive, coverage) = run_until_directive(&mut controller);
            assert_eq!(directive, Directive::Initialize(step));
            assert_eq!(coverage, 1.0);
            assert!(matches!(
                controller.signal_complete(step),
                Signal::Accepted {
                    newly_unlocked: Some(_)
                }
            ));
        }

        assert_eq!(run_until_directive(&mut controller).0, Directive::Finish);
        assert_eq!(controller.phase(), Phase::Finished);
        assert_eq!(
            keys(&controller),
            [
                "sticker-bean",
                "sticker-milk",
                "sticker-shell",
                "sticker-crab",
                "sticker-cup"
            ]
        );
        assert_eq!(controller.signal_complete(StepId::Brewing), Signal::Ignored);
    }

    #[test]
    fn signals_for_inactive_steps_are_ignored() {
        let mut controller = ProgressionController::new(reward_steps(), Timings::default());
        // Not yet running.
        assert_eq!(controller.signal_complete(StepId::CoffeeBeans), Signal::Ignored);
        controller.tick(TICK);
        assert_eq!(controller.signal_complete(StepId::MilkPour), Signal::Ignored);
        assert!(controller.ledger().unlocked().is_empty());
    }

    #[test]
    fn completing_step_waits_out_linger_before_fading() {
        let timings = Timings::default();
        let mut controller = ProgressionController::new(reward_steps(), timings.clone());
        controller.tick(TICK);
        // Let the first fade-in finish.
        while !controller.gate().is_open() {
            controller.tick(TICK);
        }
        controller.signal_complete(StepId::CoffeeBeans);
        assert!(!controller.accepts_input());

        let mut waited = Duration::ZERO;
        while !controller.gate().is_fading_out() {
            assert_eq!(controller.tick(TICK), None);
            waited += TICK;
        }
        assert_eq!(waited, timings.minigame_linger);
    }

    #[test]
    fn initialize_only_follows_an_accepted_completion() {
        let mut controller = ProgressionController::new(reward_steps(), Timings::default());
        let mut running = 0;
        let mut initialized = Vec::new();

        for _ in 0..2000 {
            match controller.tick(TICK) {
                Some(Directive::Initialize(step)) => {
                    running += 1;
                    assert_eq!(running, 1, "two steps running at once");
                    initialized.push(step);
                }
                Some(Directive::Finish) => break,
                None => {}
            }
            if let Some(step) = controller.running_step() {
                if controller.signal_complete(step) != Signal::Ignored {
                    running -= 1;
                }
            }
        }

        assert_eq!(controller.phase(), Phase::Finished);
        assert_eq!(
            initialized,
            reward_steps().iter().map(|step| step.id).collect::<Vec<_>>()
        );
    }

    #[test]
    fn reset_replays_from_first_step_with_empty_ledger() {
        let steps = StepList::chain(&[
            (StepId::Welcome, None),
            (StepId::Celebration, None),
        ])
        .unwrap();
        let mut controller = ProgressionController::new(steps, Timings::default());
        controller.tick(TICK);
        controller.signal_complete(StepId::Welcome);
        assert_eq!(
            run_until_directive(&mut controller).0,
            Directive::Initialize(StepId::Celebration)
        );
        controller.signal_complete(StepId::Celebration);
        assert_eq!(run_until_directive(&mut controller).0, Directive::Finish);
        assert!(controller.ledger().is_step_complete(StepId::Celebration));

        controller.reset();
        assert_eq!(controller.phase(), Phase::Idle);
        assert!(controller.ledger().completed_steps().is_empty());
        let (directive, coverage) = run_until_directive(&mut controller);
        assert_eq!(directive, Directive::Initialize(StepId::Welcome));
        assert_eq!(coverage, 1.0);
        assert_eq!(controller.running_step(), Some(StepId::Welcome));
    }
}
