/// Stickers unlocked and steps completed during one play session.
use crate::steps::{RewardKey, StepId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewardLedger {
    // Insertion order is display order.
    unlocked: Vec<RewardKey>,
    completed: Vec<StepId>,
}

impl RewardLedger {
    /// Returns `true` only the first time `key` is granted.
    pub fn grant(&mut self, key: RewardKey) -> bool {
        if self.unlocked.contains(&key) {
            return false;
        }
        self.unlocked.push(key);
        true
    }

    /// Records `step` as complete and grants its reward. Returns the reward if
    /// this call unlocked it.
    pub fn mark_step_complete(
        &mut self,
        step: StepId,
        reward: Option<RewardKey>,
    ) -> Option<RewardKey> {
        if self.completed.contains(&step) {
            return None;
        }
        self.completed.push(step);
        reward.filter(|&key| self.grant(key))
    }

    pub fn unlocked(&self) -> &[RewardKey] {
        &self.unlocked
    }

    pub fn is_step_complete(&self, step: StepId) -> bool {
        self.completed.contains(&step)
    }

    pub fn completed_steps(&self) -> &[StepId] {
        &self.completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grant_is_true_once_per_key() {
        let mut ledger = RewardLedger::default();
        assert!(ledger.grant(RewardKey::Shell));
        assert!(!ledger.grant(RewardKey::Shell));
        assert!(ledger.grant(RewardKey::Crab));
        assert!(!ledger.grant(RewardKey::Shell));
        assert_eq!(ledger.unlocked(), &[RewardKey::Shell, RewardKey::Crab]);
    }

    #[test]
    fn repeated_completion_grants_reward_once() {
        let mut ledger = RewardLedger::default();
        assert_eq!(
            ledger.mark_step_complete(StepId::CoffeeBeans, Some(RewardKey::Bean)),
            Some(RewardKey::Bean)
        );
        for _ in 0..3 {
            assert_eq!(
                ledger.mark_step_complete(StepId::CoffeeBeans, Some(RewardKey::Bean)),
                None
            );
        }
        assert_eq!(ledger.unlocked(), &[RewardKey::Bean]);
        assert_eq!(ledger.completed_steps(), &[StepId::CoffeeBeans]);
    }

    #[test]
    fn steps_without_reward_are_still_recorded() {
        let mut ledger = RewardLedger::default();
        assert_eq!(ledger.mark_step_complete(StepId::Opening, None), None);
        assert!(ledger.is_step_complete(StepId::Opening));
        assert!(ledger.unlocked().is_empty());
    }

    #[test]
    fn reward_already_granted_elsewhere_is_not_reported_again() {
        let mut ledger = RewardLedger::default();
        ledger.grant(RewardKey::Cup);
        assert_eq!(
            ledger.mark_step_complete(StepId::Brewing, Some(RewardKey::Cup)),
            None
        );
        assert!(ledger.is_step_complete(StepId::Brewing));
        assert_eq!(ledger.unlocked(), &[RewardKey::Cup]);
    }
}
