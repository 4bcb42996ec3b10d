/// Step identities, reward keys and the ordered step list.
use std::fmt;

use strum::{Display, EnumIter, EnumMessage, IntoStaticStr};

/// One node of the adventure: a title screen, a cutscene, a mini-game or the finale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum StepId {
    Welcome,
    Opening,
    CoffeeBeans,
    AfterBeans,
    MilkPour,
    AfterMilk,
    BeachArrival,
    BeachDiscovery,
    CrabSteal,
    CrabPhotography,
    AfterCrab,
    BeforeBrewing,
    Brewing,
    Celebration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Title,
    Cutscene,
    MiniGame,
    Finale,
}

impl StepId {
    pub fn kind(self) -> StepKind {
        match self {
            StepId::Welcome => StepKind::Title,
            StepId::CoffeeBeans
            | StepId::MilkPour
            | StepId::BeachDiscovery
            | StepId::CrabPhotography
            | StepId::Brewing => StepKind::MiniGame,
            StepId::Celebration => StepKind::Finale,
            _ => StepKind::Cutscene,
        }
    }

    pub fn is_cutscene(self) -> bool {
        self.kind() == StepKind::Cutscene
    }
}

/// Stable identifier of a sticker granted on step completion.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumMessage, IntoStaticStr,
)]
pub enum RewardKey {
    #[strum(serialize = "sticker-bean", message = "Coffee Bean")]
    Bean,
    #[strum(serialize = "sticker-milk", message = "Fresh Milk")]
    Milk,
    #[strum(serialize = "sticker-shell", message = "Beach Shell")]
    Shell,
    #[strum(serialize = "sticker-crab", message = "Happy Crab")]
    Crab,
    #[strum(serialize = "sticker-cup", message = "Perfect Coffee")]
    Cup,
}

impl RewardKey {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Name shown on the unlock card.
    pub fn display_name(self) -> &'static str {
        self.get_message().unwrap_or("Special Sticker")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepDescriptor {
    pub id: StepId,
    pub reward: Option<RewardKey>,
    pub next: Option<StepId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepListError {
    Empty,
    Duplicate(StepId),
    /// A step's `next` does not name the step that follows it in the list.
    BrokenLink {
        step: StepId,
        expected: Option<StepId>,
        found: Option<StepId>,
    },
}

impl fmt::Display for StepListError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepListError::Empty => write!(f, "step list is empty"),
            StepListError::Duplicate(id) => write!(f, "step `{id}` appears more than once"),
            StepListError::BrokenLink {
                step,
                expected,
                found,
            } => {
                let name = |id: &Option<StepId>| id.map_or("<end>".to_string(), |id| id.to_string());
                write!(
                    f,
                    "step `{step}` links to {} but is followed by {}",
                    name(found),
                    name(expected)
                )
            }
        }
    }
}

impl std::error::Error for StepListError {}

/// Validated, immutable sequence of steps.
#[derive(Debug, Clone)]
pub struct StepList(Vec<StepDescriptor>);

impl StepList {
    pub fn new(steps: Vec<StepDescriptor>) -> Result<Self, StepListError> {
        if steps.is_empty() {
            return Err(StepListError::Empty);
        }
        for (i, step) in steps.iter().enumerate() {
            if steps[..i].iter().any(|earlier| earlier.id == step.id) {
                return Err(StepListError::Duplicate(step.id));
            }
            let expected = steps.get(i + 1).map(|following| following.id);
            if step.next != expected {
                return Err(StepListError::BrokenLink {
                    step: step.id,
                    expected,
                    found: step.next,
                });
            }
        }
        Ok(StepList(steps))
    }

    /// Builds a list whose `next` links follow the given order.
    pub fn chain(order: &[(StepId, Option<RewardKey>)]) -> Result<Self, StepListError> {
        let steps = order
            .iter()
            .enumerate()
            .map(|(i, &(id, reward))| StepDescriptor {
                id,
                reward,
                next: order.get(i + 1).map(|&(next, _)| next),
            })
            .collect();
        Self::new(steps)
    }

    /// The birthday adventure, start to finish.
    pub fn standard() -> Result<Self, StepListError> {
        Self::chain(&[
            (StepId::Welcome, None),
            (StepId::Opening, None),
            (StepId::CoffeeBeans, Some(RewardKey::Bean)),
            (StepId::AfterBeans, None),
            (StepId::MilkPour, Some(RewardKey::Milk)),
            (StepId::AfterMilk, None),
            (StepId::BeachArrival, None),
            (StepId::BeachDiscovery, Some(RewardKey::Shell)),
            (StepId::CrabSteal, None),
            (StepId::CrabPhotography, Some(RewardKey::Crab)),
            (StepId::AfterCrab, None),
            (StepId::BeforeBrewing, None),
            (StepId::Brewing, Some(RewardKey::Cup)),
            (StepId::Celebration, None),
        ])
    }

    pub fn first(&self) -> &StepDescriptor {
        &self.0[0]
    }

    pub fn get(&self, index: usize) -> Option<&StepDescriptor> {
        self.0.get(index)
    }

    pub fn index_of(&self, id: StepId) -> Option<usize> {
        self.0.iter().position(|step| step.id == id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepDescriptor> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn standard_list_is_valid_and_covers_every_step() {
        let steps = StepList::standard().unwrap();
        assert_eq!(steps.len(), StepId::iter().count());
        assert_eq!(steps.first().id, StepId::Welcome);
        assert_eq!(steps.iter().last().map(|s| s.next), Some(None));
    }

    #[test]
    fn standard_list_grants_each_sticker_once() {
        let steps = StepList::standard().unwrap();
        let rewards: Vec<_> = steps.iter().filter_map(|s| s.reward).collect();
        assert_eq!(rewards, RewardKey::iter().collect::<Vec<_>>());
        for step in steps.iter().filter(|s| s.reward.is_some()) {
            assert_eq!(step.id.kind(), StepKind::MiniGame);
        }
    }

    #[test]
    fn rejects_empty_list() {
        assert_eq!(StepList::new(Vec::new()).unwrap_err(), StepListError::Empty);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = StepList::chain(&[
            (StepId::CoffeeBeans, Some(RewardKey::Bean)),
            (StepId::MilkPour, None),
            (StepId::CoffeeBeans, None),
        ])
        .unwrap_err();
        assert_eq!(err, StepListError::Duplicate(StepId::CoffeeBeans));
    }

    #[test]
    fn rejects_links_that_skip_ahead() {
        let err = StepList::new(vec![
            StepDescriptor {
                id: StepId::Welcome,
                reward: None,
                next: Some(StepId::Brewing),
            },
            StepDescriptor {
                id: StepId::Opening,
                reward: None,
                next: None,
            },
        ])
        .unwrap_err();
        assert_eq!(
            err,
            StepListError::BrokenLink {
                step: StepId::Welcome,
                expected: Some(StepId::Opening),
                found: Some(StepId::Brewing),
            }
        );
        assert!(err.to_string().contains("welcome"));
    }

    #[test]
    fn rejects_dangling_last_link() {
        let err = StepList::new(vec![StepDescriptor {
            id: StepId::Celebration,
            reward: None,
            next: Some(StepId::Welcome),
        }])
        .unwrap_err();
        assert!(matches!(err, StepListError::BrokenLink { expected: None, .. }));
    }

    #[test]
    fn reward_keys_use_sticker_ids() {
        assert_eq!(RewardKey::Bean.as_str(), "sticker-bean");
        assert_eq!(RewardKey::Cup.to_string(), "sticker-cup");
        assert_eq!(RewardKey::Crab.display_name(), "Happy Crab");
        assert_eq!(StepId::CrabPhotography.to_string(), "crab-photography");
    }
}
