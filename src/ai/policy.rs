use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::game::{ActionKind, Roster, TurnQueue};

/// 策略的选择结果；找不到可用动作时为 `Invalid`。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActionChoice {
    Normal,
    Special,
    Invalid,
}

impl ActionChoice {
    /// 按键映射：`A` 为普通攻击，`S` 为特殊攻击。
    pub fn from_key(key: &str) -> Self {
        match key {
            "A" => ActionChoice::Normal,
            "S" => ActionChoice::Special,
            _ => ActionChoice::Invalid,
        }
    }

    pub fn action(self) -> Option<ActionKind> {
        match self {
            ActionChoice::Normal => Some(ActionKind::Normal),
            ActionChoice::Special => Some(ActionKind::Special),
            ActionChoice::Invalid => None,
        }
    }
}

impl From<ActionKind> for ActionChoice {
    fn from(action: ActionKind) -> Self {
        match action {
            ActionKind::Normal => ActionChoice::Normal,
            ActionKind::Special => ActionChoice::Special,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PolicyMode {
    Manual,
    #[default]
    Random,
}

impl FromStr for PolicyMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "manual" | "human" => Ok(PolicyMode::Manual),
            "random" | "ai" => Ok(PolicyMode::Random),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionPolicy {
    mode: PolicyMode,
}

impl ActionPolicy {
    pub fn new(mode: PolicyMode) -> Self {
        Self { mode }
    }

    pub fn manual() -> Self {
        Self::new(PolicyMode::Manual)
    }

    pub fn random() -> Self {
        Self::new(PolicyMode::Random)
    }

    pub fn mode(&self) -> PolicyMode {
        self.mode
    }

    pub fn is_manual(&self) -> bool {
        self.mode == PolicyMode::Manual
    }

    /// 为队列中下一个能行动的战斗者选择动作。手动模式只读 `input`，随机模式只用 `rng`。
    pub fn select<R: Rng + ?Sized>(
        &self,
        queue: &TurnQueue,
        roster: &Roster,
        input: Option<&str>,
        rng: &mut R,
    ) -> ActionChoice {
        match self.mode {
            PolicyMode::Manual => input.map_or(ActionChoice::Invalid, ActionChoice::from_key),
            PolicyMode::Random => {
                let Some(combatant) = queue.peek_next(roster).and_then(|id| roster.get(id))
                else {
                    tracing::warn!("random policy found nobody able to act");
                    return ActionChoice::Invalid;
                };
                combatant
                    .affordable_actions()
                    .choose(rng)
                    .copied()
                    .map_or(ActionChoice::Invalid, ActionChoice::from)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Combatant;
    use rand::rngs::mock::StepRng;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn setup() -> (Roster, TurnQueue) {
        let roster = Roster::pair(Combatant::caster(0, "Ashas"), Combatant::brawler(1, "Sophia"))
            .expect("roster should pair");
        let mut queue = TurnQueue::new();
        queue.add(0);
        queue.add(1);
        (roster, queue)
    }

    #[test]
    fn manual_passes_known_keys_through() {
        let (roster, queue) = setup();
        let policy = ActionPolicy::manual();
        let mut rng = StepRng::new(0, 1);

        assert_eq!(
            policy.select(&queue, &roster, Some("A"), &mut rng),
            ActionChoice::Normal
        );
        assert_eq!(
            policy.select(&queue, &roster, Some("S"), &mut rng),
            ActionChoice::Special
        );
        assert_eq!(
            policy.select(&queue, &roster, Some("a"), &mut rng),
            ActionChoice::Invalid
        );
        assert_eq!(
            policy.select(&queue, &roster, None, &mut rng),
            ActionChoice::Invalid
        );
    }

    #[test]
    fn manual_ignores_affordability() {
        let (mut roster, queue) = setup();
        if let Some(caster) = roster.get_mut(0) {
            caster.set_resources(100, 0);
        }
        let mut rng = StepRng::new(0, 1);
        assert_eq!(
            ActionPolicy::manual().select(&queue, &roster, Some("S"), &mut rng),
            ActionChoice::Special
        );
    }

    #[test]
    fn random_on_empty_queue_is_invalid() {
        let (roster, _) = setup();
        let queue = TurnQueue::new();
        let mut rng = StepRng::new(0, 1);
        assert_eq!(
            ActionPolicy::random().select(&queue, &roster, None, &mut rng),
            ActionChoice::Invalid
        );
    }

    #[test]
    fn random_only_offers_what_is_affordable() {
        let (mut roster, queue) = setup();
        if let Some(caster) = roster.get_mut(0) {
            caster.set_resources(100, 29);
        }
        let policy = ActionPolicy::random();
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..32 {
            assert_eq!(
                policy.select(&queue, &roster, Some("S"), &mut rng),
                ActionChoice::Normal
            );
        }
    }

    #[test]
    fn random_looks_at_the_peeked_combatant() {
        let (mut roster, queue) = setup();
        if let Some(caster) = roster.get_mut(0) {
            caster.set_resources(100, 0);
        }
        // 施法者被跳过，按格斗家的门槛选择
        if let Some(brawler) = roster.get_mut(1) {
            brawler.set_resources(100, 9);
        }
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(
            ActionPolicy::random().select(&queue, &roster, None, &mut rng),
            ActionChoice::Normal
        );
    }

    #[test]
    fn random_is_reproducible_and_covers_both_actions() {
        let (roster, queue) = setup();
        let policy = ActionPolicy::random();

        let picks = |seed: u64| -> Vec<ActionChoice> {
            let mut rng = SmallRng::seed_from_u64(seed);
            (0..64)
                .map(|_| policy.select(&queue, &roster, None, &mut rng))
                .collect()
        };

        let first = picks(42);
        assert_eq!(first, picks(42));

        let seen: HashSet<_> = first.iter().map(|choice| format!("{choice:?}")).collect();
        assert!(seen.contains("Normal"));
        assert!(seen.contains("Special"));
        assert!(!seen.contains("Invalid"));
    }

    #[test]
    fn policy_mode_parses_aliases() {
        assert_eq!("Human".parse::<PolicyMode>(), Ok(PolicyMode::Manual));
        assert_eq!("random".parse::<PolicyMode>(), Ok(PolicyMode::Random));
        assert_eq!("AI".parse::<PolicyMode>(), Ok(PolicyMode::Random));
        assert!("coinflip".parse::<PolicyMode>().is_err());
    }
}
