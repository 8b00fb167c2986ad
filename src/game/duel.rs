use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::ai::{ActionChoice, ActionPolicy};
use crate::config::MatchConfig;

use super::{
    queue::TurnQueue,
    rules::{ActionResolution, RuleError},
    state::{Combatant, CombatantId, DuelEvent, MatchOutcome, OutcomeReason, Roster},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum TurnOutcome {
    Resolved {
        resolution: ActionResolution,
        #[serde(skip_serializing_if = "Option::is_none")]
        outcome: Option<MatchOutcome>,
    },
    /// 行动者保留位置，下一步重新询问。
    Rejected {
        actor: CombatantId,
        choice: ActionChoice,
    },
}

/// 交给表现层的可序列化快照。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DuelSnapshot {
    pub combatants: Vec<Combatant>,
    pub queue: Vec<CombatantId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<CombatantId>,
    pub turn: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<MatchOutcome>,
}

/// 对局驱动：持有双方、行动队列、每方的策略以及随机策略使用的随机源。
pub struct Duel {
    roster: Roster,
    queue: TurnQueue,
    policies: [ActionPolicy; 2],
    rng: SmallRng,
    turn: u32,
    event_log: Vec<DuelEvent>,
    rejected_turn: Option<u32>,
    outcome: Option<MatchOutcome>,
}

impl Duel {
    pub fn new(config: &MatchConfig) -> Result<Self, RuleError> {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }

    pub fn with_rng(config: &MatchConfig, rng: SmallRng) -> Result<Self, RuleError> {
        config.validate()?;
        let [first, second] = &config.fighters;

        let roster = Roster::pair(
            Combatant::new(0, first.name.as_str(), first.kind),
            Combatant::new(1, second.name.as_str(), second.kind),
        )?;

        let mut queue = TurnQueue::new();
        for id in roster.ids() {
            queue.add(id);
        }

        Ok(Self {
            roster,
            queue,
            policies: [
                ActionPolicy::new(first.policy),
                ActionPolicy::new(second.policy),
            ],
            rng,
            turn: 0,
            event_log: Vec::new(),
            rejected_turn: None,
            outcome: None,
        })
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn queue(&self) -> &TurnQueue {
        &self.queue
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn events(&self) -> &[DuelEvent] {
        &self.event_log
    }

    pub fn outcome(&self) -> Option<&MatchOutcome> {
        self.outcome.as_ref()
    }

    pub fn is_over(&self) -> bool {
        self.queue.is_over(&self.roster)
    }

    pub fn next_actor(&self) -> Option<&Combatant> {
        self.queue
            .peek_next(&self.roster)
            .and_then(|id| self.roster.get(id))
    }

    pub fn policy_for(&self, id: CombatantId) -> Result<ActionPolicy, RuleError> {
        self.roster
            .index_of(id)
            .map(|index| self.policies[index])
            .ok_or(RuleError::UnknownCombatant { combatant_id: id })
    }

    pub fn snapshot(&self) -> DuelSnapshot {
        DuelSnapshot {
            combatants: self.roster.combatants().to_vec(),
            queue: self.queue.entries().to_vec(),
            next: self.queue.peek_next(&self.roster),
            turn: self.turn,
            outcome: self.outcome.clone(),
        }
    }

    /// 进行一个回合。`input` 是手动策略捕获的按键，随机策略忽略它。
    pub fn step(&mut self, input: Option<&str>) -> Result<TurnOutcome, RuleError> {
        if self.outcome.is_some() {
            return Err(RuleError::MatchFinished);
        }
        if self.is_over() {
            self.finish();
            return Err(RuleError::MatchFinished);
        }

        let actor = self
            .queue
            .peek_next(&self.roster)
            .ok_or(RuleError::MatchFinished)?;
        let policy = self.policy_for(actor)?;
        let choice = policy.select(&self.queue, &self.roster, input, &mut self.rng);

        let affordable = self
            .roster
            .get(actor)
            .zip(choice.action())
            .filter(|(combatant, action)| combatant.is_valid_action(*action))
            .map(|(_, action)| action);

        let Some(action) = affordable else {
            tracing::debug!(actor, ?choice, "action rejected");
            // 同一回合只记录第一次被拒绝的输入
            let turn = self.turn + 1;
            if self.rejected_turn != Some(turn) {
                self.rejected_turn = Some(turn);
                self.event_log.push(DuelEvent::ActionRejected {
                    turn,
                    actor,
                    requested: choice.action(),
                });
            }
            return Ok(TurnOutcome::Rejected { actor, choice });
        };

        if self.queue.remove_next(&self.roster) != Some(actor) {
            return Err(RuleError::MatchFinished);
        }
        let resolution = self.roster.perform(actor, action, &mut self.queue)?;
        self.turn += 1;
        self.event_log.push(DuelEvent::ActionResolved {
            turn: self.turn,
            actor,
            target: resolution.target,
            action,
            damage: resolution.damage,
            remaining_health: resolution.remaining_health,
        });

        let outcome = if self.is_over() {
            Some(self.finish())
        } else {
            None
        };

        Ok(TurnOutcome::Resolved { resolution, outcome })
    }

    /// 不带输入地推进到对局结束；遇到需要手动输入的回合时返回 `AwaitingInput`。
    pub fn play_out(&mut self) -> Result<MatchOutcome, RuleError> {
        loop {
            if let Some(outcome) = &self.outcome {
                return Ok(outcome.clone());
            }

            match self.step(None) {
                Ok(TurnOutcome::Resolved { .. }) => {}
                Ok(TurnOutcome::Rejected { actor, .. }) => {
                    return Err(RuleError::AwaitingInput {
                        combatant_id: actor,
                    })
                }
                Err(RuleError::MatchFinished) => {}
                Err(error) => return Err(error),
            }
        }
    }

    fn finish(&mut self) -> MatchOutcome {
        if let Some(outcome) = &self.outcome {
            return outcome.clone();
        }

        let winner = self.queue.winner(&self.roster);
        let reason = match winner.and_then(|id| self.roster.enemy_of(id)) {
            Some(loser) => OutcomeReason::KnockOut { loser: loser.id() },
            None => {
                let everyone_standing = self
                    .roster
                    .combatants()
                    .iter()
                    .all(|combatant| !combatant.is_defeated());
                let nobody_can_act = self
                    .roster
                    .combatants()
                    .iter()
                    .all(|combatant| !combatant.can_act());
                if everyone_standing && nobody_can_act {
                    OutcomeReason::Exhaustion
                } else {
                    OutcomeReason::Stalemate
                }
            }
        };

        let outcome = MatchOutcome { winner, reason };
        tracing::info!(turn = self.turn, ?outcome, "match over");
        self.event_log.push(DuelEvent::MatchEnded {
            outcome: outcome.clone(),
        });
        self.outcome = Some(outcome.clone());
        outcome
    }

    #[cfg(test)]
    pub(crate) fn roster_mut(&mut self) -> &mut Roster {
        &mut self.roster
    }
}
