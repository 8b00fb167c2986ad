use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    queue::TurnQueue,
    state::{ActionKind, CombatantId, CombatantKind, IntegrityError, Roster},
};

/// 动作结算后追加到行动队列的一方。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RequeueTarget {
    Actor,
    Enemy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveProfile {
    pub cost: u8,
    pub damage: u8,
    pub requeue: &'static [RequeueTarget],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindProfile {
    pub defence: u8,
    pub normal: MoveProfile,
    pub special: MoveProfile,
}

impl KindProfile {
    pub fn moves(&self, action: ActionKind) -> &MoveProfile {
        match action {
            ActionKind::Normal => &self.normal,
            ActionKind::Special => &self.special,
        }
    }

    pub fn cheapest_cost(&self) -> u8 {
        self.normal.cost.min(self.special.cost)
    }
}

const BRAWLER: KindProfile = KindProfile {
    defence: 10,
    normal: MoveProfile {
        cost: 3,
        damage: 15,
        requeue: &[RequeueTarget::Actor],
    },
    special: MoveProfile {
        cost: 10,
        damage: 20,
        requeue: &[RequeueTarget::Actor, RequeueTarget::Actor],
    },
};

const CASTER: KindProfile = KindProfile {
    defence: 8,
    normal: MoveProfile {
        cost: 5,
        damage: 20,
        requeue: &[RequeueTarget::Actor],
    },
    special: MoveProfile {
        cost: 30,
        damage: 40,
        requeue: &[RequeueTarget::Enemy, RequeueTarget::Actor],
    },
};

impl CombatantKind {
    pub fn profile(self) -> &'static KindProfile {
        match self {
            CombatantKind::Brawler => &BRAWLER,
            CombatantKind::Caster => &CASTER,
        }
    }
}

pub fn effective_damage(raw: u8, defence: u8) -> u8 {
    raw.saturating_sub(defence)
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum RuleError {
    #[error("the match is already over")]
    MatchFinished,
    #[error("combatant {combatant_id} is not part of this match")]
    UnknownCombatant { combatant_id: CombatantId },
    #[error("combatant {combatant_id} has no enemy assigned")]
    EnemyUnassigned { combatant_id: CombatantId },
    #[error("combatant id {combatant_id} is used twice")]
    DuplicateCombatant { combatant_id: CombatantId },
    #[error("combatant {combatant_id} cannot afford {action}: needs {required}, has {available}")]
    UnaffordableAction {
        combatant_id: CombatantId,
        action: ActionKind,
        required: u8,
        available: u8,
    },
    #[error("combatant {combatant_id} is waiting for manual input")]
    AwaitingInput { combatant_id: CombatantId },
    #[error("invalid match config: {reason}")]
    InvalidConfig { reason: String },
    #[error("integrity violation: {error}")]
    IntegrityViolation { error: IntegrityError },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionResolution {
    pub actor: CombatantId,
    pub target: CombatantId,
    pub action: ActionKind,
    pub cost: u8,
    pub raw_damage: u8,
    pub damage: u8,
    pub remaining_health: u8,
    pub requeued: Vec<CombatantId>,
}

impl Roster {
    /// 结算动作：扣除技能点、伤害对手、按规则重新入队；出错时状态不变。
    pub fn perform(
        &mut self,
        actor: CombatantId,
        action: ActionKind,
        queue: &mut TurnQueue,
    ) -> Result<ActionResolution, RuleError> {
        let actor_idx = self.index_of(actor).ok_or(RuleError::UnknownCombatant {
            combatant_id: actor,
        })?;
        let target = self.combatants()[actor_idx]
            .enemy()
            .ok_or(RuleError::EnemyUnassigned {
                combatant_id: actor,
            })?;
        let target_idx = self.index_of(target).ok_or(RuleError::UnknownCombatant {
            combatant_id: target,
        })?;

        let (attacker, defender) = self
            .pair_mut(actor_idx, target_idx)
            .ok_or(RuleError::IntegrityViolation {
                error: IntegrityError::AsymmetricEnemy { combatant_id: actor },
            })?;
        let moves = *attacker.kind().profile().moves(action);

        if attacker.skill_points() < moves.cost {
            return Err(RuleError::UnaffordableAction {
                combatant_id: actor,
                action,
                required: moves.cost,
                available: attacker.skill_points(),
            });
        }

        attacker.spend(moves.cost);
        let damage = effective_damage(moves.damage, defender.kind().profile().defence);
        defender.take_damage(damage);

        let requeued: Vec<CombatantId> = moves
            .requeue
            .iter()
            .map(|slot| match slot {
                RequeueTarget::Actor => actor,
                RequeueTarget::Enemy => target,
            })
            .collect();
        for id in &requeued {
            queue.add(*id);
        }

        tracing::debug!(
            actor,
            target,
            %action,
            damage,
            remaining_health = defender.health(),
            "action resolved"
        );

        Ok(ActionResolution {
            actor,
            target,
            action,
            cost: moves.cost,
            raw_damage: moves.damage,
            damage,
            remaining_health: defender.health(),
            requeued,
        })
    }

    pub fn perform_normal(
        &mut self,
        actor: CombatantId,
        queue: &mut TurnQueue,
    ) -> Result<ActionResolution, RuleError> {
        self.perform(actor, ActionKind::Normal, queue)
    }

    pub fn perform_special(
        &mut self,
        actor: CombatantId,
        queue: &mut TurnQueue,
    ) -> Result<ActionResolution, RuleError> {
        self.perform(actor, ActionKind::Special, queue)
    }
}
