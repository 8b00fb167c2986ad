//! 对决核心逻辑模块（战斗者状态、行动规则、行动队列与对局驱动）。

pub mod duel;
pub mod queue;
pub mod rules;
pub mod state;

pub use duel::{Duel, DuelSnapshot, TurnOutcome};
pub use queue::TurnQueue;
pub use rules::{
    effective_damage, ActionResolution, KindProfile, MoveProfile, RequeueTarget, RuleError,
};
pub use state::{
    ActionKind,
    Combatant,
    CombatantId,
    CombatantKind,
    DuelEvent,
    IntegrityError,
    MatchOutcome,
    OutcomeReason,
    Roster,
    MAX_HEALTH,
    MAX_SKILL_POINTS,
};
