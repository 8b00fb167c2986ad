use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::rules::RuleError;

/// 生命值与技能点的上限，也是开局数值。
pub const MAX_HEALTH: u8 = 100;
pub const MAX_SKILL_POINTS: u8 = 100;

/// 战斗者标识，即其在 `Roster` 中的下标。
pub type CombatantId = u8;

/// 战斗者职业。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CombatantKind {
    Brawler,
    Caster,
}

impl CombatantKind {
    pub fn label(self) -> &'static str {
        match self {
            CombatantKind::Brawler => "brawler",
            CombatantKind::Caster => "caster",
        }
    }
}

impl fmt::Display for CombatantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CombatantKind::Brawler => f.write_str("Brawler"),
            CombatantKind::Caster => f.write_str("Caster"),
        }
    }
}

/// 两种可执行的动作。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Normal,
    Special,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Normal => f.write_str("normal"),
            ActionKind::Special => f.write_str("special"),
        }
    }
}

/// 参战者的资源状态。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "CombatantRecord")]
pub struct Combatant {
    id: CombatantId,
    pub name: String,
    kind: CombatantKind,
    health: u8,
    skill_points: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    enemy: Option<CombatantId>,
}

/// 反序列化时的原始字段，校验通过后才转换为 `Combatant`。
#[derive(Deserialize)]
struct CombatantRecord {
    id: CombatantId,
    name: String,
    kind: CombatantKind,
    health: u8,
    skill_points: u8,
    #[serde(default)]
    enemy: Option<CombatantId>,
}

impl TryFrom<CombatantRecord> for Combatant {
    type Error = RuleError;

    fn try_from(record: CombatantRecord) -> Result<Self, Self::Error> {
        let combatant = Combatant {
            id: record.id,
            name: record.name.trim().to_owned(),
            kind: record.kind,
            health: record.health,
            skill_points: record.skill_points,
            enemy: record.enemy,
        };
        combatant
            .integrity_check()
            .map_err(|error| RuleError::IntegrityViolation { error })?;
        Ok(combatant)
    }
}

impl Combatant {
    pub fn new(id: CombatantId, name: impl Into<String>, kind: CombatantKind) -> Self {
        let name: String = name.into();
        Self {
            id,
            name: name.trim().to_owned(),
            kind,
            health: MAX_HEALTH,
            skill_points: MAX_SKILL_POINTS,
            enemy: None,
        }
    }

    pub fn brawler(id: CombatantId, name: impl Into<String>) -> Self {
        Self::new(id, name, CombatantKind::Brawler)
    }

    pub fn caster(id: CombatantId, name: impl Into<String>) -> Self {
        Self::new(id, name, CombatantKind::Caster)
    }

    pub fn id(&self) -> CombatantId {
        self.id
    }

    pub fn kind(&self) -> CombatantKind {
        self.kind
    }

    pub fn health(&self) -> u8 {
        self.health
    }

    pub fn skill_points(&self) -> u8 {
        self.skill_points
    }

    pub fn enemy(&self) -> Option<CombatantId> {
        self.enemy
    }

    pub fn is_defeated(&self) -> bool {
        self.health == 0
    }

    /// 当前付得起的动作，特殊攻击在前。
    pub fn affordable_actions(&self) -> Vec<ActionKind> {
        let profile = self.kind.profile();
        let mut actions = Vec::with_capacity(2);
        if self.skill_points >= profile.special.cost {
            actions.push(ActionKind::Special);
        }
        if self.skill_points >= profile.normal.cost {
            actions.push(ActionKind::Normal);
        }
        actions
    }

    pub fn can_act(&self) -> bool {
        self.skill_points >= self.kind.profile().cheapest_cost()
    }

    pub fn is_valid_action(&self, action: ActionKind) -> bool {
        self.skill_points >= self.kind.profile().moves(action).cost
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        if self.health > MAX_HEALTH {
            return Err(IntegrityError::HealthOutOfRange {
                combatant_id: self.id,
                value: self.health,
            });
        }
        if self.skill_points > MAX_SKILL_POINTS {
            return Err(IntegrityError::SkillPointsOutOfRange {
                combatant_id: self.id,
                value: self.skill_points,
            });
        }
        if self.enemy == Some(self.id) {
            return Err(IntegrityError::AsymmetricEnemy {
                combatant_id: self.id,
            });
        }
        Ok(())
    }

    pub(crate) fn spend(&mut self, cost: u8) {
        self.skill_points = self.skill_points.saturating_sub(cost);
    }

    pub(crate) fn take_damage(&mut self, amount: u8) {
        self.health = self.health.saturating_sub(amount);
    }

    #[cfg(test)]
    pub(crate) fn set_resources(&mut self, health: u8, skill_points: u8) {
        self.health = health.min(MAX_HEALTH);
        self.skill_points = skill_points.min(MAX_SKILL_POINTS);
    }
}

impl fmt::Display for Combatant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {}/{}",
            self.name, self.kind, self.health, self.skill_points
        )
    }
}

/// 状态完整性错误。
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum IntegrityError {
    #[error("combatant {combatant_id} has health {value}")]
    HealthOutOfRange { combatant_id: CombatantId, value: u8 },
    #[error("combatant {combatant_id} has {value} skill points")]
    SkillPointsOutOfRange { combatant_id: CombatantId, value: u8 },
    #[error("a roster holds exactly two combatants, found {count}")]
    RosterSize { count: usize },
    #[error("combatant id {combatant_id} is used twice")]
    DuplicateCombatant { combatant_id: CombatantId },
    #[error("combatant {combatant_id} is not linked to the other side")]
    AsymmetricEnemy { combatant_id: CombatantId },
}

/// 一场对决的双方，独占两个战斗者。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "RosterRecord")]
pub struct Roster {
    combatants: Vec<Combatant>,
}

#[derive(Deserialize)]
struct RosterRecord {
    combatants: Vec<Combatant>,
}

impl TryFrom<RosterRecord> for Roster {
    type Error = RuleError;

    fn try_from(record: RosterRecord) -> Result<Self, Self::Error> {
        let roster = Roster {
            combatants: record.combatants,
        };
        roster
            .integrity_check()
            .map_err(|error| RuleError::IntegrityViolation { error })?;
        Ok(roster)
    }
}

impl Roster {
    /// 先接管双方，再互相设为对手。
    pub fn pair(first: Combatant, second: Combatant) -> Result<Self, RuleError> {
        if first.id == second.id {
            return Err(RuleError::DuplicateCombatant {
                combatant_id: first.id,
            });
        }

        let mut roster = Self {
            combatants: vec![first, second],
        };
        roster.link_enemies();
        Ok(roster)
    }

    fn link_enemies(&mut self) {
        let first = self.combatants[0].id;
        let second = self.combatants[1].id;
        self.combatants[0].enemy = Some(second);
        self.combatants[1].enemy = Some(first);
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        let [first, second] = self.combatants.as_slice() else {
            return Err(IntegrityError::RosterSize {
                count: self.combatants.len(),
            });
        };
        first.integrity_check()?;
        second.integrity_check()?;
        if first.id == second.id {
            return Err(IntegrityError::DuplicateCombatant {
                combatant_id: first.id,
            });
        }
        if first.enemy != Some(second.id) {
            return Err(IntegrityError::AsymmetricEnemy {
                combatant_id: first.id,
            });
        }
        if second.enemy != Some(first.id) {
            return Err(IntegrityError::AsymmetricEnemy {
                combatant_id: second.id,
            });
        }
        Ok(())
    }

    pub fn combatants(&self) -> &[Combatant] {
        &self.combatants
    }

    pub fn ids(&self) -> impl Iterator<Item = CombatantId> + '_ {
        self.combatants.iter().map(|combatant| combatant.id)
    }

    pub fn get(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.iter().find(|combatant| combatant.id == id)
    }

    #[cfg(test)]
    pub(crate) fn get_mut(&mut self, id: CombatantId) -> Option<&mut Combatant> {
        self.combatants
            .iter_mut()
            .find(|combatant| combatant.id == id)
    }

    pub fn enemy_of(&self, id: CombatantId) -> Option<&Combatant> {
        self.get(id)
            .and_then(|combatant| combatant.enemy)
            .and_then(|enemy| self.get(enemy))
    }

    pub fn can_act(&self, id: CombatantId) -> bool {
        self.get(id).map(Combatant::can_act).unwrap_or(false)
    }

    pub(crate) fn index_of(&self, id: CombatantId) -> Option<usize> {
        self.combatants
            .iter()
            .position(|combatant| combatant.id == id)
    }

    /// 同时可变借用行动者与目标；两者下标相同或越界时返回 `None`。
    pub(crate) fn pair_mut(
        &mut self,
        actor: usize,
        target: usize,
    ) -> Option<(&mut Combatant, &mut Combatant)> {
        if actor == target || actor.max(target) >= self.combatants.len() {
            return None;
        }
        if actor < target {
            let (left, right) = self.combatants.split_at_mut(target);
            Some((&mut left[actor], &mut right[0]))
        } else {
            let (left, right) = self.combatants.split_at_mut(actor);
            Some((&mut right[0], &mut left[target]))
        }
    }
}

/// 对局结束原因。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum OutcomeReason {
    KnockOut { loser: CombatantId },
    Exhaustion,
    Stalemate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<CombatantId>,
    pub reason: OutcomeReason,
}

impl MatchOutcome {
    pub fn is_draw(&self) -> bool {
        self.winner.is_none()
    }
}

/// 对局事件流。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum DuelEvent {
    ActionResolved {
        turn: u32,
        actor: CombatantId,
        target: CombatantId,
        action: ActionKind,
        damage: u8,
        remaining_health: u8,
    },
    ActionRejected {
        turn: u32,
        actor: CombatantId,
        #[serde(skip_serializing_if = "Option::is_none")]
        requested: Option<ActionKind>,
    },
    MatchEnded {
        outcome: MatchOutcome,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_combatant_starts_full_and_unlinked() {
        let sophia = Combatant::brawler(0, "  Sophia ");
        assert_eq!(sophia.name, "Sophia");
        assert_eq!(sophia.health(), 100);
        assert_eq!(sophia.skill_points(), 100);
        assert_eq!(sophia.enemy(), None);
        assert_eq!(sophia.to_string(), "Sophia (Brawler): 100/100");
    }

    #[test]
    fn pairing_links_enemies_symmetrically() {
        let roster = Roster::pair(Combatant::brawler(0, "a"), Combatant::caster(1, "b"))
            .expect("distinct ids should pair");

        assert_eq!(roster.get(0).and_then(Combatant::enemy), Some(1));
        assert_eq!(roster.get(1).and_then(Combatant::enemy), Some(0));
        assert_eq!(roster.enemy_of(0).map(Combatant::id), Some(1));
        assert_eq!(roster.enemy_of(1).map(Combatant::id), Some(0));
    }

    #[test]
    fn pairing_rejects_duplicate_ids() {
        let result = Roster::pair(Combatant::brawler(3, "a"), Combatant::caster(3, "b"));
        assert_eq!(
            result,
            Err(RuleError::DuplicateCombatant { combatant_id: 3 })
        );
    }

    #[test]
    fn affordable_actions_list_special_before_normal() {
        let mut brawler = Combatant::brawler(0, "a");
        assert_eq!(
            brawler.affordable_actions(),
            vec![ActionKind::Special, ActionKind::Normal]
        );

        brawler.set_resources(100, 9);
        assert_eq!(brawler.affordable_actions(), vec![ActionKind::Normal]);
        assert!(brawler.is_valid_action(ActionKind::Normal));
        assert!(!brawler.is_valid_action(ActionKind::Special));

        brawler.set_resources(100, 2);
        assert!(brawler.affordable_actions().is_empty());
        assert!(!brawler.can_act());
    }

    #[test]
    fn caster_thresholds_follow_its_costs() {
        let mut caster = Combatant::caster(0, "m");
        caster.set_resources(100, 29);
        assert_eq!(caster.affordable_actions(), vec![ActionKind::Normal]);
        caster.set_resources(100, 30);
        assert_eq!(
            caster.affordable_actions(),
            vec![ActionKind::Special, ActionKind::Normal]
        );
        caster.set_resources(100, 4);
        assert!(caster.affordable_actions().is_empty());
    }

    fn roster_json(first: &str, second: &str) -> String {
        format!(r#"{{"combatants":[{first},{second}]}}"#)
    }

    #[test]
    fn deserializing_keeps_a_valid_roster() {
        let roster = Roster::pair(Combatant::brawler(0, "a"), Combatant::caster(1, "b"))
            .expect("roster should pair");
        let json = serde_json::to_string(&roster).expect("roster should serialize");
        let parsed: Roster = serde_json::from_str(&json).expect("roster should parse");
        assert_eq!(parsed, roster);
    }

    #[test]
    fn deserializing_rejects_out_of_range_resources() {
        let json = roster_json(
            r#"{"id":0,"name":"a","kind":"brawler","health":255,"skill_points":255,"enemy":1}"#,
            r#"{"id":1,"name":"b","kind":"caster","health":100,"skill_points":100,"enemy":0}"#,
        );
        let error = serde_json::from_str::<Roster>(&json).expect_err("health 255 is out of range");
        assert!(error.to_string().contains("health 255"));
    }

    #[test]
    fn deserializing_rejects_self_and_one_sided_enemies() {
        let self_linked = roster_json(
            r#"{"id":0,"name":"a","kind":"brawler","health":100,"skill_points":100,"enemy":0}"#,
            r#"{"id":1,"name":"b","kind":"caster","health":100,"skill_points":100,"enemy":0}"#,
        );
        assert!(serde_json::from_str::<Roster>(&self_linked).is_err());

        let one_sided = roster_json(
            r#"{"id":0,"name":"a","kind":"brawler","health":100,"skill_points":100,"enemy":1}"#,
            r#"{"id":1,"name":"b","kind":"caster","health":100,"skill_points":100}"#,
        );
        assert!(serde_json::from_str::<Roster>(&one_sided).is_err());

        let lone = r#"{"combatants":[{"id":0,"name":"a","kind":"brawler","health":100,"skill_points":100}]}"#;
        assert!(serde_json::from_str::<Roster>(lone).is_err());
    }

    #[test]
    fn combatant_integrity_flags_self_enemy() {
        let json = r#"{"id":2,"name":"a","kind":"caster","health":10,"skill_points":10,"enemy":2}"#;
        let error = serde_json::from_str::<Combatant>(json).expect_err("self enemy is invalid");
        assert!(error.to_string().contains("combatant 2"));
    }

    #[test]
    fn pair_mut_refuses_aliasing_indices() {
        let mut roster = Roster::pair(Combatant::brawler(0, "a"), Combatant::caster(1, "b"))
            .expect("roster should pair");
        assert!(roster.pair_mut(0, 0).is_none());
        assert!(roster.pair_mut(0, 2).is_none());
        assert!(roster.pair_mut(1, 0).is_some());
    }

    #[test]
    fn outcome_serializes_with_type_tag() {
        let outcome = MatchOutcome {
            winner: Some(1),
            reason: OutcomeReason::KnockOut { loser: 0 },
        };
        let json = serde_json::to_string(&outcome).expect("outcome should serialize");
        assert_eq!(json, r#"{"winner":1,"reason":{"type":"KnockOut","loser":0}}"#);
    }
}
