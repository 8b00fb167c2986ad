use serde::{Deserialize, Serialize};

use super::state::{Combatant, CombatantId, Roster};

/// 行动顺序队列。同一战斗者可以同时出现多次。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TurnQueue {
    entries: Vec<CombatantId>,
}

impl TurnQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, combatant: CombatantId) {
        self.entries.push(combatant);
    }

    pub fn entries(&self) -> &[CombatantId] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn next_position(&self, roster: &Roster) -> Option<usize> {
        self.entries.iter().position(|&id| roster.can_act(id))
    }

    /// 移除最靠前且能行动的条目；无法行动的条目原地保留。
    pub fn remove_next(&mut self, roster: &Roster) -> Option<CombatantId> {
        let position = self.next_position(roster)?;
        Some(self.entries.remove(position))
    }

    pub fn peek_next(&self, roster: &Roster) -> Option<CombatantId> {
        self.next_position(roster).map(|position| self.entries[position])
    }

    /// 没有任何条目能行动（包括队列为空）时为真。
    pub fn is_empty(&self, roster: &Roster) -> bool {
        self.next_position(roster).is_none()
    }

    pub fn is_over(&self, roster: &Roster) -> bool {
        let Some(next) = self.peek_next(roster).and_then(|id| roster.get(id)) else {
            return true;
        };

        if next.is_defeated() {
            return true;
        }

        match roster.enemy_of(next.id()) {
            Some(enemy) => enemy.is_defeated() || (!next.can_act() && !enemy.can_act()),
            None => false,
        }
    }

    /// 对手生命归零而自身仍存活的一方；对局未结束或平局时为 `None`。
    pub fn winner(&self, roster: &Roster) -> Option<CombatantId> {
        if !self.is_over(roster) {
            return None;
        }

        self.entries.iter().find_map(|&id| {
            let combatant = roster.get(id)?;
            let enemy = roster.enemy_of(id)?;
            decide(combatant, enemy)
        })
    }
}

fn decide(combatant: &Combatant, enemy: &Combatant) -> Option<CombatantId> {
    match (combatant.is_defeated(), enemy.is_defeated()) {
        (false, true) => Some(combatant.id()),
        (true, false) => Some(enemy.id()),
        _ => None,
    }
}
