//! 对局配置：双方职业、策略与随机种子。

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ai::PolicyMode;
use crate::game::{CombatantKind, RuleError};

impl FromStr for CombatantKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "brawler" | "rogue" => Ok(CombatantKind::Brawler),
            "caster" | "mage" => Ok(CombatantKind::Caster),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FighterConfig {
    pub name: String,
    pub kind: CombatantKind,
    #[serde(default)]
    pub policy: PolicyMode,
}

impl FighterConfig {
    pub fn new(name: impl Into<String>, kind: CombatantKind, policy: PolicyMode) -> Self {
        Self {
            name: name.into(),
            kind,
            policy,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchConfig {
    pub fighters: [FighterConfig; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl MatchConfig {
    pub fn new(first: FighterConfig, second: FighterConfig) -> Self {
        Self {
            fighters: [first, second],
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn from_json(json: &str) -> Result<Self, RuleError> {
        let config: MatchConfig =
            serde_json::from_str(json).map_err(|error| RuleError::InvalidConfig {
                reason: error.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RuleError> {
        for (slot, fighter) in self.fighters.iter().enumerate() {
            if fighter.name.trim().is_empty() {
                return Err(RuleError::InvalidConfig {
                    reason: format!("fighter {slot} needs a name"),
                });
            }
        }
        Ok(())
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig::new(
            FighterConfig::new("Sophia", CombatantKind::Brawler, PolicyMode::Random),
            FighterConfig::new("Ashas", CombatantKind::Caster, PolicyMode::Random),
        )
    }
}
