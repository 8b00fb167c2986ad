pub mod ai;
pub mod config;
pub mod game;

use serde::Serialize;
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

pub use ai::{ActionChoice, ActionPolicy, PolicyMode};
pub use config::{FighterConfig, MatchConfig};
pub use game::{
    ActionKind, ActionResolution, Combatant, CombatantId, CombatantKind, Duel, DuelEvent,
    DuelSnapshot, IntegrityError, MatchOutcome, OutcomeReason, Roster, RuleError, TurnOutcome,
    TurnQueue,
};

#[cfg(all(feature = "wee_alloc", target_arch = "wasm32"))]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    set_panic_hook();
}

fn to_js_error(error: RuleError) -> JsValue {
    to_value(&error).unwrap_or_else(|_| JsValue::from_str(&error.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(serde_to_js_error)
}

fn config_from(config_json: Option<String>) -> Result<MatchConfig, JsValue> {
    match config_json {
        Some(json) => MatchConfig::from_json(&json).map_err(to_js_error),
        None => Ok(MatchConfig::default()),
    }
}

#[wasm_bindgen]
pub struct DuelEngine {
    duel: Duel,
}

#[wasm_bindgen]
impl DuelEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<DuelEngine, JsValue> {
        let config = config_from(config_json)?;
        let duel = Duel::new(&config).map_err(to_js_error)?;
        Ok(DuelEngine { duel })
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        to_json(&self.duel.snapshot())
    }

    pub fn events_json(&self) -> Result<String, JsValue> {
        to_json(&self.duel.events())
    }

    /// 手动策略行动时，`key` 为捕获的按键（`"A"` 或 `"S"`）。
    pub fn step(&mut self, key: Option<String>) -> Result<String, JsValue> {
        let outcome = self.duel.step(key.as_deref()).map_err(to_js_error)?;
        to_json(&outcome)
    }

    pub fn play_out(&mut self) -> Result<String, JsValue> {
        let outcome = self.duel.play_out().map_err(to_js_error)?;
        to_json(&outcome)
    }

    pub fn is_over(&self) -> bool {
        self.duel.is_over()
    }

    pub fn next_is_manual(&self) -> bool {
        self.duel
            .next_actor()
            .and_then(|actor| self.duel.policy_for(actor.id()).ok())
            .map(|policy| policy.is_manual())
            .unwrap_or(false)
    }

    pub fn outcome_json(&self) -> Result<String, JsValue> {
        to_json(&self.duel.outcome())
    }
}

/// 根据配置创建一场对局，返回其初始快照。
#[wasm_bindgen(js_name = "createDuel")]
pub fn create_duel(config_json: Option<String>) -> Result<JsValue, JsValue> {
    let config = config_from(config_json)?;
    let duel = Duel::new(&config).map_err(to_js_error)?;
    to_value(&duel.snapshot()).map_err(JsValue::from)
}

/// 默认对局配置：随机策略的格斗家对阵施法者。
#[wasm_bindgen(js_name = "defaultConfig")]
pub fn default_config() -> Result<JsValue, JsValue> {
    to_value(&MatchConfig::default()).map_err(JsValue::from)
}

#[cfg(feature = "console_error_panic_hook")]
fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
fn set_panic_hook() {}
