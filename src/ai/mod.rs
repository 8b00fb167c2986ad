//! 行动选择策略（手动输入与随机选择）。

pub mod policy;

pub use policy::{ActionChoice, ActionPolicy, PolicyMode};
