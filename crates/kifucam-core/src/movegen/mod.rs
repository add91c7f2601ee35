//! 指し手生成モジュール
//!
//! - `effect`: 駒の利き（遠方駒の遮りを含む到達判定）
//! - `generator`: 合法手生成（二歩・行き所のない駒・自殺手・打ち歩詰めを除外）

mod effect;
mod generator;

pub use effect::{attacks_from, can_reach};
pub use generator::{find_legal, generate, generate_legal};
