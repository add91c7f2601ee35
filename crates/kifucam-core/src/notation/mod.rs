//! 棋譜表記
//!
//! - `Suffix` / `decide_suffix`: 同じ駒が複数あるときの修飾語（右・左・直・上・引・寄・打）
//! - `format_move`: KIF・KI2・西洋式・USIの指し手文字列

mod kif;
mod suffix;

pub use kif::{NotationStyle, format_move};
pub use suffix::{Suffix, decide_suffix};
