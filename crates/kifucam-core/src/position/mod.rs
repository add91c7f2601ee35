//! 局面表現モジュール
//!
//! - `Position`: 盤面（9x9）と両者の持ち駒
//! - `apply`: 指し手の適用（盤面・持ち駒を更新する唯一の経路）
//! - `is_in_check`: 王手判定（手番を問わない純粋な利き判定）
//! - SFEN形式の解析・出力
//! - Zobristキー（千日手判定用）

mod pos;
mod sfen;
mod zobrist;

pub use pos::Position;
pub use sfen::{SfenError, SfenPosition, SFEN_HIRATE, parse_sfen};
