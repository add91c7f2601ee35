//! 盤面撮影による対局記録のための将棋ルールコア
//!
//! - `types`: 手番・升目・駒・持ち駒・指し手などの値型
//! - `position`: 盤面と持ち駒（`Position`）、SFEN入出力、Zobristキー
//! - `movegen`: 駒の利き（到達判定）と合法手生成
//! - `notation`: 棋譜表記の修飾語（上・引・寄・右・左・直・打）と指し手文字列
//! - `game`: 確定した指し手列と千日手判定
//! - `opponent`: 対局相手（外部エンジン・通信相手）の抽象

pub mod game;
pub mod movegen;
pub mod notation;
pub mod opponent;
pub mod position;
pub mod types;

pub use game::{AppliedMove, Game, GameError, MoveOutcome, OpponentTurn};
pub use notation::{NotationStyle, Suffix};
pub use opponent::{Opponent, RandomOpponent};
pub use position::Position;
pub use types::{Color, File, Hand, Move, Piece, PieceKind, Promotion, Rank, Square, SquareSet};
