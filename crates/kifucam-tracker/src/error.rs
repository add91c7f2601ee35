//! エラー型

use kifucam_core::{Color, Square};
use thiserror::Error;

/// 盤面差分から指し手を復元できなかった理由
///
/// どれも致命的ではなく、トラッカーは次のフレームを待つ。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DetectError {
    #[error("no square changed")]
    NoChange,
    #[error("{0} squares changed at once")]
    TooManyChanges(usize),
    #[error("side to move is unknown")]
    UnknownSide,
    #[error("{color:?} has nothing in hand to drop at {square}")]
    EmptyHand { color: Color, square: Square },
    #[error("no exemplar matches the piece dropped at {0}")]
    NoExemplar(Square),
    #[error("unrecognized transition between {0} and {1}")]
    UnrecognizedTransition(Square, Square),
    #[error("{moved:?} moved but {expected:?} is to move")]
    WrongSide { moved: Color, expected: Color },
    #[error("no legal move matches {0}")]
    NoLegalMove(String),
    #[error("both {0} and {1} are legal readings of the change")]
    Ambiguous(String, String),
}

/// セッション（ワーカースレッド）との通信エラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("tracker session is closed")]
    Closed,
    #[error("tracker worker panicked")]
    WorkerPanicked,
}

/// 設定値の検証エラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be at least {min} (got {value})")]
    TooSmall {
        field: &'static str,
        min: usize,
        value: usize,
    },
}
