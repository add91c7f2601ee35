//! 対局（確定した指し手列と千日手判定）

use thiserror::Error;

use crate::movegen::{find_legal, generate};
use crate::notation::{NotationStyle, decide_suffix, format_move};
use crate::opponent::Opponent;
use crate::position::Position;
use crate::types::json::BoardStateJson;
use crate::types::{Color, Move};

/// 同一局面がこの回数現れたら千日手
const REPETITION_COUNT: usize = 4;

/// 指し手を適用できなかった理由
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("not {got:?}'s turn (expected {expected:?})")]
    WrongSide { expected: Color, got: Color },
    #[error("illegal move: {0}")]
    IllegalMove(String),
}

/// 指し手を適用した結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Ok,
    /// 千日手（引き分け）
    Repetition,
    /// 連続王手の千日手（王手をかけ続けた側の負け）
    CheckRepetition { loser: Color },
}

/// 対局相手の手番の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpponentTurn {
    Moved { mv: Move, outcome: MoveOutcome },
    Resigned,
}

/// 確定した指し手
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedMove {
    /// 取った駒・修飾語を埋めた指し手
    pub mv: Move,
    /// 相手玉に王手をかけたか
    pub gives_check: bool,
}

/// 対局
///
/// 局面は `apply` でのみ進む。手番は最初の指し手で決まる（先手・後手のどちらから始めてもよい）。
#[derive(Debug, Clone)]
pub struct Game {
    position: Position,
    moves: Vec<AppliedMove>,
    /// 各手数での局面キー（0手目は最初の指し手の時点で確定する）
    keys: Vec<u64>,
    first_mover: Option<Color>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// 平手初期局面から始める
    pub fn new() -> Self {
        Self::from_position(Position::hirate(), None)
    }

    /// 任意の局面から始める。`side_to_move` がNoneなら最初の指し手の手番は問わない。
    pub fn from_position(position: Position, side_to_move: Option<Color>) -> Self {
        let keys = side_to_move
            .map(|c| vec![position.key(c)])
            .unwrap_or_default();
        Game {
            position,
            moves: Vec::new(),
            keys,
            first_mover: side_to_move,
        }
    }

    #[inline]
    pub fn position(&self) -> &Position {
        &self.position
    }

    #[inline]
    pub fn moves(&self) -> &[AppliedMove] {
        &self.moves
    }

    #[inline]
    pub fn last_move(&self) -> Option<&AppliedMove> {
        self.moves.last()
    }

    /// 指した手数
    #[inline]
    pub fn ply(&self) -> usize {
        self.moves.len()
    }

    /// 次の手番（まだ誰も指しておらず開始時の手番も未指定ならNone）
    pub fn side_to_move(&self) -> Option<Color> {
        match self.moves.last() {
            Some(last) => Some(last.mv.color().opponent()),
            None => self.first_mover,
        }
    }

    /// `color` の合法手（手番は問わない）
    pub fn legal_moves(&self, color: Color) -> Vec<Move> {
        generate(&self.position, color)
    }

    /// 指し手を検証して適用する
    ///
    /// 取った駒と修飾語は局面から埋め直す。非合法なら局面は変わらない。
    pub fn apply(&mut self, mv: &Move) -> Result<MoveOutcome, GameError> {
        let color = mv.color();
        if let Some(expected) = self.side_to_move()
            && expected != color
        {
            return Err(GameError::WrongSide {
                expected,
                got: color,
            });
        }
        let legal = find_legal(&self.position, mv)
            .ok_or_else(|| GameError::IllegalMove(mv.to_usi()))?;
        let mv = legal.with_suffix(decide_suffix(&self.position, &legal));

        if self.keys.is_empty() {
            self.keys.push(self.position.key(color));
        }
        self.position.apply(&mv);
        let gives_check = self.position.is_in_check(color.opponent());
        self.moves.push(AppliedMove { mv, gives_check });
        self.keys.push(self.position.key(color.opponent()));
        log::debug!("ply {}: {}", self.moves.len(), mv);

        Ok(self.repetition())
    }

    /// 最新局面の千日手判定
    fn repetition(&self) -> MoveOutcome {
        let Some(&current) = self.keys.last() else {
            return MoveOutcome::Ok;
        };
        let count = self.keys.iter().filter(|&&k| k == current).count();
        if count < REPETITION_COUNT {
            return MoveOutcome::Ok;
        }
        let Some(first) = self.keys.iter().position(|&k| k == current) else {
            return MoveOutcome::Ok;
        };
        // keys[i] はi手目の後の局面なので、first以降の指し手が同一局面の間の手
        let span = &self.moves[first..];
        for color in Color::ALL {
            let mut by_color = span.iter().filter(|m| m.mv.color() == color).peekable();
            if by_color.peek().is_some() && by_color.all(|m| m.gives_check) {
                return MoveOutcome::CheckRepetition { loser: color };
            }
        }
        MoveOutcome::Repetition
    }

    /// 対局相手に1手指させる
    ///
    /// 相手がNoneを返したら投了。非合法手はエラーにして局面は進めない。
    pub fn play_opponent(
        &mut self,
        opponent: &mut dyn Opponent,
        color: Color,
    ) -> Result<OpponentTurn, GameError> {
        let history: Vec<Move> = self.moves.iter().map(|m| m.mv).collect();
        let Some(mv) = opponent.next_move(&self.position, &history, color) else {
            log::info!("{color:?} resigned at ply {}", self.ply());
            return Ok(OpponentTurn::Resigned);
        };
        if mv.color() != color {
            return Err(GameError::WrongSide {
                expected: color,
                got: mv.color(),
            });
        }
        let outcome = self.apply(&mv)?;
        let mv = self.moves.last().map_or(mv, |m| m.mv);
        Ok(OpponentTurn::Moved { mv, outcome })
    }

    /// `index` 手目（0始まり）の表記
    pub fn notation(&self, index: usize, style: NotationStyle) -> Option<String> {
        let applied = self.moves.get(index)?;
        let prev_to = index
            .checked_sub(1)
            .and_then(|i| self.moves.get(i))
            .map(|m| m.mv.to());
        Some(format_move(&applied.mv, prev_to, style))
    }

    /// 全指し手の表記
    pub fn notations(&self, style: NotationStyle) -> Vec<String> {
        (0..self.moves.len())
            .filter_map(|i| self.notation(i, style))
            .collect()
    }

    /// 表示用の盤面
    pub fn to_json(&self) -> BoardStateJson {
        let ply = i32::try_from(self.ply()).ok();
        BoardStateJson::from_position(&self.position, self.side_to_move(), ply)
    }
}
