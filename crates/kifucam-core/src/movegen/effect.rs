//! 駒の利き（到達判定）
//!
//! 駒種ごとのステップ表（先手視点）を引き、遠方駒は途中の駒で止める。
//! 王手判定・合法手生成・表記の修飾語判定がこの利きを共有する。

use crate::position::Position;
use crate::types::{Color, Piece, Square, SquareSet};

/// 1方向の動き（先手視点、段は前方が負）
#[derive(Clone, Copy)]
struct Step {
    df: i8,
    dr: i8,
    slide: bool,
}

const fn step(df: i8, dr: i8) -> Step {
    Step {
        df,
        dr,
        slide: false,
    }
}

const fn ray(df: i8, dr: i8) -> Step {
    Step {
        df,
        dr,
        slide: true,
    }
}

const KING: &[Step] = &[
    step(-1, -1),
    step(0, -1),
    step(1, -1),
    step(-1, 0),
    step(1, 0),
    step(-1, 1),
    step(0, 1),
    step(1, 1),
];
const GOLD: &[Step] = &[
    step(-1, -1),
    step(0, -1),
    step(1, -1),
    step(-1, 0),
    step(1, 0),
    step(0, 1),
];
const SILVER: &[Step] = &[step(-1, -1), step(0, -1), step(1, -1), step(-1, 1), step(1, 1)];
const KNIGHT: &[Step] = &[step(-1, -2), step(1, -2)];
const LANCE: &[Step] = &[ray(0, -1)];
const PAWN: &[Step] = &[step(0, -1)];
const BISHOP: &[Step] = &[ray(-1, -1), ray(1, -1), ray(-1, 1), ray(1, 1)];
const ROOK: &[Step] = &[ray(0, -1), ray(-1, 0), ray(1, 0), ray(0, 1)];
const HORSE: &[Step] = &[
    ray(-1, -1),
    ray(1, -1),
    ray(-1, 1),
    ray(1, 1),
    step(0, -1),
    step(-1, 0),
    step(1, 0),
    step(0, 1),
];
const DRAGON: &[Step] = &[
    ray(0, -1),
    ray(-1, 0),
    ray(1, 0),
    ray(0, 1),
    step(-1, -1),
    step(1, -1),
    step(-1, 1),
    step(1, 1),
];
const NONE: &[Step] = &[];

/// `Piece::type_index()` で引くステップ表（成玉・成金は欠番）
const STEPS: [&[Step]; Piece::TYPE_NUM] = [
    KING, ROOK, BISHOP, GOLD, SILVER, KNIGHT, LANCE, PAWN, // 生駒
    NONE, DRAGON, HORSE, NONE, GOLD, GOLD, GOLD, GOLD, // 成駒
];

/// `from` にある `piece` の利き（自駒・敵駒を問わず最初に当たる升まで含む）
pub fn attacks_from(pos: &Position, piece: Piece, from: Square) -> SquareSet {
    let sign = match piece.color() {
        Color::Black => 1,
        Color::White => -1,
    };
    let mut set = SquareSet::EMPTY;
    for st in STEPS[piece.type_index()] {
        let (df, dr) = (st.df * sign, st.dr * sign);
        let mut cur = from;
        while let Some(next) = cur.offset(df, dr) {
            set.insert(next);
            if !st.slide || !pos.is_empty(next) {
                break;
            }
            cur = next;
        }
    }
    set
}

/// `from` の駒が `to` に到達できるか（移動先の駒の色・王手放置は問わない）
#[inline]
pub fn can_reach(pos: &Position, from: Square, to: Square) -> bool {
    pos.piece_on(from)
        .is_some_and(|pc| attacks_from(pos, pc, from).contains(to))
}
