//! 棋譜表記の修飾語（右・左・直・上・引・寄・打）

use crate::movegen::can_reach;
use crate::position::Position;
use crate::types::{Color, Move, Square};

/// 表記修飾語のビット集合
///
/// 横方向（右・左・直）を高々1つ、動作（上・引・寄）を高々1つ組み合わせる。
/// 打は単独で使う。
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Suffix(u8);

impl Suffix {
    pub const NONE: Suffix = Suffix(0);
    /// 右
    pub const RIGHT: Suffix = Suffix(1 << 0);
    /// 左
    pub const LEFT: Suffix = Suffix(1 << 1);
    /// 直
    pub const NEAREST: Suffix = Suffix(1 << 2);
    /// 上
    pub const UP: Suffix = Suffix(1 << 3);
    /// 引
    pub const DOWN: Suffix = Suffix(1 << 4);
    /// 寄
    pub const SIDEWAY: Suffix = Suffix(1 << 5);
    /// 打
    pub const DROP: Suffix = Suffix(1 << 6);

    /// 表示順（横方向→動作→打）
    const KANJI: [(Suffix, &'static str); 7] = [
        (Suffix::RIGHT, "右"),
        (Suffix::LEFT, "左"),
        (Suffix::NEAREST, "直"),
        (Suffix::UP, "上"),
        (Suffix::DOWN, "引"),
        (Suffix::SIDEWAY, "寄"),
        (Suffix::DROP, "打"),
    ];

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn contains(self, other: Suffix) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn union(self, other: Suffix) -> Suffix {
        Suffix(self.0 | other.0)
    }

    /// 漢字表記（"右上" 等）
    pub fn kanji(self) -> String {
        Self::KANJI
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, s)| *s)
            .collect()
    }
}

impl std::ops::BitOr for Suffix {
    type Output = Suffix;

    fn bitor(self, rhs: Suffix) -> Suffix {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for Suffix {
    fn bitor_assign(&mut self, rhs: Suffix) {
        *self = self.union(rhs);
    }
}

impl std::fmt::Debug for Suffix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_none() {
            return f.write_str("Suffix(NONE)");
        }
        write!(f, "Suffix({})", self.kanji())
    }
}

/// 移動元から見た動作（上・引・寄）
fn vertical(color: Color, from: Square, to: Square) -> Suffix {
    // 手番から見て前方への段数
    let advance = (from.rank().index() as i8 - to.rank().index() as i8) * -color.forward();
    match advance {
        d if d > 0 => Suffix::UP,
        d if d < 0 => Suffix::DOWN,
        _ => Suffix::SIDEWAY,
    }
}

/// 手番から見た左右の位置（大きいほど左）
#[inline]
fn left_key(color: Color, sq: Square) -> usize {
    match color {
        Color::Black => sq.file().index(),
        Color::White => 8 - sq.file().index(),
    }
}

/// 候補の中で `from` が最も左・最も右にあるか
fn lateral(color: Color, from: Square, among: &[Square]) -> Option<Suffix> {
    let key = left_key(color, from);
    let others = among
        .iter()
        .filter(|&&sq| sq != from)
        .map(|&sq| left_key(color, sq));
    let (mut left_of_all, mut right_of_all) = (true, true);
    for other in others {
        left_of_all &= key > other;
        right_of_all &= key < other;
    }
    match (left_of_all, right_of_all) {
        (true, false) => Some(Suffix::LEFT),
        (false, true) => Some(Suffix::RIGHT),
        _ => None,
    }
}

/// 指し手の表記修飾語を決める
///
/// `pos` は指す前の局面。同じ駒（成る手なら成る前の駒）で `to` に到達できる升を
/// 候補とし、王手放置やピンは考慮しない。
///
/// 打つ手だけは候補が1つでも修飾する。盤上の同じ駒が1枚でも `to` に行けるなら、
/// KI2 表記では「打」がないと盤上の駒を動かした手と区別できない。
/// そのため `DROP` を返す。
/// 盤上の手は候補が2つ以上のときだけ修飾する。
pub fn decide_suffix(pos: &Position, mv: &Move) -> Suffix {
    let color = mv.color();
    let piece = mv.moved_piece();
    let to = mv.to();
    let candidates: Vec<Square> = pos
        .pieces_of(color)
        .filter(|&(sq, pc)| pc == piece && can_reach(pos, sq, to))
        .map(|(sq, _)| sq)
        .collect();

    let Some(from) = mv.from() else {
        return if candidates.is_empty() {
            Suffix::NONE
        } else {
            Suffix::DROP
        };
    };
    if candidates.len() < 2 {
        return Suffix::NONE;
    }

    let dir = vertical(color, from, to);
    let same_dir: Vec<Square> = candidates
        .iter()
        .copied()
        .filter(|&sq| vertical(color, sq, to) == dir)
        .collect();
    if same_dir.len() == 1 {
        return dir;
    }

    // 真っ直ぐ上がる手は直（龍・馬を除く）
    if dir == Suffix::UP && from.file() == to.file() && !piece.is_dragon_or_horse() {
        return Suffix::NEAREST;
    }

    match lateral(color, from, &same_dir) {
        Some(side) if lateral(color, from, &candidates) == Some(side) => side,
        Some(side) => side | dir,
        None => {
            log::debug!("suffix for {mv} is ambiguous among {candidates:?}");
            dir
        }
    }
}
