//! 手番（Color）

use serde::{Deserialize, Serialize};

/// 手番（先手/後手）
///
/// 内部表現では先手が常に盤の下側（7〜9段側）に位置する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Color {
    Black = 0,
    White = 1,
}

impl Color {
    /// 手番の数
    pub const NUM: usize = 2;

    /// 両手番
    pub const ALL: [Color; 2] = [Color::Black, Color::White];

    /// 相手番を返す
    #[inline]
    pub const fn opponent(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// インデックスとして使用（配列アクセス用）
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// 前進方向の段の増分（先手は段が減る方向、後手は増える方向）
    #[inline]
    pub const fn forward(self) -> i8 {
        match self {
            Color::Black => -1,
            Color::White => 1,
        }
    }

    /// KIF表記の手番記号（▲/△）
    pub const fn kif_mark(self) -> char {
        match self {
            Color::Black => '▲',
            Color::White => '△',
        }
    }

    /// 将棋駒記号（☗/☖）
    pub const fn piece_mark(self) -> char {
        match self {
            Color::Black => '☗',
            Color::White => '☖',
        }
    }

    /// SFENの手番文字
    pub const fn to_sfen_char(self) -> char {
        match self {
            Color::Black => 'b',
            Color::White => 'w',
        }
    }
}

impl std::ops::Not for Color {
    type Output = Color;

    #[inline]
    fn not(self) -> Color {
        self.opponent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_opponent() {
        assert_eq!(Color::Black.opponent(), Color::White);
        assert_eq!(!Color::White, Color::Black);
    }

    #[test]
    fn test_color_forward() {
        // 先手は1段目方向、後手は9段目方向へ進む
        assert_eq!(Color::Black.forward(), -1);
        assert_eq!(Color::White.forward(), 1);
    }

    #[test]
    fn test_color_marks() {
        assert_eq!(Color::Black.kif_mark(), '▲');
        assert_eq!(Color::White.piece_mark(), '☖');
        assert_eq!(Color::White.to_sfen_char(), 'w');
    }
}
