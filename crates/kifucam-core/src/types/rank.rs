//! 段（Rank）

use super::Color;

/// 段（1段〜9段）
///
/// 0が1段目。盤面画像では上端（後手の陣地側）に写る。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Rank {
    Rank1 = 0,
    Rank2 = 1,
    Rank3 = 2,
    Rank4 = 3,
    Rank5 = 4,
    Rank6 = 5,
    Rank7 = 6,
    Rank8 = 7,
    Rank9 = 8,
}

/// 段ごとの表記（USI文字, 漢数字）
const LABELS: [(char, char); Rank::NUM] = [
    ('a', '一'),
    ('b', '二'),
    ('c', '三'),
    ('d', '四'),
    ('e', '五'),
    ('f', '六'),
    ('g', '七'),
    ('h', '八'),
    ('i', '九'),
];

/// 敵陣の段数
const PROMOTION_RANKS: usize = 3;

impl Rank {
    pub const NUM: usize = 9;

    pub const ALL: [Rank; Rank::NUM] = [
        Rank::Rank1,
        Rank::Rank2,
        Rank::Rank3,
        Rank::Rank4,
        Rank::Rank5,
        Rank::Rank6,
        Rank::Rank7,
        Rank::Rank8,
        Rank::Rank9,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn from_u8(n: u8) -> Option<Rank> {
        match n {
            0..=8 => Some(Rank::ALL[n as usize]),
            _ => None,
        }
    }

    /// 盤を180度回したときの段
    #[inline]
    pub const fn flip(self) -> Rank {
        Rank::ALL[Rank::NUM - 1 - self.index()]
    }

    /// `color` の側から数えた段
    #[inline]
    pub const fn relative(self, color: Color) -> Rank {
        match color {
            Color::Black => self,
            Color::White => self.flip(),
        }
    }

    /// `color` にとって敵陣（成れる段）か
    #[inline]
    pub const fn can_promote(self, color: Color) -> bool {
        self.relative(color).index() < PROMOTION_RANKS
    }

    #[inline]
    pub const fn to_usi_char(self) -> char {
        LABELS[self.index()].0
    }

    pub fn from_usi_char(c: char) -> Option<Rank> {
        Rank::ALL.into_iter().find(|r| r.to_usi_char() == c)
    }

    /// 漢数字（KIF表記）
    #[inline]
    pub const fn to_kanji(self) -> char {
        LABELS[self.index()].1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_labels_round_trip() {
        for rank in Rank::ALL {
            assert_eq!(Rank::from_usi_char(rank.to_usi_char()), Some(rank));
            assert_eq!(Rank::from_u8(rank.index() as u8), Some(rank));
        }
        assert_eq!(Rank::Rank6.to_kanji(), '六');
        assert_eq!(Rank::from_usi_char('j'), None);
        assert_eq!(Rank::from_u8(9), None);
    }

    #[test]
    fn test_each_side_has_three_promotion_ranks() {
        for color in Color::ALL {
            let zone: Vec<Rank> = Rank::ALL.into_iter().filter(|r| r.can_promote(color)).collect();
            assert_eq!(zone.len(), 3);
        }
        assert!(Rank::Rank3.can_promote(Color::Black));
        assert!(!Rank::Rank7.can_promote(Color::Black));
        assert!(Rank::Rank7.can_promote(Color::White));
    }

    #[test]
    fn test_flip_and_relative() {
        assert_eq!(Rank::Rank2.flip(), Rank::Rank8);
        assert_eq!(Rank::Rank5.flip(), Rank::Rank5);
        assert_eq!(Rank::Rank2.relative(Color::Black), Rank::Rank2);
        assert_eq!(Rank::Rank2.relative(Color::White), Rank::Rank8);
    }
}
