//! 升目（Square）

use super::{Color, File, Rank};

/// 升目（0-80）
///
/// 配置: 筋優先（縦型）
/// 1一=0, 1二=1, ..., 1九=8, 2一=9, ..., 9九=80
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Square(u8);

impl Square {
    /// 升目の数
    pub const NUM: usize = 81;

    /// 1一
    pub const SQ_11: Square = Square(0);
    /// 5五（中央）
    pub const SQ_55: Square = Square(40);
    /// 9九
    pub const SQ_99: Square = Square(80);

    /// FileとRankからSquareを生成
    #[inline]
    pub const fn new(file: File, rank: Rank) -> Square {
        Square(file as u8 * 9 + rank as u8)
    }

    /// 筋・段のインデックス（0-8）から生成。盤外ならNone。
    #[inline]
    pub const fn from_coords(file: i8, rank: i8) -> Option<Square> {
        if file >= 0 && file < 9 && rank >= 0 && rank < 9 {
            Some(Square(file as u8 * 9 + rank as u8))
        } else {
            None
        }
    }

    /// 筋を取得
    #[inline]
    pub const fn file(self) -> File {
        File::ALL[(self.0 / 9) as usize]
    }

    /// 段を取得
    #[inline]
    pub const fn rank(self) -> Rank {
        Rank::ALL[(self.0 % 9) as usize]
    }

    /// インデックスとして使用
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// u8から生成（範囲チェックあり）
    #[inline]
    pub const fn from_u8(n: u8) -> Option<Square> {
        if n < 81 { Some(Square(n)) } else { None }
    }

    /// 180度回転（筋・段をそれぞれ反転）
    ///
    /// カメラの向きと内部の盤の向きを揃えるのに使う。
    #[inline]
    pub const fn inverse(self) -> Square {
        Square::new(self.file().flip(), self.rank().flip())
    }

    /// 方向オフセット（筋, 段）を足したSquareを返す（盤外ならNone）
    #[inline]
    pub const fn offset(self, df: i8, dr: i8) -> Option<Square> {
        Square::from_coords((self.0 / 9) as i8 + df, (self.0 % 9) as i8 + dr)
    }

    /// 手番から見て敵陣（成れる3段）にあるか
    #[inline]
    pub const fn in_promotion_zone(self, color: Color) -> bool {
        self.rank().can_promote(color)
    }

    /// USI形式の文字列（"7g"等）に変換
    pub fn to_usi(self) -> String {
        format!("{}{}", self.file().to_usi_char(), self.rank().to_usi_char())
    }

    /// USI形式の文字列からSquareに変換
    pub fn from_usi(s: &str) -> Option<Square> {
        let mut chars = s.chars();
        let file = File::from_usi_char(chars.next()?)?;
        let rank = Rank::from_usi_char(chars.next()?)?;
        if chars.next().is_some() {
            return None;
        }
        Some(Square::new(file, rank))
    }

    /// KIF形式（"７六"）
    pub fn to_kif(self) -> String {
        format!("{}{}", self.file().to_zenkaku(), self.rank().to_kanji())
    }

    /// 棋譜の移動元表記（"77"）
    pub fn to_digits(self) -> String {
        format!("{}{}", self.file().index() + 1, self.rank().index() + 1)
    }

    /// 全ての升を返すイテレータ
    pub fn all() -> impl Iterator<Item = Square> {
        (0..81).map(Square)
    }
}

impl std::fmt::Display for Square {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.file().to_usi_char(), self.rank().to_usi_char())
    }
}
