//! 指し手（Move）

use super::{Color, Piece, PieceKind, Square};
use crate::notation::Suffix;

/// 成りの選択
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Promotion {
    /// 成る
    Promote,
    /// 成れるが成らない（不成）
    Decline,
    /// 成りの選択がない（打ち・敵陣外・成れない駒・成駒）
    NotApplicable,
}

/// 指し手
///
/// 同一性は手番・移動元・移動先・成りの選択で決まる（駒打ちは移動元の代わりに打つ駒種）。
/// 取った駒と表記修飾語は局面から導出される付帯情報で、比較には含めない。
#[derive(Debug, Clone, Copy)]
pub struct Move {
    color: Color,
    piece: Piece,
    from: Option<Square>,
    to: Square,
    promotion: Promotion,
    captured: Option<PieceKind>,
    suffix: Suffix,
}

impl Move {
    /// 盤上の駒の移動
    ///
    /// `piece` は移動前の駒。成る場合は内部で成駒に置き換える。
    pub fn new_board(
        piece: Piece,
        from: Square,
        to: Square,
        promotion: Promotion,
        captured: Option<PieceKind>,
    ) -> Move {
        let after = match promotion {
            Promotion::Promote => piece.promote().unwrap_or(piece),
            _ => piece,
        };
        Move {
            color: piece.color(),
            piece: after,
            from: Some(from),
            to,
            promotion,
            captured,
            suffix: Suffix::NONE,
        }
    }

    /// 駒打ち
    pub fn new_drop(color: Color, kind: PieceKind, to: Square) -> Move {
        Move {
            color,
            piece: Piece::new(color, kind),
            from: None,
            to,
            promotion: Promotion::NotApplicable,
            captured: None,
            suffix: Suffix::NONE,
        }
    }

    #[inline]
    pub const fn color(&self) -> Color {
        self.color
    }

    /// 移動後の駒（成った場合は成駒）
    #[inline]
    pub const fn piece(&self) -> Piece {
        self.piece
    }

    /// 移動前の駒
    #[inline]
    pub const fn moved_piece(&self) -> Piece {
        match self.promotion {
            Promotion::Promote => self.piece.unpromote(),
            _ => self.piece,
        }
    }

    /// 移動元（駒打ちはNone）
    #[inline]
    pub const fn from(&self) -> Option<Square> {
        self.from
    }

    #[inline]
    pub const fn to(&self) -> Square {
        self.to
    }

    #[inline]
    pub const fn is_drop(&self) -> bool {
        self.from.is_none()
    }

    #[inline]
    pub const fn promotion(&self) -> Promotion {
        self.promotion
    }

    #[inline]
    pub const fn captured(&self) -> Option<PieceKind> {
        self.captured
    }

    #[inline]
    pub const fn suffix(&self) -> Suffix {
        self.suffix
    }

    /// 表記修飾語を設定した指し手を返す
    #[inline]
    pub const fn with_suffix(self, suffix: Suffix) -> Move {
        Move { suffix, ..self }
    }

    /// USI形式（"7g7f", "P*5e", "8h2b+"）
    pub fn to_usi(&self) -> String {
        match self.from {
            Some(from) => {
                let promote = match self.promotion {
                    Promotion::Promote => "+",
                    _ => "",
                };
                format!("{}{}{promote}", from.to_usi(), self.to.to_usi())
            }
            None => format!("{}*{}", self.piece.kind().to_sfen_char(), self.to.to_usi()),
        }
    }

    fn identity(&self) -> (Color, Option<Square>, Square, Promotion, Option<PieceKind>) {
        let drop_kind = self.from.is_none().then(|| self.piece.kind());
        (self.color, self.from, self.to, self.promotion, drop_kind)
    }
}

impl PartialEq for Move {
    fn eq(&self, other: &Move) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for Move {}

impl std::hash::Hash for Move {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_usi())
    }
}
