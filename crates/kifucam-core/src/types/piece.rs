//! 駒（PieceKind / Piece）

use super::Color;

/// 駒種（成りの区別なし）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum PieceKind {
    King = 0,
    Rook = 1,
    Bishop = 2,
    Gold = 3,
    Silver = 4,
    Knight = 5,
    Lance = 6,
    Pawn = 7,
}

impl PieceKind {
    /// 駒種の数
    pub const NUM: usize = 8;

    /// 全駒種
    pub const ALL: [PieceKind; 8] = [
        PieceKind::King,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Gold,
        PieceKind::Silver,
        PieceKind::Knight,
        PieceKind::Lance,
        PieceKind::Pawn,
    ];

    /// 手駒になる駒種一覧（SFENの持ち駒順）
    pub const HAND_KINDS: [PieceKind; 7] = [
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Gold,
        PieceKind::Silver,
        PieceKind::Knight,
        PieceKind::Lance,
        PieceKind::Pawn,
    ];

    /// 成れる駒種かどうか（玉・金は成れない）
    #[inline]
    pub const fn can_promote(self) -> bool {
        !matches!(self, PieceKind::King | PieceKind::Gold)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// 1局で使う枚数（両者合計）
    #[inline]
    pub const fn total_count(self) -> u8 {
        match self {
            PieceKind::King | PieceKind::Rook | PieceKind::Bishop => 2,
            PieceKind::Gold | PieceKind::Silver | PieceKind::Knight | PieceKind::Lance => 4,
            PieceKind::Pawn => 18,
        }
    }

    /// 持ち駒配列のインデックス（玉はNone）
    #[inline]
    pub const fn hand_index(self) -> Option<usize> {
        match self {
            PieceKind::King => None,
            _ => Some(self as usize - 1),
        }
    }

    /// SFENの駒文字（先手＝大文字）
    pub const fn to_sfen_char(self) -> char {
        match self {
            PieceKind::King => 'K',
            PieceKind::Rook => 'R',
            PieceKind::Bishop => 'B',
            PieceKind::Gold => 'G',
            PieceKind::Silver => 'S',
            PieceKind::Knight => 'N',
            PieceKind::Lance => 'L',
            PieceKind::Pawn => 'P',
        }
    }

    /// SFENの駒文字から変換（大文字・小文字を区別しない）
    pub fn from_sfen_char(c: char) -> Option<PieceKind> {
        let kind = match c.to_ascii_uppercase() {
            'K' => PieceKind::King,
            'R' => PieceKind::Rook,
            'B' => PieceKind::Bishop,
            'G' => PieceKind::Gold,
            'S' => PieceKind::Silver,
            'N' => PieceKind::Knight,
            'L' => PieceKind::Lance,
            'P' => PieceKind::Pawn,
            _ => return None,
        };
        Some(kind)
    }

    /// 漢字表記（生駒）
    pub const fn kanji(self) -> &'static str {
        match self {
            PieceKind::King => "玉",
            PieceKind::Rook => "飛",
            PieceKind::Bishop => "角",
            PieceKind::Gold => "金",
            PieceKind::Silver => "銀",
            PieceKind::Knight => "桂",
            PieceKind::Lance => "香",
            PieceKind::Pawn => "歩",
        }
    }
}

/// 駒（手番 × 駒種 × 成り）
///
/// 玉・金は成りフラグを持たない。コンストラクタと `promote()` がこれを保証する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    color: Color,
    kind: PieceKind,
    promoted: bool,
}

impl Piece {
    /// 成駒を区別した駒種インデックスの数（成玉・成金の欠番を含む）
    pub const TYPE_NUM: usize = PieceKind::NUM * 2;

    /// 生駒を生成
    #[inline]
    pub const fn new(color: Color, kind: PieceKind) -> Piece {
        Piece {
            color,
            kind,
            promoted: false,
        }
    }

    #[inline]
    pub const fn color(self) -> Color {
        self.color
    }

    #[inline]
    pub const fn kind(self) -> PieceKind {
        self.kind
    }

    #[inline]
    pub const fn is_promoted(self) -> bool {
        self.promoted
    }

    /// 成駒を返す（成れない駒・成駒はNone）
    #[inline]
    pub const fn promote(self) -> Option<Piece> {
        if self.promoted || !self.kind.can_promote() {
            return None;
        }
        Some(Piece {
            promoted: true,
            ..self
        })
    }

    /// 生駒を返す
    #[inline]
    pub const fn unpromote(self) -> Piece {
        Piece {
            promoted: false,
            ..self
        }
    }

    /// 手番を変えた駒を返す
    #[inline]
    pub const fn with_color(self, color: Color) -> Piece {
        Piece { color, ..self }
    }

    /// 龍・馬かどうか
    #[inline]
    pub const fn is_dragon_or_horse(self) -> bool {
        self.promoted && matches!(self.kind, PieceKind::Rook | PieceKind::Bishop)
    }

    /// 成りを区別した駒種インデックス（0-15、成駒は+8）
    ///
    /// 利きテーブルや駒画像帳のスロット参照専用。
    #[inline]
    pub const fn type_index(self) -> usize {
        self.kind as usize + if self.promoted { PieceKind::NUM } else { 0 }
    }

    /// 駒種インデックスから手番つきの駒を復元
    pub const fn from_type_index(color: Color, index: usize) -> Option<Piece> {
        if index >= Self::TYPE_NUM {
            return None;
        }
        let kind = PieceKind::ALL[index % PieceKind::NUM];
        let piece = Piece::new(color, kind);
        if index < PieceKind::NUM {
            Some(piece)
        } else {
            piece.promote()
        }
    }

    /// 漢字表記（KIF）
    pub const fn kanji(self) -> &'static str {
        if !self.promoted {
            return self.kind.kanji();
        }
        match self.kind {
            PieceKind::Rook => "龍",
            PieceKind::Bishop => "馬",
            PieceKind::Silver => "成銀",
            PieceKind::Knight => "成桂",
            PieceKind::Lance => "成香",
            PieceKind::Pawn => "と",
            PieceKind::King | PieceKind::Gold => self.kind.kanji(),
        }
    }

    /// SFEN表記（"+p"等）
    pub fn to_sfen(self) -> String {
        let c = self.kind.to_sfen_char();
        let c = match self.color {
            Color::Black => c,
            Color::White => c.to_ascii_lowercase(),
        };
        if self.promoted {
            format!("+{c}")
        } else {
            c.to_string()
        }
    }

    /// 英字略号（"+R"等、手番なし）
    pub fn to_western(self) -> String {
        let c = self.kind.to_sfen_char();
        if self.promoted {
            format!("+{c}")
        } else {
            c.to_string()
        }
    }
}
