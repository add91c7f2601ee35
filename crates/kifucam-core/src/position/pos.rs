use crate::movegen::attacks_from;
use crate::types::{Color, File, Hand, Move, Piece, PieceKind, Promotion, Rank, Square};

/// 平手初期配置の1段目（9筋→1筋）
const BACK_RANK: [PieceKind; 9] = [
    PieceKind::Lance,
    PieceKind::Knight,
    PieceKind::Silver,
    PieceKind::Gold,
    PieceKind::King,
    PieceKind::Gold,
    PieceKind::Silver,
    PieceKind::Knight,
    PieceKind::Lance,
];

/// 局面（盤面＋持ち駒）
///
/// 盤面と持ち駒は `apply` を通じてのみ更新される前提。
/// `put_piece` / `remove_piece` は初期配置やテスト局面の構築用。
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Position {
    board: [Option<Piece>; Square::NUM],
    hands: [Hand; Color::NUM],
}

impl Default for Position {
    fn default() -> Self {
        Self::empty()
    }
}

impl Position {
    /// 駒のない局面
    pub fn empty() -> Self {
        Position {
            board: [None; Square::NUM],
            hands: [Hand::EMPTY; Color::NUM],
        }
    }

    /// 平手初期局面
    pub fn hirate() -> Self {
        let mut pos = Self::empty();
        for (i, &kind) in BACK_RANK.iter().enumerate() {
            let file = File::ALL[8 - i];
            pos.put_piece(Square::new(file, Rank::Rank9), Piece::new(Color::Black, kind));
            pos.put_piece(Square::new(file, Rank::Rank1), Piece::new(Color::White, kind));
        }
        for file in File::ALL {
            pos.put_piece(
                Square::new(file, Rank::Rank7),
                Piece::new(Color::Black, PieceKind::Pawn),
            );
            pos.put_piece(
                Square::new(file, Rank::Rank3),
                Piece::new(Color::White, PieceKind::Pawn),
            );
        }
        pos.put_piece(
            Square::new(File::File8, Rank::Rank8),
            Piece::new(Color::Black, PieceKind::Bishop),
        );
        pos.put_piece(
            Square::new(File::File2, Rank::Rank8),
            Piece::new(Color::Black, PieceKind::Rook),
        );
        pos.put_piece(
            Square::new(File::File2, Rank::Rank2),
            Piece::new(Color::White, PieceKind::Bishop),
        );
        pos.put_piece(
            Square::new(File::File8, Rank::Rank2),
            Piece::new(Color::White, PieceKind::Rook),
        );
        pos
    }

    #[inline]
    pub fn piece_on(&self, sq: Square) -> Option<Piece> {
        self.board[sq.index()]
    }

    #[inline]
    pub fn is_empty(&self, sq: Square) -> bool {
        self.board[sq.index()].is_none()
    }

    /// 駒を置く（既存の駒は上書き）
    #[inline]
    pub fn put_piece(&mut self, sq: Square, piece: Piece) {
        self.board[sq.index()] = Some(piece);
    }

    /// 駒を取り除く
    #[inline]
    pub fn remove_piece(&mut self, sq: Square) -> Option<Piece> {
        self.board[sq.index()].take()
    }

    #[inline]
    pub fn hand(&self, color: Color) -> &Hand {
        &self.hands[color.index()]
    }

    /// 持ち駒を直接編集する（局面構築用）
    #[inline]
    pub fn hand_mut(&mut self, color: Color) -> &mut Hand {
        &mut self.hands[color.index()]
    }

    /// 駒のある升と駒の組
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(|sq| self.piece_on(sq).map(|pc| (sq, pc)))
    }

    /// 指定手番の駒のある升と駒の組
    pub fn pieces_of(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.pieces().filter(move |(_, pc)| pc.color() == color)
    }

    /// 玉の位置（存在しなければNone）
    pub fn king_square(&self, color: Color) -> Option<Square> {
        let king = Piece::new(color, PieceKind::King);
        Square::all().find(|&sq| self.piece_on(sq) == Some(king))
    }

    /// `color` の玉に相手の駒の利きがあるか
    ///
    /// 手番は考慮しない。玉がいない局面では常にfalse。
    pub fn is_in_check(&self, color: Color) -> bool {
        let Some(king_sq) = self.king_square(color) else {
            return false;
        };
        self.pieces_of(color.opponent())
            .any(|(sq, pc)| attacks_from(self, pc, sq).contains(king_sq))
    }

    /// 指し手を適用する
    ///
    /// 合法性は検査しない（呼び出し側で保証すること）。
    /// 持っていない駒を打つ指し手は上流の不具合として記録し、持ち駒の減算なしで盤面を更新する。
    pub fn apply(&mut self, mv: &Move) {
        let color = mv.color();
        match mv.from() {
            Some(from) => {
                self.remove_piece(from);
            }
            None => {
                let kind = mv.piece().kind();
                if !self.hands[color.index()].remove(kind) {
                    log::error!(
                        "drop of {kind:?} by {color:?} at {} but the hand has none",
                        mv.to()
                    );
                }
            }
        }

        let mut piece = mv.piece().with_color(color);
        if mv.promotion() == Promotion::Promote {
            piece = piece.promote().unwrap_or(piece);
        }
        self.put_piece(mv.to(), piece);

        if let Some(captured) = mv.captured() {
            self.hands[color.index()].add(captured);
        }
    }
}

impl std::fmt::Debug for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Position({})", self.to_sfen(Color::Black, 1))
    }
}
