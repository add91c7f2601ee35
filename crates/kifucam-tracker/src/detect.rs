//! 盤面差分からの指し手復元
//!
//! 変化した升の数と、変化前の局面での升の占有状況から指し手を組み立て、
//! 最後に合法手と突き合わせる。成り・打った駒種は駒画像帳との照合で推定する。

use kifucam_core::movegen::generate;
use kifucam_core::{Color, Game, Move, Piece, PieceKind, Position, Promotion, Square, SquareSet};

use crate::book::PieceBook;
use crate::error::DetectError;
use crate::vision::Vision;

/// 復元結果の確かさ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    /// 変化した升から一意に決まった
    Exact,
    /// 移動元を画像の類似度から推測した
    Approximate,
}

/// 復元した指し手
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    /// 合法手生成器が作った指し手（取った駒つき）
    pub mv: Move,
    pub confidence: Confidence,
}

/// 変化前後の盤面画像と変化した升から指し手を復元する
///
/// `game` は変化前の対局状態。画像はどちらも正規の向き（先手が手前）であること。
pub fn detect<V: Vision>(
    vision: &V,
    before: &V::Image,
    after: &V::Image,
    changed: SquareSet,
    game: &Game,
    book: &PieceBook<V::Image>,
) -> Result<Detection, DetectError> {
    let frames = Frames {
        vision,
        before,
        after,
        game,
        book,
    };
    let squares: Vec<Square> = changed.iter().collect();
    match squares.as_slice() {
        [] => Err(DetectError::NoChange),
        [sq] => match game.position().piece_on(*sq) {
            None => frames.drop_at(*sq),
            Some(victim) => frames.capture_with_unknown_origin(*sq, victim),
        },
        [a, b] => frames.two_squares(*a, *b),
        _ => Err(DetectError::TooManyChanges(squares.len())),
    }
}

struct Frames<'a, V: Vision> {
    vision: &'a V,
    before: &'a V::Image,
    after: &'a V::Image,
    game: &'a Game,
    book: &'a PieceBook<V::Image>,
}

impl<V: Vision> Frames<'_, V> {
    #[inline]
    fn position(&self) -> &Position {
        self.game.position()
    }

    fn check_side(&self, mover: Color) -> Result<(), DetectError> {
        match self.game.side_to_move() {
            Some(expected) if expected != mover => Err(DetectError::WrongSide {
                moved: mover,
                expected,
            }),
            _ => Ok(()),
        }
    }

    /// 空升に駒が現れた: 駒打ち
    fn drop_at(&self, sq: Square) -> Result<Detection, DetectError> {
        let pos = self.position();
        let color = match self.game.side_to_move() {
            Some(color) => color,
            None => {
                // 手番未確定なら持ち駒のある側
                let holders: Vec<Color> = Color::ALL
                    .into_iter()
                    .filter(|&c| !pos.hand(c).is_empty())
                    .collect();
                match holders.as_slice() {
                    [color] => *color,
                    _ => return Err(DetectError::UnknownSide),
                }
            }
        };

        let kinds: Vec<PieceKind> = pos.hand(color).kinds().collect();
        let kind = match kinds.as_slice() {
            [] => return Err(DetectError::EmptyHand { color, square: sq }),
            [kind] => *kind,
            _ => {
                let crop = self.vision.crop_square(self.after, sq);
                let candidates = kinds.iter().map(|&k| Piece::new(color, k));
                let (piece, score) = self
                    .book
                    .best_match(self.vision, &crop, color, candidates)
                    .ok_or(DetectError::NoExemplar(sq))?;
                log::debug!(
                    "drop at {sq} matched {:?} (similarity {score:.3})",
                    piece.kind()
                );
                piece.kind()
            }
        };

        let mv = legalize(pos, Move::new_drop(color, kind, sq))?;
        Ok(Detection {
            mv,
            confidence: Confidence::Exact,
        })
    }

    /// 駒のある升だけが変化した: 取る手で移動元の変化を見落とした
    ///
    /// 取った側の駒のうち、その升へ合法に行けて、前後の画像が最も変わった升を
    /// 移動元とみなす。
    fn capture_with_unknown_origin(
        &self,
        to: Square,
        victim: Piece,
    ) -> Result<Detection, DetectError> {
        let pos = self.position();
        let mover = victim.color().opponent();
        self.check_side(mover)?;

        let mut origins: Vec<Square> = generate(pos, mover)
            .iter()
            .filter(|m| m.to() == to)
            .filter_map(Move::from)
            .collect();
        origins.sort();
        origins.dedup();

        let from = origins
            .into_iter()
            .map(|sq| {
                let a = self.vision.crop_square(self.before, sq);
                let b = self.vision.crop_square(self.after, sq);
                (sq, self.vision.similarity(&a, &b))
            })
            .min_by(|x, y| x.1.total_cmp(&y.1))
            .map(|(sq, _)| sq)
            .ok_or_else(|| DetectError::NoLegalMove(format!("capture at {to}")))?;

        let Some(piece) = pos.piece_on(from) else {
            return Err(DetectError::NoLegalMove(format!("capture at {to}")));
        };
        let mv = self.board_move(piece, from, to)?;
        log::debug!("single-square change at {to} read as {mv} (approximate)");
        Ok(Detection {
            mv,
            confidence: Confidence::Approximate,
        })
    }

    /// 2升が変化した: 移動、または取る手
    fn two_squares(&self, a: Square, b: Square) -> Result<Detection, DetectError> {
        let pos = self.position();
        let exact = |mv| Detection {
            mv,
            confidence: Confidence::Exact,
        };
        match (pos.piece_on(a), pos.piece_on(b)) {
            (Some(pa), None) => {
                self.check_side(pa.color())?;
                self.board_move(pa, a, b).map(exact)
            }
            (None, Some(pb)) => {
                self.check_side(pb.color())?;
                self.board_move(pb, b, a).map(exact)
            }
            (Some(pa), Some(pb)) if pa.color() != pb.color() => {
                let stm = self.game.side_to_move();
                let unrecognized = DetectError::UnrecognizedTransition(a, b);
                let mut readings = Vec::with_capacity(2);
                let mut last_err = None;
                for (piece, from, to) in [(pa, a, b), (pb, b, a)] {
                    if stm.is_some_and(|c| c != piece.color()) {
                        continue;
                    }
                    match self.board_move(piece, from, to) {
                        Ok(mv) => readings.push(mv),
                        Err(e) => last_err = Some(e),
                    }
                }
                match readings.as_slice() {
                    [mv] => Ok(exact(*mv)),
                    [x, y] => self.pick_by_image(*x, *y).map(exact),
                    _ => Err(last_err.unwrap_or(unrecognized)),
                }
            }
            _ => Err(DetectError::UnrecognizedTransition(a, b)),
        }
    }

    /// 互いに取り合える2駒の取る手のうち、移動先に移動元の駒が写っている方を選ぶ
    fn pick_by_image(&self, x: Move, y: Move) -> Result<Move, DetectError> {
        let score = |mv: &Move| {
            let Some(from) = mv.from() else { return 0.0 };
            let origin = self.vision.crop_square(self.before, from);
            let landed = self.vision.crop_square(self.after, mv.to());
            self.vision.similarity(&origin, &landed)
        };
        let (sx, sy) = (score(&x), score(&y));
        if sx > sy {
            Ok(x)
        } else if sy > sx {
            Ok(y)
        } else {
            Err(DetectError::Ambiguous(x.to_usi(), y.to_usi()))
        }
    }

    fn board_move(&self, piece: Piece, from: Square, to: Square) -> Result<Move, DetectError> {
        let captured = self.position().piece_on(to).map(|pc| pc.kind());
        let promotion = self.infer_promotion(piece, from, to);
        let mv = Move::new_board(piece, from, to, promotion, captured);
        legalize(self.position(), mv)
    }

    /// 成りの推定
    ///
    /// 移動後の駒画像と移動前の駒画像の類似度が、その駒種の見本どうしの最小類似度を
    /// 下回れば成り。初手や見本が足りないときは不成とし、成り必須なら合法手との照合で
    /// 成りに直る。
    fn infer_promotion(&self, piece: Piece, from: Square, to: Square) -> Promotion {
        let color = piece.color();
        let in_zone = from.in_promotion_zone(color) || to.in_promotion_zone(color);
        if piece.promote().is_none() || !in_zone {
            return Promotion::NotApplicable;
        }
        if self.game.moves().is_empty() {
            return Promotion::Decline;
        }
        let Some(range) = self.book.self_similarity(piece) else {
            return Promotion::Decline;
        };
        let origin = self.vision.crop_square(self.before, from);
        let landed = self.vision.crop_square(self.after, to);
        let similarity = self.vision.similarity(&landed, &origin);
        if similarity < range.min {
            log::debug!(
                "{from}->{to}: similarity {similarity:.3} < {:.3}, promoted",
                range.min
            );
            Promotion::Promote
        } else {
            Promotion::Decline
        }
    }
}

/// 推定した指し手を合法手と突き合わせる
///
/// 完全一致がなければ、移動元・移動先が同じ唯一の合法手（成り必須など）を採る。
fn legalize(pos: &Position, mv: Move) -> Result<Move, DetectError> {
    let legal = generate(pos, mv.color());
    if let Some(found) = legal.iter().find(|m| **m == mv) {
        return Ok(*found);
    }
    if mv.is_drop() {
        return Err(DetectError::NoLegalMove(mv.to_usi()));
    }
    let mut same_squares = legal
        .iter()
        .filter(|m| m.from() == mv.from() && m.to() == mv.to());
    match (same_squares.next(), same_squares.next()) {
        (Some(found), None) => Ok(*found),
        _ => Err(DetectError::NoLegalMove(mv.to_usi())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::{SyntheticImage, SyntheticVision};
    use kifucam_core::position::parse_sfen;

    fn sq(usi: &str) -> Square {
        Square::from_usi(usi).unwrap()
    }

    fn position(sfen: &str) -> Position {
        parse_sfen(sfen).unwrap().position
    }

    fn board_move(
        color: Color,
        kind: PieceKind,
        from: &str,
        to: &str,
        promotion: Promotion,
    ) -> Move {
        Move::new_board(Piece::new(color, kind), sq(from), sq(to), promotion, None)
    }

    /// 局面 `game` から `mv` を指した前後の画像で復元する
    fn detect_move(
        game: &Game,
        book: &PieceBook<SyntheticImage>,
        mv: &Move,
    ) -> Result<Detection, DetectError> {
        let vision = SyntheticVision::default();
        let before = SyntheticImage::render(game.position());
        let mut next = game.position().clone();
        next.apply(mv);
        let after = SyntheticImage::render(&next);
        let changed = vision.changed_squares(&before, &after);
        detect(&vision, &before, &after, changed, game, book)
    }

    fn pawn_76() -> Move {
        board_move(Color::Black, PieceKind::Pawn, "7g", "7f", Promotion::NotApplicable)
    }

    #[test]
    fn test_simple_move_without_side_to_move() {
        let game = Game::new();
        let book = PieceBook::new(4);
        let found = detect_move(&game, &book, &pawn_76()).unwrap();
        assert_eq!(found.mv, pawn_76());
        assert_eq!(found.confidence, Confidence::Exact);
    }

    #[test]
    fn test_wrong_side_is_rejected() {
        let mut game = Game::new();
        game.apply(&pawn_76()).unwrap();
        let book = PieceBook::new(4);
        let again = board_move(Color::Black, PieceKind::Pawn, "2g", "2f", Promotion::NotApplicable);
        assert_eq!(
            detect_move(&game, &book, &again),
            Err(DetectError::WrongSide {
                moved: Color::Black,
                expected: Color::White
            })
        );
    }

    #[test]
    fn test_capture_orientation_from_side_to_move() {
        // 先手の飛車と後手の飛車が向かい合い、どちらも相手を取れる
        let pos = position("4k4/9/9/4r4/9/4R4/9/9/K8 b - 1");
        let game = Game::from_position(pos, Some(Color::Black));
        let book = PieceBook::new(4);
        let mv = board_move(Color::Black, PieceKind::Rook, "5f", "5d", Promotion::NotApplicable);
        let found = detect_move(&game, &book, &mv).unwrap();
        assert_eq!(found.mv, mv);
        assert_eq!(found.mv.captured(), Some(PieceKind::Rook));
    }

    #[test]
    fn test_capture_orientation_from_image_when_side_unknown() {
        let pos = position("4k4/9/9/4r4/9/4R4/9/9/K8 b - 1");
        let game = Game::from_position(pos, None);
        let book = PieceBook::new(4);
        let mv = board_move(Color::White, PieceKind::Rook, "5d", "5f", Promotion::NotApplicable);
        let found = detect_move(&game, &book, &mv).unwrap();
        assert_eq!(found.mv.color(), Color::White);
        assert_eq!(found.mv, mv);
    }

    #[test]
    fn test_forced_promotion_falls_back_to_legal_move() {
        let pos = position("k8/8P/9/9/9/9/9/9/8K b - 1");
        let game = Game::from_position(pos, Some(Color::Black));
        let book = PieceBook::new(4);
        let mv = board_move(Color::Black, PieceKind::Pawn, "1b", "1a", Promotion::Promote);
        let found = detect_move(&game, &book, &mv).unwrap();
        assert_eq!(found.mv.promotion(), Promotion::Promote);
    }

    #[test]
    fn test_promotion_inferred_from_book_statistics() {
        let vision = SyntheticVision::default();
        let pos = position("k8/9/9/7S1/9/9/9/9/8K w - 1");
        let mut game = Game::from_position(pos, Some(Color::White));
        // 後手が1手指して履歴を作る
        let king = board_move(Color::White, PieceKind::King, "9a", "8a", Promotion::NotApplicable);
        game.apply(&king).unwrap();
        let mut book = PieceBook::new(4);
        let image = SyntheticImage::render(game.position());
        book.update(&vision, game.position(), &image);
        let noisy = image.clone().with_noise(sq("2d"), 1);
        book.update(&vision, game.position(), &noisy);

        let promote = board_move(Color::Black, PieceKind::Silver, "2d", "2c", Promotion::Promote);
        assert_eq!(detect_move(&game, &book, &promote).unwrap().mv, promote);
        let decline = board_move(Color::Black, PieceKind::Silver, "2d", "2c", Promotion::Decline);
        assert_eq!(detect_move(&game, &book, &decline).unwrap().mv, decline);
    }

    #[test]
    fn test_drop_with_single_and_multiple_kinds() {
        let vision = SyntheticVision::default();
        let pos = position("4k4/9/9/9/9/9/9/9/4K4 b G 1");
        let game = Game::from_position(pos, None);
        let book = PieceBook::new(4);
        let gold_drop = Move::new_drop(Color::Black, PieceKind::Gold, Square::SQ_55);
        assert_eq!(detect_move(&game, &book, &gold_drop).unwrap().mv, gold_drop);

        // 持ち駒が2種類なら駒画像帳で見分ける
        let pos = position("4k4/9/9/9/9/9/9/4S4/4K4 b GS 1");
        let game = Game::from_position(pos, Some(Color::Black));
        let mut book = PieceBook::new(4);
        let silver_drop = Move::new_drop(Color::Black, PieceKind::Silver, Square::SQ_55);
        assert_eq!(
            detect_move(&game, &book, &silver_drop),
            Err(DetectError::NoExemplar(Square::SQ_55))
        );
        let pos = game.position().clone();
        book.update(&vision, &pos, &SyntheticImage::render(&pos));
        assert_eq!(
            detect_move(&game, &book, &silver_drop).unwrap().mv,
            silver_drop
        );
    }

    #[test]
    fn test_drop_with_empty_hand() {
        let vision = SyntheticVision::default();
        let pos = position("4k4/9/9/9/9/9/9/9/4K4 b - 1");
        let game = Game::from_position(pos.clone(), Some(Color::Black));
        let book = PieceBook::new(4);
        let before = SyntheticImage::render(&pos);
        let mut with_piece = pos.clone();
        with_piece.put_piece(Square::SQ_55, Piece::new(Color::Black, PieceKind::Gold));
        let after = SyntheticImage::render(&with_piece);
        let changed = vision.changed_squares(&before, &after);
        assert_eq!(
            detect(&vision, &before, &after, changed, &game, &book),
            Err(DetectError::EmptyHand {
                color: Color::Black,
                square: Square::SQ_55
            })
        );
    }

    #[test]
    fn test_single_square_capture_is_approximate() {
        let vision = SyntheticVision::default();
        // 5六の飛車と6五の金の両方が5五の歩を取れる
        let pos = position("4k4/9/9/9/3Gp4/4R4/9/9/4K4 b - 1");
        let game = Game::from_position(pos.clone(), Some(Color::Black));
        let book = PieceBook::new(4);
        let before = SyntheticImage::render(&pos);
        let rook = Piece::new(Color::Black, PieceKind::Rook);
        let from = sq("5f");
        let capture = Move::new_board(
            rook,
            from,
            Square::SQ_55,
            Promotion::NotApplicable,
            Some(PieceKind::Pawn),
        );
        let mut next = pos.clone();
        next.apply(&capture);
        let after = SyntheticImage::render(&next);

        // 移動元の変化を見落として、取られた升だけが変化として届いた
        let only_target: SquareSet = std::iter::once(Square::SQ_55).collect();
        let found = detect(&vision, &before, &after, only_target, &game, &book).unwrap();
        assert_eq!(found.confidence, Confidence::Approximate);
        assert_eq!(found.mv.from(), Some(from));
        assert_eq!(found.mv.captured(), Some(PieceKind::Pawn));
    }

    #[test]
    fn test_unrecognized_and_too_many() {
        let vision = SyntheticVision::default();
        let game = Game::new();
        let book = PieceBook::new(4);
        let image = SyntheticImage::render(game.position());
        let empties: SquareSet = [Square::SQ_55, sq("5d")].into_iter().collect();
        assert!(matches!(
            detect(&vision, &image, &image, empties, &game, &book),
            Err(DetectError::UnrecognizedTransition(..))
        ));
        let three: SquareSet = [Square::SQ_55, Square::SQ_11, Square::SQ_99]
            .into_iter()
            .collect();
        assert_eq!(
            detect(&vision, &image, &image, three, &game, &book),
            Err(DetectError::TooManyChanges(3))
        );
        assert_eq!(
            detect(&vision, &image, &image, SquareSet::EMPTY, &game, &book),
            Err(DetectError::NoChange)
        );
    }
}
