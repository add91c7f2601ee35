//! 合法手生成器

use super::effect::attacks_from;
use crate::position::Position;
use crate::types::{Color, File, Move, Piece, PieceKind, Promotion, Square};

/// 行き所のない段（相対段でこの段数より手前には置けない）
///
/// 歩・香は1段目、桂は1・2段目。
#[inline]
fn dead_ranks(kind: PieceKind) -> usize {
    match kind {
        PieceKind::Pawn | PieceKind::Lance => 1,
        PieceKind::Knight => 2,
        _ => 0,
    }
}

/// `to` に生駒 `kind` を置いたとき、以後動けなくなるか
#[inline]
fn is_dead_square(color: Color, kind: PieceKind, to: Square) -> bool {
    to.rank().relative(color).index() < dead_ranks(kind)
}

/// 二歩になる筋（自分の生歩がある筋）
fn pawn_files(pos: &Position, color: Color) -> [bool; File::NUM] {
    let pawn = Piece::new(color, PieceKind::Pawn);
    let mut files = [false; File::NUM];
    for (sq, pc) in pos.pieces_of(color) {
        if pc == pawn {
            files[sq.file().index()] = true;
        }
    }
    files
}

// ============================================================================
// 候補手（自玉の安全は未検査）
// ============================================================================

/// 駒打ちの候補手
fn generate_drops(pos: &Position, color: Color, out: &mut Vec<Move>) {
    let hand = pos.hand(color);
    if hand.is_empty() {
        return;
    }
    let nifu = pawn_files(pos, color);
    for kind in hand.kinds() {
        for to in Square::all() {
            if !pos.is_empty(to) || is_dead_square(color, kind, to) {
                continue;
            }
            if kind == PieceKind::Pawn && nifu[to.file().index()] {
                continue;
            }
            out.push(Move::new_drop(color, kind, to));
        }
    }
}

/// 盤上の駒の移動の候補手
fn generate_board_moves(pos: &Position, color: Color, out: &mut Vec<Move>) {
    for (from, piece) in pos.pieces_of(color) {
        for to in attacks_from(pos, piece, from).iter() {
            let target = pos.piece_on(to);
            if target.is_some_and(|pc| pc.color() == color) {
                continue;
            }
            let captured = target.map(|pc| pc.kind());
            let can_promote = piece.promote().is_some()
                && (from.in_promotion_zone(color) || to.in_promotion_zone(color));
            if !can_promote {
                out.push(Move::new_board(piece, from, to, Promotion::NotApplicable, captured));
                continue;
            }
            out.push(Move::new_board(piece, from, to, Promotion::Promote, captured));
            if !is_dead_square(color, piece.kind(), to) {
                out.push(Move::new_board(piece, from, to, Promotion::Decline, captured));
            }
        }
    }
}

// ============================================================================
// 合法性
// ============================================================================

/// 候補手を仮に指した局面で自玉に王手がかかっていないか。
/// 歩打ちで王手になる場合は、`check_pawn_drop_mate` が真なら相手に応手があることも確かめる。
fn is_legal_candidate(pos: &Position, mv: &Move, check_pawn_drop_mate: bool) -> bool {
    let color = mv.color();
    let mut next = pos.clone();
    next.apply(mv);
    if next.is_in_check(color) {
        return false;
    }
    if check_pawn_drop_mate && mv.is_drop() && mv.piece().kind() == PieceKind::Pawn {
        let enemy = color.opponent();
        // 再帰は1手分のみ（相手側の生成では打ち歩詰め判定をしない）
        if next.is_in_check(enemy) && generate_legal(&next, enemy, false).is_empty() {
            return false;
        }
    }
    true
}

/// 合法手を生成する
///
/// 二歩・行き所のない駒・自殺手・打ち歩詰めを除いた全合法手（成・不成の両方）を返す。
/// 並び順は規定しない。
pub fn generate(pos: &Position, color: Color) -> Vec<Move> {
    generate_legal(pos, color, true)
}

/// 合法手を生成する（打ち歩詰め判定の有無を指定）
///
/// `check_pawn_drop_mate` が偽のとき、王手になる歩打ちも詰みかどうかを調べずに残す。
pub fn generate_legal(pos: &Position, color: Color, check_pawn_drop_mate: bool) -> Vec<Move> {
    let mut candidates = Vec::with_capacity(128);
    generate_board_moves(pos, color, &mut candidates);
    generate_drops(pos, color, &mut candidates);
    candidates.retain(|mv| is_legal_candidate(pos, mv, check_pawn_drop_mate));
    candidates
}

/// 指し手が `color` の合法手なら、生成器が作った同一の指し手（取った駒つき）を返す
pub fn find_legal(pos: &Position, mv: &Move) -> Option<Move> {
    generate(pos, mv.color()).into_iter().find(|legal| legal == mv)
}
