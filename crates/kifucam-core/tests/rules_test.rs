//! 合法手生成・局面更新・表記の結合テスト

use kifucam_core::movegen::generate;
use kifucam_core::notation::{NotationStyle, decide_suffix};
use kifucam_core::position::parse_sfen;
use kifucam_core::{
    Color, File, Game, Move, Piece, PieceKind, Position, Promotion, Rank, Square, Suffix,
};

fn sq(file: File, rank: Rank) -> Square {
    Square::new(file, rank)
}

fn perft(pos: &Position, color: Color, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = generate(pos, color);
    if depth == 1 {
        return moves.len() as u64;
    }
    moves
        .iter()
        .map(|mv| {
            let mut next = pos.clone();
            next.apply(mv);
            perft(&next, color.opponent(), depth - 1)
        })
        .sum()
}

#[test]
fn test_perft_from_hirate() {
    let pos = Position::hirate();
    assert_eq!(perft(&pos, Color::Black, 1), 30);
    assert_eq!(perft(&pos, Color::Black, 2), 900);
    assert_eq!(perft(&pos, Color::Black, 3), 25_470);
}

#[test]
fn test_small_position_is_complete() {
    // 玉5手 + 金打ち79升
    let pos = parse_sfen("4k4/9/9/9/9/9/9/9/4K4 b G 1").unwrap().position;
    let moves = generate(&pos, Color::Black);
    assert_eq!(moves.len(), 5 + 79);
    assert_eq!(moves.iter().filter(|m| m.is_drop()).count(), 79);
}

#[test]
fn test_check_evasions_only() {
    // 5九玉に5一の飛車で王手。合駒の金打ち（5二〜5八の7升）と玉の横移動4手
    let pos = parse_sfen("4r4/9/9/9/9/9/9/9/4K4 b G 1").unwrap().position;
    assert!(pos.is_in_check(Color::Black));
    let moves = generate(&pos, Color::Black);
    let drops: Vec<_> = moves.iter().filter(|m| m.is_drop()).collect();
    assert_eq!(drops.len(), 7);
    assert!(drops.iter().all(|m| m.to().file() == File::File5));
    let king_moves = moves.iter().filter(|m| !m.is_drop()).count();
    assert_eq!(king_moves, 4);
}

#[test]
fn test_apply_and_undo_round_trip() {
    let sfen = "ln1g3nl/1r3kg2/p1pppp1pp/1p4p2/9/2P1b4/PP1PPPPPP/1S5R1/LN1GKGSNL b BSs 1";
    let original = parse_sfen(sfen).unwrap().position;
    for mv in generate(&original, Color::Black).iter().filter(|m| !m.is_drop()) {
        let mut pos = original.clone();
        pos.apply(mv);
        let Some(from) = mv.from() else { continue };

        // 逆操作
        pos.remove_piece(mv.to());
        pos.put_piece(from, mv.moved_piece());
        if let Some(kind) = mv.captured() {
            let victim = original.piece_on(mv.to()).unwrap();
            assert_eq!(victim.kind(), kind);
            pos.put_piece(mv.to(), victim);
            assert!(pos.hand_mut(Color::Black).remove(kind));
        }
        assert_eq!(pos, original, "round trip failed for {mv}");
    }
}

#[test]
fn test_gold_fixture_through_game() {
    let pos = parse_sfen("4k4/2G6/G8/9/9/9/9/9/4K4 b - 1").unwrap().position;
    let gold = Piece::new(Color::Black, PieceKind::Gold);
    let to = sq(File::File8, Rank::Rank2);
    let (from_93, from_72) = (sq(File::File9, Rank::Rank3), sq(File::File7, Rank::Rank2));
    let up = Move::new_board(gold, from_93, to, Promotion::NotApplicable, None);
    let sideway = Move::new_board(gold, from_72, to, Promotion::NotApplicable, None);
    assert_eq!(decide_suffix(&pos, &up), Suffix::UP);
    assert_eq!(decide_suffix(&pos, &sideway), Suffix::SIDEWAY);

    let mut game = Game::from_position(pos, Some(Color::Black));
    game.apply(&up).unwrap();
    assert_eq!(
        game.notation(0, NotationStyle::Ki2).as_deref(),
        Some("▲８二金上")
    );
    assert_eq!(
        game.notation(0, NotationStyle::Kif).as_deref(),
        Some("▲８二金(93)")
    );
    assert_eq!(
        game.notation(0, NotationStyle::Western).as_deref(),
        Some("☗G9c-8b")
    );
}

#[test]
fn test_drop_rules_for_both_colors() {
    let pos = parse_sfen("4k4/9/4p4/9/9/9/4P4/9/4K4 b Pp 1").unwrap().position;
    for color in Color::ALL {
        let pawn_drops: Vec<_> = generate(&pos, color)
            .into_iter()
            .filter(|m| m.is_drop() && m.piece().kind() == PieceKind::Pawn)
            .collect();
        assert!(!pawn_drops.is_empty());
        assert!(pawn_drops.iter().all(|m| m.to().file() != File::File5));
        let last = match color {
            Color::Black => Rank::Rank1,
            Color::White => Rank::Rank9,
        };
        assert!(pawn_drops.iter().all(|m| m.to().rank() != last));
    }
}
