//! 対局相手（外部エンジン・通信相手）の抽象

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::movegen::generate;
use crate::position::Position;
use crate::types::{Color, Move};

/// 対局相手
///
/// 実装は局面と指し手履歴から `color` の指し手を返す。Noneは投了。
pub trait Opponent {
    fn next_move(&mut self, position: &Position, history: &[Move], color: Color) -> Option<Move>;
}

/// 合法手から一様に選ぶ相手（テスト・代役用）
pub struct RandomOpponent {
    rng: Xoshiro256PlusPlus,
}

impl RandomOpponent {
    pub fn new(seed: u64) -> Self {
        RandomOpponent {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }
}

impl Opponent for RandomOpponent {
    fn next_move(&mut self, position: &Position, _history: &[Move], color: Color) -> Option<Move> {
        let mut moves = generate(position, color);
        if moves.is_empty() {
            return None;
        }
        // 生成順に依存しないよう並べてから選ぶ
        moves.sort_by_cached_key(Move::to_usi);
        let index = self.rng.random_range(0..moves.len());
        Some(moves[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Game, MoveOutcome, OpponentTurn};
    use crate::position::parse_sfen;

    #[test]
    fn test_random_opponent_is_reproducible() {
        let pos = Position::hirate();
        let a = RandomOpponent::new(7).next_move(&pos, &[], Color::Black);
        let b = RandomOpponent::new(7).next_move(&pos, &[], Color::Black);
        assert!(a.is_some());
        assert_eq!(a, b);
    }

    #[test]
    fn test_random_opponent_resigns_when_mated() {
        // 頭金で詰んだ後手玉
        let pos = parse_sfen("4k4/4G4/4P4/9/9/9/9/9/4K4 w - 1").unwrap().position;
        assert!(
            RandomOpponent::new(1).next_move(&pos, &[], Color::White).is_none()
        );

        let mut game = Game::from_position(pos, Some(Color::White));
        let turn = game.play_opponent(&mut RandomOpponent::new(1), Color::White);
        assert_eq!(turn, Ok(OpponentTurn::Resigned));
    }

    #[test]
    fn test_random_self_play_stays_legal() {
        let mut game = Game::new();
        let mut players = [RandomOpponent::new(11), RandomOpponent::new(12)];
        for ply in 0..60 {
            let color = Color::ALL[ply % 2];
            match game.play_opponent(&mut players[color.index()], color) {
                Ok(OpponentTurn::Moved { outcome, .. }) => {
                    if outcome != MoveOutcome::Ok {
                        break;
                    }
                }
                Ok(OpponentTurn::Resigned) => break,
                Err(e) => panic!("random opponent produced an illegal move: {e}"),
            }
            assert!(!game.position().is_in_check(color));
        }
        assert!(game.ply() > 0);
    }
}
