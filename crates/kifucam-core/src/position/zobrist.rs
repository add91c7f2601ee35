//! Zobristハッシュ（千日手判定用の局面キー）

use std::sync::OnceLock;

use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use super::Position;
use crate::types::{Color, Piece, Square};

/// 持ち駒1種あたりの最大枚数（歩18枚）+1
const HAND_SLOTS: usize = 19;

struct ZobristTable {
    psq: [[[u64; Square::NUM]; Piece::TYPE_NUM]; Color::NUM],
    hand: [[[u64; HAND_SLOTS]; 7]; Color::NUM],
    side: u64,
}

static ZOBRIST: OnceLock<ZobristTable> = OnceLock::new();

fn zobrist() -> &'static ZobristTable {
    ZOBRIST.get_or_init(ZobristTable::new)
}

impl ZobristTable {
    fn new() -> Self {
        // 固定シードで毎回同じ表を作る
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0x6b69_6675_6361_6d00);
        let mut psq = [[[0u64; Square::NUM]; Piece::TYPE_NUM]; Color::NUM];
        for table in psq.iter_mut().flatten() {
            for key in table.iter_mut() {
                *key = rng.next_u64();
            }
        }
        let mut hand = [[[0u64; HAND_SLOTS]; 7]; Color::NUM];
        for table in hand.iter_mut().flatten() {
            // 0枚のキーは0（持ち駒なしは寄与しない）
            for key in table.iter_mut().skip(1) {
                *key = rng.next_u64();
            }
        }
        let side = rng.next_u64();
        ZobristTable { psq, hand, side }
    }
}

impl Position {
    /// 盤面・持ち駒・手番を合わせた局面キー
    pub fn key(&self, side_to_move: Color) -> u64 {
        let table = zobrist();
        let mut key = 0u64;
        for (sq, pc) in self.pieces() {
            key ^= table.psq[pc.color().index()][pc.type_index()][sq.index()];
        }
        for color in Color::ALL {
            for (kind, n) in self.hand(color).iter() {
                if let Some(i) = kind.hand_index() {
                    key ^= table.hand[color.index()][i][usize::from(n).min(HAND_SLOTS - 1)];
                }
            }
        }
        if side_to_move == Color::White {
            key ^= table.side;
        }
        key
    }
}
