//! 持ち駒（Hand）

use super::PieceKind;

/// 片方の手番の持ち駒（生駒の多重集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Hand {
    counts: [u8; 7],
}

impl Hand {
    pub const EMPTY: Hand = Hand { counts: [0; 7] };

    /// 駒種の枚数
    #[inline]
    pub fn count(&self, kind: PieceKind) -> u8 {
        kind.hand_index().map_or(0, |i| self.counts[i])
    }

    #[inline]
    pub fn has(&self, kind: PieceKind) -> bool {
        self.count(kind) > 0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }

    /// 1枚加える（玉は無視）
    pub fn add(&mut self, kind: PieceKind) {
        if let Some(i) = kind.hand_index() {
            self.counts[i] = self.counts[i].saturating_add(1);
        }
    }

    /// 1枚取り除く。持っていなければfalse。
    pub fn remove(&mut self, kind: PieceKind) -> bool {
        match kind.hand_index() {
            Some(i) if self.counts[i] > 0 => {
                self.counts[i] -= 1;
                true
            }
            _ => false,
        }
    }

    /// 1枚以上ある駒種（SFEN順）
    pub fn kinds(&self) -> impl Iterator<Item = PieceKind> + '_ {
        PieceKind::HAND_KINDS.into_iter().filter(|&k| self.has(k))
    }

    /// 駒種と枚数の組（SFEN順、0枚は除く）
    pub fn iter(&self) -> impl Iterator<Item = (PieceKind, u8)> + '_ {
        PieceKind::HAND_KINDS
            .into_iter()
            .map(|k| (k, self.count(k)))
            .filter(|&(_, n)| n > 0)
    }
}
