//! 駒画像帳
//!
//! 駒種（成りを区別）ごとに、最初に見た画像と直近の画像を手番別に保持する。
//! 画像はすべて先手向きに揃えて保存し、同種の見本どうしの類似度の範囲も記録する。
//! 照合専用で、ルール判定には使わない。

use std::collections::VecDeque;

use kifucam_core::{Color, Piece, Position};

use crate::vision::Vision;

/// 同種の見本どうしの類似度の範囲
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityRange {
    pub min: f32,
    pub max: f32,
}

impl SimilarityRange {
    fn include(range: Option<SimilarityRange>, value: f32) -> SimilarityRange {
        match range {
            Some(r) => SimilarityRange {
                min: r.min.min(value),
                max: r.max.max(value),
            },
            None => SimilarityRange {
                min: value,
                max: value,
            },
        }
    }
}

/// 1駒種分の見本
#[derive(Debug, Clone)]
struct BookEntry<I> {
    initial: [Option<I>; Color::NUM],
    recent: [VecDeque<I>; Color::NUM],
    self_similarity: Option<SimilarityRange>,
}

impl<I> BookEntry<I> {
    fn new() -> Self {
        BookEntry {
            initial: [None, None],
            recent: [VecDeque::new(), VecDeque::new()],
            self_similarity: None,
        }
    }

    /// 優先順: 同じ手番の初見 → 相手の初見 → 同じ手番の直近 → 相手の直近
    fn exemplars(&self, color: Color) -> impl Iterator<Item = &I> {
        let (own, other) = (color.index(), color.opponent().index());
        self.initial[own]
            .iter()
            .chain(self.initial[other].iter())
            .chain(self.recent[own].iter())
            .chain(self.recent[other].iter())
    }
}

/// 駒画像帳
#[derive(Debug, Clone)]
pub struct PieceBook<I> {
    entries: Vec<BookEntry<I>>,
    recent_capacity: usize,
}

impl<I: Clone> PieceBook<I> {
    pub fn new(recent_capacity: usize) -> Self {
        PieceBook {
            entries: (0..Piece::TYPE_NUM).map(|_| BookEntry::new()).collect(),
            recent_capacity: recent_capacity.max(1),
        }
    }

    /// 切り出した駒画像を登録する（後手の駒は回転して向きを揃える）
    pub fn push<V: Vision<Image = I>>(&mut self, vision: &V, piece: Piece, crop: &I) {
        let normalized = match piece.color() {
            Color::Black => crop.clone(),
            Color::White => vision.rotate(crop),
        };
        let entry = &mut self.entries[piece.type_index()];

        let mut range = entry.self_similarity;
        for exemplar in entry.exemplars(Color::Black) {
            range = Some(SimilarityRange::include(range, vision.similarity(exemplar, &normalized)));
        }
        entry.self_similarity = range;

        let side = piece.color().index();
        if entry.initial[side].is_none() {
            entry.initial[side] = Some(normalized);
            return;
        }
        let recent = &mut entry.recent[side];
        if recent.len() >= self.recent_capacity {
            recent.pop_front();
        }
        recent.push_back(normalized);
    }

    /// 盤上のすべての駒を `board` 画像から切り出して登録する
    pub fn update<V: Vision<Image = I>>(&mut self, vision: &V, position: &Position, board: &I) {
        for (sq, piece) in position.pieces() {
            let crop = vision.crop_square(board, sq);
            self.push(vision, piece, &crop);
        }
    }

    /// `piece` の見本（先手向き）を優先順に返す
    pub fn exemplars(&self, piece: Piece) -> impl Iterator<Item = &I> {
        self.entries[piece.type_index()].exemplars(piece.color())
    }

    /// `piece` の見本どうしの類似度の範囲（見本が2枚未満ならNone）
    pub fn self_similarity(&self, piece: Piece) -> Option<SimilarityRange> {
        self.entries[piece.type_index()].self_similarity
    }

    pub fn has_exemplar(&self, piece: Piece) -> bool {
        self.exemplars(piece).next().is_some()
    }

    /// `crop`（`color` の駒として写った画像）に最も似た候補と類似度
    ///
    /// 見本のない候補は無視する。どの候補にも見本がなければNone。
    pub fn best_match<V: Vision<Image = I>>(
        &self,
        vision: &V,
        crop: &I,
        color: Color,
        candidates: impl IntoIterator<Item = Piece>,
    ) -> Option<(Piece, f32)> {
        let normalized = match color {
            Color::Black => crop.clone(),
            Color::White => vision.rotate(crop),
        };
        let mut best: Option<(Piece, f32)> = None;
        for piece in candidates {
            let score = self
                .exemplars(piece)
                .map(|ex| vision.similarity(ex, &normalized))
                .fold(None, |acc: Option<f32>, s| Some(acc.map_or(s, |a| a.max(s))));
            let Some(score) = score else { continue };
            if best.is_none_or(|(_, b)| score > b) {
                best = Some((piece, score));
            }
        }
        best
    }
}
