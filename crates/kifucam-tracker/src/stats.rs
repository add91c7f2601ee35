//! 状態機械のフレーム統計
//!
//! - 連続無変化フレームの列（変化があれば捨てる）
//! - 確定した安定バーストの履歴（最新が比較の基準）
//! - 指し手候補の投票窓
//! - 雑音バーストの連続回数

use std::collections::VecDeque;

use kifucam_core::Move;

/// 安定バースト（連続した無変化フレーム）
#[derive(Debug, Clone)]
pub struct Burst<I> {
    frames: Vec<I>,
}

impl<I> Burst<I> {
    #[inline]
    pub fn frames(&self) -> &[I] {
        &self.frames
    }

    /// 最新のフレーム
    #[inline]
    pub fn last(&self) -> Option<&I> {
        self.frames.last()
    }

    /// 向きの反転用
    pub(crate) fn map_images(&mut self, f: &impl Fn(&I) -> I) {
        for frame in &mut self.frames {
            *frame = f(frame);
        }
    }
}

#[derive(Debug, Clone)]
pub struct FrameStats<I> {
    run: VecDeque<I>,
    bursts: VecDeque<Burst<I>>,
    votes: Vec<Move>,
    contaminated: usize,
    stable_frames: usize,
    max_bursts: usize,
}

impl<I: Clone> FrameStats<I> {
    pub fn new(stable_frames: usize, max_bursts: usize) -> Self {
        FrameStats {
            run: VecDeque::with_capacity(stable_frames),
            bursts: VecDeque::new(),
            votes: Vec::new(),
            contaminated: 0,
            stable_frames: stable_frames.max(1),
            max_bursts: max_bursts.max(1),
        }
    }

    /// 直前に受け取ったフレーム
    #[inline]
    pub fn last_frame(&self) -> Option<&I> {
        self.run.back()
    }

    /// 変化のあったフレームから無変化列をやり直す（投票も捨てる）
    pub fn restart_run(&mut self, frame: I) {
        self.run.clear();
        self.run.push_back(frame);
        self.votes.clear();
    }

    /// 無変化フレームを列に足す（直近 `stable_frames` 枚だけ残す）
    pub fn extend_run(&mut self, frame: I) {
        if self.run.len() >= self.stable_frames {
            self.run.pop_front();
        }
        self.run.push_back(frame);
    }

    /// 直近の無変化フレームが揃っていれば、それを安定バーストとして返す
    pub fn current_burst(&self) -> Option<Burst<I>> {
        (self.run.len() >= self.stable_frames).then(|| Burst {
            frames: self.run.iter().cloned().collect(),
        })
    }

    /// 比較の基準となる最新の安定バースト
    #[inline]
    pub fn baseline(&self) -> Option<&Burst<I>> {
        self.bursts.back()
    }

    #[inline]
    pub fn burst_count(&self) -> usize {
        self.bursts.len()
    }

    /// 安定バーストを履歴に積む（古いものから捨てる）
    pub fn push_baseline(&mut self, burst: Burst<I>) {
        if self.bursts.len() >= self.max_bursts {
            self.bursts.pop_front();
        }
        self.bursts.push_back(burst);
    }

    /// 最新の安定バーストを置き換える
    pub fn replace_baseline(&mut self, burst: Burst<I>) {
        self.bursts.pop_back();
        self.bursts.push_back(burst);
    }

    /// 候補に投票し、同じ候補が連続した回数を返す
    ///
    /// 直前の候補と違えば窓をその候補だけにする。
    pub fn vote(&mut self, mv: Move) -> usize {
        if self.votes.last().is_some_and(|last| *last != mv) {
            self.votes.clear();
        }
        self.votes.push(mv);
        self.votes.len()
    }

    #[inline]
    pub fn votes(&self) -> usize {
        self.votes.len()
    }

    pub fn clear_votes(&mut self) {
        self.votes.clear();
    }

    /// 雑音バーストを数え、連続回数を返す
    pub fn note_contamination(&mut self) -> usize {
        self.contaminated += 1;
        self.contaminated
    }

    pub fn clear_contamination(&mut self) {
        self.contaminated = 0;
    }

    /// 保持しているすべての画像に `f` を適用する（向きの反転用）
    pub fn map_images(&mut self, f: impl Fn(&I) -> I) {
        for frame in &mut self.run {
            *frame = f(frame);
        }
        for burst in &mut self.bursts {
            burst.map_images(&f);
        }
    }

    /// すべて捨てて基準盤面の取り直しから始める
    pub fn reset(&mut self) {
        self.run.clear();
        self.bursts.clear();
        self.votes.clear();
        self.contaminated = 0;
    }
}
