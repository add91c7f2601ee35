//! 指し手推定の状態機械
//!
//! 盤面画像を1枚ずつ受け取り、以下の順で指し手を確定する。
//!
//! 1. 直前のフレームと比べて変化があれば無変化列をやり直し、投票を捨てる
//! 2. 無変化フレームが `stable_frames` 枚続いたら安定バーストとする
//! 3. 基準バーストがなければ記録して終わり
//! 4. 基準バーストと新しいバーストの全組み合わせで変化升を求める
//!    （変化なし・雑音・不一致ならそこで待つ）
//! 5. 変化升から指し手を復元し、同じ候補が `required_votes` 回続いたら確定する
//! 6. 初手が手前側に着地した場合はカメラが逆向きとみなして画像をすべて回転する
//!
//! どの段階で止まっても次のフレームを待つだけで、致命的な状態はない。

use kifucam_core::{Game, GameError, Move, MoveOutcome, NotationStyle, SquareSet};
use serde::{Deserialize, Serialize};

use crate::book::PieceBook;
use crate::config::TrackerConfig;
use crate::detect::{Confidence, Detection, detect};
use crate::error::{ConfigError, DetectError};
use crate::stats::{Burst, FrameStats};
use crate::vision::Vision;

/// 初手でカメラの向きを判定する境界（これ以下の段のインデックスに着地したら逆向き）
const NEAR_HALF_MAX_RANK_INDEX: usize = 4;

/// 状態機械の段階
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerPhase {
    /// 基準となる安定バーストがまだない
    Unstable,
    /// 基準バーストがあり、変化を待っている
    StableBaseline,
    /// 候補の指し手に投票中
    Tracking,
}

/// フレームを受け取っても指し手が確定しなかった理由
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitReason {
    /// 無変化フレームが揃っていない
    Unstable,
    /// 最初の基準バーストを記録した
    BaselineRecorded,
    /// 雑音の多い基準バーストを取り直した
    BaselineReplaced,
    /// 基準バーストから変化していない
    NoChange,
    /// 変化升が多すぎる（手や影が写り込んだ）
    Contaminated { changed: usize },
    /// バースト内で変化升の集合が一致しない
    Disagreement,
    ResolutionFailed(DetectError),
    /// 同じ候補の連続回数が足りない
    Debouncing { votes: usize, required: usize },
    /// 対局に適用できなかった
    Rejected(GameError),
}

/// 確定した指し手
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedMove {
    /// 取った駒・修飾語を埋めた指し手（正規の向きの座標）
    pub mv: Move,
    /// KIF表記
    pub notation: String,
    pub outcome: MoveOutcome,
    pub confidence: Confidence,
    /// この時点でカメラが逆向きと判定されているか
    pub flipped: bool,
}

/// 1フレームの処理結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    Waiting(WaitReason),
    Confirmed(ConfirmedMove),
}

impl Observation {
    /// 確定した指し手（待機中ならNone）
    pub fn confirmed(&self) -> Option<&ConfirmedMove> {
        match self {
            Observation::Confirmed(confirmed) => Some(confirmed),
            Observation::Waiting(_) => None,
        }
    }
}

/// 指し手推定器
///
/// 対局・駒画像帳・フレーム統計を所有し、`observe` だけが状態を進める。
pub struct Tracker<V: Vision> {
    vision: V,
    config: TrackerConfig,
    game: Game,
    book: PieceBook<V::Image>,
    stats: FrameStats<V::Image>,
    flipped: bool,
}

impl<V: Vision> Tracker<V> {
    /// 平手の初期局面から始める
    pub fn new(vision: V, config: TrackerConfig) -> Result<Self, ConfigError> {
        Self::with_game(vision, config, Game::new())
    }

    /// 任意の対局状態（駒落ち・途中局面など）から始める
    pub fn with_game(vision: V, config: TrackerConfig, game: Game) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Tracker {
            book: PieceBook::new(config.recent_exemplars),
            stats: FrameStats::new(config.stable_frames, config.max_bursts_kept),
            vision,
            config,
            game,
            flipped: false,
        })
    }

    #[inline]
    pub fn game(&self) -> &Game {
        &self.game
    }

    #[inline]
    pub fn book(&self) -> &PieceBook<V::Image> {
        &self.book
    }

    #[inline]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    #[inline]
    pub fn vision(&self) -> &V {
        &self.vision
    }

    /// カメラが逆向き（後手側から撮影）と判定済みか
    #[inline]
    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    pub fn phase(&self) -> TrackerPhase {
        if self.stats.baseline().is_none() {
            TrackerPhase::Unstable
        } else if self.stats.votes() > 0 {
            TrackerPhase::Tracking
        } else {
            TrackerPhase::StableBaseline
        }
    }

    /// フレーム履歴を捨てて基準盤面から取り直す（対局と駒画像帳は残す）
    pub fn rebaseline(&mut self) {
        log::info!("Re-baselining at ply {}", self.game.ply());
        self.stats.reset();
    }

    /// 盤面画像を1枚処理する
    pub fn observe(&mut self, image: V::Image) -> Observation {
        let image = if self.flipped {
            self.vision.rotate(&image)
        } else {
            image
        };

        let disturbed = self
            .stats
            .last_frame()
            .is_some_and(|prev| !self.vision.changed_squares(prev, &image).is_empty());
        if disturbed {
            if self.stats.votes() > 0 {
                log::debug!(
                    "Board disturbed while voting, discarding {} vote(s)",
                    self.stats.votes()
                );
            }
            self.stats.restart_run(image);
            return Observation::Waiting(WaitReason::Unstable);
        }
        self.stats.extend_run(image);

        let Some(burst) = self.stats.current_burst() else {
            return Observation::Waiting(WaitReason::Unstable);
        };
        let Some(baseline) = self.stats.baseline() else {
            log::info!("Baseline recorded");
            self.stats.push_baseline(burst);
            return Observation::Waiting(WaitReason::BaselineRecorded);
        };

        let diffs: Vec<SquareSet> = baseline
            .frames()
            .iter()
            .flat_map(|old| burst.frames().iter().map(move |new| (old, new)))
            .map(|(old, new)| self.vision.changed_squares(old, new))
            .collect();
        if diffs.iter().any(|changed| changed.is_empty()) {
            self.stats.clear_contamination();
            return Observation::Waiting(WaitReason::NoChange);
        }
        let widest = diffs.iter().map(|changed| changed.len()).max().unwrap_or(0);
        if widest > self.config.max_changed_squares {
            return self.contaminated(burst, widest);
        }
        let Some(&changed) = diffs.first() else {
            return Observation::Waiting(WaitReason::Unstable);
        };
        if diffs.iter().any(|d| *d != changed) {
            return Observation::Waiting(WaitReason::Disagreement);
        }

        let (Some(before), Some(after)) = (baseline.last(), burst.last()) else {
            return Observation::Waiting(WaitReason::Unstable);
        };
        let detected = detect(&self.vision, before, after, changed, &self.game, &self.book);
        let detection = match detected {
            Ok(detection) => detection,
            Err(e) => {
                log::debug!("Could not resolve change at {changed:?}: {e}");
                return Observation::Waiting(WaitReason::ResolutionFailed(e));
            }
        };
        self.stats.clear_contamination();

        let votes = self.stats.vote(detection.mv);
        if votes < self.config.required_votes {
            log::debug!(
                "Candidate {} ({votes}/{})",
                detection.mv.to_usi(),
                self.config.required_votes
            );
            return Observation::Waiting(WaitReason::Debouncing {
                votes,
                required: self.config.required_votes,
            });
        }
        self.accept(detection, burst, changed)
    }

    fn contaminated(&mut self, burst: Burst<V::Image>, changed: usize) -> Observation {
        if self.stats.burst_count() == 1 && self.game.ply() == 0 {
            log::warn!(
                "Initial baseline looks contaminated ({changed} squares differ), replacing it"
            );
            self.stats.replace_baseline(burst);
            self.stats.clear_votes();
            return Observation::Waiting(WaitReason::BaselineReplaced);
        }

        let count = self.stats.note_contamination();
        if let Some(limit) = self.config.rebaseline_after
            && count >= limit
        {
            log::warn!("{count} contaminated bursts in a row, replacing baseline");
            self.stats.replace_baseline(burst);
            self.stats.clear_votes();
            self.stats.clear_contamination();
            return Observation::Waiting(WaitReason::BaselineReplaced);
        }
        if count == 1 {
            log::warn!("Discarding contaminated burst ({changed} squares differ)");
        } else {
            log::debug!(
                "Discarding contaminated burst ({changed} squares differ, {count} in a row)"
            );
        }
        Observation::Waiting(WaitReason::Contaminated { changed })
    }

    fn accept(
        &mut self,
        mut detection: Detection,
        mut burst: Burst<V::Image>,
        changed: SquareSet,
    ) -> Observation {
        if self.config.detect_orientation
            && !self.flipped
            && self.game.ply() == 0
            && detection.mv.to().rank().index() <= NEAR_HALF_MAX_RANK_INDEX
            && let Some(flipped) = self.try_flip(&mut burst, changed)
        {
            detection = flipped;
        }

        let pre_position = self.game.position().clone();
        let pre_image = self.stats.baseline().and_then(Burst::last).cloned();
        let outcome = match self.game.apply(&detection.mv) {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!("Resolved move {} was rejected: {e}", detection.mv.to_usi());
                self.stats.clear_votes();
                return Observation::Waiting(WaitReason::Rejected(e));
            }
        };

        if let Some(pre_image) = pre_image {
            self.book.update(&self.vision, &pre_position, &pre_image);
        }
        if let Some(post_image) = burst.last() {
            self.book.update(&self.vision, self.game.position(), post_image);
        }
        self.stats.push_baseline(burst);
        self.stats.clear_votes();
        self.stats.clear_contamination();

        let index = self.game.ply() - 1;
        let mv = self.game.last_move().map_or(detection.mv, |applied| applied.mv);
        let notation = self.game.notation(index, NotationStyle::Kif).unwrap_or_default();
        log::info!("Confirmed move {}: {notation}", index + 1);
        if outcome != MoveOutcome::Ok {
            log::info!("Game ended by repetition: {outcome:?}");
        }
        Observation::Confirmed(ConfirmedMove {
            mv,
            notation,
            outcome,
            confidence: detection.confidence,
            flipped: self.flipped,
        })
    }

    /// 保持している画像をすべて180度回転して復元し直す
    ///
    /// 回転後に復元できなければ元に戻してNone。
    fn try_flip(&mut self, burst: &mut Burst<V::Image>, changed: SquareSet) -> Option<Detection> {
        let vision = &self.vision;
        let rotate = |image: &V::Image| vision.rotate(image);
        self.stats.map_images(rotate);
        burst.map_images(&rotate);

        let redetected = self
            .stats
            .baseline()
            .and_then(Burst::last)
            .zip(burst.last())
            .map(|(before, after)| {
                detect(vision, before, after, changed.inverse(), &self.game, &self.book)
            });
        match redetected {
            Some(Ok(detection)) => {
                log::info!("Camera faces the board from White's side, flipping orientation");
                self.flipped = true;
                Some(detection)
            }
            other => {
                if let Some(Err(e)) = other {
                    log::debug!("Rotated reading failed ({e}), keeping orientation");
                }
                self.stats.map_images(rotate);
                burst.map_images(&rotate);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::{SyntheticImage, SyntheticVision};
    use kifucam_core::position::parse_sfen;
    use kifucam_core::{Color, Piece, PieceKind, Position, Promotion, Square};

    fn sq(usi: &str) -> Square {
        Square::from_usi(usi).unwrap()
    }

    fn tracker() -> Tracker<SyntheticVision> {
        Tracker::new(SyntheticVision::default(), TrackerConfig::default()).unwrap()
    }

    fn feed(
        tracker: &mut Tracker<SyntheticVision>,
        image: &SyntheticImage,
        n: usize,
    ) -> Vec<Observation> {
        (0..n).map(|_| tracker.observe(image.clone())).collect()
    }

    fn moved(pos: &Position, from: &str, to: &str) -> Position {
        let mut next = pos.clone();
        if let Some(piece) = next.remove_piece(sq(from)) {
            next.put_piece(sq(to), piece);
        }
        next
    }

    fn debouncing(votes: usize) -> Observation {
        Observation::Waiting(WaitReason::Debouncing { votes, required: 3 })
    }

    #[test]
    fn test_baseline_after_stable_frames() {
        let mut tracker = tracker();
        let image = SyntheticImage::render(&Position::hirate());
        assert_eq!(tracker.phase(), TrackerPhase::Unstable);
        let obs = feed(&mut tracker, &image, 4);
        assert_eq!(obs[0], Observation::Waiting(WaitReason::Unstable));
        assert_eq!(obs[1], Observation::Waiting(WaitReason::Unstable));
        assert_eq!(obs[2], Observation::Waiting(WaitReason::BaselineRecorded));
        assert_eq!(obs[3], Observation::Waiting(WaitReason::NoChange));
        assert_eq!(tracker.phase(), TrackerPhase::StableBaseline);
    }

    #[test]
    fn test_votes_and_disturbance_reset() {
        let mut tracker = tracker();
        let pos = Position::hirate();
        let after = SyntheticImage::render(&moved(&pos, "7g", "7f"));
        feed(&mut tracker, &SyntheticImage::render(&pos), 3);

        let obs = feed(&mut tracker, &after, 4);
        assert_eq!(obs[2], debouncing(1));
        assert_eq!(obs[3], debouncing(2));
        assert_eq!(tracker.phase(), TrackerPhase::Tracking);

        // 手が写り込んだら投票はやり直し
        let hand = after.clone().occlude([Square::SQ_55].into_iter().collect());
        assert_eq!(
            tracker.observe(hand),
            Observation::Waiting(WaitReason::Unstable)
        );
        assert_eq!(tracker.phase(), TrackerPhase::StableBaseline);

        let obs = feed(&mut tracker, &after, 5);
        assert!(obs[..4].iter().all(|o| o.confirmed().is_none()));
        assert_eq!(obs[3], debouncing(2));
        let confirmed = obs[4].confirmed().unwrap();
        assert_eq!(confirmed.notation, "▲７六歩(77)");
        assert_eq!(confirmed.confidence, Confidence::Exact);
        assert!(!confirmed.flipped);
        assert_eq!(tracker.game().ply(), 1);
        assert_eq!(tracker.phase(), TrackerPhase::StableBaseline);

        // 確定後は新しい基準盤面と比べる
        assert_eq!(
            tracker.observe(after),
            Observation::Waiting(WaitReason::NoChange)
        );
    }

    #[test]
    fn test_changed_candidate_restarts_debounce() {
        let config = TrackerConfig {
            detect_orientation: false,
            ..TrackerConfig::default()
        };
        let pos = parse_sfen("k8/9/9/7S1/9/9/9/9/8K w - 1").unwrap().position;
        let game = Game::from_position(pos.clone(), Some(Color::White));
        let mut tracker = Tracker::with_game(SyntheticVision::default(), config, game).unwrap();

        // 2四の銀に少しノイズが乗った基準盤面から後手玉が動き、
        // 銀の見本どうしの類似度（ノイズ差1）が駒画像帳に入る
        let start = SyntheticImage::render(&pos).with_noise(sq("2d"), 1);
        feed(&mut tracker, &start, 3);
        let after_king = moved(&pos, "9a", "8a");
        let confirmed = feed(&mut tracker, &SyntheticImage::render(&after_king), 5);
        assert!(confirmed[4].confirmed().is_some());

        // 2三の銀はノイズ1なら不成、ノイズ2なら成りと読める。
        // フレーム間のノイズ差は1なので盤面の変化とはみなされない
        let after_silver = SyntheticImage::render(&moved(&after_king, "2d", "2c"));
        let landed = |noise| after_silver.clone().with_noise(sq("2c"), noise);
        let mut obs = feed(&mut tracker, &landed(1), 4);
        obs.push(tracker.observe(landed(2)));
        obs.extend(feed(&mut tracker, &landed(1), 3));

        assert_eq!(obs[3], debouncing(2));
        // 別の候補が割り込むと連続回数は1から数え直す
        assert_eq!(obs[4], debouncing(1));
        assert_eq!(obs[5], debouncing(1));
        assert_eq!(obs[6], debouncing(2));
        let confirmed = obs[7].confirmed().unwrap();
        assert_eq!(confirmed.mv.promotion(), Promotion::Decline);
        assert_eq!(confirmed.notation, "▲２三銀不成(24)");
        assert_eq!(tracker.game().ply(), 2);
    }

    #[test]
    fn test_disagreement_within_burst() {
        let parsed = parse_sfen("4k4/9/9/9/9/9/9/9/4K4 b G 1").unwrap();
        let game = Game::from_position(parsed.position.clone(), Some(Color::Black));
        let config = TrackerConfig::default();
        let mut tracker = Tracker::with_game(SyntheticVision::default(), config, game).unwrap();
        feed(&mut tracker, &SyntheticImage::render(&parsed.position), 3);

        let mut dropped = parsed.position.clone();
        dropped.put_piece(Square::SQ_55, Piece::new(Color::Black, PieceKind::Gold));
        let after = SyntheticImage::render(&dropped);
        // 1一のノイズが少しずつ増え、フレーム間では変化なし・基準とは変化ありになる
        let frames = [1, 2, 3].map(|n| after.clone().with_noise(Square::SQ_11, n));
        let obs: Vec<Observation> = frames.into_iter().map(|f| tracker.observe(f)).collect();
        assert_eq!(obs[2], Observation::Waiting(WaitReason::Disagreement));
    }

    #[test]
    fn test_contaminated_initial_baseline_is_replaced() {
        let mut tracker = tracker();
        let pos = Position::hirate();
        let clean = SyntheticImage::render(&pos);
        let hidden: SquareSet = [Square::SQ_11, Square::SQ_55, Square::SQ_99]
            .into_iter()
            .collect();
        feed(&mut tracker, &clean.clone().occlude(hidden), 3);

        let obs = feed(&mut tracker, &clean, 3);
        assert_eq!(obs[2], Observation::Waiting(WaitReason::BaselineReplaced));
        assert_eq!(
            tracker.observe(clean),
            Observation::Waiting(WaitReason::NoChange)
        );
    }

    #[test]
    fn test_contamination_after_first_move() {
        let config = TrackerConfig {
            rebaseline_after: Some(2),
            ..TrackerConfig::default()
        };
        let mut tracker = Tracker::new(SyntheticVision::default(), config).unwrap();
        let pos = Position::hirate();
        let after = SyntheticImage::render(&moved(&pos, "7g", "7f"));
        feed(&mut tracker, &SyntheticImage::render(&pos), 3);
        assert!(feed(&mut tracker, &after, 5)[4].confirmed().is_some());

        let hidden: SquareSet = [Square::SQ_11, Square::SQ_55, Square::SQ_99]
            .into_iter()
            .collect();
        let obs = feed(&mut tracker, &after.clone().occlude(hidden), 4);
        assert_eq!(
            obs[2],
            Observation::Waiting(WaitReason::Contaminated { changed: 3 })
        );
        assert_eq!(obs[3], Observation::Waiting(WaitReason::BaselineReplaced));
        assert_eq!(tracker.game().ply(), 1);
    }

    #[test]
    fn test_rebaseline_clears_frames() {
        let mut tracker = tracker();
        feed(&mut tracker, &SyntheticImage::render(&Position::hirate()), 3);
        assert_eq!(tracker.phase(), TrackerPhase::StableBaseline);
        tracker.rebaseline();
        assert_eq!(tracker.phase(), TrackerPhase::Unstable);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = TrackerConfig {
            stable_frames: 0,
            ..TrackerConfig::default()
        };
        assert!(Tracker::new(SyntheticVision::default(), config).is_err());
    }
}
