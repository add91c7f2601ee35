//! 画像処理との境界
//!
//! トラッカーは盤面画像の中身を知らず、このトレイト越しに升の切り出し・類似度・差分だけを使う。

mod synthetic;

pub use synthetic::{OCCLUDED, SyntheticImage, SyntheticVision, Tile};

use kifucam_core::{Square, SquareSet};

/// 画像処理の実装
pub trait Vision {
    /// 盤面全体または1升分の画像
    type Image: Clone;

    /// 盤面画像から升 `sq` の領域を切り出す
    fn crop_square(&self, board: &Self::Image, sq: Square) -> Self::Image;

    /// 類似度（0.0〜1.0、1.0で同一）
    fn similarity(&self, a: &Self::Image, b: &Self::Image) -> f32;

    /// 升ごとの類似度がしきい値を下回った升の集合
    fn changed_squares(&self, before: &Self::Image, after: &Self::Image) -> SquareSet;

    /// 180度回転した画像
    fn rotate(&self, image: &Self::Image) -> Self::Image;
}
