//! 合成画像による `Vision` 実装
//!
//! 升ごとに駒の絵柄番号・上下の向き・ノイズ量だけを持つ画像。
//! 棋譜の再生やテストでカメラの代わりに使う。

use kifucam_core::{Color, Piece, Position, Square, SquareSet};

use super::Vision;

/// 手や影で隠れた升の絵柄
pub const OCCLUDED: u16 = u16::MAX;

/// 1升分の画像
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tile {
    /// 0は空升
    pub glyph: u16,
    /// 駒が逆さ（後手向き）に写っている
    pub inverted: bool,
    pub noise: u8,
}

impl Tile {
    pub const EMPTY: Tile = Tile {
        glyph: 0,
        inverted: false,
        noise: 0,
    };

    /// 正位置のカメラで写した駒
    pub fn of(piece: Option<Piece>) -> Tile {
        match piece {
            Some(pc) => Tile {
                glyph: 1 + pc.type_index() as u16,
                inverted: pc.color() == Color::White,
                noise: 0,
            },
            None => Tile::EMPTY,
        }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.glyph == 0
    }

    fn rotated(self) -> Tile {
        if self.is_empty() {
            return self;
        }
        Tile {
            inverted: !self.inverted,
            ..self
        }
    }

    fn similarity(self, other: Tile) -> f32 {
        if self.glyph != other.glyph {
            return if self.is_empty() || other.is_empty() {
                0.0
            } else {
                0.2
            };
        }
        if self.inverted != other.inverted {
            return 0.5;
        }
        let diff = f32::from(self.noise.abs_diff(other.noise));
        (1.0 - 0.05 * diff).max(0.0)
    }
}

/// 盤面全体（81升）または切り出した1升の画像
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticImage {
    tiles: Vec<Tile>,
}

impl SyntheticImage {
    /// 局面を正位置のカメラで写した盤面画像
    pub fn render(pos: &Position) -> Self {
        SyntheticImage {
            tiles: Square::all().map(|sq| Tile::of(pos.piece_on(sq))).collect(),
        }
    }

    /// 1升分の画像
    pub fn single(tile: Tile) -> Self {
        SyntheticImage { tiles: vec![tile] }
    }

    #[inline]
    pub fn is_board(&self) -> bool {
        self.tiles.len() == Square::NUM
    }

    /// 盤面画像の升 `sq`（1升画像ならNone）
    pub fn tile(&self, sq: Square) -> Option<Tile> {
        if !self.is_board() {
            return None;
        }
        self.tiles.get(sq.index()).copied()
    }

    pub fn set_tile(&mut self, sq: Square, tile: Tile) {
        if self.is_board() {
            self.tiles[sq.index()] = tile;
        }
    }

    /// 升 `sq` にノイズを乗せた画像
    pub fn with_noise(mut self, sq: Square, noise: u8) -> Self {
        if let Some(tile) = self.tile(sq) {
            self.set_tile(sq, Tile { noise, ..tile });
        }
        self
    }

    /// 升の集合を隠した画像
    pub fn occlude(mut self, squares: SquareSet) -> Self {
        for sq in squares.iter() {
            self.set_tile(
                sq,
                Tile {
                    glyph: OCCLUDED,
                    inverted: false,
                    noise: 0,
                },
            );
        }
        self
    }
}

/// 合成画像の処理系
#[derive(Debug, Clone, Copy)]
pub struct SyntheticVision {
    /// この類似度を下回った升を変化ありとする
    pub threshold: f32,
}

impl Default for SyntheticVision {
    fn default() -> Self {
        Self { threshold: 0.9 }
    }
}

impl Vision for SyntheticVision {
    type Image = SyntheticImage;

    fn crop_square(&self, board: &SyntheticImage, sq: Square) -> SyntheticImage {
        SyntheticImage::single(board.tile(sq).unwrap_or(Tile::EMPTY))
    }

    fn similarity(&self, a: &SyntheticImage, b: &SyntheticImage) -> f32 {
        if a.tiles.len() != b.tiles.len() || a.tiles.is_empty() {
            return 0.0;
        }
        let sum: f32 = a.tiles.iter().zip(&b.tiles).map(|(x, y)| x.similarity(*y)).sum();
        sum / a.tiles.len() as f32
    }

    fn changed_squares(&self, before: &SyntheticImage, after: &SyntheticImage) -> SquareSet {
        Square::all()
            .filter(|&sq| match (before.tile(sq), after.tile(sq)) {
                (Some(a), Some(b)) => a.similarity(b) < self.threshold,
                _ => true,
            })
            .collect()
    }

    fn rotate(&self, image: &SyntheticImage) -> SyntheticImage {
        SyntheticImage {
            tiles: image.tiles.iter().rev().map(|t| t.rotated()).collect(),
        }
    }
}
