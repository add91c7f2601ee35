//! 盤面撮影からの指し手推定
//!
//! - `vision`: 画像処理との境界（`Vision` トレイト）と合成画像の実装
//! - `book`: 駒画像帳（成り・打ち駒の判定に使う見本）
//! - `detect`: 変化した升からの指し手復元
//! - `stats`: 安定バースト・投票窓などのフレーム統計
//! - `tracker`: 指し手推定の状態機械
//! - `session`: 状態機械を所有するワーカースレッド
//! - `config`: TOML設定

pub mod book;
pub mod config;
pub mod detect;
pub mod error;
pub mod session;
pub mod stats;
pub mod tracker;
pub mod vision;

pub use book::{PieceBook, SimilarityRange};
pub use config::TrackerConfig;
pub use detect::{Confidence, Detection, detect};
pub use error::{ConfigError, DetectError, SessionError};
pub use session::{GameSnapshot, TrackerEvent, TrackerSession};
pub use tracker::{ConfirmedMove, Observation, Tracker, TrackerPhase, WaitReason};
pub use vision::{SyntheticImage, SyntheticVision, Tile, Vision};
