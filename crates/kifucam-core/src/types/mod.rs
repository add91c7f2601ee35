//! 基本型

mod color;
mod file;
mod hand;
pub mod json;
mod moves;
mod piece;
mod rank;
mod square;
mod square_set;

pub use color::Color;
pub use file::File;
pub use hand::Hand;
pub use moves::{Move, Promotion};
pub use piece::{Piece, PieceKind};
pub use rank::Rank;
pub use square::Square;
pub use square_set::SquareSet;
