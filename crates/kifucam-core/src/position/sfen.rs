//! SFEN形式の解析・出力

use thiserror::Error;

use super::Position;
use crate::types::{Color, File, Piece, PieceKind, Rank, Square};

/// 平手初期局面のSFEN
pub const SFEN_HIRATE: &str = "lnsgkgsnl/1r5b1/ppppppppp/9/9/9/PPPPPPPPP/1B5R1/LNSGKGSNL b - 1";

/// SFEN解析エラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SfenError {
    #[error("SFEN must have board, side and hands fields: {0:?}")]
    MissingField(String),
    #[error("invalid board row {row}: {reason}")]
    InvalidBoard { row: usize, reason: String },
    #[error("invalid side to move: {0:?}")]
    InvalidSide(String),
    #[error("invalid hand: {0:?}")]
    InvalidHand(String),
    #[error("invalid ply: {0:?}")]
    InvalidPly(String),
}

/// SFENから復元した局面
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SfenPosition {
    pub position: Position,
    pub side_to_move: Color,
    pub ply: u32,
}

/// SFEN文字列（"sfen " 接頭辞は省略可）を解析する
pub fn parse_sfen(sfen: &str) -> Result<SfenPosition, SfenError> {
    let sfen = sfen.trim();
    let sfen = sfen.strip_prefix("sfen ").unwrap_or(sfen);
    let mut fields = sfen.split_whitespace();
    let (Some(board), Some(side), Some(hands)) = (fields.next(), fields.next(), fields.next())
    else {
        return Err(SfenError::MissingField(sfen.to_string()));
    };

    let mut position = Position::empty();
    parse_board(board, &mut position)?;

    let side_to_move = match side {
        "b" => Color::Black,
        "w" => Color::White,
        other => return Err(SfenError::InvalidSide(other.to_string())),
    };

    parse_hands(hands, &mut position)?;

    let ply = match fields.next() {
        Some(s) => s.parse::<u32>().map_err(|_| SfenError::InvalidPly(s.to_string()))?,
        None => 1,
    };

    Ok(SfenPosition {
        position,
        side_to_move,
        ply,
    })
}

fn parse_board(board: &str, position: &mut Position) -> Result<(), SfenError> {
    let rows: Vec<&str> = board.split('/').collect();
    if rows.len() != Rank::NUM {
        return Err(SfenError::InvalidBoard {
            row: rows.len(),
            reason: "expected 9 rows".to_string(),
        });
    }

    for (row, (text, rank)) in rows.iter().zip(Rank::ALL).enumerate() {
        let invalid = |reason: &str| SfenError::InvalidBoard {
            row: row + 1,
            reason: reason.to_string(),
        };
        // 9筋から1筋へ
        let mut file_idx: i32 = 8;
        let mut promoted = false;
        for c in text.chars() {
            if let Some(n) = c.to_digit(10) {
                if promoted || n == 0 {
                    return Err(invalid("unexpected digit"));
                }
                file_idx -= n as i32;
                continue;
            }
            if c == '+' {
                if promoted {
                    return Err(invalid("double '+'"));
                }
                promoted = true;
                continue;
            }
            let kind = PieceKind::from_sfen_char(c).ok_or_else(|| invalid("unknown piece"))?;
            let color = sfen_color(c);
            let Some(file) = u8::try_from(file_idx).ok().and_then(File::from_u8) else {
                return Err(invalid("too many squares"));
            };
            let mut piece = Piece::new(color, kind);
            if promoted {
                piece = piece.promote().ok_or_else(|| invalid("piece cannot promote"))?;
                promoted = false;
            }
            position.put_piece(Square::new(file, rank), piece);
            file_idx -= 1;
        }
        if promoted || file_idx != -1 {
            return Err(invalid("row does not cover 9 files"));
        }
    }
    Ok(())
}

/// SFENの駒文字の手番（大文字が先手）
fn sfen_color(c: char) -> Color {
    if c.is_ascii_uppercase() {
        Color::Black
    } else {
        Color::White
    }
}

fn parse_hands(hands: &str, position: &mut Position) -> Result<(), SfenError> {
    if hands == "-" {
        return Ok(());
    }
    let invalid = || SfenError::InvalidHand(hands.to_string());
    let mut count: Option<u32> = None;
    for c in hands.chars() {
        if let Some(d) = c.to_digit(10) {
            let next = count.unwrap_or(0).checked_mul(10).and_then(|n| n.checked_add(d));
            count = Some(next.ok_or_else(invalid)?);
            continue;
        }
        let kind = PieceKind::from_sfen_char(c)
            .filter(|&k| k != PieceKind::King)
            .ok_or_else(invalid)?;
        let color = sfen_color(c);
        let n = count.take().unwrap_or(1);
        // 盤上の駒と合わせた検査は行わず、駒種ごとの総数だけを上限とする
        let held = u32::from(position.hand(color).count(kind));
        if n == 0 || held.saturating_add(n) > u32::from(kind.total_count()) {
            return Err(invalid());
        }
        for _ in 0..n {
            position.hand_mut(color).add(kind);
        }
    }
    if count.is_some() {
        return Err(invalid());
    }
    Ok(())
}

impl Position {
    /// SFEN文字列に変換
    pub fn to_sfen(&self, side_to_move: Color, ply: u32) -> String {
        let mut board = String::new();
        for rank in Rank::ALL {
            if rank != Rank::Rank1 {
                board.push('/');
            }
            let mut empty = 0;
            for file in File::ALL.iter().rev() {
                match self.piece_on(Square::new(*file, rank)) {
                    Some(pc) => {
                        if empty > 0 {
                            board.push_str(&empty.to_string());
                            empty = 0;
                        }
                        board.push_str(&pc.to_sfen());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                board.push_str(&empty.to_string());
            }
        }

        let mut hands = String::new();
        for color in Color::ALL {
            for (kind, n) in self.hand(color).iter() {
                if n > 1 {
                    hands.push_str(&n.to_string());
                }
                hands.push_str(&Piece::new(color, kind).to_sfen());
            }
        }
        if hands.is_empty() {
            hands.push('-');
        }

        format!("{board} {} {hands} {ply}", side_to_move.to_sfen_char())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hirate_sfen_matches_constructor() {
        let parsed = parse_sfen(SFEN_HIRATE).unwrap();
        assert_eq!(parsed.position, Position::hirate());
        assert_eq!(parsed.side_to_move, Color::Black);
        assert_eq!(parsed.ply, 1);
        assert_eq!(Position::hirate().to_sfen(Color::Black, 1), SFEN_HIRATE);
    }

    #[test]
    fn test_sfen_with_promoted_and_hands() {
        let sfen = "8l/1+R5k1/9/9/4b4/9/9/9/K8 w 2Pgs 42";
        let parsed = parse_sfen(sfen).unwrap();
        let dragon = parsed.position.piece_on(Square::new(File::File8, Rank::Rank2));
        assert!(
            dragon.is_some_and(|p| p.is_dragon_or_horse() && p.color() == Color::Black)
        );
        assert_eq!(parsed.position.hand(Color::Black).count(PieceKind::Pawn), 2);
        assert_eq!(
            parsed.position.hand(Color::White).count(PieceKind::Silver),
            1
        );
        assert_eq!(
            parsed.position.to_sfen(parsed.side_to_move, parsed.ply),
            sfen
        );
    }

    #[test]
    fn test_invalid_sfen() {
        assert!(matches!(
            parse_sfen("9/9/9 b -"),
            Err(SfenError::InvalidBoard { .. })
        ));
        assert!(matches!(
            parse_sfen("9/9/9/9/9/9/9/9/8 b -"),
            Err(SfenError::InvalidBoard { row: 9, .. })
        ));
        assert!(matches!(
            parse_sfen("9/9/9/9/9/9/9/9/9 x -"),
            Err(SfenError::InvalidSide(_))
        ));
        assert!(matches!(
            parse_sfen("9/9/9/9/9/9/9/9/+G8 b -"),
            Err(SfenError::InvalidBoard { .. })
        ));
        assert!(matches!(
            parse_sfen("9/9/9/9/9/9/9/9/9 b 2K"),
            Err(SfenError::InvalidHand(_))
        ));
        let board = "4k4/9/9/9/9/9/9/9/4K4";
        for hands in [
            "99999999999P",
            "P4294967295P",
            "300P",
            "19P",
            "3B",
            "10P9P",
            "0P",
            "2",
        ] {
            let sfen = format!("{board} b {hands} 1");
            assert!(
                matches!(parse_sfen(&sfen), Err(SfenError::InvalidHand(_))),
                "{hands} should be rejected"
            );
        }
        let full = parse_sfen(&format!("{board} b 18P2b4g 1")).unwrap();
        assert_eq!(full.position.hand(Color::Black).count(PieceKind::Pawn), 18);
        assert_eq!(full.position.hand(Color::White).count(PieceKind::Gold), 4);
        assert!(matches!(
            parse_sfen("9/9/9/9/9/9/9/9/9"),
            Err(SfenError::MissingField(_))
        ));
    }
}
