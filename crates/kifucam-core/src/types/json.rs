use serde::{Deserialize, Serialize};

use super::{Color, File, Hand, PieceKind, Rank, Square};
use crate::position::Position;

/// 表示層に渡す駒のJSON表現
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PieceJson {
    /// "sente" | "gote"
    pub owner: String,
    /// "K" | "R" | "B" | "G" | "S" | "N" | "L" | "P"
    #[serde(rename = "type")]
    pub piece_type: String,
    /// 成駒かどうか
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promoted: Option<bool>,
}

/// 盤面の1マス
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CellJson {
    /// "9a" ~ "1i" 形式
    pub square: String,
    /// 駒（存在しない場合はnull）
    pub piece: Option<PieceJson>,
}

/// 持ち駒
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct HandJson {
    #[serde(rename = "P", skip_serializing_if = "Option::is_none")]
    pub pawn: Option<u32>,
    #[serde(rename = "L", skip_serializing_if = "Option::is_none")]
    pub lance: Option<u32>,
    #[serde(rename = "N", skip_serializing_if = "Option::is_none")]
    pub knight: Option<u32>,
    #[serde(rename = "S", skip_serializing_if = "Option::is_none")]
    pub silver: Option<u32>,
    #[serde(rename = "G", skip_serializing_if = "Option::is_none")]
    pub gold: Option<u32>,
    #[serde(rename = "B", skip_serializing_if = "Option::is_none")]
    pub bishop: Option<u32>,
    #[serde(rename = "R", skip_serializing_if = "Option::is_none")]
    pub rook: Option<u32>,
}

impl From<&Hand> for HandJson {
    fn from(hand: &Hand) -> Self {
        let get = |kind| match hand.count(kind) {
            0 => None,
            n => Some(u32::from(n)),
        };
        HandJson {
            pawn: get(PieceKind::Pawn),
            lance: get(PieceKind::Lance),
            knight: get(PieceKind::Knight),
            silver: get(PieceKind::Silver),
            gold: get(PieceKind::Gold),
            bishop: get(PieceKind::Bishop),
            rook: get(PieceKind::Rook),
        }
    }
}

/// 両者の持ち駒
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HandsJson {
    pub sente: HandJson,
    pub gote: HandJson,
}

/// 盤面全体の状態
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoardStateJson {
    /// 9x9のセル配列（行: 1段〜9段、列: 9筋〜1筋。盤を先手側から見た並び）
    pub cells: Vec<Vec<CellJson>>,
    /// 持ち駒
    pub hands: HandsJson,
    /// 手番: "sente" | "gote"（初手前で未定ならnull）
    pub turn: Option<String>,
    /// 手数（省略可）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ply: Option<i32>,
}

fn owner_label(color: Color) -> String {
    match color {
        Color::Black => "sente".to_string(),
        Color::White => "gote".to_string(),
    }
}

impl BoardStateJson {
    pub fn from_position(pos: &Position, turn: Option<Color>, ply: Option<i32>) -> Self {
        let cells = Rank::ALL
            .iter()
            .map(|&rank| {
                File::ALL
                    .iter()
                    .rev()
                    .map(|&file| {
                        let sq = Square::new(file, rank);
                        CellJson {
                            square: sq.to_usi(),
                            piece: pos.piece_on(sq).map(|pc| PieceJson {
                                owner: owner_label(pc.color()),
                                piece_type: pc.kind().to_sfen_char().to_string(),
                                promoted: pc.is_promoted().then_some(true),
                            }),
                        }
                    })
                    .collect()
            })
            .collect();
        BoardStateJson {
            cells,
            hands: HandsJson {
                sente: HandJson::from(pos.hand(Color::Black)),
                gote: HandJson::from(pos.hand(Color::White)),
            },
            turn: turn.map(owner_label),
            ply,
        }
    }
}
