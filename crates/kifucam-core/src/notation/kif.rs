//! 指し手の文字列表記（KIF・KI2・西洋式・USI）

use super::Suffix;
use crate::types::{Move, Promotion, Square};

/// 表記形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotationStyle {
    /// KIF形式（"▲７六歩(77)"）。移動元を括弧で付ける。
    #[default]
    Kif,
    /// KI2形式（"▲７六歩"）。移動元の代わりに修飾語で区別する。
    Ki2,
    /// 西洋式（"☗P-7f"）
    Western,
    /// USI（"7g7f"）
    Usi,
}

/// 指し手を文字列にする
///
/// `prev_to` は直前の指し手の移動先（"同" 表記の判定用）。
/// 修飾語は `mv.suffix()` に決定済みであること。
pub fn format_move(mv: &Move, prev_to: Option<Square>, style: NotationStyle) -> String {
    match style {
        NotationStyle::Kif => format_kif(mv, prev_to, false),
        NotationStyle::Ki2 => format_kif(mv, prev_to, true),
        NotationStyle::Western => format_western(mv),
        NotationStyle::Usi => mv.to_usi(),
    }
}

fn format_kif(mv: &Move, prev_to: Option<Square>, ki2: bool) -> String {
    let piece = mv.moved_piece().kanji();
    let mut s = String::new();
    s.push(mv.color().kif_mark());
    if prev_to == Some(mv.to()) {
        // 1文字の駒名は全角空白で桁を揃える
        let same = if piece.chars().count() == 1 {
            "同　"
        } else {
            "同"
        };
        s.push_str(same);
    } else {
        s.push_str(&mv.to().to_kif());
    }
    s.push_str(piece);

    if ki2 {
        s.push_str(&mv.suffix().kanji());
    }
    match mv.promotion() {
        Promotion::Promote => s.push('成'),
        Promotion::Decline => s.push_str("不成"),
        Promotion::NotApplicable => {}
    }
    if !ki2 {
        match mv.from() {
            Some(from) => {
                s.push('(');
                s.push_str(&from.to_digits());
                s.push(')');
            }
            None => s.push('打'),
        }
    }
    s
}

fn format_western(mv: &Move) -> String {
    let mut s = String::new();
    s.push(mv.color().piece_mark());
    s.push_str(&mv.moved_piece().to_western());
    match mv.from() {
        None => s.push('*'),
        Some(from) => {
            // 曖昧なときだけ移動元を書く
            if !mv.suffix().is_none() && mv.suffix() != Suffix::DROP {
                s.push_str(&from.to_usi());
            }
            s.push(if mv.captured().is_some() { 'x' } else { '-' });
        }
    }
    s.push_str(&mv.to().to_usi());
    match mv.promotion() {
        Promotion::Promote => s.push('+'),
        Promotion::Decline => s.push('='),
        Promotion::NotApplicable => {}
    }
    s
}
