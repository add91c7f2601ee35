//! 筋（File）

/// 筋（1筋〜9筋）
///
/// 0が1筋。先手から見て右端で、盤面画像では右端に写る。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum File {
    File1 = 0,
    File2 = 1,
    File3 = 2,
    File4 = 3,
    File5 = 4,
    File6 = 5,
    File7 = 6,
    File8 = 7,
    File9 = 8,
}

/// 筋ごとの表記（USI文字, 全角数字）
const LABELS: [(char, char); File::NUM] = [
    ('1', '１'),
    ('2', '２'),
    ('3', '３'),
    ('4', '４'),
    ('5', '５'),
    ('6', '６'),
    ('7', '７'),
    ('8', '８'),
    ('9', '９'),
];

impl File {
    pub const NUM: usize = 9;

    pub const ALL: [File; File::NUM] = [
        File::File1,
        File::File2,
        File::File3,
        File::File4,
        File::File5,
        File::File6,
        File::File7,
        File::File8,
        File::File9,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn from_u8(n: u8) -> Option<File> {
        match n {
            0..=8 => Some(File::ALL[n as usize]),
            _ => None,
        }
    }

    /// 盤を180度回したときの筋
    #[inline]
    pub const fn flip(self) -> File {
        File::ALL[File::NUM - 1 - self.index()]
    }

    #[inline]
    pub const fn to_usi_char(self) -> char {
        LABELS[self.index()].0
    }

    pub fn from_usi_char(c: char) -> Option<File> {
        File::ALL.into_iter().find(|f| f.to_usi_char() == c)
    }

    /// 全角数字（KIF表記）
    #[inline]
    pub const fn to_zenkaku(self) -> char {
        LABELS[self.index()].1
    }
}
