//! 歌词

use serde::{Deserialize, Serialize};

/// 生成的歌词
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lyrics {
    pub title: String,
    pub lyrics: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
}

impl Lyrics {
    /// 最少歌词行数
    pub const MIN_LINES: usize = 4;

    /// 标题非空且至少有 MIN_LINES 行非空歌词
    pub fn is_well_formed(&self) -> bool {
        !self.title.trim().is_empty() && self.line_count() >= Self::MIN_LINES
    }

    pub fn line_count(&self) -> usize {
        self.lyrics.lines().filter(|l| !l.trim().is_empty()).count()
    }
}
