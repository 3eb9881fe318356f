//! 背景音乐与音效
//!
//! 选择记录引用外部音频目录中的资源（musicPath / effectPath），
//! 音频生成后补充对象存储 URL 与实测时长

use serde::{Deserialize, Serialize};

/// 每页假定的朗读时长（秒），音效位置按 0–10 刻度映射到该窗口
pub const READING_WINDOW_SECS: f64 = 15.0;

/// 音效位置刻度上限
pub const POSITION_SCALE_MAX: f64 = 10.0;

/// 音频合成服务的时长上限（秒）
pub const MAX_AUDIO_SECS: f64 = 22.0;

/// 音效最短时长（秒）
pub const MIN_EFFECT_SECS: f64 = 0.5;

/// 向量检索返回的目录候选
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogCandidate {
    pub path: String,
    pub score: f32,
    #[serde(default)]
    pub description: String,
}

/// 背景音乐选择
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundMusic {
    pub page_key: i64,
    pub music_path: String,
    pub score: f32,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
}

impl BackgroundMusic {
    pub fn from_candidate(page_key: i64, candidate: &CatalogCandidate, reason: impl Into<String>) -> Self {
        Self {
            page_key,
            music_path: candidate.path.clone(),
            score: candidate.score,
            reason: reason.into(),
            description: non_empty(&candidate.description),
            url: None,
            duration: None,
        }
    }

    /// 零置信度占位（该页选择失败时使用）
    pub fn unselected(page_key: i64, reason: impl Into<String>) -> Self {
        Self {
            page_key,
            music_path: String::new(),
            score: 0.0,
            reason: reason.into(),
            description: None,
            url: None,
            duration: None,
        }
    }

    pub fn is_selected(&self) -> bool {
        !self.music_path.is_empty()
    }

    pub fn prompt_text(&self) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| path_stem(&self.music_path))
    }
}

/// 音效选择
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundEffect {
    pub page_key: i64,
    pub effect_path: String,
    pub score: f32,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub position: Option<EffectPosition>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
}

impl SoundEffect {
    pub fn from_candidate(page_key: i64, candidate: &CatalogCandidate, reason: impl Into<String>) -> Self {
        Self {
            page_key,
            effect_path: candidate.path.clone(),
            score: candidate.score,
            reason: reason.into(),
            description: non_empty(&candidate.description),
            position: None,
            url: None,
            duration: None,
        }
    }

    pub fn unselected(page_key: i64, reason: impl Into<String>) -> Self {
        Self {
            page_key,
            effect_path: String::new(),
            score: 0.0,
            reason: reason.into(),
            description: None,
            position: None,
            url: None,
            duration: None,
        }
    }

    pub fn is_selected(&self) -> bool {
        !self.effect_path.is_empty()
    }

    /// 音频生成使用的提示文本
    pub fn prompt_text(&self) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| path_stem(&self.effect_path))
    }
}

/// 音效在页内的时间位置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectPosition {
    pub effect_path: String,
    /// 0–10 刻度
    pub position: f64,
    /// 秒
    pub duration: f64,
}

impl EffectPosition {
    /// 构造并把数值夹到合法范围
    pub fn clamped(effect_path: impl Into<String>, position: f64, duration: f64) -> Self {
        let position = if position.is_finite() {
            position.clamp(0.0, POSITION_SCALE_MAX)
        } else {
            0.0
        };
        let duration = if duration.is_finite() {
            duration.clamp(MIN_EFFECT_SECS, MAX_AUDIO_SECS)
        } else {
            MIN_EFFECT_SECS
        };
        Self {
            effect_path: effect_path.into(),
            position,
            duration,
        }
    }

    /// 默认位置：页首，2 秒
    pub fn default_for(effect_path: impl Into<String>) -> Self {
        Self::clamped(effect_path, 0.0, 2.0)
    }

    /// 位置对应的秒数
    pub fn start_secs(&self) -> f64 {
        self.position / POSITION_SCALE_MAX * READING_WINDOW_SECS
    }
}

/// 取路径的文件名（不含扩展名），下划线视为空格
pub fn path_stem(path: &str) -> String {
    let file = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let stem = match file.rfind('.') {
        Some(idx) if idx > 0 => &file[..idx],
        _ => file,
    };
    stem.replace(['_', '-'], " ")
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_position_clamped() {
        let pos = EffectPosition::clamped("rain.mp3", 12.0, 40.0);
        assert_eq!(pos.position, 10.0);
        assert_eq!(pos.duration, MAX_AUDIO_SECS);

        let pos = EffectPosition::clamped("rain.mp3", -1.0, f64::NAN);
        assert_eq!(pos.position, 0.0);
        assert_eq!(pos.duration, MIN_EFFECT_SECS);
    }

    #[test]
    fn test_start_secs() {
        let pos = EffectPosition::clamped("x", 5.0, 1.0);
        assert!((pos.start_secs() - 7.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_path_stem() {
        assert_eq!(path_stem("effects/door_knock-loud.mp3"), "door knock loud");
        assert_eq!(path_stem("rain"), "rain");
    }

    #[test]
    fn test_serialize_camel_case() {
        let music = BackgroundMusic::unselected(3, "no candidates");
        let json = serde_json::to_value(&music).unwrap();
        assert_eq!(json["musicPath"], "");
        assert_eq!(json["pageKey"], 3);
        assert!(!music.is_selected());
    }

    #[test]
    fn test_prompt_text_prefers_description() {
        let candidate = CatalogCandidate {
            path: "fx/thunder.wav".to_string(),
            score: 0.9,
            description: "distant thunder".to_string(),
        };
        let effect = SoundEffect::from_candidate(1, &candidate, "storm scene");
        assert_eq!(effect.prompt_text(), "distant thunder");

        let bare = SoundEffect::from_candidate(
            1,
            &CatalogCandidate { path: "fx/thunder.wav".into(), score: 0.1, description: String::new() },
            "",
        );
        assert_eq!(bare.prompt_text(), "thunder");
    }
}
