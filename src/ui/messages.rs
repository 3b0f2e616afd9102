//! User-facing notices in the two supported locales.

use crate::error::PlayerError;
use crate::player::{PlayerMode, QueueMode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "en")]
    En,
    #[serde(rename = "zh-CN")]
    ZhCn,
}

impl Locale {
    /// Chinese for any `zh*` language tag, English otherwise.
    pub fn detect(tag: &str) -> Self {
        if tag.to_ascii_lowercase().starts_with("zh") {
            Locale::ZhCn
        } else {
            Locale::En
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    PickFolder,
    Scanning,
    ScanFailed,
    EmptyFolder,
    UnsupportedCapability,
    PermissionDenied,
    UnsupportedMedia,
    Idle,
    SizeUnit,
    Queue(QueueMode),
    Mode(PlayerMode),
}

impl Notice {
    pub fn for_error(err: &PlayerError) -> Self {
        match err {
            PlayerError::UnsupportedCapability => Notice::UnsupportedCapability,
            PlayerError::PermissionDenied(_) => Notice::PermissionDenied,
            PlayerError::DirectoryRead { .. } | PlayerError::UnknownFolder(_) => Notice::ScanFailed,
        }
    }
}

pub fn text(locale: Locale, notice: Notice) -> &'static str {
    match locale {
        Locale::En => match notice {
            Notice::PickFolder => "Pick a folder to begin",
            Notice::Scanning => "Scanning media...",
            Notice::ScanFailed => "Scan failed",
            Notice::EmptyFolder => "No audio or video files in this folder",
            Notice::UnsupportedCapability => "This host cannot open folders",
            Notice::PermissionDenied => "Read access to the folder was denied",
            Notice::UnsupportedMedia => "This media file cannot be decoded here",
            Notice::Idle => "Idle",
            Notice::SizeUnit => "MB",
            Notice::Queue(QueueMode::Single) => "Loop single track",
            Notice::Queue(QueueMode::Loop) => "Loop playlist",
            Notice::Queue(QueueMode::Shuffle) => "Shuffle play",
            Notice::Mode(PlayerMode::Hybrid) => "Hybrid mode",
            Notice::Mode(PlayerMode::Audio) => "Audio mode",
            Notice::Mode(PlayerMode::Video) => "Video mode",
        },
        Locale::ZhCn => match notice {
            Notice::PickFolder => "请选择文件夹开始",
            Notice::Scanning => "正在扫描媒体…",
            Notice::ScanFailed => "扫描失败",
            Notice::EmptyFolder => "该文件夹中没有音视频文件",
            Notice::UnsupportedCapability => "当前环境无法打开文件夹",
            Notice::PermissionDenied => "文件夹读取权限被拒绝",
            Notice::UnsupportedMedia => "无法解码该媒体文件",
            Notice::Idle => "待命",
            Notice::SizeUnit => "MB",
            Notice::Queue(QueueMode::Single) => "单曲循环",
            Notice::Queue(QueueMode::Loop) => "列表循环",
            Notice::Queue(QueueMode::Shuffle) => "随机播放",
            Notice::Mode(PlayerMode::Hybrid) => "混合通道",
            Notice::Mode(PlayerMode::Audio) => "音频通道",
            Notice::Mode(PlayerMode::Video) => "视频通道",
        },
    }
}
