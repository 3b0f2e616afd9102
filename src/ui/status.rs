use super::messages::{text, Locale, Notice};
use crate::player::{Action, PlayerState, ScanStatus};

/// `mm:ss`, or `--:--` when there is nothing meaningful to show.
pub fn format_seconds(value: f64) -> String {
    if !value.is_finite() || value <= 0.0 {
        return "--:--".to_string();
    }
    let total = value.floor() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

pub fn format_size(bytes: u64, unit: &str) -> String {
    if bytes == 0 {
        return format!("0 {}", unit);
    }
    format!("{:.1} {}", bytes as f64 / 1024.0 / 1024.0, unit)
}

/// One line summarising the session, e.g.
/// `▶ song | 01:02 / 03:04 | 4.2 MB | 1.5x | Loop playlist | vol 80%`
pub fn status_line(state: &PlayerState, locale: Locale) -> String {
    match &state.status {
        ScanStatus::Loading => return text(locale, Notice::Scanning).to_string(),
        ScanStatus::Error(message) => {
            return format!("{}: {}", text(locale, Notice::ScanFailed), message);
        }
        ScanStatus::Idle => {}
    }

    let Some(item) = state.now_playing() else {
        let notice = if state.library.is_empty() {
            Notice::PickFolder
        } else {
            Notice::Idle
        };
        return text(locale, notice).to_string();
    };

    let volume = if state.muted {
        "muted".to_string()
    } else {
        format!("vol {:.0}%", state.volume * 100.0)
    };

    format!(
        "{} {} | {} / {} | {} | {}x | {} | {}",
        if state.playing { "▶" } else { "⏸" },
        item.display_title(),
        format_seconds(state.current_time),
        format_seconds(state.duration),
        format_size(item.size, text(locale, Notice::SizeUnit)),
        state.playback_rate,
        text(locale, Notice::Queue(state.queue_mode)),
        volume,
    )
}

/// Notice worth flashing after `action` moved the state from `before` to `after`.
pub fn action_notice(
    action: &Action,
    before: &PlayerState,
    after: &PlayerState,
) -> Option<Notice> {
    match action {
        Action::SetMode(mode) => Some(Notice::Mode(*mode)),
        Action::CycleQueueMode => Some(Notice::Queue(after.queue_mode)),
        // Asked to start, device refused
        Action::TogglePlay if !before.playing && !after.playing => {
            after.now_playing().map(|_| Notice::UnsupportedMedia)
        }
        _ => None,
    }
}
