// Terminal front - the face of OnlyPlayer
// A status line, a handful of notices and single-key controls

pub mod messages; // locale catalogs for user-facing notices
pub mod status;   // time/size formatting and the status line
#[cfg(feature = "tui")]
pub mod events;   // keyboard handling + raw mode guard

pub use messages::{text, Locale, Notice};
pub use status::{action_notice, format_seconds, format_size, status_line};
#[cfg(feature = "tui")]
pub use events::{draw_status, key_to_command, poll_command, Command, TerminalGuard};
