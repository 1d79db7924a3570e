//! Terminal styling helpers
//!
//! Semantic styling via the [`Stylize`] trait. Color support detection is
//! delegated to `owo-colors`, which honors `NO_COLOR`, `CLICOLOR`,
//! `CLICOLOR_FORCE` and TTY detection per stream.

use std::fmt::{self, Display};

pub use owo_colors::Stream;
use owo_colors::{OwoColorize, Style};

const ACCENT: Style = Style::new().cyan();
const SUCCESS: Style = Style::new().green();
const ERROR: Style = Style::new().red();
const WARN: Style = Style::new().yellow();
const MUTED: Style = Style::new().dimmed();
const EMPHASIS: Style = Style::new().bold();

/// A value with semantic styling applied, rendered with ANSI codes only when
/// the target stream supports them.
#[derive(Clone, Debug)]
pub struct Styled<T> {
    value: T,
    style: Style,
    stream: Stream,
}

impl<T> Styled<T> {
    const fn new(value: T, style: Style, stream: Stream) -> Self {
        Self {
            value,
            style,
            stream,
        }
    }

    /// Override to render for stderr stream detection.
    #[must_use]
    pub const fn for_stderr(mut self) -> Self {
        self.stream = Stream::Stderr;
        self
    }
}

impl<T: Display> Display for Styled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.value
                .if_supports_color(self.stream, |v| v.style(self.style))
        )
    }
}

/// Extension trait for semantic terminal styling.
///
/// Implemented for all [`Display`] types; methods take `&self` so borrowed
/// data can be styled in place.
pub trait Stylize: Display {
    /// Cyan, for primary information: branches, counts, URLs.
    fn accent(&self) -> Styled<&Self> {
        Styled::new(self, ACCENT, Stream::Stdout)
    }

    /// Green, for completed operations.
    fn success(&self) -> Styled<&Self> {
        Styled::new(self, SUCCESS, Stream::Stdout)
    }

    /// Red, for failures; renders for stderr.
    fn error(&self) -> Styled<&Self> {
        Styled::new(self, ERROR, Stream::Stderr)
    }

    /// Yellow, for attention-needed states; renders for stderr.
    fn warn(&self) -> Styled<&Self> {
        Styled::new(self, WARN, Stream::Stderr)
    }

    /// Dim, for secondary information.
    fn muted(&self) -> Styled<&Self> {
        Styled::new(self, MUTED, Stream::Stdout)
    }

    /// Bold, for headers and key information.
    fn emphasis(&self) -> Styled<&Self> {
        Styled::new(self, EMPHASIS, Stream::Stdout)
    }
}

impl<T: Display + ?Sized> Stylize for T {}

/// Success checkmark
pub const CHECK: &str = "✓";

/// Arrow for steps/actions
pub const ARROW: &str = "→";

/// Bullet for plan items
pub const BULLET: &str = "○";

/// Green checkmark for success states.
#[inline]
pub const fn check() -> Styled<&'static str> {
    Styled::new(CHECK, SUCCESS, Stream::Stdout)
}

/// Cyan arrow for action steps.
#[inline]
pub const fn arrow() -> Styled<&'static str> {
    Styled::new(ARROW, ACCENT, Stream::Stdout)
}

/// Dimmed bullet for plan items.
#[inline]
pub const fn bullet() -> Styled<&'static str> {
    Styled::new(BULLET, MUTED, Stream::Stdout)
}

const fn to_hyperlink_stream(stream: Stream) -> supports_hyperlinks::Stream {
    match stream {
        Stream::Stdout => supports_hyperlinks::Stream::Stdout,
        Stream::Stderr => supports_hyperlinks::Stream::Stderr,
    }
}

/// Clickable OSC 8 hyperlink showing the URL itself, plain text where the
/// terminal does not support links.
pub fn hyperlink_url(stream: Stream, url: &str) -> String {
    if supports_hyperlinks::on(to_hyperlink_stream(stream)) {
        terminal_link::Link::new(url, url).to_string()
    } else {
        url.to_string()
    }
}

use indicatif::ProgressStyle;
use std::sync::OnceLock;

/// Default spinner style, cyan dots.
pub fn spinner_style() -> ProgressStyle {
    static STYLE: OnceLock<ProgressStyle> = OnceLock::new();
    STYLE
        .get_or_init(|| {
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("hardcoded spinner template is valid")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        })
        .clone()
}
