//! Theme and styling for the wizard
//!
//! Every color and style used by the UI is defined here, on the Nord palette.
//!
//! # Usage
//! ```rust
//! use archwizard::theme::{Colors, Styles};
//! use ratatui::style::Style;
//!
//! let border = Style::default().fg(Colors::FROST);
//! let title = Styles::title();
//! ```

use ratatui::style::{Color, Modifier, Style};

// =============================================================================
// COLOR PALETTE
// =============================================================================

/// Nord palette, named by role
pub struct Colors;

impl Colors {
    // -------------------------------------------------------------------------
    // Polar Night (backgrounds)
    // -------------------------------------------------------------------------

    /// nord0, main background
    pub const BG_PRIMARY: Color = Color::Rgb(46, 52, 64);

    /// nord1, panels and the progress track
    pub const BG_SECONDARY: Color = Color::Rgb(59, 66, 82);

    /// nord2, highlighted rows
    pub const BG_HIGHLIGHT: Color = Color::Rgb(67, 76, 94);

    /// nord3, inactive borders and hints
    pub const FG_MUTED: Color = Color::Rgb(76, 86, 106);

    // -------------------------------------------------------------------------
    // Snow Storm (text)
    // -------------------------------------------------------------------------

    /// nord4
    pub const FG_SECONDARY: Color = Color::Rgb(216, 222, 233);

    /// nord6
    pub const FG_PRIMARY: Color = Color::Rgb(236, 239, 244);

    // -------------------------------------------------------------------------
    // Frost (accents)
    // -------------------------------------------------------------------------

    /// nord7
    pub const TEAL: Color = Color::Rgb(143, 188, 187);

    /// nord8, primary accent for titles and active borders
    pub const FROST: Color = Color::Rgb(136, 192, 208);

    /// nord9
    pub const FROST_LIGHT: Color = Color::Rgb(129, 161, 193);

    /// nord10
    pub const FROST_DEEP: Color = Color::Rgb(94, 129, 172);

    // -------------------------------------------------------------------------
    // Aurora (feedback)
    // -------------------------------------------------------------------------

    /// nord11
    pub const ERROR: Color = Color::Rgb(191, 97, 106);

    /// nord12
    pub const ORANGE: Color = Color::Rgb(208, 135, 112);

    /// nord13
    pub const WARNING: Color = Color::Rgb(235, 203, 139);

    /// nord14
    pub const SUCCESS: Color = Color::Rgb(163, 190, 140);

    /// nord15
    pub const PURPLE: Color = Color::Rgb(180, 142, 173);
}

// =============================================================================
// PRE-BUILT STYLES
// =============================================================================

/// Styles shared by the UI modules
pub struct Styles;

impl Styles {
    pub fn base() -> Style {
        Style::default().fg(Colors::FG_PRIMARY).bg(Colors::BG_PRIMARY)
    }

    pub fn text() -> Style {
        Style::default().fg(Colors::FG_SECONDARY)
    }

    pub fn text_muted() -> Style {
        Style::default().fg(Colors::FG_MUTED)
    }

    pub fn title() -> Style {
        Style::default()
            .fg(Colors::FROST)
            .add_modifier(Modifier::BOLD)
    }

    pub fn border_active() -> Style {
        Style::default().fg(Colors::FROST)
    }

    pub fn border_inactive() -> Style {
        Style::default().fg(Colors::FG_MUTED)
    }

    /// Question id in the answers column
    pub fn answer_key() -> Style {
        Style::default().fg(Colors::FROST_LIGHT)
    }

    pub fn answer_value() -> Style {
        Style::default().fg(Colors::FG_PRIMARY)
    }

    /// Row of the question being answered
    pub fn current_row() -> Style {
        Style::default()
            .bg(Colors::BG_HIGHLIGHT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn prompt() -> Style {
        Style::default()
            .fg(Colors::WARNING)
            .add_modifier(Modifier::BOLD)
    }

    pub fn input() -> Style {
        Style::default().fg(Colors::FG_PRIMARY).bg(Colors::BG_SECONDARY)
    }

    /// Highlighted option of a Select question
    pub fn selected() -> Style {
        Style::default()
            .fg(Colors::BG_PRIMARY)
            .bg(Colors::FROST)
            .add_modifier(Modifier::BOLD)
    }

    pub fn unselected() -> Style {
        Style::default().fg(Colors::FG_SECONDARY)
    }

    pub fn error() -> Style {
        Style::default()
            .fg(Colors::ERROR)
            .add_modifier(Modifier::BOLD)
    }

    pub fn success() -> Style {
        Style::default().fg(Colors::SUCCESS)
    }

    pub fn progress() -> Style {
        Style::default().fg(Colors::TEAL).bg(Colors::BG_SECONDARY)
    }

    pub fn key_hint() -> Style {
        Style::default()
            .fg(Colors::PURPLE)
            .add_modifier(Modifier::BOLD)
    }

    pub fn nav_hint() -> Style {
        Style::default().fg(Colors::FG_MUTED)
    }
}

// =============================================================================
// LAYOUT CONSTANTS
// =============================================================================

pub struct UiConstants;

impl UiConstants {
    pub const HEADER_HEIGHT: u16 = 3;

    /// Progress gauge plus the key hint line
    pub const FOOTER_HEIGHT: u16 = 4;

    /// Width share of the answers column
    pub const ANSWERS_WIDTH_PCT: u16 = 40;

    /// Character shown in place of each secret character
    pub const MASK_CHAR: char = '*';
}

// =============================================================================
// TEXT
// =============================================================================

pub struct UiText;

impl UiText {
    pub const TITLE: &'static str = " Arch Linux Install Wizard ";
    pub const ANSWERS_TITLE: &'static str = " Answers ";
    pub const QUESTION_TITLE: &'static str = " Question ";
    pub const REVIEW_TITLE: &'static str = " Review ";
    pub const PROGRESS_TITLE: &'static str = " Progress ";
    pub const REVIEW_PROMPT: &'static str = "Save these answers?";
    pub const REVIEW_CHOICES: &'static str = "[y] save   [n] edit   [q] quit";
    pub const YES_NO_CHOICES: &'static str = "[y] Yes   [n] No";
}

/// Mask `value` for display, one mask char per character
pub fn mask(value: &str) -> String {
    std::iter::repeat_n(UiConstants::MASK_CHAR, value.chars().count()).collect()
}
