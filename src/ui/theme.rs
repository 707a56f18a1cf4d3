use crate::kind::EntityKind;
use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Terminal palette. Every entity kind gets its own color so keys stay
/// readable in mixed listings such as `related` output.
#[derive(Debug, Clone)]
pub struct Theme {
    pub title: Style,
    pub success: Style,
    pub error: Style,
    pub warn: Style,
    /// Attribute names in `show`
    pub label: Style,
    pub muted: Style,
    kinds: [Style; 6],
}

impl Theme {
    /// Follows `console`'s color detection (tty, `CLICOLOR`, `CLICOLOR_FORCE`) and `NO_COLOR`
    pub fn detect() -> Self {
        if !console::colors_enabled() || std::env::var_os("NO_COLOR").is_some() {
            return Self::plain();
        }
        Self::colored()
    }

    pub fn colored() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            success: Style::new().green().bold(),
            error: Style::new().red().bold(),
            warn: Style::new().yellow().bold(),
            label: Style::new().bright_black(),
            muted: Style::new().bright_black().italic(),
            kinds: [
                Style::new().magenta().bold(),      // Account
                Style::new().blue().bold(),         // Region
                Style::new().bright_blue(),         // Location
                Style::new().green().bold(),        // Listing
                Style::new().yellow(),              // Review
                Style::new().cyan(),                // Amenity
            ],
        }
    }

    pub fn plain() -> Self {
        Self {
            title: Style::new(),
            success: Style::new(),
            error: Style::new(),
            warn: Style::new(),
            label: Style::new(),
            muted: Style::new(),
            kinds: [Style::new(); 6],
        }
    }

    /// Style for lookup keys of `kind`
    pub fn kind(&self, kind: EntityKind) -> Style {
        let slot = EntityKind::all().iter().position(|k| *k == kind).unwrap_or(0);
        self.kinds[slot]
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}
