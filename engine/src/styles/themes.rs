use serde::Serialize;

/// Layouts a theme offers, as shown to the deck generator
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ThemeCapabilities {
    pub theme: &'static str,
    pub layouts: &'static [&'static str],
}

const DEFAULT_THEME: ThemeCapabilities = ThemeCapabilities {
    theme: "default",
    layouts: &["cover", "intro", "default", "center", "two-cols", "image-right", "quote", "end"],
};

const THEMES: &[ThemeCapabilities] = &[
    DEFAULT_THEME,
    ThemeCapabilities {
        theme: "seriph",
        layouts: &["cover", "intro", "default", "center", "two-cols", "image-right", "quote", "fact", "end"],
    },
    ThemeCapabilities {
        theme: "apple-basic",
        layouts: &["intro", "intro-image", "default", "bullets", "section", "fact", "statement", "quote", "image-right", "third"],
    },
    ThemeCapabilities {
        theme: "bricks",
        layouts: &["cover", "intro", "default", "section", "two-cols", "quote", "fact"],
    },
];

/// Static table of the themes the deck builder knows about
pub struct ThemeCatalog;

impl ThemeCatalog {
    /// Look up a theme; unknown names fall back to `default`
    pub fn resolve(name: &str) -> &'static ThemeCapabilities {
        let wanted = name.trim();
        match THEMES.iter().find(|t| t.theme.eq_ignore_ascii_case(wanted)) {
            Some(theme) => theme,
            None => {
                tracing::warn!("Unknown theme '{}', using default", name);
                &THEMES[0]
            }
        }
    }

    pub fn all() -> &'static [ThemeCapabilities] {
        THEMES
    }

    pub fn contains(name: &str) -> bool {
        THEMES.iter().any(|t| t.theme.eq_ignore_ascii_case(name.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_theme_resolves() {
        let theme = ThemeCatalog::resolve("Bricks");
        assert_eq!(theme.theme, "bricks");
        assert!(theme.layouts.contains(&"two-cols"));
    }

    #[test]
    fn test_unknown_theme_falls_back_to_default() {
        assert_eq!(ThemeCatalog::resolve("neon").theme, "default");
        assert!(!ThemeCatalog::contains("neon"));
    }

    #[test]
    fn test_capabilities_serialize_layout_list() {
        let json = serde_json::to_value(ThemeCatalog::resolve("seriph")).unwrap();
        assert_eq!(json["theme"], "seriph");
        assert!(json["layouts"].as_array().unwrap().len() > 3);
    }
}
