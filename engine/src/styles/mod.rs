//! Presentation styles and themes
//!
//! A style is the pair of instruction texts fed to the generator for the
//! outline and deck stages. Four styles ship built in; `[styles.<id>]`
//! tables in the config add more or replace a built-in by id.

mod builtin;
mod themes;

pub use themes::{ThemeCapabilities, ThemeCatalog};

use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::StyleConfig;
use builtin::{BUILTIN_STYLES, DEFAULT_STYLE_ID};

/// One instruction set
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Style {
    pub id: String,
    pub name: String,
    pub description: String,
    pub is_builtin: bool,

    #[serde(skip)]
    pub outline_prompt: String,

    #[serde(skip)]
    pub slide_prompt: String,
}

/// Built-in styles merged with custom ones
#[derive(Debug, Clone)]
pub struct StyleBook {
    styles: Vec<Style>,
}

impl StyleBook {
    /// Built-in styles only
    pub fn builtin() -> Self {
        Self::with_custom(&BTreeMap::new())
    }

    /// Merge custom styles over the built-ins
    ///
    /// A custom style with a built-in id keeps its slot and its built-in flag.
    /// Other custom styles follow in id order.
    pub fn with_custom(custom: &BTreeMap<String, StyleConfig>) -> Self {
        let mut styles: Vec<Style> = BUILTIN_STYLES
            .iter()
            .map(|b| Style {
                id: b.id.to_string(),
                name: b.name.to_string(),
                description: b.description.to_string(),
                is_builtin: true,
                outline_prompt: b.outline_prompt(),
                slide_prompt: b.slide_prompt(),
            })
            .collect();

        for (id, config) in custom {
            let name = if config.name.trim().is_empty() {
                id.clone()
            } else {
                config.name.clone()
            };

            match styles.iter_mut().find(|s| s.id == *id) {
                Some(existing) => {
                    tracing::debug!("Custom style '{}' overrides built-in", id);
                    existing.name = name;
                    existing.description = config.description.clone();
                    existing.outline_prompt = config.outline_prompt.clone();
                    existing.slide_prompt = config.slide_prompt.clone();
                }
                None => styles.push(Style {
                    id: id.clone(),
                    name,
                    description: config.description.clone(),
                    is_builtin: false,
                    outline_prompt: config.outline_prompt.clone(),
                    slide_prompt: config.slide_prompt.clone(),
                }),
            }
        }

        Self { styles }
    }

    /// Find a style by id, falling back to the default style
    pub fn resolve(&self, id: &str) -> &Style {
        if let Some(style) = self.get(id) {
            return style;
        }
        tracing::warn!("Unknown style '{}', using '{}'", id, DEFAULT_STYLE_ID);
        self.default_style()
    }

    pub fn get(&self, id: &str) -> Option<&Style> {
        self.styles.iter().find(|s| s.id == id.trim())
    }

    pub fn default_style(&self) -> &Style {
        // The default id is always present: built-ins are never removed
        self.get(DEFAULT_STYLE_ID).unwrap_or(&self.styles[0])
    }

    pub fn list(&self) -> &[Style] {
        &self.styles
    }
}

impl Default for StyleBook {
    fn default() -> Self {
        Self::builtin()
    }
}
