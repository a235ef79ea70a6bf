use serde::Deserialize;
use tracing::{debug, warn};

use super::document::DeckDocument;
use crate::styles::ThemeCatalog;

#[derive(Deserialize)]
struct UpdatePageArgs {
    #[serde(alias = "pageIndex")]
    page_index: usize,
    markdown: String,
}

#[derive(Deserialize)]
struct InsertPageArgs {
    #[serde(alias = "afterIndex")]
    after_index: usize,
    markdown: String,
}

#[derive(Deserialize)]
struct ApplyThemeArgs {
    #[serde(alias = "themeName")]
    theme_name: String,
}

/// Deck editing tools offered to the chat model
///
/// Tool failures are returned as `ERROR: ...` strings so the model can see
/// them and correct itself; they never abort the turn.
pub struct DeckTools {
    document: DeckDocument,
}

impl DeckTools {
    pub fn new(document: DeckDocument) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &DeckDocument {
        &self.document
    }

    pub fn into_document(self) -> DeckDocument {
        self.document
    }

    /// Dispatch a tool call by name, parsing arguments from JSON.
    pub fn dispatch(&mut self, name: &str, arguments_json: &str) -> String {
        debug!("Dispatching tool '{}'", name);

        let result = match name {
            "update_page" => parse_args::<UpdatePageArgs>(arguments_json).and_then(|args| {
                self.document
                    .replace_page(args.page_index, &args.markdown)
                    .map(|_| format!("Page {} updated.", args.page_index))
            }),
            "insert_page" => parse_args::<InsertPageArgs>(arguments_json).and_then(|args| {
                self.document
                    .insert_page(args.after_index, &args.markdown)
                    .map(|at| format!("Page inserted at index {}.", at))
            }),
            "apply_theme" => parse_args::<ApplyThemeArgs>(arguments_json).and_then(|args| {
                self.document.set_theme(&args.theme_name).map(|_| {
                    if ThemeCatalog::contains(&args.theme_name) {
                        format!("Theme set to {}.", args.theme_name.trim())
                    } else {
                        format!(
                            "Theme set to {}. It is not in the built-in catalog, so its layouts are unknown.",
                            args.theme_name.trim()
                        )
                    }
                })
            }),
            other => Err(format!("Unknown tool '{}'", other)),
        };

        match result {
            Ok(message) => message,
            Err(e) => {
                warn!("Tool '{}' failed: {}", name, e);
                format!("ERROR: {}", e)
            }
        }
    }

    /// Tool protocol section of the chat system prompt
    pub fn system_prompt(&self) -> String {
        let themes: Vec<&str> = ThemeCatalog::all().iter().map(|t| t.theme).collect();
        let mut prompt = String::from(
            "You can edit the deck with these tools. To call one, reply with only a JSON object:\n\
             {\"function\": \"<name>\", \"arguments\": {...}}\n\n\
             - update_page {\"page_index\": n, \"markdown\": \"...\"}: replace page n\n\
             - insert_page {\"after_index\": n, \"markdown\": \"...\"}: add a page after page n\n\
             - apply_theme {\"theme_name\": \"...\"}: set the deck theme\n\n\
             Keep each page's first line as its <!-- slide_id: ... --> anchor. \
             Never put a line holding only --- inside page markdown.\n",
        );
        prompt.push_str(&format!("Known themes: {}\n\n", themes.join(", ")));
        prompt.push_str("Current pages:\n");
        prompt.push_str(&self.document.overview());
        prompt.push_str("\n\nCurrent deck:\n");
        prompt.push_str(&self.document.render());
        prompt
    }
}

fn parse_args<T: for<'de> Deserialize<'de>>(arguments_json: &str) -> Result<T, String> {
    serde_json::from_str(arguments_json)
        .map_err(|e| format!("Failed to parse arguments JSON: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tools() -> DeckTools {
        DeckTools::new(DeckDocument::parse(
            "<!-- slide_id: a -->\n# A\n---\n<!-- slide_id: b -->\n# B",
        ))
    }

    #[test]
    fn test_update_page() {
        let mut tools = tools();
        let out = tools.dispatch(
            "update_page",
            r#"{"page_index": 1, "markdown": "<!-- slide_id: b -->\n# B2"}"#,
        );
        assert_eq!(out, "Page 1 updated.");
        assert!(tools.document().pages()[1].ends_with("# B2"));
    }

    #[test]
    fn test_camel_case_arguments_accepted() {
        let mut tools = tools();
        let out = tools.dispatch("insert_page", r##"{"afterIndex": 0, "markdown": "# New"}"##);
        assert_eq!(out, "Page inserted at index 1.");
    }

    #[test]
    fn test_huge_after_index_appends() {
        let mut tools = tools();
        let out = tools.dispatch(
            "insert_page",
            r##"{"after_index": 18446744073709551615, "markdown": "# Tail"}"##,
        );
        assert_eq!(out, "Page inserted at index 2.");
        assert_eq!(tools.document().pages()[2], "# Tail");
    }

    #[test]
    fn test_errors_are_strings() {
        let mut tools = tools();
        assert!(tools.dispatch("delete_page", "{}").starts_with("ERROR: Unknown tool"));
        assert!(tools.dispatch("update_page", "not json").starts_with("ERROR: Failed to parse"));
        assert!(tools
            .dispatch("update_page", r#"{"page_index": 9, "markdown": "x"}"#)
            .contains("out of range"));
    }

    #[test]
    fn test_apply_theme_notes_unknown_catalog_entry() {
        let mut tools = tools();
        assert_eq!(
            tools.dispatch("apply_theme", r#"{"theme_name": "seriph"}"#),
            "Theme set to seriph."
        );
        assert!(tools
            .dispatch("apply_theme", r#"{"theme_name": "geist"}"#)
            .contains("not in the built-in catalog"));
        assert_eq!(tools.document().headmatter(), Some("theme: geist"));
    }

    #[test]
    fn test_system_prompt_lists_pages() {
        let prompt = tools().system_prompt();
        assert!(prompt.contains("0: [a] # A"));
        assert!(prompt.contains("update_page"));
    }
}
