use std::sync::OnceLock;

use regex::Regex;

use crate::pipeline::parser::{contains_separator, read_anchor, split_deck, DeckParts};

static THEME_LINE: OnceLock<Regex> = OnceLock::new();

fn theme_line() -> &'static Regex {
    THEME_LINE.get_or_init(|| Regex::new(r"(?m)^theme:[ \t]*.*$").expect("Invalid theme pattern"))
}

/// An editable deck held in memory
///
/// Pages are split the same way the coverage validator splits a deck, so
/// page indices here match `append_bullets.page_index`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeckDocument {
    headmatter: Option<String>,
    pages: Vec<String>,
}

impl DeckDocument {
    pub fn parse(markdown: &str) -> Self {
        let DeckParts { headmatter, pages } = split_deck(markdown);
        Self { headmatter, pages }
    }

    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    pub fn headmatter(&self) -> Option<&str> {
        self.headmatter.as_deref()
    }

    /// Replace page `index`
    pub fn replace_page(&mut self, index: usize, markdown: &str) -> Result<(), String> {
        let page = check_page(markdown)?;
        let count = self.pages.len();
        let slot = self
            .pages
            .get_mut(index)
            .ok_or_else(|| format!("page_index {} is out of range (deck has {} pages)", index, count))?;
        *slot = page;
        Ok(())
    }

    /// Insert a page after `after_index`, or append when it is past the end
    ///
    /// Returns the index of the new page.
    pub fn insert_page(&mut self, after_index: usize, markdown: &str) -> Result<usize, String> {
        let page = check_page(markdown)?;
        let at = after_index.saturating_add(1).min(self.pages.len());
        self.pages.insert(at, page);
        Ok(at)
    }

    /// Set `theme:` in the headmatter, creating the headmatter if needed
    pub fn set_theme(&mut self, theme: &str) -> Result<(), String> {
        let theme = theme.trim();
        if theme.is_empty() || theme.contains(char::is_whitespace) {
            return Err(format!("'{}' is not a valid theme name", theme));
        }

        let line = format!("theme: {}", theme);
        self.headmatter = Some(match self.headmatter.take() {
            Some(existing) if theme_line().is_match(&existing) => {
                theme_line()
                    .replace(&existing, regex::NoExpand(&line))
                    .into_owned()
            }
            Some(existing) if !existing.trim().is_empty() => format!("{}\n{}", existing, line),
            _ => line,
        });
        Ok(())
    }

    /// One line per page: index, anchor id, and first line of the body
    pub fn overview(&self) -> String {
        self.pages
            .iter()
            .enumerate()
            .map(|(i, page)| {
                let id = read_anchor(page).unwrap_or("(no anchor)");
                let heading = page
                    .lines()
                    .map(str::trim)
                    .find(|l| !l.is_empty() && !l.starts_with("<!--"))
                    .unwrap_or("");
                format!("{}: [{}] {}", i, id, heading)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(headmatter) = &self.headmatter {
            out.push_str("---\n");
            out.push_str(headmatter);
            out.push_str("\n---\n\n");
        }
        out.push_str(&self.pages.join("\n\n---\n\n"));
        out.push('\n');
        out
    }
}

fn check_page(markdown: &str) -> Result<String, String> {
    let page = markdown.replace("\r\n", "\n").trim().to_string();
    if page.is_empty() {
        return Err("markdown must not be empty".to_string());
    }
    if contains_separator(&page) {
        return Err("markdown must not contain a line holding only ---".to_string());
    }
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DECK: &str = "---\ntheme: seriph\ntitle: Q3\n---\n\n<!-- slide_id: cover -->\n# Q3\n\n---\n\n<!-- slide_id: s01 -->\n# Growth\n";

    #[test]
    fn test_headmatter_is_not_a_page() {
        let doc = DeckDocument::parse(DECK);
        assert_eq!(doc.headmatter(), Some("theme: seriph\ntitle: Q3"));
        assert_eq!(doc.pages().len(), 2);
        assert!(doc.pages()[0].starts_with("<!-- slide_id: cover -->"));
    }

    #[test]
    fn test_leading_separator_before_slide_is_not_headmatter() {
        let doc = DeckDocument::parse("---\n<!-- slide_id: a -->\n# A\n---\n# B");
        assert_eq!(doc.headmatter(), None);
        assert_eq!(doc.pages().len(), 2);
    }

    #[test]
    fn test_render_round_trips_structure() {
        let doc = DeckDocument::parse(DECK);
        let again = DeckDocument::parse(&doc.render());
        assert_eq!(doc, again);
    }

    #[test]
    fn test_replace_and_insert() {
        let mut doc = DeckDocument::parse(DECK);
        doc.replace_page(1, "<!-- slide_id: s01 -->\n# Faster growth").unwrap();
        assert!(doc.pages()[1].contains("Faster"));

        assert_eq!(doc.insert_page(0, "# Between").unwrap(), 1);
        assert_eq!(doc.insert_page(99, "# Last").unwrap(), 3);
        assert_eq!(doc.pages()[3], "# Last");
    }

    #[test]
    fn test_insert_after_max_index_appends() {
        let mut doc = DeckDocument::parse(DECK);
        assert_eq!(doc.insert_page(usize::MAX, "# Tail").unwrap(), 2);
        assert_eq!(doc.pages().last().map(String::as_str), Some("# Tail"));
    }

    #[test]
    fn test_out_of_range_and_separator_rejected() {
        let mut doc = DeckDocument::parse(DECK);
        assert!(doc.replace_page(5, "# x").unwrap_err().contains("out of range"));
        assert!(doc.insert_page(0, "# a\n---\n# b").is_err());
        assert!(doc.replace_page(0, "   ").is_err());
    }

    #[test]
    fn test_set_theme_rewrites_or_creates() {
        let mut doc = DeckDocument::parse(DECK);
        doc.set_theme("bricks").unwrap();
        assert_eq!(doc.headmatter(), Some("theme: bricks\ntitle: Q3"));

        let mut bare = DeckDocument::parse("# Only");
        bare.set_theme("apple-basic").unwrap();
        assert!(bare.render().starts_with("---\ntheme: apple-basic\n---\n\n# Only"));
    }

    #[test]
    fn test_overview_lists_anchor_and_heading() {
        let doc = DeckDocument::parse(DECK);
        assert_eq!(doc.overview(), "0: [cover] # Q3\n1: [s01] # Growth");
    }
}
