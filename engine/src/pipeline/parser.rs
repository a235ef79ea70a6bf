use std::sync::OnceLock;

use regex::Regex;
use sdk::types::{DeckSlide, UNKNOWN_SLIDE_PREFIX};

static SEPARATOR: OnceLock<Regex> = OnceLock::new();
static ANCHOR: OnceLock<Regex> = OnceLock::new();
static YAML_KEY: OnceLock<Regex> = OnceLock::new();

/// A line holding only `---`, trailing horizontal whitespace allowed
fn separator() -> &'static Regex {
    SEPARATOR.get_or_init(|| Regex::new(r"(?m)^---[ \t]*$").expect("Invalid separator pattern"))
}

/// `<!-- slide_id: token -->` at the very start of a fragment
fn anchor() -> &'static Regex {
    ANCHOR.get_or_init(|| {
        Regex::new(r"\A<!--\s*slide_id:\s*([^\s>]+?)\s*-->").expect("Invalid anchor pattern")
    })
}

fn yaml_key() -> &'static Regex {
    YAML_KEY.get_or_init(|| Regex::new(r"^[A-Za-z_][\w-]*:").expect("Invalid key pattern"))
}

/// Deck markdown cut into optional headmatter and trimmed, non-empty pages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeckParts {
    pub headmatter: Option<String>,
    pub pages: Vec<String>,
}

/// Split deck markdown into headmatter and pages
///
/// Slidev headmatter (a leading `---` block whose lines are all
/// `key: value`) is not a page, so page indices count slides only.
pub fn split_deck(markdown: &str) -> DeckParts {
    let normalized = markdown.replace("\r\n", "\n");
    let (headmatter, rest) = split_headmatter(&normalized);

    let pages = separator()
        .split(rest)
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .map(str::to_string)
        .collect();

    DeckParts { headmatter, pages }
}

/// Whether `text` has a line that would act as a slide separator
pub fn contains_separator(text: &str) -> bool {
    separator().is_match(text)
}

/// Split deck markdown into slides
///
/// Purely structural: no check that ids are known or unique. Fragments
/// without an anchor get `unknown-<index>`, which no outline id can match.
pub fn parse_deck(markdown: &str) -> Vec<DeckSlide> {
    split_deck(markdown)
        .pages
        .into_iter()
        .enumerate()
        .map(|(index, content)| {
            let (slide_id, anchored) = match read_anchor(&content) {
                Some(id) => (id.to_string(), true),
                None => (format!("{}{}", UNKNOWN_SLIDE_PREFIX, index), false),
            };
            DeckSlide {
                slide_id,
                content,
                index,
                anchored,
            }
        })
        .collect()
}

fn split_headmatter(text: &str) -> (Option<String>, &str) {
    let Some(first) = separator().find(text) else {
        return (None, text);
    };
    if !text[..first.start()].trim().is_empty() {
        return (None, text);
    }
    let after_open = &text[first.end()..];
    let Some(close) = separator().find(after_open) else {
        return (None, text);
    };

    let block = after_open[..close.start()].trim_matches('\n');
    let is_yaml = !block.trim().is_empty()
        && block
            .lines()
            .filter(|l| !l.trim().is_empty())
            .all(|l| yaml_key().is_match(l) || l.starts_with(' '));

    if is_yaml {
        (Some(block.to_string()), &after_open[close.end()..])
    } else {
        (None, text)
    }
}

/// The slide id in a fragment's leading anchor comment
pub fn read_anchor(fragment: &str) -> Option<&str> {
    anchor()
        .captures(fragment)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
