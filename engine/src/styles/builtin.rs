//! Built-in instruction sets
//!
//! Every built-in shares the same structural rules; only the closing
//! profile differs. The deck builder appends its own constraint block on
//! top of `slide_prompt`, so the anchor and separator rules here are a
//! first line of defence, not the only one.

const OUTLINE_RULES: &str = r#"You are a presentation information architect. Turn the source cards into an outline in JSON.

Rules:
- Reply with JSON only. No prose, no slide markdown.
- Use only facts present in the cards.
- Aim for estimated_pages slides, give or take two, and never fewer than 6 or more than 18.
- Fixed pages, in this order: cover, agenda, the content slides, summary, qa.

must_include:
- Short, stable phrases. Do not paraphrase between bullets and must_include.
- No duplicates within a slide.
- By default must_include repeats bullets one for one.

Schema:
{
  "outline_version": "v1",
  "meta": { "topic": "...", "estimated_pages": 12 },
  "slides": [
    {
      "slide_id": "cover | agenda | s01 | s02 | ... | summary | qa",
      "type": "cover | agenda | content | summary | qa",
      "title": "...",
      "purpose": "introduce | define | argue | compare | conclude | act | transition",
      "density": "low | med | high",
      "visual_hint": "hero | list | table | timeline | diagram | quote",
      "bullets": ["..."],
      "must_include": ["..."],
      "source_card_ids": ["c001"]
    }
  ]
}"#;

const SLIDE_RULES: &str = r#"You are a Slidev deck writer. You receive OUTLINE_JSON and THEME_CAPABILITIES and reply with the complete slides.md text.

Rules:
- Reply with slides.md content only. No code fences around the whole deck, no commentary.
- Same slides, same order as OUTLINE_JSON.
- Use only facts from the outline.
- The first line of every slide is <!-- slide_id: {slide_id} -->
- Every must_include string appears verbatim as visible text on its slide.
- A line holding only --- separates slides and appears nowhere else.
- Pick layouts from THEME_CAPABILITIES.layouts.

Before replying, check every slide for its must_include strings. If one is missing, append it as a bullet at the end of that slide."#;

pub(super) struct BuiltinStyle {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    outline_profile: &'static str,
    slide_profile: &'static str,
}

impl BuiltinStyle {
    pub fn outline_prompt(&self) -> String {
        format!("{}\n\n{}", OUTLINE_RULES, self.outline_profile)
    }

    pub fn slide_prompt(&self) -> String {
        format!("{}\n\n{}", SLIDE_RULES, self.slide_profile)
    }
}

pub(super) const BUILTIN_STYLES: &[BuiltinStyle] = &[
    BuiltinStyle {
        id: "business",
        name: "Business",
        description: "Concise, data-driven, results first",
        outline_profile: "Style: business. Formal and concise. Lead with outcomes and metrics.",
        slide_profile: "Style profile (business):
- Formal, concise tone; action verbs in titles.
- A title plus three to five short bullets.
- Prefer two-cols, then center, then default.
- Mark charts as [Chart: description].",
    },
    BuiltinStyle {
        id: "tech",
        name: "Tech",
        description: "Minimal, precise, code friendly",
        outline_profile: "Style: tech. Precise and engineering minded. Favour principles, steps, and trade-offs.",
        slide_profile: "Style profile (tech):
- Precise tone; numbered steps and checklists.
- Mermaid diagrams for architecture and flows.
- Prefer default and two-cols.
- Code blocks with a language tag where code helps.",
    },
    BuiltinStyle {
        id: "education",
        name: "Education",
        description: "Step by step, plain language",
        outline_profile: "Style: education. Build concepts in order, from definition to example to recap.",
        slide_profile: "Style profile (education):
- Plain language; one idea per slide.
- Pair each concept with an example.
- Alternate center for concepts and two-cols for examples.
- Close sections with a short recap.",
    },
    BuiltinStyle {
        id: "creative",
        name: "Creative",
        description: "Bold visuals, story led",
        outline_profile: "Style: creative. Tell a story with a clear arc and memorable section titles.",
        slide_profile: "Style profile (creative):
- Vivid, narrative tone; short punchy titles.
- Few words per slide, strong imagery.
- Prefer cover, center, and image-right where the theme has them.",
    },
];

pub(super) const DEFAULT_STYLE_ID: &str = "business";
