use sdk::types::{Confidence, MissingPoint, MissingSlide, Patch};

/// Issues patches with sequential ids in discovery order
///
/// Works from the validator's findings only; it never sees, let alone
/// edits, the deck or outline.
#[derive(Debug, Default)]
pub struct PatchProposer {
    issued: usize,
    patches: Vec<Patch>,
}

impl PatchProposer {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> String {
        self.issued += 1;
        format!("patch-{:03}", self.issued)
    }

    /// Reconstruct an absent slide at its outline position
    pub fn propose_insert(&mut self, missing: &MissingSlide) {
        let patch_id = self.next_id();
        self.patches.push(Patch::InsertSlide {
            patch_id,
            slide_id: missing.slide_id.clone(),
            insert_at_index: missing.expected_index,
            markdown: reconstruct_slide(&missing.slide_id, &missing.title, &missing.must_include),
            confidence: Confidence::High,
            explain: format!(
                "Slide '{}' is in the outline but not in the deck; insert a minimal version at position {}.",
                missing.slide_id, missing.expected_index
            ),
        });
    }

    /// Append the missing points to the end of an existing slide
    pub fn propose_append(&mut self, gap: &MissingPoint) {
        let patch_id = self.next_id();
        self.patches.push(Patch::AppendBullets {
            patch_id,
            slide_id: gap.slide_id.clone(),
            page_index: gap.page_index,
            append: gap.missing_points.clone(),
            confidence: Confidence::High,
            explain: format!(
                "Slide '{}' is missing {} required point(s); append them at the end of the slide.",
                gap.slide_id,
                gap.missing_points.len()
            ),
        });
    }

    pub fn into_patches(self) -> Vec<Patch> {
        self.patches
    }
}

/// Anchor, title, and one bullet per required point
pub fn reconstruct_slide(slide_id: &str, title: &str, points: &[String]) -> String {
    let mut markdown = format!("<!-- slide_id: {} -->\n# {}", slide_id, title);
    if !points.is_empty() {
        markdown.push('\n');
        for point in points {
            markdown.push_str("\n- ");
            markdown.push_str(point);
        }
    }
    markdown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_sequential_across_kinds() {
        let mut proposer = PatchProposer::new();
        proposer.propose_insert(&MissingSlide {
            slide_id: "s02".into(),
            expected_index: 3,
            title: "Risks".into(),
            must_include: vec!["Supply delays".into()],
            reason: "absent".into(),
        });
        proposer.propose_append(&MissingPoint {
            slide_id: "s03".into(),
            page_index: 3,
            matched_points: vec![],
            missing_points: vec!["a".into(), "b".into()],
            excerpt: String::new(),
        });

        let patches = proposer.into_patches();
        let ids: Vec<&str> = patches.iter().map(|p| p.patch_id()).collect();
        assert_eq!(ids, vec!["patch-001", "patch-002"]);

        match &patches[0] {
            Patch::InsertSlide { markdown, insert_at_index, .. } => {
                assert_eq!(*insert_at_index, 3);
                assert_eq!(markdown, "<!-- slide_id: s02 -->\n# Risks\n\n- Supply delays");
            }
            other => panic!("unexpected patch {:?}", other),
        }
        match &patches[1] {
            Patch::AppendBullets { append, explain, .. } => {
                assert_eq!(append, &vec!["a".to_string(), "b".to_string()]);
                assert!(explain.contains("2 required"));
            }
            other => panic!("unexpected patch {:?}", other),
        }
    }

    #[test]
    fn test_reconstruction_without_points() {
        assert_eq!(
            reconstruct_slide("qa", "Thanks", &[]),
            "<!-- slide_id: qa -->\n# Thanks"
        );
    }
}
