//! Pairing edited elements with the elements extracted from the slide.
//!
//! Identifiers are not stable across tools, so the matcher falls back to
//! position: an exact id hit wins, then the nearest same-kind element within
//! the tight tolerance, then within the loose tolerance. Each extracted
//! element is claimed at most once per slide.

use crate::pml::settings::EditOptions;
use crate::pml::types::SlideElement;
use std::collections::HashSet;

/// For each edited element, the index of the extracted element it patched
/// onto, or `None` when nothing claimed it.
pub(crate) fn match_all(
    edited: &[SlideElement],
    extracted: &[SlideElement],
    opts: &EditOptions,
) -> Vec<Option<usize>> {
    let mut used = HashSet::new();
    edited
        .iter()
        .map(|el| {
            let hit = match_element(el, extracted, &used, opts);
            if let Some(i) = hit {
                used.insert(i);
            }
            hit
        })
        .collect()
}

pub(crate) fn match_element(
    edited: &SlideElement,
    extracted: &[SlideElement],
    used: &HashSet<usize>,
    opts: &EditOptions,
) -> Option<usize> {
    let candidates = || {
        extracted
            .iter()
            .enumerate()
            .filter(|(i, el)| !used.contains(i) && el.kind.same_kind(&edited.kind))
    };

    if let Some((i, _)) = candidates().find(|(_, el)| el.id == edited.id) {
        return Some(i);
    }

    nearest_within(candidates(), edited, opts.tight_tolerance)
        .or_else(|| nearest_within(candidates(), edited, opts.loose_tolerance))
}

fn nearest_within<'a>(
    candidates: impl Iterator<Item = (usize, &'a SlideElement)>,
    edited: &SlideElement,
    tolerance: f64,
) -> Option<usize> {
    candidates
        .filter_map(|(i, el)| {
            let dx = (el.x - edited.x).abs();
            let dy = (el.y - edited.y).abs();
            (dx <= tolerance && dy <= tolerance).then_some((i, dx + dy))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pml::types::ElementKind;
    use pretty_assertions::assert_eq;

    fn text(id: &str, x: f64, y: f64) -> SlideElement {
        SlideElement::new(
            id.to_string(),
            x,
            y,
            3.0,
            1.0,
            ElementKind::Text {
                content: String::new(),
                original_content: String::new(),
            },
        )
    }

    fn shape(id: &str, x: f64, y: f64) -> SlideElement {
        SlideElement::new(id.to_string(), x, y, 3.0, 1.0, ElementKind::Shape)
    }

    #[test]
    fn id_beats_position() {
        let extracted = vec![text("text-0", 1.0, 1.0), text("text-1", 5.0, 5.0)];
        let edited = text("text-1", 1.0, 1.0);

        let hit = match_element(&edited, &extracted, &HashSet::new(), &EditOptions::default());
        assert_eq!(hit, Some(1));
    }

    #[test]
    fn tight_match_prefers_nearest() {
        let extracted = vec![text("a", 1.05, 1.0), text("b", 1.01, 1.0)];
        let edited = text("other", 1.0, 1.0);

        let hit = match_element(&edited, &extracted, &HashSet::new(), &EditOptions::default());
        assert_eq!(hit, Some(1));
    }

    #[test]
    fn loose_match_catches_moved_elements() {
        let extracted = vec![text("a", 1.8, 1.8)];
        let edited = text("other", 1.0, 1.0);

        let hit = match_element(&edited, &extracted, &HashSet::new(), &EditOptions::default());
        assert_eq!(hit, Some(0));
    }

    #[test]
    fn beyond_loose_tolerance_is_no_match() {
        let extracted = vec![text("a", 5.0, 5.0)];
        let edited = text("a-moved", 1.0, 1.0);

        let hit = match_element(&edited, &extracted, &HashSet::new(), &EditOptions::default());
        assert_eq!(hit, None);
    }

    #[test]
    fn kind_mismatch_never_matches() {
        let extracted = vec![shape("text-0", 1.0, 1.0)];
        let edited = text("text-0", 1.0, 1.0);

        let hit = match_element(&edited, &extracted, &HashSet::new(), &EditOptions::default());
        assert_eq!(hit, None);
    }

    #[test]
    fn each_extracted_element_claimed_once() {
        let extracted = vec![text("a", 1.0, 1.0)];
        let edited = vec![text("x", 1.0, 1.0), text("y", 1.0, 1.0)];

        let hits = match_all(&edited, &extracted, &EditOptions::default());
        assert_eq!(hits, vec![Some(0), None]);
    }
}
