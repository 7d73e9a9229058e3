//! In-place text replacement over a serialized slide.
//!
//! Patching works on the slide's XML string wherever possible so untouched
//! markup survives byte for byte. Tiers, in order: whole-content literal
//! replacement, line-by-line replacement inside `a:t` bodies, and finally a
//! tree rewrite of the matching text body. The first tier that lands wins.

use crate::pml::extract::{shape_tree, text_body_content};
use crate::xml::namespaces::{A, P};
use crate::xml::node::XmlNodeData;
use crate::xml::{builder, parser, XmlDocument};
use indextree::NodeId;

/// Replace every occurrence of `original` with `replacement` inside one
/// slide's XML. Returns the rewritten slide, or `None` when the original
/// text cannot be located. Locating nothing is a quiet outcome, not an
/// error.
pub(crate) fn patch_text(xml: &str, original: &str, replacement: &str) -> Option<String> {
    if original == replacement || original.is_empty() || replacement.is_empty() {
        return Some(xml.to_string());
    }

    // Tier 1: the whole content as one escaped span inside a single run
    // body. Constrained to a:t bodies so content that happens to collide
    // with markup can never corrupt it.
    if let Some(patched) = patch_in_run_body(xml, original, replacement) {
        return Some(patched);
    }

    // Tier 2: multi-paragraph content is stored one line per a:t run.
    if let Some(patched) = patch_by_line(xml, original, replacement) {
        return Some(patched);
    }

    // Tier 3: rewrite the text body whose joined content matches.
    let result = patch_in_tree(xml, original, replacement);
    if result.is_none() {
        log::debug!("no run or body carries the original text; leaving slide unchanged");
    }
    result
}

/// Replace the original in every `<a:t>` body containing it, leaving all
/// bytes outside those bodies alone. The entity-escaped form the writer
/// would have emitted is tried first, then the raw form.
fn patch_in_run_body(xml: &str, original: &str, replacement: &str) -> Option<String> {
    let escaped_old = escape_xml(original);
    let escaped_new = escape_xml(replacement);
    let mut attempts = vec![(escaped_old.as_str(), escaped_new.as_str())];
    if escaped_old != original {
        // Callers working in already-escaped space get their text spliced
        // verbatim.
        attempts.push((original, replacement));
    }
    let open = memchr::memmem::Finder::new(b"<a:t>");

    for (needle, insert) in attempts {
        let mut out = String::with_capacity(xml.len());
        let mut cursor = 0usize;
        let mut replaced = false;

        for start in open.find_iter(xml.as_bytes()) {
            let body_start = start + 5;
            let Some(rel_end) = memchr::memmem::find(&xml.as_bytes()[body_start..], b"</a:t>")
            else {
                continue;
            };
            let body = &xml[body_start..body_start + rel_end];
            if body.contains(needle) {
                out.push_str(&xml[cursor..body_start]);
                out.push_str(&body.replace(needle, insert));
                cursor = body_start + rel_end;
                replaced = true;
            }
        }
        if replaced {
            out.push_str(&xml[cursor..]);
            return Some(out);
        }
    }
    None
}

fn patch_by_line(xml: &str, original: &str, replacement: &str) -> Option<String> {
    let old_lines: Vec<&str> = original.lines().collect();
    let new_lines: Vec<&str> = replacement.lines().collect();
    if old_lines.len() < 2 || old_lines.len() != new_lines.len() {
        return None;
    }

    let mut out = xml.to_string();
    for (old_line, new_line) in old_lines.iter().zip(&new_lines) {
        let needle = format!("<a:t>{}</a:t>", escape_xml(old_line));
        if !out.contains(needle.as_str()) {
            return None;
        }
        out = out.replace(
            needle.as_str(),
            &format!("<a:t>{}</a:t>", escape_xml(new_line)),
        );
    }
    Some(out)
}

fn patch_in_tree(xml: &str, original: &str, replacement: &str) -> Option<String> {
    let mut doc = match parser::parse(xml) {
        Ok(doc) => doc,
        Err(e) => {
            log::warn!("text patch fell through to tree tier on unparsable slide: {}", e);
            return None;
        }
    };

    let tree = shape_tree(&doc)?;
    let targets: Vec<NodeId> = doc
        .children(tree)
        .filter(|&node| doc.is_named(node, &P::sp()))
        .filter_map(|node| doc.find_child(node, &P::txBody()))
        .filter(|&tx| text_body_content(&doc, tx) == original)
        .collect();
    if targets.is_empty() {
        return None;
    }

    for target in targets {
        rewrite_text_body(&mut doc, target, replacement);
    }

    match builder::serialize(&doc) {
        Ok(out) => Some(out),
        Err(e) => {
            log::warn!("failed to reserialize patched slide: {}", e);
            None
        }
    }
}

/// Replace a body's content line by line, reusing existing paragraphs and
/// their first run so run properties survive. Surplus runs are emptied,
/// surplus lines get fresh unformatted paragraphs.
pub(crate) fn rewrite_text_body(doc: &mut XmlDocument, tx_body: NodeId, text: &str) {
    let lines: Vec<&str> = if text.is_empty() {
        vec![""]
    } else {
        text.split('\n').collect()
    };
    let paragraphs: Vec<NodeId> = doc.children_named(tx_body, &A::p()).collect();

    for (i, paragraph) in paragraphs.iter().enumerate() {
        let line = lines.get(i).copied().unwrap_or("");
        let runs: Vec<NodeId> = doc.children_named(*paragraph, &A::r()).collect();
        if runs.is_empty() {
            if !line.is_empty() {
                append_run(doc, *paragraph, line);
            }
            continue;
        }
        for (j, run) in runs.iter().enumerate() {
            let run_text = if j == 0 { line } else { "" };
            match doc.find_child(*run, &A::t()) {
                Some(t) => doc.set_element_text(t, run_text),
                None => {
                    let t = doc.add_child(*run, XmlNodeData::element(A::t()));
                    doc.set_element_text(t, run_text);
                }
            }
        }
    }

    for line in lines.iter().skip(paragraphs.len()) {
        let paragraph = doc.add_child(tx_body, XmlNodeData::element(A::p()));
        append_run(doc, paragraph, line);
    }
}

fn append_run(doc: &mut XmlDocument, paragraph: NodeId, text: &str) {
    let run = doc.add_child(paragraph, XmlNodeData::element(A::r()));
    let t = doc.add_child(run, XmlNodeData::element(A::t()));
    doc.set_element_text(t, text);
}

/// Escape text content the way the writer does.
pub(crate) fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

pub(crate) fn unescape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        let replaced = [
            ("&amp;", "&"),
            ("&lt;", "<"),
            ("&gt;", ">"),
            ("&quot;", "\""),
            ("&apos;", "'"),
        ]
        .iter()
        .find(|(entity, _)| rest.starts_with(entity));
        match replaced {
            Some((entity, ch)) => {
                out.push_str(ch);
                rest = &rest[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SLIDE_NS: &str = concat!(
        r#"xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" "#,
        r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main""#
    );

    #[test]
    fn literal_tier_replaces_every_occurrence() {
        let xml = "<a:t>Hello</a:t><a:t>Say Hello twice: Hello</a:t>";
        let out = patch_text(xml, "Hello", "World").unwrap();
        assert_eq!(out, "<a:t>World</a:t><a:t>Say World twice: World</a:t>");
    }

    #[test]
    fn literal_tier_escapes_replacement() {
        let xml = "<a:t>Profit</a:t>";
        let out = patch_text(xml, "Profit", "P&L < plan").unwrap();
        assert_eq!(out, "<a:t>P&amp;L &lt; plan</a:t>");
    }

    #[test]
    fn literal_tier_matches_escaped_original() {
        let xml = "<a:t>Q&amp;A</a:t>";
        let out = patch_text(xml, "Q&A", "Questions").unwrap();
        assert_eq!(out, "<a:t>Questions</a:t>");
    }

    #[test]
    fn pre_escaped_original_splices_verbatim() {
        let xml = "<a:t>Q&amp;A</a:t>";
        let out = patch_text(xml, "Q&amp;A", "R&amp;D").unwrap();
        assert_eq!(out, "<a:t>R&amp;D</a:t>");
    }

    #[test]
    fn line_tier_handles_one_run_per_line() {
        let xml = r#"<a:p><a:r><a:t>First</a:t></a:r></a:p><a:p><a:r><a:t>Second</a:t></a:r></a:p>"#;
        let out = patch_text(xml, "First\nSecond", "Eins\nZwei").unwrap();
        assert!(out.contains("<a:t>Eins</a:t>"));
        assert!(out.contains("<a:t>Zwei</a:t>"));
    }

    #[test]
    fn untouched_markup_survives_string_tiers() {
        let xml = r#"<p:sp weird="  kept  "><a:t>Hello</a:t></p:sp>"#;
        let out = patch_text(xml, "Hello", "World").unwrap();
        assert_eq!(out, r#"<p:sp weird="  kept  "><a:t>World</a:t></p:sp>"#);
    }

    #[test]
    fn tree_tier_rewrites_split_runs() {
        // "Hello" split across two runs defeats the string tiers.
        let xml = format!(
            r#"<p:sld {}><p:cSld><p:spTree><p:sp><p:txBody><a:p><a:r><a:rPr b="1"/><a:t>Hel</a:t></a:r><a:r><a:t>lo</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#,
            SLIDE_NS
        );
        let out = patch_text(&xml, "Hello", "World").unwrap();
        assert!(out.contains("<a:t>World</a:t>"));
        assert!(out.contains("<a:rPr b=\"1\"/>"));
        assert!(!out.contains("lo</a:t>"));
    }

    #[test]
    fn tree_tier_grows_paragraphs_for_extra_lines() {
        let xml = format!(
            r#"<p:sld {}><p:cSld><p:spTree><p:sp><p:txBody><a:p><a:r><a:t>On&#101;</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#,
            SLIDE_NS
        );
        let out = patch_text(&xml, "One", "One\nTwo").unwrap();
        assert!(out.contains("<a:t>One</a:t>"));
        assert!(out.contains("<a:t>Two</a:t>"));
    }

    #[test]
    fn unlocatable_original_returns_none() {
        let xml = format!(
            r#"<p:sld {}><p:cSld><p:spTree><p:sp><p:txBody><a:p><a:r><a:t>Hello</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#,
            SLIDE_NS
        );
        assert_eq!(patch_text(&xml, "Absent", "X"), None);
    }

    #[test]
    fn identical_or_empty_input_is_a_noop() {
        let xml = "<a:t>Same</a:t>";
        assert_eq!(patch_text(xml, "Same", "Same").as_deref(), Some(xml));
        assert_eq!(patch_text(xml, "", "New").as_deref(), Some(xml));
        assert_eq!(patch_text(xml, "Same", "").as_deref(), Some(xml));
    }

    #[test]
    fn content_colliding_with_markup_cannot_corrupt_it() {
        // "a:t" as content must only ever be replaced inside a run body.
        let xml = "<a:t>a:t</a:t>";
        let out = patch_text(xml, "a:t", "safe").unwrap();
        assert_eq!(out, "<a:t>safe</a:t>");
    }

    #[test]
    fn escape_round_trip() {
        let raw = r#"a < b & c > "d'""#;
        assert_eq!(unescape_xml(&escape_xml(raw)), raw);
        assert_eq!(unescape_xml("&unknown; &amp;"), "&unknown; &");
    }
}
