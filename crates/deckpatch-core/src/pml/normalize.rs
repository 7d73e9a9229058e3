//! Canonicalizes transform values in serialized slide XML.
//!
//! Editors sometimes hand back fractional or junk EMU values. The normalizer
//! rewrites only the offset and extent attributes of `a:off`/`a:ext` tags,
//! in place on the string, so everything else stays byte for byte. Running
//! it twice produces the same output as running it once.

use crate::units::parse_emu;

pub(crate) fn normalize_dimensions(xml: &str) -> String {
    let mut out = String::with_capacity(xml.len());
    let mut rest = xml;

    loop {
        let off = rest.find("<a:off");
        let ext = rest.find("<a:ext");
        let next = match (off, ext) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        let Some(pos) = next else { break };

        // Reject lookalike names such as a:offset.
        let after = rest.as_bytes().get(pos + 6).copied();
        if !matches!(after, Some(b' ' | b'\t' | b'\r' | b'\n' | b'/' | b'>')) {
            out.push_str(&rest[..pos + 6]);
            rest = &rest[pos + 6..];
            continue;
        }

        let Some(end_rel) = rest[pos..].find('>') else { break };
        let end = pos + end_rel + 1;
        out.push_str(&rest[..pos]);

        let tag = &rest[pos..end];
        let names: &[&str] = if tag.starts_with("<a:off") {
            &["x", "y"]
        } else {
            &["cx", "cy"]
        };
        out.push_str(&rewrite_tag(tag, names));
        rest = &rest[end..];
    }

    out.push_str(rest);
    out
}

fn rewrite_tag(tag: &str, names: &[&str]) -> String {
    let mut out = tag.to_string();
    for name in names {
        let marker = format!(" {}=\"", name);
        let Some(start) = out.find(&marker) else { continue };
        let value_start = start + marker.len();
        let Some(len) = out[value_start..].find('"') else { continue };
        let canonical = parse_emu(&out[value_start..value_start + len]).to_string();
        out.replace_range(value_start..value_start + len, &canonical);
    }
    out
}
