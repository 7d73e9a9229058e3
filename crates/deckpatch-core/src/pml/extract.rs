//! Element extraction: one slide's shape tree into the element model.
//!
//! Every direct child of `p:spTree` that is a shape, picture, connector, or
//! graphic frame becomes an element. A node whose structure is broken still
//! yields an element with a substituted default transform; only references
//! that cannot be resolved at all drop out, with a warning.

use crate::package::PptxPackage;
use crate::pml::settings::EditOptions;
use crate::pml::text_patch::unescape_xml;
use crate::pml::types::{ElementKind, Slide, SlideElement};
use crate::units::{parse_emu, to_emu, to_inches};
use crate::xml::namespaces::{A, P, R};
use crate::xml::xname::XName;
use crate::xml::{parser, XmlDocument};
use indextree::NodeId;
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// The spTree children that become elements. Anything else (group shapes,
/// properties, extension lists) is passed over.
static VISUAL_CHILDREN: Lazy<HashSet<XName>> = Lazy::new(|| {
    HashSet::from([P::sp(), P::pic(), P::graphicFrame(), P::cxnSp()])
});

/// Offset + extent in EMU, as read from (or written to) an `a:xfrm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Transform {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

impl Transform {
    pub fn default_for(opts: &EditOptions) -> Self {
        Self {
            x: 0,
            y: 0,
            cx: to_emu(opts.default_extent),
            cy: to_emu(opts.default_extent),
        }
    }
}

/// Extract every slide the archive contains. Slides that fail to extract
/// are skipped with a warning, never fatal to the batch.
pub fn extract_all(pkg: &PptxPackage, opts: &EditOptions) -> Vec<Slide> {
    let mut slides = Vec::new();
    for number in pkg.slide_numbers() {
        match extract_slide(pkg, number, opts) {
            Ok(slide) => slides.push(slide),
            Err(e) => log::warn!("skipping slide {}: {}", number, e),
        }
    }
    slides
}

pub fn extract_slide(
    pkg: &PptxPackage,
    number: usize,
    opts: &EditOptions,
) -> crate::error::Result<Slide> {
    let path = pkg.slide_path(number);
    let xml = pkg.part_text(&path)?;

    let elements = match parser::parse(&xml) {
        Ok(doc) => match shape_tree(&doc) {
            Some(tree) => extract_elements(&doc, tree, pkg, number, opts),
            None => {
                log::warn!("slide {} has no spTree; salvaging bare text runs", number);
                salvage_elements(&xml, opts)
            }
        },
        Err(e) => {
            log::warn!("slide {} is unparsable ({}); salvaging bare text runs", number, e);
            salvage_elements(&xml, opts)
        }
    };

    Ok(Slide {
        number,
        width: opts.slide_width,
        height: opts.slide_height,
        elements,
    })
}

/// `p:sld/p:cSld/p:spTree`, if the slide has the expected structure.
pub(crate) fn shape_tree(doc: &XmlDocument) -> Option<NodeId> {
    let root = doc.root()?;
    let c_sld = doc.find_child(root, &P::cSld())?;
    doc.find_child(c_sld, &P::spTree())
}

fn extract_elements(
    doc: &XmlDocument,
    tree: NodeId,
    pkg: &PptxPackage,
    slide_number: usize,
    opts: &EditOptions,
) -> Vec<SlideElement> {
    let rels = pkg.merged_slide_relationships(slide_number);
    let mut elements = Vec::new();
    let mut index = 0usize;

    let mut push = |elements: &mut Vec<SlideElement>, kind: ElementKind, tf: Transform| {
        let id = format!("{}-{}", kind.name(), index);
        index += 1;
        elements.push(SlideElement::new(
            id,
            to_inches(tf.x),
            to_inches(tf.y),
            to_inches(tf.cx),
            to_inches(tf.cy),
            kind,
        ));
    };

    for node in doc.children(tree) {
        let Some(name) = doc.name(node) else { continue };
        if !VISUAL_CHILDREN.contains(name) {
            continue;
        }

        let tf = resolve_transform(doc, node).unwrap_or_else(|| Transform::default_for(opts));

        if doc.is_named(node, &P::pic()) {
            match extract_image(doc, node, pkg, &rels) {
                Some(kind) => push(&mut elements, kind, tf),
                None => {} // non-image or unresolvable blip; already logged
            }
            continue;
        }

        if doc.is_named(node, &P::graphicFrame()) {
            if let Some(grid) = table_grid(doc, node) {
                // Both the table and its flattened text are emitted;
                // downstream consumers historically expect either.
                let text = grid
                    .iter()
                    .map(|row| row.join(" | "))
                    .collect::<Vec<_>>()
                    .join("\n");
                push(&mut elements, ElementKind::Table { rows: grid }, tf);
                push(
                    &mut elements,
                    ElementKind::Text {
                        original_content: text.clone(),
                        content: text,
                    },
                    tf,
                );
                continue;
            }
            push(&mut elements, ElementKind::Shape, tf);
            continue;
        }

        // p:sp and p:cxnSp: text if a non-whitespace body exists.
        match doc.find_child(node, &P::txBody()) {
            Some(tx_body) => {
                let content = text_body_content(doc, tx_body);
                if content.trim().is_empty() {
                    push(&mut elements, ElementKind::Shape, tf);
                } else {
                    push(
                        &mut elements,
                        ElementKind::Text {
                            original_content: content.clone(),
                            content,
                        },
                        tf,
                    );
                }
            }
            None => push(&mut elements, ElementKind::Shape, tf),
        }
    }

    elements
}

/// Resolve a node's transform by checking, in order: shape-properties
/// transform, direct DrawingML transform, graphic-frame transform.
pub(crate) fn resolve_transform(doc: &XmlDocument, node: NodeId) -> Option<Transform> {
    let xfrm = doc
        .find_child(node, &P::spPr())
        .and_then(|sp_pr| doc.find_child(sp_pr, &A::xfrm()))
        .or_else(|| doc.find_child(node, &A::xfrm()))
        .or_else(|| doc.find_child(node, &P::xfrm()))?;

    let mut tf = Transform {
        x: 0,
        y: 0,
        cx: 0,
        cy: 0,
    };
    if let Some(off) = doc.find_child(xfrm, &A::off()) {
        tf.x = parse_emu(doc.attribute_local(off, "x").unwrap_or("0"));
        tf.y = parse_emu(doc.attribute_local(off, "y").unwrap_or("0"));
    }
    if let Some(ext) = doc.find_child(xfrm, &A::ext()) {
        tf.cx = parse_emu(doc.attribute_local(ext, "cx").unwrap_or("0"));
        tf.cy = parse_emu(doc.attribute_local(ext, "cy").unwrap_or("0"));
    }
    Some(tf)
}

/// Paragraphs joined with `\n`; runs within a paragraph joined with no
/// separator, in document order.
pub(crate) fn text_body_content(doc: &XmlDocument, tx_body: NodeId) -> String {
    let mut paragraphs = Vec::new();
    for p in doc.children_named(tx_body, &A::p()) {
        let mut para = String::new();
        for child in doc.children(p) {
            let Some(name) = doc.name(child) else { continue };
            if *name == A::r() || *name == A::fld() {
                if let Some(t) = doc.find_child(child, &A::t()) {
                    para.push_str(&doc.element_text(t));
                }
            }
        }
        paragraphs.push(para);
    }
    paragraphs.join("\n")
}

fn extract_image(
    doc: &XmlDocument,
    pic: NodeId,
    pkg: &PptxPackage,
    rels: &std::collections::BTreeMap<String, String>,
) -> Option<ElementKind> {
    let blip = doc
        .find_child(pic, &P::blipFill())
        .and_then(|fill| doc.find_child(fill, &A::blip()))?;
    let embed = doc.attribute(blip, &R::embed())?;

    let Some(target) = rels.get(embed) else {
        log::warn!("blip references undeclared relationship {}", embed);
        return None;
    };

    if !likely_image_path(target) {
        // Layout/notes/theme and other non-image references show up in
        // blips occasionally; skip silently.
        return None;
    }

    let Some(resolved) = pkg.resolve_media_target(target) else {
        log::warn!("image target {} not found by any candidate path", target);
        return None;
    };

    let src = resolved.rsplit('/').next().unwrap_or(&resolved).to_string();
    Some(ElementKind::Image {
        src,
        original_path: Some(resolved),
    })
}

/// Grid of cell strings for a graphic frame wrapping table data.
pub(crate) fn table_grid(doc: &XmlDocument, frame: NodeId) -> Option<Vec<Vec<String>>> {
    let tbl = doc
        .find_child(frame, &A::graphic())
        .and_then(|graphic| doc.find_child(graphic, &A::graphicData()))
        .and_then(|data| doc.find_child(data, &A::tbl()))?;

    let mut rows = Vec::new();
    for tr in doc.children_named(tbl, &A::tr()) {
        let mut cells = Vec::new();
        for tc in doc.children_named(tr, &A::tc()) {
            let text = doc
                .find_child(tc, &A::txBody())
                .map(|tx| text_body_content(doc, tx))
                .unwrap_or_default();
            cells.push(text);
        }
        rows.push(cells);
    }
    Some(rows)
}

/// Whether a relationship target plausibly names an image.
pub(crate) fn likely_image_path(path: &str) -> bool {
    if unlikely_image_path(path) {
        return false;
    }
    let lower = path.to_ascii_lowercase();
    const IMAGE_EXTENSIONS: &[&str] = &[
        ".png", ".jpg", ".jpeg", ".gif", ".bmp", ".tif", ".tiff", ".svg", ".emf", ".wmf",
    ];
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
        || lower.contains("media/")
        || lower.contains("image")
}

pub(crate) fn unlikely_image_path(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    lower.ends_with(".xml")
        || lower.contains("slidelayout")
        || lower.contains("notesslide")
        || lower.contains("theme")
}

/// Best-effort salvage for a slide whose structure does not match the
/// expected containers: scan the serialized form for bare text-run payloads
/// and synthesize pseudo-elements at staggered default positions.
pub(crate) fn salvage_elements(xml: &str, opts: &EditOptions) -> Vec<SlideElement> {
    let mut elements = Vec::new();
    let finder = memchr::memmem::Finder::new(b"<a:t>");

    let bytes = xml.as_bytes();
    for start in finder.find_iter(bytes) {
        let body_start = start + 5;
        let Some(rel_end) = memchr::memmem::find(&bytes[body_start..], b"</a:t>") else {
            continue;
        };
        let body = &xml[body_start..body_start + rel_end];
        if body.trim().is_empty() {
            continue;
        }

        let content = unescape_xml(body);
        let index = elements.len();
        elements.push(SlideElement::new(
            format!("text-{}", index),
            0.5,
            0.5 + index as f64 * 0.75,
            opts.slide_width - 1.0,
            0.5,
            ElementKind::Text {
                original_content: content.clone(),
                content,
            },
        ));
    }

    elements
}
