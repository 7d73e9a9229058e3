//! Image replacement and insertion.
//!
//! New image bytes always go through the package's media store, so identical
//! payloads share one part. The slide only ever changes at the picture node
//! being touched; relationship and content-type bookkeeping happens in the
//! package parts.

use crate::error::{DeckError, Result};
use crate::package::relationships::{self, relationship_types};
use crate::package::{PptxPackage, Relationship};
use crate::pml::extract::{resolve_transform, shape_tree, Transform};
use crate::pml::settings::EditOptions;
use crate::pml::types::SlideElement;
use crate::units::{to_emu, to_inches};
use crate::xml::namespaces::{A, P, R};
use crate::xml::node::XmlNodeData;
use crate::xml::xname::{XAttribute, XName};
use crate::xml::{builder, parser, XmlDocument};
use indextree::NodeId;

/// Point an existing picture at new image bytes. Returns the rewritten
/// slide XML.
pub(crate) fn replace_image(
    pkg: &mut PptxPackage,
    slide_number: usize,
    xml: &str,
    element: &SlideElement,
    bytes: &[u8],
    extension: &str,
    opts: &EditOptions,
) -> Result<String> {
    let mut doc = parse_slide(xml, slide_number)?;
    let tree = shape_tree(&doc).ok_or_else(|| DeckError::InvalidEdit {
        message: format!("slide {} has no shape tree", slide_number),
    })?;

    let pic = find_picture(&doc, tree, element, opts).ok_or_else(|| DeckError::InvalidEdit {
        message: format!("no picture near ({}, {}) to replace", element.x, element.y),
    })?;
    let blip = doc
        .find_child(pic, &P::blipFill())
        .and_then(|fill| doc.find_child(fill, &A::blip()))
        .ok_or_else(|| DeckError::InvalidEdit {
            message: "matched picture has no blip fill".to_string(),
        })?;

    let media_path = pkg.add_media(bytes, extension)?;
    let rel_id = ensure_image_relationship(pkg, slide_number, &media_path)?;

    doc.set_attribute(blip, &R::embed(), &rel_id);
    update_transform(&mut doc, pic, element);
    doc.ensure_namespace("r", R::NS);

    builder::serialize(&doc)
}

/// Rewrite a picture's offset and extent in place. An existing `a:xfrm`
/// keeps its other attributes (rotation, flips); only off/ext change.
fn update_transform(doc: &mut XmlDocument, pic: NodeId, element: &SlideElement) {
    let Some(sp_pr) = doc.find_child(pic, &P::spPr()) else {
        return;
    };
    let Some(xfrm) = doc.find_child(sp_pr, &A::xfrm()) else {
        build_transform(doc, sp_pr, A::xfrm(), element);
        return;
    };

    let off = match doc.find_child(xfrm, &A::off()) {
        Some(off) => off,
        None => doc.add_child(xfrm, XmlNodeData::element(A::off())),
    };
    doc.set_attribute(off, &XName::local("x"), &to_emu(element.x).to_string());
    doc.set_attribute(off, &XName::local("y"), &to_emu(element.y).to_string());

    let ext = match doc.find_child(xfrm, &A::ext()) {
        Some(ext) => ext,
        None => doc.add_child(xfrm, XmlNodeData::element(A::ext())),
    };
    doc.set_attribute(ext, &XName::local("cx"), &to_emu(element.width).to_string());
    doc.set_attribute(ext, &XName::local("cy"), &to_emu(element.height).to_string());
}

/// Append a fresh picture shape to the slide's tree.
pub(crate) fn insert_image(
    pkg: &mut PptxPackage,
    slide_number: usize,
    xml: &str,
    element: &SlideElement,
    bytes: &[u8],
    extension: &str,
) -> Result<String> {
    let mut doc = parse_slide(xml, slide_number)?;
    let tree = shape_tree(&doc).ok_or_else(|| DeckError::InvalidEdit {
        message: format!("slide {} has no shape tree", slide_number),
    })?;

    let media_path = pkg.add_media(bytes, extension)?;
    let rel_id = ensure_image_relationship(pkg, slide_number, &media_path)?;
    let shape_id = next_shape_id(&doc);

    build_picture(&mut doc, tree, element, &rel_id, shape_id);
    doc.ensure_namespace("a", A::NS);
    doc.ensure_namespace("r", R::NS);

    builder::serialize(&doc)
}

/// Reuse an existing relationship to the same media part, or mint the next
/// free `rId`.
pub(crate) fn ensure_image_relationship(
    pkg: &mut PptxPackage,
    slide_number: usize,
    media_path: &str,
) -> Result<String> {
    let target = format!("../{}", media_path.trim_start_matches("ppt/"));
    let rels_path = pkg.slide_rels_path(slide_number);
    let mut rels = pkg.relationships(&rels_path);

    if let Some(existing) = rels.iter().find(|rel| rel.target == target) {
        return Ok(existing.id.clone());
    }

    let id = relationships::next_relationship_id(&rels);
    rels.push(Relationship::new(&id, relationship_types::IMAGE, &target));
    pkg.write_relationships(&rels_path, &rels)?;
    Ok(id)
}

fn parse_slide(xml: &str, slide_number: usize) -> Result<XmlDocument> {
    parser::parse(xml).map_err(|e| DeckError::XmlParse {
        message: e.to_string(),
        location: format!("ppt/slides/slide{}.xml", slide_number),
    })
}

fn find_picture(
    doc: &XmlDocument,
    tree: NodeId,
    element: &SlideElement,
    opts: &EditOptions,
) -> Option<NodeId> {
    let pics: Vec<NodeId> = doc
        .children(tree)
        .filter(|&node| doc.is_named(node, &P::pic()))
        .collect();

    // Only a tight positional hit may retarget a picture in place;
    // anything looser risks rewiring the wrong image.
    pics.iter()
        .filter_map(|&pic| {
            let tf = resolve_transform(doc, pic)?;
            let dx = (to_inches(tf.x) - element.x).abs();
            let dy = (to_inches(tf.y) - element.y).abs();
            (dx <= opts.tight_tolerance && dy <= opts.tight_tolerance).then_some((pic, dx + dy))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(pic, _)| pic)
}

/// Largest `p:cNvPr` id in the document plus one.
pub(crate) fn next_shape_id(doc: &XmlDocument) -> u64 {
    let Some(root) = doc.root() else { return 2 };
    doc.descendants(root)
        .filter(|&node| doc.is_named(node, &P::cNvPr()))
        .filter_map(|node| doc.attribute_local(node, "id"))
        .filter_map(|id| id.parse::<u64>().ok())
        .max()
        .unwrap_or(1)
        + 1
}

fn build_picture(
    doc: &mut XmlDocument,
    tree: NodeId,
    element: &SlideElement,
    rel_id: &str,
    shape_id: u64,
) {
    let pic = doc.add_child(tree, XmlNodeData::element(P::pic()));

    let nv_pic_pr = doc.add_child(pic, XmlNodeData::element(P::nvPicPr()));
    doc.add_child(
        nv_pic_pr,
        XmlNodeData::element_with_attrs(
            P::cNvPr(),
            vec![
                local_attr("id", &shape_id.to_string()),
                local_attr("name", &format!("Picture {}", shape_id)),
            ],
        ),
    );
    doc.add_child(nv_pic_pr, XmlNodeData::element(P::cNvPicPr()));
    doc.add_child(nv_pic_pr, XmlNodeData::element(P::nvPr()));

    let blip_fill = doc.add_child(pic, XmlNodeData::element(P::blipFill()));
    doc.add_child(
        blip_fill,
        XmlNodeData::element_with_attrs(
            A::blip(),
            vec![XAttribute::new(R::embed(), rel_id)],
        ),
    );
    let stretch = doc.add_child(blip_fill, XmlNodeData::element(A::stretch()));
    doc.add_child(stretch, XmlNodeData::element(A::fillRect()));

    let sp_pr = doc.add_child(pic, XmlNodeData::element(P::spPr()));
    build_transform(doc, sp_pr, A::xfrm(), element);
    let geom = doc.add_child(
        sp_pr,
        XmlNodeData::element_with_attrs(A::prstGeom(), vec![local_attr("prst", "rect")]),
    );
    doc.add_child(geom, XmlNodeData::element(A::avLst()));
}

/// Write a transform under `parent`. Pictures wrap theirs in `a:xfrm`,
/// graphic frames in `p:xfrm`.
pub(crate) fn build_transform(
    doc: &mut XmlDocument,
    parent: NodeId,
    wrapper: XName,
    element: &SlideElement,
) {
    let tf = Transform {
        x: to_emu(element.x),
        y: to_emu(element.y),
        cx: to_emu(element.width),
        cy: to_emu(element.height),
    };
    let xfrm = doc.add_child(parent, XmlNodeData::element(wrapper));
    doc.add_child(
        xfrm,
        XmlNodeData::element_with_attrs(
            A::off(),
            vec![
                local_attr("x", &tf.x.to_string()),
                local_attr("y", &tf.y.to_string()),
            ],
        ),
    );
    doc.add_child(
        xfrm,
        XmlNodeData::element_with_attrs(
            A::ext(),
            vec![
                local_attr("cx", &tf.cx.to_string()),
                local_attr("cy", &tf.cy.to_string()),
            ],
        ),
    );
}

pub(crate) fn local_attr(name: &str, value: &str) -> XAttribute {
    XAttribute::new(XName::local(name), value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pml::extract;
    use crate::pml::types::ElementKind;
    use pretty_assertions::assert_eq;

    const SLIDE_NS: &str = concat!(
        r#"xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" "#,
        r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
        r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships""#
    );

    fn slide_with_picture() -> String {
        format!(
            r#"<p:sld {}><p:cSld><p:spTree><p:pic><p:nvPicPr><p:cNvPr id="4" name="Picture 4"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="rId2"/></p:blipFill><p:spPr><a:xfrm><a:off x="914400" y="914400"/><a:ext cx="1828800" cy="1828800"/></a:xfrm></p:spPr></p:pic></p:spTree></p:cSld></p:sld>"#,
            SLIDE_NS
        )
    }

    fn image_element(x: f64, y: f64) -> SlideElement {
        SlideElement::new(
            "image-0".to_string(),
            x,
            y,
            2.0,
            2.0,
            ElementKind::Image {
                src: "new.png".to_string(),
                original_path: None,
            },
        )
    }

    #[test]
    fn replace_rewires_blip_and_registers_everything() {
        let mut pkg = PptxPackage::new();
        let xml = slide_with_picture();
        pkg.set_part("ppt/slides/slide1.xml", xml.clone().into_bytes());

        let out = replace_image(
            &mut pkg,
            1,
            &xml,
            &image_element(1.0, 1.0),
            b"fake png bytes",
            "png",
            &EditOptions::default(),
        )
        .unwrap();

        assert!(!out.contains(r#"r:embed="rId2""#));
        assert!(out.contains("r:embed=\"rId1\""));

        let media: Vec<_> = pkg
            .part_names()
            .filter(|p| p.starts_with("ppt/media/"))
            .collect();
        assert_eq!(media.len(), 1);
        let rels = pkg.relationships("ppt/slides/_rels/slide1.xml.rels");
        assert_eq!(rels.len(), 1);
        assert!(rels[0].target.starts_with("../media/"));
    }

    #[test]
    fn replace_rewrites_transform_but_keeps_rotation() {
        let mut pkg = PptxPackage::new();
        let xml = slide_with_picture().replace("<a:xfrm>", r#"<a:xfrm rot="5400000">"#);
        pkg.set_part("ppt/slides/slide1.xml", xml.clone().into_bytes());

        let out = replace_image(
            &mut pkg,
            1,
            &xml,
            &image_element(1.0, 1.0),
            b"bytes",
            "png",
            &EditOptions::default(),
        )
        .unwrap();

        assert!(out.contains(r#"rot="5400000""#));
        // 2.0in extent from the edited element replaces the old 1828800.
        assert!(out.contains(&format!(r#"cx="{}""#, to_emu(2.0))));
        assert!(out.contains(&format!(r#"x="{}""#, to_emu(1.0))));
    }

    #[test]
    fn far_edit_does_not_retarget_the_only_picture() {
        let mut pkg = PptxPackage::new();
        let xml = slide_with_picture();
        pkg.set_part("ppt/slides/slide1.xml", xml.clone().into_bytes());

        let err = replace_image(
            &mut pkg,
            1,
            &xml,
            &image_element(8.0, 8.0),
            b"bytes",
            "png",
            &EditOptions::default(),
        );
        assert!(err.is_err());
        assert!(xml.contains(r#"r:embed="rId2""#));
    }

    #[test]
    fn identical_bytes_share_one_media_part() {
        let mut pkg = PptxPackage::new();
        let a = pkg.add_media(b"same", "png").unwrap();
        let b = pkg.add_media(b"same", "png").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn relationship_is_reused_for_same_target() {
        let mut pkg = PptxPackage::new();
        let id1 = ensure_image_relationship(&mut pkg, 1, "ppt/media/image_abc.png").unwrap();
        let id2 = ensure_image_relationship(&mut pkg, 1, "ppt/media/image_abc.png").unwrap();
        let id3 = ensure_image_relationship(&mut pkg, 1, "ppt/media/image_def.png").unwrap();
        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
    }

    #[test]
    fn insert_builds_a_resolvable_picture() {
        let mut pkg = PptxPackage::new();
        let xml = format!(
            r#"<p:sld {}><p:cSld><p:spTree/></p:cSld></p:sld>"#,
            SLIDE_NS
        );
        pkg.set_part("ppt/slides/slide1.xml", xml.clone().into_bytes());

        let out = insert_image(
            &mut pkg,
            1,
            &xml,
            &image_element(2.0, 3.0),
            b"payload",
            "jpg",
        )
        .unwrap();
        pkg.set_part("ppt/slides/slide1.xml", out.into_bytes());

        let slide = extract::extract_slide(&pkg, 1, &EditOptions::default()).unwrap();
        assert_eq!(slide.elements.len(), 1);
        assert_eq!((slide.elements[0].x, slide.elements[0].y), (2.0, 3.0));
        assert!(matches!(slide.elements[0].kind, ElementKind::Image { .. }));
    }

    #[test]
    fn next_shape_id_skips_existing_ids() {
        let doc = parser::parse(&slide_with_picture()).unwrap();
        assert_eq!(next_shape_id(&doc), 5);
    }
}
