//! DrawingML table building and replacement.
//!
//! A replaced table keeps its frame and style but gets a rebuilt grid: the
//! frame's width is divided evenly across the new column count, and the
//! frame's height across the new rows. Inserted tables follow the same
//! layout from a caller-supplied extent, falling back to stock dimensions.

use crate::error::{DeckError, Result};
use crate::pml::extract::shape_tree;
use crate::pml::image_patch::{build_transform, local_attr, next_shape_id};
use crate::pml::settings::EditOptions;
use crate::pml::types::{ElementKind, SlideElement};
use crate::units::{parse_emu, to_emu};
use crate::xml::namespaces::{A, P};
use crate::xml::node::XmlNodeData;
use crate::xml::{builder, parser, XmlDocument};
use indextree::NodeId;

const TABLE_GRAPHIC_URI: &str = "http://schemas.openxmlformats.org/drawingml/2006/table";
const DEFAULT_TABLE_STYLE: &str = "{5C22544A-7EE6-4342-B048-85BDC9FD1C3A}";
/// Fill for the even banding rows, matching the default style's light gray.
const BAND_FILL: &str = "D9D9D9";

/// Swap the contents of the table nearest to `element` for `rows`.
pub(crate) fn replace_table(
    xml: &str,
    slide_number: usize,
    element: &SlideElement,
    rows: &[Vec<String>],
    opts: &EditOptions,
) -> Result<String> {
    if rows.is_empty() || rows.iter().all(|r| r.is_empty()) {
        return Err(DeckError::InvalidEdit {
            message: "table replacement requires at least one non-empty row".to_string(),
        });
    }

    let mut doc = parse_slide(xml, slide_number)?;
    let tree = shape_tree(&doc).ok_or_else(|| DeckError::InvalidEdit {
        message: format!("slide {} has no shape tree", slide_number),
    })?;

    let (frame, graphic_data, tbl) =
        find_table_frame(&doc, tree, element, opts).ok_or_else(|| DeckError::InvalidEdit {
            message: format!("no table near ({}, {}) to replace", element.x, element.y),
        })?;

    let style_id = doc
        .find_child(tbl, &A::tblPr())
        .and_then(|pr| doc.find_child(pr, &A::tableStyleId()))
        .map(|node| doc.element_text(node));

    let (width, height) = frame_extent(&doc, frame)
        .unwrap_or((to_emu(element.width.max(1.0)), to_emu(element.height.max(0.5))));

    doc.remove(tbl);
    build_table(&mut doc, graphic_data, rows, width, height, style_id.as_deref());

    builder::serialize(&doc)
}

/// Append a new table frame to the slide. Empty `rows` yields a placeholder
/// grid with labelled cells.
pub(crate) fn insert_table(
    xml: &str,
    slide_number: usize,
    element: &SlideElement,
    opts: &EditOptions,
) -> Result<String> {
    let rows = match &element.kind {
        ElementKind::Table { rows } if !rows.is_empty() => rows.clone(),
        _ => placeholder_grid(opts.placeholder_rows, opts.placeholder_cols),
    };

    let mut doc = parse_slide(xml, slide_number)?;
    let tree = shape_tree(&doc).ok_or_else(|| DeckError::InvalidEdit {
        message: format!("slide {} has no shape tree", slide_number),
    })?;

    let mut sized = element.clone();
    if sized.width <= 0.0 {
        sized.width = opts.table_width;
    }
    if sized.height <= 0.0 {
        sized.height = opts.table_row_height * rows.len() as f64;
    }

    let shape_id = next_shape_id(&doc);
    let frame = doc.add_child(tree, XmlNodeData::element(P::graphicFrame()));

    let nv = doc.add_child(frame, XmlNodeData::element(P::nvGraphicFramePr()));
    doc.add_child(
        nv,
        XmlNodeData::element_with_attrs(
            P::cNvPr(),
            vec![
                local_attr("id", &shape_id.to_string()),
                local_attr("name", &format!("Table {}", shape_id)),
            ],
        ),
    );
    doc.add_child(nv, XmlNodeData::element(P::cNvGraphicFramePr()));
    doc.add_child(nv, XmlNodeData::element(P::nvPr()));

    build_transform(&mut doc, frame, P::xfrm(), &sized);

    let graphic = doc.add_child(frame, XmlNodeData::element(A::graphic()));
    let graphic_data = doc.add_child(
        graphic,
        XmlNodeData::element_with_attrs(
            A::graphicData(),
            vec![local_attr("uri", TABLE_GRAPHIC_URI)],
        ),
    );
    build_table(
        &mut doc,
        graphic_data,
        &rows,
        to_emu(sized.width),
        to_emu(sized.height),
        None,
    );
    doc.ensure_namespace("a", A::NS);

    builder::serialize(&doc)
}

fn parse_slide(xml: &str, slide_number: usize) -> Result<XmlDocument> {
    parser::parse(xml).map_err(|e| DeckError::XmlParse {
        message: e.to_string(),
        location: format!("ppt/slides/slide{}.xml", slide_number),
    })
}

fn find_table_frame(
    doc: &XmlDocument,
    tree: NodeId,
    element: &SlideElement,
    opts: &EditOptions,
) -> Option<(NodeId, NodeId, NodeId)> {
    let frames: Vec<(NodeId, NodeId, NodeId)> = doc
        .children(tree)
        .filter(|&node| doc.is_named(node, &P::graphicFrame()))
        .filter_map(|frame| {
            let data = doc
                .find_child(frame, &A::graphic())
                .and_then(|g| doc.find_child(g, &A::graphicData()))?;
            let tbl = doc.find_child(data, &A::tbl())?;
            Some((frame, data, tbl))
        })
        .collect();

    frames
        .iter()
        .filter_map(|&(frame, data, tbl)| {
            let (x, y) = frame_offset(doc, frame)?;
            let dx = (crate::units::to_inches(x) - element.x).abs();
            let dy = (crate::units::to_inches(y) - element.y).abs();
            (dx <= opts.loose_tolerance && dy <= opts.loose_tolerance)
                .then_some(((frame, data, tbl), dx + dy))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(hit, _)| hit)
}

fn frame_offset(doc: &XmlDocument, frame: NodeId) -> Option<(i64, i64)> {
    let off = doc
        .find_child(frame, &P::xfrm())
        .and_then(|xfrm| doc.find_child(xfrm, &A::off()))?;
    Some((
        parse_emu(doc.attribute_local(off, "x").unwrap_or("0")),
        parse_emu(doc.attribute_local(off, "y").unwrap_or("0")),
    ))
}

fn frame_extent(doc: &XmlDocument, frame: NodeId) -> Option<(i64, i64)> {
    let ext = doc
        .find_child(frame, &P::xfrm())
        .and_then(|xfrm| doc.find_child(xfrm, &A::ext()))?;
    let cx = parse_emu(doc.attribute_local(ext, "cx")?);
    let cy = parse_emu(doc.attribute_local(ext, "cy")?);
    (cx > 0 && cy > 0).then_some((cx, cy))
}

/// "Cell 1-1" style labels so a freshly inserted grid is visible and each
/// cell is easy to address in a follow-up edit.
fn placeholder_grid(rows: usize, cols: usize) -> Vec<Vec<String>> {
    (0..rows)
        .map(|r| (0..cols).map(|c| format!("Cell {}-{}", r + 1, c + 1)).collect())
        .collect()
}

fn build_table(
    doc: &mut XmlDocument,
    graphic_data: NodeId,
    rows: &[Vec<String>],
    width: i64,
    height: i64,
    style_id: Option<&str>,
) {
    let cols = rows.iter().map(Vec::len).max().unwrap_or(1).max(1);
    let col_width = width / cols as i64;
    let row_height = height / rows.len().max(1) as i64;

    let tbl = doc.add_child(graphic_data, XmlNodeData::element(A::tbl()));

    let tbl_pr = doc.add_child(
        tbl,
        XmlNodeData::element_with_attrs(
            A::tblPr(),
            vec![local_attr("firstRow", "1"), local_attr("bandRow", "1")],
        ),
    );
    let style = doc.add_child(tbl_pr, XmlNodeData::element(A::tableStyleId()));
    doc.set_element_text(style, style_id.unwrap_or(DEFAULT_TABLE_STYLE));

    let grid = doc.add_child(tbl, XmlNodeData::element(A::tblGrid()));
    for _ in 0..cols {
        doc.add_child(
            grid,
            XmlNodeData::element_with_attrs(
                A::gridCol(),
                vec![local_attr("w", &col_width.to_string())],
            ),
        );
    }

    for (index, row) in rows.iter().enumerate() {
        let tr = doc.add_child(
            tbl,
            XmlNodeData::element_with_attrs(
                A::tr(),
                vec![local_attr("h", &row_height.to_string())],
            ),
        );
        for col in 0..cols {
            let text = row.get(col).map(String::as_str).unwrap_or("");
            build_cell(doc, tr, text, index % 2 == 1);
        }
    }
}

fn build_cell(doc: &mut XmlDocument, tr: NodeId, text: &str, shaded: bool) {
    let tc = doc.add_child(tr, XmlNodeData::element(A::tc()));
    let tx = doc.add_child(tc, XmlNodeData::element(A::txBody()));
    doc.add_child(tx, XmlNodeData::element(A::bodyPr()));
    doc.add_child(tx, XmlNodeData::element(A::lstStyle()));
    let p = doc.add_child(tx, XmlNodeData::element(A::p()));
    let run = doc.add_child(p, XmlNodeData::element(A::r()));
    let t = doc.add_child(run, XmlNodeData::element(A::t()));
    doc.set_element_text(t, text);
    let tc_pr = doc.add_child(tc, XmlNodeData::element(A::tcPr()));
    if shaded {
        let fill = doc.add_child(tc_pr, XmlNodeData::element(A::solidFill()));
        doc.add_child(
            fill,
            XmlNodeData::element_with_attrs(A::srgbClr(), vec![local_attr("val", BAND_FILL)]),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::PptxPackage;
    use crate::pml::extract;
    use pretty_assertions::assert_eq;

    const SLIDE_NS: &str = concat!(
        r#"xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" "#,
        r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main""#
    );

    fn empty_slide() -> String {
        format!(
            r#"<p:sld {}><p:cSld><p:spTree/></p:cSld></p:sld>"#,
            SLIDE_NS
        )
    }

    fn table_element(rows: Vec<Vec<String>>) -> SlideElement {
        SlideElement::new(
            "table-0".to_string(),
            1.0,
            1.0,
            4.0,
            2.0,
            ElementKind::Table { rows },
        )
    }

    fn grid_of(pkg: &PptxPackage) -> Vec<Vec<String>> {
        let slide = extract::extract_slide(pkg, 1, &EditOptions::default()).unwrap();
        match &slide.elements[0].kind {
            ElementKind::Table { rows } => rows.clone(),
            other => panic!("expected table, got {}", other.name()),
        }
    }

    #[test]
    fn insert_then_extract_round_trips_cells() {
        let rows = vec![
            vec!["H1".to_string(), "H2".to_string()],
            vec!["a".to_string(), "b".to_string()],
        ];
        let out = insert_table(
            &empty_slide(),
            1,
            &table_element(rows.clone()),
            &EditOptions::default(),
        )
        .unwrap();

        let mut pkg = PptxPackage::new();
        pkg.set_part("ppt/slides/slide1.xml", out.into_bytes());
        assert_eq!(grid_of(&pkg), rows);
    }

    #[test]
    fn insert_without_rows_builds_placeholder_grid() {
        let mut element = table_element(vec![]);
        element.width = 0.0;
        element.height = 0.0;
        let out = insert_table(&empty_slide(), 1, &element, &EditOptions::default()).unwrap();

        let mut pkg = PptxPackage::new();
        pkg.set_part("ppt/slides/slide1.xml", out.into_bytes());
        let grid = grid_of(&pkg);
        assert_eq!(grid.len(), 5);
        assert!(grid.iter().all(|row| row.len() == 5));
        assert_eq!(grid[0][0], "Cell 1-1");
        assert_eq!(grid[4][4], "Cell 5-5");
    }

    #[test]
    fn insert_divides_width_evenly_across_columns() {
        let out = insert_table(
            &empty_slide(),
            1,
            &table_element(vec![vec!["a".into(), "b".into(), "c".into(), "d".into()]]),
            &EditOptions::default(),
        )
        .unwrap();

        // 4.0in frame over four columns.
        let expected = to_emu(4.0) / 4;
        let needle = format!(r#"<a:gridCol w="{}"/>"#, expected);
        assert_eq!(out.matches(&needle).count(), 4);
    }

    #[test]
    fn replace_keeps_frame_and_style_but_swaps_cells() {
        let original = insert_table(
            &empty_slide(),
            1,
            &table_element(vec![vec!["old".to_string()]]),
            &EditOptions::default(),
        )
        .unwrap();

        let replacement = vec![
            vec!["r1c1".to_string(), "r1c2".to_string()],
            vec!["r2c1".to_string(), "r2c2".to_string()],
            vec!["r3c1".to_string(), "r3c2".to_string()],
        ];
        let out = replace_table(
            &original,
            1,
            &table_element(vec![]),
            &replacement,
            &EditOptions::default(),
        )
        .unwrap();

        let mut pkg = PptxPackage::new();
        pkg.set_part("ppt/slides/slide1.xml", out.clone().into_bytes());
        assert_eq!(grid_of(&pkg), replacement);
        assert!(out.contains(DEFAULT_TABLE_STYLE));
        // Frame extent survives; rows are an even division of it.
        assert!(out.contains(&format!(r#"<a:ext cx="{}" cy="{}"/>"#, to_emu(4.0), to_emu(2.0))));
        let row_h = to_emu(2.0) / 3;
        assert_eq!(out.matches(&format!(r#"<a:tr h="{}">"#, row_h)).count(), 3);
    }

    #[test]
    fn ragged_rows_pad_to_widest() {
        let rows = vec![
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
            vec!["d".to_string()],
        ];
        let out = insert_table(&empty_slide(), 1, &table_element(rows), &EditOptions::default())
            .unwrap();

        let mut pkg = PptxPackage::new();
        pkg.set_part("ppt/slides/slide1.xml", out.into_bytes());
        let grid = grid_of(&pkg);
        assert_eq!(grid[1], vec!["d".to_string(), String::new(), String::new()]);
    }

    #[test]
    fn every_second_row_is_shaded() {
        let rows = vec![
            vec!["a".to_string(), "b".to_string()],
            vec!["c".to_string(), "d".to_string()],
            vec!["e".to_string(), "f".to_string()],
            vec!["g".to_string(), "h".to_string()],
        ];
        let out = insert_table(&empty_slide(), 1, &table_element(rows), &EditOptions::default())
            .unwrap();

        // Rows two and four carry the band fill, two cells each.
        let needle = format!(r#"<a:srgbClr val="{}"/>"#, BAND_FILL);
        assert_eq!(out.matches(&needle).count(), 4);
    }

    #[test]
    fn far_edit_does_not_replace_the_only_table() {
        let original = insert_table(
            &empty_slide(),
            1,
            &table_element(vec![vec!["old".to_string()]]),
            &EditOptions::default(),
        )
        .unwrap();

        let mut far = table_element(vec![]);
        far.x = 9.0;
        far.y = 6.0;
        let err = replace_table(
            &original,
            1,
            &far,
            &[vec!["new".to_string()]],
            &EditOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DeckError::InvalidEdit { .. }));
    }

    #[test]
    fn replacing_with_no_rows_is_rejected() {
        let err = replace_table(
            &empty_slide(),
            1,
            &table_element(vec![]),
            &[],
            &EditOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DeckError::InvalidEdit { .. }));
    }
}
