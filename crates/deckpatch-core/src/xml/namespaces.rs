#![allow(non_snake_case)]

use super::xname::XName;

/// PresentationML
pub mod P {
    use super::XName;
    pub const NS: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";

    pub fn sld() -> XName { XName::new(NS, "sld") }
    pub fn cSld() -> XName { XName::new(NS, "cSld") }
    pub fn spTree() -> XName { XName::new(NS, "spTree") }
    pub fn sp() -> XName { XName::new(NS, "sp") }
    pub fn pic() -> XName { XName::new(NS, "pic") }
    pub fn cxnSp() -> XName { XName::new(NS, "cxnSp") }
    pub fn grpSp() -> XName { XName::new(NS, "grpSp") }
    pub fn graphicFrame() -> XName { XName::new(NS, "graphicFrame") }
    pub fn nvSpPr() -> XName { XName::new(NS, "nvSpPr") }
    pub fn nvPicPr() -> XName { XName::new(NS, "nvPicPr") }
    pub fn nvCxnSpPr() -> XName { XName::new(NS, "nvCxnSpPr") }
    pub fn nvGraphicFramePr() -> XName { XName::new(NS, "nvGraphicFramePr") }
    pub fn cNvPr() -> XName { XName::new(NS, "cNvPr") }
    pub fn cNvSpPr() -> XName { XName::new(NS, "cNvSpPr") }
    pub fn cNvPicPr() -> XName { XName::new(NS, "cNvPicPr") }
    pub fn cNvGraphicFramePr() -> XName { XName::new(NS, "cNvGraphicFramePr") }
    pub fn nvPr() -> XName { XName::new(NS, "nvPr") }
    pub fn spPr() -> XName { XName::new(NS, "spPr") }
    pub fn blipFill() -> XName { XName::new(NS, "blipFill") }
    pub fn txBody() -> XName { XName::new(NS, "txBody") }
    pub fn xfrm() -> XName { XName::new(NS, "xfrm") }
}

/// DrawingML
pub mod A {
    use super::XName;
    pub const NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";

    pub fn p() -> XName { XName::new(NS, "p") }
    pub fn r() -> XName { XName::new(NS, "r") }
    pub fn t() -> XName { XName::new(NS, "t") }
    pub fn rPr() -> XName { XName::new(NS, "rPr") }
    pub fn xfrm() -> XName { XName::new(NS, "xfrm") }
    pub fn off() -> XName { XName::new(NS, "off") }
    pub fn ext() -> XName { XName::new(NS, "ext") }
    pub fn blip() -> XName { XName::new(NS, "blip") }
    pub fn stretch() -> XName { XName::new(NS, "stretch") }
    pub fn fillRect() -> XName { XName::new(NS, "fillRect") }
    pub fn prstGeom() -> XName { XName::new(NS, "prstGeom") }
    pub fn avLst() -> XName { XName::new(NS, "avLst") }
    pub fn graphic() -> XName { XName::new(NS, "graphic") }
    pub fn graphicData() -> XName { XName::new(NS, "graphicData") }
    pub fn tbl() -> XName { XName::new(NS, "tbl") }
    pub fn tblPr() -> XName { XName::new(NS, "tblPr") }
    pub fn tableStyleId() -> XName { XName::new(NS, "tableStyleId") }
    pub fn tblGrid() -> XName { XName::new(NS, "tblGrid") }
    pub fn gridCol() -> XName { XName::new(NS, "gridCol") }
    pub fn tr() -> XName { XName::new(NS, "tr") }
    pub fn tc() -> XName { XName::new(NS, "tc") }
    pub fn tcPr() -> XName { XName::new(NS, "tcPr") }
    pub fn txBody() -> XName { XName::new(NS, "txBody") }
    pub fn bodyPr() -> XName { XName::new(NS, "bodyPr") }
    pub fn lstStyle() -> XName { XName::new(NS, "lstStyle") }
    pub fn solidFill() -> XName { XName::new(NS, "solidFill") }
    pub fn srgbClr() -> XName { XName::new(NS, "srgbClr") }
    pub fn endParaRPr() -> XName { XName::new(NS, "endParaRPr") }
    pub fn fld() -> XName { XName::new(NS, "fld") }
    pub fn br() -> XName { XName::new(NS, "br") }
}

/// Relationship references inside document parts (r:id, r:embed)
pub mod R {
    use super::XName;
    pub const NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

    pub fn id() -> XName { XName::new(NS, "id") }
    pub fn embed() -> XName { XName::new(NS, "embed") }
}

/// Package relationship parts (.rels files); unprefixed default namespace
pub mod REL {
    use super::XName;
    pub const NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

    pub fn Relationships() -> XName { XName::new(NS, "Relationships") }
    pub fn Relationship() -> XName { XName::new(NS, "Relationship") }
}

/// [Content_Types].xml; unprefixed default namespace
pub mod CT {
    use super::XName;
    pub const NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

    pub fn Types() -> XName { XName::new(NS, "Types") }
    pub fn Default() -> XName { XName::new(NS, "Default") }
    pub fn Override() -> XName { XName::new(NS, "Override") }
}

/// Markup Compatibility
pub mod MC {
    pub const NS: &str = "http://schemas.openxmlformats.org/markup-compatibility/2006";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presentation_names_carry_the_pml_namespace() {
        let tree = P::spTree();
        assert_eq!(tree.namespace.as_deref(), Some(P::NS));
        assert_eq!(tree.local_name, "spTree");
    }

    #[test]
    fn drawing_and_presentation_transforms_differ() {
        assert_ne!(A::xfrm(), P::xfrm());
    }
}
