use std::fmt;

/// A namespace-qualified XML name.
///
/// Slide markup is heavily prefixed (`p:`, `a:`, `r:`); names are compared
/// by namespace URI plus local name, never by prefix.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct XName {
    pub namespace: Option<String>,
    pub local_name: String,
}

impl XName {
    pub fn new(namespace: &str, local_name: &str) -> Self {
        Self {
            namespace: if namespace.is_empty() {
                None
            } else {
                Some(namespace.to_string())
            },
            local_name: local_name.to_string(),
        }
    }

    pub fn local(local_name: &str) -> Self {
        Self {
            namespace: None,
            local_name: local_name.to_string(),
        }
    }

    pub fn has_namespace(&self, ns: &str) -> bool {
        self.namespace.as_deref() == Some(ns)
    }
}

impl fmt::Display for XName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local_name),
            None => write!(f, "{}", self.local_name),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XAttribute {
    pub name: XName,
    pub value: String,
}

impl XAttribute {
    pub fn new(name: XName, value: &str) -> Self {
        Self {
            name,
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_name_displays_in_expanded_form() {
        let name = XName::new(
            "http://schemas.openxmlformats.org/presentationml/2006/main",
            "spTree",
        );
        assert_eq!(
            name.to_string(),
            "{http://schemas.openxmlformats.org/presentationml/2006/main}spTree"
        );
    }

    #[test]
    fn unqualified_name_displays_bare() {
        let name = XName::local("Relationship");
        assert_eq!(name.to_string(), "Relationship");
    }

    #[test]
    fn names_compare_by_namespace_and_local() {
        let a = XName::new("urn:a", "off");
        let b = XName::new("urn:b", "off");
        assert_ne!(a, b);
        assert_eq!(a, XName::new("urn:a", "off"));
    }
}
