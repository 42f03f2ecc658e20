use crate::core::hierarchy::HierarchyNode;
use crate::core::nomenclature::{escape_html, file_href, format_curated_name, is_shaded, page_stem};
use crate::domain::model::{ModificationRecord, NomenclatureEntry};
use std::collections::HashMap;

/// A link to one modification page as shown on the homepage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub id: String,
    /// HTML label: nomenclature abbreviation, or the formatted ChEBI name.
    pub label: String,
    pub title: String,
    pub href: String,
    pub origin: String,
    pub shaded: bool,
}

/// Templates cannot recurse, so nested lists are emitted as a flat event
/// stream: a `Branch` opens a nested list that a later `Close` ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavEvent {
    Branch(NavEntry),
    Leaf(NavEntry),
    Close,
}

/// Resolves modification ids to homepage links.
pub struct NavIndex<'a> {
    records: HashMap<&'a str, &'a ModificationRecord>,
    nomenclature: HashMap<&'a str, &'a NomenclatureEntry>,
    shade_origins: &'a [String],
}

impl<'a> NavIndex<'a> {
    pub fn new(
        records: &'a [ModificationRecord],
        nomenclature: &'a [NomenclatureEntry],
        shade_origins: &'a [String],
    ) -> Self {
        Self {
            records: records.iter().map(|r| (r.chebi_id.as_str(), r)).collect(),
            nomenclature: nomenclature
                .iter()
                .map(|n| (n.chebi_id.as_str(), n))
                .collect(),
            shade_origins,
        }
    }

    pub fn entry(&self, id: &str) -> NavEntry {
        let Some(record) = self.records.get(id) else {
            return NavEntry {
                id: id.to_string(),
                label: escape_html(id),
                title: id.to_string(),
                href: "#".to_string(),
                origin: String::new(),
                shaded: false,
            };
        };

        let label = self
            .nomenclature
            .get(id)
            .and_then(|n| n.abbreviation())
            .map(escape_html)
            .unwrap_or_else(|| format_curated_name(&record.chebi_name));
        let origin = record.origin().unwrap_or_default().to_string();

        NavEntry {
            id: id.to_string(),
            label,
            title: record.chebi_name.clone(),
            href: page_href(record),
            shaded: is_shaded(&origin, self.shade_origins),
            origin,
        }
    }

    /// Flat link for a plain page list, labelled with the formatted name.
    pub fn link(&self, record: &ModificationRecord) -> NavEntry {
        let origin = record.origin().unwrap_or_default().to_string();
        NavEntry {
            id: record.chebi_id.clone(),
            label: format_curated_name(&record.chebi_name),
            title: record.chebi_name.clone(),
            href: page_href(record),
            shaded: is_shaded(&origin, self.shade_origins),
            origin,
        }
    }

    pub fn flatten(&self, nodes: &[HierarchyNode]) -> Vec<NavEvent> {
        let mut events = Vec::new();
        for node in nodes {
            self.push_node(node, &mut events);
        }
        events
    }

    fn push_node(&self, node: &HierarchyNode, events: &mut Vec<NavEvent>) {
        let entry = self.entry(&node.id);
        if node.is_leaf() {
            events.push(NavEvent::Leaf(entry));
            return;
        }

        events.push(NavEvent::Branch(entry));
        for child in &node.children {
            self.push_node(child, events);
        }
        events.push(NavEvent::Close);
    }
}

fn page_href(record: &ModificationRecord) -> String {
    file_href(&format!("{}.html", page_stem(&record.chebi_name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{AnnotationGroup, Nucleobase};

    fn record(id: &str, name: &str, origin: Option<&str>) -> ModificationRecord {
        ModificationRecord {
            chebi_id: id.to_string(),
            chebi_name: name.to_string(),
            base: Nucleobase::Adenine,
            common_name: "adenine".to_string(),
            verified: true,
            formula: String::new(),
            net_charge: String::new(),
            average_mass: String::new(),
            definition: String::new(),
            iupac_name: String::new(),
            synonyms: String::new(),
            smiles: String::new(),
            inchi: String::new(),
            inchikey: String::new(),
            citations: vec![],
            sequencing: vec![],
            nature: origin
                .map(|o| {
                    vec![AnnotationGroup {
                        fields: vec![("Origin".to_string(), o.to_string())],
                        citations: vec![],
                    }]
                })
                .unwrap_or_default(),
            expanded_alphabet: None,
        }
    }

    #[test]
    fn test_flatten_emits_balanced_events() {
        let records = vec![
            record("1", "N(6)-methyladenine", Some("natural")),
            record("2", "N(6)-hydroxymethyladenine", Some("synthetic")),
            record("3", "other", None),
        ];
        let nomenclature = vec![NomenclatureEntry {
            chebi_id: "1".to_string(),
            chebi_name: "N(6)-methyladenine".to_string(),
            fields: vec![("Abbreviation".to_string(), "6mA".to_string())],
        }];
        let shades = vec!["synthetic".to_string()];
        let index = NavIndex::new(&records, &nomenclature, &shades);

        let tree = vec![
            HierarchyNode {
                id: "1".to_string(),
                children: vec![HierarchyNode::leaf("2")],
            },
            HierarchyNode::leaf("3"),
        ];
        let events = index.flatten(&tree);

        assert_eq!(events.len(), 4);
        match &events[0] {
            NavEvent::Branch(entry) => {
                assert_eq!(entry.label, "6mA");
                assert_eq!(entry.href, "N%286%29-methyladenine.html");
                assert!(!entry.shaded);
            }
            other => panic!("expected branch, got {:?}", other),
        }
        match &events[1] {
            NavEvent::Leaf(entry) => {
                assert_eq!(entry.label, "<i>N</i><sup>6</sup>-hydroxymethyladenine");
                assert!(entry.shaded);
            }
            other => panic!("expected leaf, got {:?}", other),
        }
        assert_eq!(events[2], NavEvent::Close);
        assert!(matches!(&events[3], NavEvent::Leaf(entry) if entry.id == "3"));
    }

    #[test]
    fn test_unknown_id_gets_placeholder_link() {
        let index = NavIndex::new(&[], &[], &[]);
        let entry = index.entry("CHEBI:1");
        assert_eq!(entry.href, "#");
        assert_eq!(entry.label, "CHEBI:1");
    }

    #[test]
    fn test_labels_are_escaped_and_hrefs_encoded() {
        let records = vec![record("1", "N(6)-x&y #2?", None)];
        let nomenclature = vec![NomenclatureEntry {
            chebi_id: "1".to_string(),
            chebi_name: "N(6)-x&y #2?".to_string(),
            fields: vec![("Abbreviation".to_string(), "<x>".to_string())],
        }];
        let index = NavIndex::new(&records, &nomenclature, &[]);

        let entry = index.entry("1");
        assert_eq!(entry.label, "&lt;x&gt;");
        assert_eq!(entry.href, "N%286%29-x%26y%20%232%3F.html");

        let link = index.link(&records[0]);
        assert_eq!(link.label, "<i>N</i><sup>6</sup>-x&amp;y #2?");
        assert_eq!(link.href, entry.href);
    }
}
