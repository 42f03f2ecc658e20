//! Verified-modification ontology.
//!
//! The database records a directed "derived-from" graph between modified
//! bases. The homepage shows it as a forest per canonical base: only verified
//! modifications take part, a modification without a verified parent hangs
//! directly off its unmodified base, and a node reachable through several
//! parents is repeated under each of them.

use crate::domain::model::{CanonicalBase, Nucleobase, ParentLink};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// What the hierarchy needs to know about a modification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OntologyMember {
    pub id: String,
    pub base: Nucleobase,
    pub verified: bool,
}

impl OntologyMember {
    pub fn new(id: impl Into<String>, base: Nucleobase, verified: bool) -> Self {
        Self {
            id: id.into(),
            base,
            verified,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HierarchyNode {
    pub id: String,
    pub children: Vec<HierarchyNode>,
}

impl HierarchyNode {
    pub fn leaf(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            children: Vec::new(),
        }
    }

    /// Number of levels below and including this node.
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(HierarchyNode::depth).max().unwrap_or(0)
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn collect_ids<'a>(&'a self, out: &mut HashSet<&'a str>) {
        out.insert(&self.id);
        for child in &self.children {
            child.collect_ids(out);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerifiedHierarchy {
    roots: BTreeMap<CanonicalBase, Vec<HierarchyNode>>,
    unplaced: Vec<String>,
}

impl VerifiedHierarchy {
    /// Root nodes hanging off the given canonical base, deepest branch first.
    pub fn roots(&self, base: CanonicalBase) -> &[HierarchyNode] {
        self.roots.get(&base).map(Vec::as_slice).unwrap_or(&[])
    }

    #[cfg(test)]
    fn bases(&self) -> impl Iterator<Item = CanonicalBase> + '_ {
        self.roots.keys().copied()
    }

    /// Verified members that no root reaches, i.e. members of a parent cycle.
    pub fn unplaced(&self) -> &[String] {
        &self.unplaced
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    #[cfg(test)]
    fn contains(&self, id: &str) -> bool {
        self.roots
            .values()
            .flatten()
            .any(|node| node_contains(node, id))
    }
}

#[cfg(test)]
fn node_contains(node: &HierarchyNode, id: &str) -> bool {
    node.id == id || node.children.iter().any(|child| node_contains(child, id))
}

/// Builds the verified forest from the ontology adjacency data.
pub fn build_verified_hierarchy(
    members: &[OntologyMember],
    links: &[ParentLink],
    other_shared: CanonicalBase,
) -> VerifiedHierarchy {
    let verified: HashMap<&str, &OntologyMember> = members
        .iter()
        .filter(|m| m.verified)
        .map(|m| (m.id.as_str(), m))
        .collect();

    // 只保留兩端皆為已驗證的關係
    let mut children_of: HashMap<&str, BTreeSet<&str>> = HashMap::new();
    let mut has_verified_parent: HashSet<&str> = HashSet::new();
    for link in links {
        let (child, parent) = (link.child_id.as_str(), link.parent_id.as_str());
        if child == parent {
            tracing::warn!("Ignoring self-referencing ontology link for {}", child);
            continue;
        }
        if verified.contains_key(child) && verified.contains_key(parent) {
            children_of.entry(parent).or_default().insert(child);
            has_verified_parent.insert(child);
        }
    }

    let mut root_ids: Vec<&OntologyMember> = verified
        .values()
        .filter(|m| !has_verified_parent.contains(m.id.as_str()))
        .copied()
        .collect();
    root_ids.sort_by(|a, b| a.id.cmp(&b.id));

    let mut roots: BTreeMap<CanonicalBase, Vec<HierarchyNode>> = BTreeMap::new();
    for member in root_ids {
        let mut path = Vec::new();
        let node = expand(&member.id, &children_of, &mut path);
        roots
            .entry(member.base.canonical(other_shared))
            .or_default()
            .push(node);
    }
    for nodes in roots.values_mut() {
        order_by_depth(nodes);
    }

    let mut placed: HashSet<&str> = HashSet::new();
    for node in roots.values().flatten() {
        node.collect_ids(&mut placed);
    }
    let mut unplaced: Vec<String> = verified
        .keys()
        .filter(|id| !placed.contains(*id))
        .map(|id| id.to_string())
        .collect();
    unplaced.sort();
    if !unplaced.is_empty() {
        tracing::warn!(
            "{} verified modifications are only reachable through a parent cycle: {}",
            unplaced.len(),
            unplaced.join(", ")
        );
    }

    VerifiedHierarchy { roots, unplaced }
}

fn expand<'a>(
    id: &'a str,
    children_of: &HashMap<&'a str, BTreeSet<&'a str>>,
    path: &mut Vec<&'a str>,
) -> HierarchyNode {
    path.push(id);
    let mut children = Vec::new();
    if let Some(child_ids) = children_of.get(id) {
        for &child in child_ids {
            if path.contains(&child) {
                tracing::warn!("Ignoring ontology link {} -> {} (cycle)", child, id);
                continue;
            }
            children.push(expand(child, children_of, path));
        }
    }
    path.pop();

    order_by_depth(&mut children);
    HierarchyNode {
        id: id.to_string(),
        children,
    }
}

/// Deepest subtree first; equal depths keep id order.
fn order_by_depth(nodes: &mut [HierarchyNode]) {
    nodes.sort_by(|a, b| b.depth().cmp(&a.depth()).then_with(|| a.id.cmp(&b.id)));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: &str, base: Nucleobase) -> OntologyMember {
        OntologyMember::new(id, base, true)
    }

    fn ids(nodes: &[HierarchyNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn test_chain_nests_children_under_parents() {
        let members = vec![
            member("5mC", Nucleobase::Cytosine),
            member("5hmC", Nucleobase::Cytosine),
            member("5fC", Nucleobase::Cytosine),
            member("5caC", Nucleobase::Cytosine),
        ];
        let links = vec![
            ParentLink::new("5hmC", "5mC"),
            ParentLink::new("5fC", "5hmC"),
            ParentLink::new("5caC", "5fC"),
        ];

        let hierarchy = build_verified_hierarchy(&members, &links, CanonicalBase::Thymine);
        let roots = hierarchy.roots(CanonicalBase::Cytosine);

        assert_eq!(ids(roots), vec!["5mC"]);
        assert_eq!(roots[0].depth(), 4);
        assert_eq!(roots[0].children[0].id, "5hmC");
        assert_eq!(roots[0].children[0].children[0].id, "5fC");
        assert_eq!(roots[0].children[0].children[0].children[0].id, "5caC");
        assert!(hierarchy.unplaced().is_empty());
    }

    #[test]
    fn test_uracil_folds_into_thymine_and_other_into_shared_base() {
        let members = vec![
            member("5hmU", Nucleobase::Uracil),
            member("base J", Nucleobase::Thymine),
            member("queuine", Nucleobase::Other),
        ];

        let hierarchy = build_verified_hierarchy(&members, &[], CanonicalBase::Thymine);
        assert_eq!(
            ids(hierarchy.roots(CanonicalBase::Thymine)),
            vec!["5hmU", "base J", "queuine"]
        );
        assert!(hierarchy.roots(CanonicalBase::Adenine).is_empty());

        let shared_with_guanine =
            build_verified_hierarchy(&members, &[], CanonicalBase::Guanine);
        assert_eq!(
            ids(shared_with_guanine.roots(CanonicalBase::Guanine)),
            vec!["queuine"]
        );
    }

    #[test]
    fn test_unverified_members_are_excluded() {
        let members = vec![
            member("6mA", Nucleobase::Adenine),
            OntologyMember::new("6hmA", Nucleobase::Adenine, false),
            member("6fA", Nucleobase::Adenine),
        ];
        // 6fA 的唯一父節點未驗證，因此直接掛在腺嘌呤之下
        let links = vec![
            ParentLink::new("6hmA", "6mA"),
            ParentLink::new("6fA", "6hmA"),
        ];

        let hierarchy = build_verified_hierarchy(&members, &links, CanonicalBase::Thymine);
        let roots = hierarchy.roots(CanonicalBase::Adenine);

        assert_eq!(ids(roots), vec!["6fA", "6mA"]);
        assert!(roots.iter().all(HierarchyNode::is_leaf));
        assert!(!hierarchy.contains("6hmA"));
    }

    #[test]
    fn test_shared_child_is_embedded_under_every_parent() {
        let members = vec![
            member("a", Nucleobase::Guanine),
            member("b", Nucleobase::Guanine),
            member("shared", Nucleobase::Guanine),
        ];
        let links = vec![
            ParentLink::new("shared", "a"),
            ParentLink::new("shared", "b"),
            ParentLink::new("shared", "b"),
        ];

        let hierarchy = build_verified_hierarchy(&members, &links, CanonicalBase::Thymine);
        let roots = hierarchy.roots(CanonicalBase::Guanine);

        assert_eq!(ids(roots), vec!["a", "b"]);
        assert_eq!(ids(&roots[0].children), vec!["shared"]);
        assert_eq!(ids(&roots[1].children), vec!["shared"]);
    }

    #[test]
    fn test_siblings_ordered_by_descending_depth() {
        let members = vec![
            member("root", Nucleobase::Cytosine),
            member("a-leaf", Nucleobase::Cytosine),
            member("z-deep", Nucleobase::Cytosine),
            member("z-deep-child", Nucleobase::Cytosine),
            member("lonely", Nucleobase::Cytosine),
        ];
        let links = vec![
            ParentLink::new("a-leaf", "root"),
            ParentLink::new("z-deep", "root"),
            ParentLink::new("z-deep-child", "z-deep"),
        ];

        let hierarchy = build_verified_hierarchy(&members, &links, CanonicalBase::Thymine);
        let roots = hierarchy.roots(CanonicalBase::Cytosine);

        assert_eq!(ids(roots), vec!["root", "lonely"]);
        assert_eq!(ids(&roots[0].children), vec!["z-deep", "a-leaf"]);
    }

    #[test]
    fn test_cycles_do_not_recurse_forever() {
        let members = vec![
            member("root", Nucleobase::Adenine),
            member("x", Nucleobase::Adenine),
            member("y", Nucleobase::Adenine),
            member("p", Nucleobase::Adenine),
            member("q", Nucleobase::Adenine),
        ];
        let links = vec![
            ParentLink::new("x", "root"),
            ParentLink::new("y", "x"),
            ParentLink::new("x", "y"),
            // p 與 q 互為父節點，沒有任何根節點可到達
            ParentLink::new("p", "q"),
            ParentLink::new("q", "p"),
        ];

        let hierarchy = build_verified_hierarchy(&members, &links, CanonicalBase::Thymine);
        let roots = hierarchy.roots(CanonicalBase::Adenine);

        assert_eq!(ids(roots), vec!["root"]);
        assert_eq!(roots[0].children[0].id, "x");
        assert_eq!(roots[0].children[0].children[0].id, "y");
        assert!(roots[0].children[0].children[0].is_leaf());
        assert_eq!(hierarchy.unplaced(), &["p".to_string(), "q".to_string()]);
    }

    #[test]
    fn test_empty_input_has_no_bases() {
        let hierarchy = build_verified_hierarchy(&[], &[], CanonicalBase::Thymine);
        assert!(hierarchy.is_empty());
        assert_eq!(hierarchy.bases().count(), 0);
    }
}
