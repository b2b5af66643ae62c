//! Work (range) hierarchy reconstruction from flat rows.
//!
//! Work rows name their parent through `parent_work_id`. Two views are built
//! from the same input: a pointer map (parent id to child references) for v2's
//! flat range list, and a nested tree for v3's recursive ranges.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::solr::Row;

/// One work row with its linkage pulled out.
#[derive(Debug, Clone, PartialEq)]
pub struct Work {
    pub work_id: String,
    pub parent_work_id: Option<String>,
    pub row: Row,
}

impl Work {
    /// `None` for rows without a `work_id`.
    pub fn from_row(row: Row) -> Option<Self> {
        let work_id = row.str("work_id")?.to_string();
        let parent_work_id = row.str("parent_work_id").map(str::to_string);
        Some(Self {
            work_id,
            parent_work_id,
            row,
        })
    }

    pub fn is_root(&self) -> bool {
        self.parent_work_id.is_none()
    }

    pub fn object_id(&self) -> &str {
        self.row.str("object_id").unwrap_or_default()
    }

    /// Surface ids for a leaf work, in stored order.
    pub fn surfaces(&self) -> Vec<String> {
        self.row.values("surfaces_sm")
    }
}

/// Convert rows to works, dropping rows that carry no `work_id`.
pub fn works_from_rows(rows: Vec<Row>) -> Vec<Work> {
    rows.into_iter()
        .filter_map(|row| {
            let work = Work::from_row(row);
            if work.is_none() {
                warn!("Skipping work row without a work_id");
            }
            work
        })
        .collect()
}

/// Parent work id to child references, in input order.
///
/// Works without a parent never appear as keys unless some other work names
/// them as parent. A work is an internal node iff its id is a key.
pub fn child_pointers<F>(works: &[Work], reference: F) -> HashMap<String, Vec<String>>
where
    F: Fn(&Work) -> String,
{
    let mut pointers: HashMap<String, Vec<String>> = HashMap::new();
    for work in works {
        if let Some(parent) = &work.parent_work_id {
            pointers.entry(parent.clone()).or_default().push(reference(work));
        }
    }
    pointers
}

/// A work with its nested children.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkNode {
    pub work: Work,
    pub children: Vec<WorkNode>,
}

impl WorkNode {
    pub fn is_range(&self) -> bool {
        !self.children.is_empty()
    }

    /// Nodes in this subtree, including this one.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(WorkNode::count).sum::<usize>()
    }
}

/// Build the nested work forest, returning only root works.
///
/// Children are grouped by parent index first and then materialized
/// recursively. Roots and siblings keep input order. A work whose
/// `parent_work_id` names no work in the input is unreachable from any root
/// and is dropped with its subtree.
pub fn build_tree(works: Vec<Work>) -> Vec<WorkNode> {
    let mut children_of: HashMap<String, Vec<usize>> = HashMap::new();
    let mut roots = Vec::new();

    for (idx, work) in works.iter().enumerate() {
        match &work.parent_work_id {
            Some(parent) => children_of.entry(parent.clone()).or_default().push(idx),
            None => roots.push(idx),
        }
    }

    fn build_node(idx: usize, works: &[Work], children_of: &HashMap<String, Vec<usize>>) -> WorkNode {
        let work = works[idx].clone();
        let children = children_of
            .get(&work.work_id)
            .map(|ids| ids.iter().map(|&c| build_node(c, works, children_of)).collect())
            .unwrap_or_default();

        WorkNode { work, children }
    }

    let tree: Vec<WorkNode> = roots
        .into_iter()
        .map(|idx| build_node(idx, &works, &children_of))
        .collect();

    let placed: usize = tree.iter().map(WorkNode::count).sum();
    if placed < works.len() {
        debug!("{} work(s) orphaned by dangling parent references", works.len() - placed);
    }

    tree
}

/// Depth-first, pre-order search for the node whose identifier equals `target`.
///
/// Only range nodes (with children) are descended into.
pub fn find_in_tree<'a, F>(nodes: &'a [WorkNode], target: &str, id_of: &F) -> Option<&'a WorkNode>
where
    F: Fn(&Work) -> String,
{
    for node in nodes {
        if id_of(&node.work) == target {
            return Some(node);
        }
        if node.is_range() {
            if let Some(found) = find_in_tree(&node.children, target, id_of) {
                return Some(found);
            }
        }
    }
    None
}
