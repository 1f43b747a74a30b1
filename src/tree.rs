//! Tree Builder: flat work-item rows to an ordered, hour-rolled-up forest.

use crate::types::{WorkItem, WorkItemTree};
use std::collections::{HashMap, HashSet};

/// Build the nested tree for one project's rows.
///
/// Rows whose parent is absent from the input set become roots, so a
/// partial row set still produces a usable forest. Siblings are ordered by
/// display order, falling back to identity when unset. Each node carries
/// `calculated_planned_hours`: a leaf contributes its own planned hours
/// (zero if unset), an internal node the sum of its children's rollups,
/// with its own stored value ignored.
pub fn build_item_tree(items: Vec<WorkItem>) -> Vec<WorkItemTree> {
    let present: HashSet<i64> = items.iter().map(|item| item.item_id).collect();

    let mut children: HashMap<i64, Vec<WorkItem>> = HashMap::new();
    let mut roots: Vec<WorkItem> = Vec::new();
    for item in items {
        match item.parent_item_id {
            Some(parent) if present.contains(&parent) => {
                children.entry(parent).or_default().push(item);
            }
            _ => roots.push(item),
        }
    }

    let mut forest: Vec<WorkItemTree> = roots
        .into_iter()
        .map(|item| build_node(item, &mut children))
        .collect();
    sort_siblings(&mut forest);
    forest
}

fn build_node(item: WorkItem, children: &mut HashMap<i64, Vec<WorkItem>>) -> WorkItemTree {
    let own = children.remove(&item.item_id).unwrap_or_default();
    let mut subtasks: Vec<WorkItemTree> = own
        .into_iter()
        .map(|child| build_node(child, children))
        .collect();
    sort_siblings(&mut subtasks);

    let calculated_planned_hours = if subtasks.is_empty() {
        item.planned_hours.unwrap_or(0.0)
    } else {
        subtasks
            .iter()
            .map(|child| child.calculated_planned_hours)
            .sum()
    };

    WorkItemTree {
        item,
        calculated_planned_hours,
        subtasks,
    }
}

// Identity as the fallback key tracks insertion order, which drifts after
// rows are deleted and re-created.
fn sort_siblings(nodes: &mut [WorkItemTree]) {
    nodes.sort_by_key(|node| node.item.display_order.unwrap_or(node.item.item_id));
}
