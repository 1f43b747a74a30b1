//! Tests for the tree builder: parent/child assembly, sibling ordering,
//! and bottom-up hour rollups.

use lifemap::tree::build_item_tree;
use lifemap::types::{WorkItem, WorkItemTree};

/// Bare row with the given tree position; other fields defaulted.
fn item(item_id: i64, parent_item_id: Option<i64>) -> WorkItem {
    WorkItem {
        item_id,
        project_id: 1,
        parent_item_id,
        name: format!("item-{}", item_id),
        description: None,
        due_date: None,
        is_completed: false,
        is_minimized: false,
        display_order: None,
        planned_hours: None,
        calendar_event_id: None,
    }
}

fn with_hours(mut base: WorkItem, hours: f64) -> WorkItem {
    base.planned_hours = Some(hours);
    base
}

fn with_order(mut base: WorkItem, order: i64) -> WorkItem {
    base.display_order = Some(order);
    base
}

fn find<'a>(forest: &'a [WorkItemTree], item_id: i64) -> &'a WorkItemTree {
    fn walk(nodes: &[WorkItemTree], item_id: i64) -> Option<&WorkItemTree> {
        for node in nodes {
            if node.item.item_id == item_id {
                return Some(node);
            }
            if let Some(found) = walk(&node.subtasks, item_id) {
                return Some(found);
            }
        }
        None
    }
    walk(forest, item_id).expect("item missing from forest")
}

mod structure_tests {
    use super::*;

    #[test]
    fn builds_nested_tree_from_flat_rows() {
        let forest = build_item_tree(vec![
            item(1, None),
            item(2, Some(1)),
            item(3, Some(1)),
            item(4, Some(2)),
        ]);

        assert_eq!(forest.len(), 1);
        let root = &forest[0];
        assert_eq!(root.item.item_id, 1);
        assert_eq!(root.subtasks.len(), 2);
        assert_eq!(find(&forest, 2).subtasks.len(), 1);
        assert_eq!(find(&forest, 4).subtasks.len(), 0);
    }

    #[test]
    fn orphan_with_absent_parent_becomes_second_root() {
        let forest = build_item_tree(vec![item(1, None), item(2, Some(1)), item(3, Some(99))]);

        let root_ids: Vec<i64> = forest.iter().map(|node| node.item.item_id).collect();
        assert_eq!(root_ids, vec![1, 3]);
    }

    #[test]
    fn empty_input_yields_empty_forest() {
        assert!(build_item_tree(vec![]).is_empty());
    }
}

mod ordering_tests {
    use super::*;

    #[test]
    fn siblings_sorted_by_display_order() {
        let forest = build_item_tree(vec![
            item(1, None),
            with_order(item(2, Some(1)), 30),
            with_order(item(3, Some(1)), 10),
            with_order(item(4, Some(1)), 20),
        ]);

        let order: Vec<i64> = forest[0]
            .subtasks
            .iter()
            .map(|node| node.item.item_id)
            .collect();
        assert_eq!(order, vec![3, 4, 2]);
    }

    #[test]
    fn missing_display_order_falls_back_to_identity() {
        // Item 2 has no display order, so it sorts by its identity (2),
        // landing between orders 1 and 5.
        let forest = build_item_tree(vec![
            item(1, None),
            item(2, Some(1)),
            with_order(item(3, Some(1)), 1),
            with_order(item(4, Some(1)), 5),
        ]);

        let order: Vec<i64> = forest[0]
            .subtasks
            .iter()
            .map(|node| node.item.item_id)
            .collect();
        assert_eq!(order, vec![3, 2, 4]);
    }
}

mod rollup_tests {
    use super::*;

    #[test]
    fn leaf_hours_propagate_to_every_ancestor() {
        let forest = build_item_tree(vec![
            item(1, None),
            item(2, Some(1)),
            with_hours(item(3, Some(2)), 5.0),
        ]);

        assert_eq!(find(&forest, 3).calculated_planned_hours, 5.0);
        assert_eq!(find(&forest, 2).calculated_planned_hours, 5.0);
        assert_eq!(find(&forest, 1).calculated_planned_hours, 5.0);
    }

    #[test]
    fn root_rollup_equals_sum_of_leaf_hours() {
        let forest = build_item_tree(vec![
            item(1, None),
            item(2, Some(1)),
            item(3, Some(1)),
            with_hours(item(4, Some(2)), 1.5),
            with_hours(item(5, Some(2)), 2.0),
            with_hours(item(6, Some(3)), 4.0),
            item(7, Some(3)), // leaf with no hours contributes zero
        ]);

        assert_eq!(find(&forest, 1).calculated_planned_hours, 7.5);
        assert_eq!(find(&forest, 2).calculated_planned_hours, 3.5);
        assert_eq!(find(&forest, 3).calculated_planned_hours, 4.0);
    }

    #[test]
    fn node_with_subtasks_ignores_its_own_stored_hours() {
        // Item 2 carries stale stored hours from before it had children.
        let forest = build_item_tree(vec![
            item(1, None),
            with_hours(item(2, Some(1)), 99.0),
            with_hours(item(3, Some(2)), 2.0),
        ]);

        assert_eq!(find(&forest, 2).calculated_planned_hours, 2.0);
        assert_eq!(find(&forest, 1).calculated_planned_hours, 2.0);
    }

    #[test]
    fn orphan_roots_roll_up_independently() {
        let forest = build_item_tree(vec![
            with_hours(item(1, None), 1.0),
            with_hours(item(3, Some(99)), 4.0),
        ]);

        assert_eq!(find(&forest, 1).calculated_planned_hours, 1.0);
        assert_eq!(find(&forest, 3).calculated_planned_hours, 4.0);
    }
}
