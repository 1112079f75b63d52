//! Pruning towards the root and detaching subtrees.

use ordtree::util::testing::init_test_setup;
use ordtree::{Items, Tree, TreeError};
use rstest::{fixture, rstest};

// [[0, 1], [2, 3], [4, 5], [6, 7]]
#[fixture]
fn pairs() -> Tree<i32> {
    init_test_setup();
    Tree::new(Items::branch((0..4).map(|i| Items::leaves([2 * i, 2 * i + 1])))).unwrap()
}

fn nested(groups: &[Vec<i32>]) -> Items<i32> {
    Items::branch(groups.iter().map(|group| Items::leaves(group.iter().copied())))
}

#[rstest]
#[case::first_leaf(&[0, 0], false, vec![vec![1], vec![2, 3], vec![4, 5], vec![6, 7]])]
#[case::last_group_first_leaf(&[3, 0], false, vec![vec![7]])]
#[case::emptied_group(&[1, 1], false, vec![vec![4, 5], vec![6, 7]])]
#[case::whole_group(&[1], false, vec![vec![4, 5], vec![6, 7]])]
#[case::reverse_last_leaf(&[3, 1], true, vec![vec![0, 1], vec![2, 3], vec![4, 5], vec![6]])]
#[case::reverse_second_leaf(&[0, 1], true, vec![vec![0]])]
#[case::reverse_emptied_group(&[1, 0], true, vec![vec![0, 1]])]
fn given_node_when_removing_to_root_then_direction_prefix_is_gone(
    mut pairs: Tree<i32>,
    #[case] position: &[usize],
    #[case] reverse: bool,
    #[case] expected: Vec<Vec<i32>>,
) {
    let id = pairs.node_at(position).unwrap();
    pairs.remove_to_root(id, reverse).unwrap();
    assert_eq!(pairs.payload_nested(pairs.root()).unwrap(), nested(&expected));
    assert!(!pairs.contains_node(id));
}

#[rstest]
fn given_pruned_tree_when_counting_then_removed_nodes_are_freed(mut pairs: Tree<i32>) {
    let id = pairs.node_at(&[3, 0]).unwrap();
    let dropped = pairs.node_at(&[1, 1]).unwrap();
    pairs.remove_to_root(id, false).unwrap();
    assert_eq!(pairs.node_count(), 3);
    assert!(matches!(
        pairs.level(dropped),
        Err(TreeError::NodeNotFound(_))
    ));
}

#[rstest]
fn given_nested_singletons_when_removing_to_root_then_empty_ancestors_cascade() {
    init_test_setup();
    // [[[0]], [1, 2]]
    let mut tree = Tree::new(Items::branch([
        Items::branch([Items::leaves([0])]),
        Items::leaves([1, 2]),
    ]))
    .unwrap();
    let id = tree.node_at(&[0, 0, 0]).unwrap();
    tree.remove_to_root(id, false).unwrap();
    assert_eq!(
        tree.payload_nested(tree.root()).unwrap(),
        Items::branch([Items::leaves([1, 2])])
    );
    assert_eq!(tree.node_count(), 4);
}

#[rstest]
fn given_stale_id_when_removing_to_root_then_tree_is_unchanged(mut pairs: Tree<i32>) {
    let first = pairs.node_at(&[0, 0]).unwrap();
    pairs.remove_to_root(first, false).unwrap();
    let before = pairs.clone();

    let result = pairs.remove_to_root(first, false);
    assert!(matches!(result, Err(TreeError::NodeNotFound(_))));
    assert_eq!(pairs, before);
}

// ============================================================
// remove
// ============================================================

#[rstest]
fn given_inner_node_when_removing_then_subtree_is_detached(mut pairs: Tree<i32>) {
    let group = pairs.node_at(&[1]).unwrap();
    let detached = pairs.remove(group).unwrap();

    assert_eq!(detached, Tree::new(Items::leaves([2, 3])).unwrap());
    assert_eq!(detached.parent(detached.root()).unwrap(), None);
    assert_eq!(detached.node_count(), 3);
    assert_eq!(pairs.node_count(), 10);
    assert_eq!(
        pairs.payload_nested(pairs.root()).unwrap(),
        nested(&[vec![0, 1], vec![4, 5], vec![6, 7]])
    );
}

#[rstest]
fn given_every_child_removed_when_inspecting_then_branch_stays_internal(mut pairs: Tree<i32>) {
    let group = pairs.node_at(&[0]).unwrap();
    for _ in 0..2 {
        let leaf = pairs.child(group, 0).unwrap();
        let detached = pairs.remove(leaf).unwrap();
        assert!(detached.is_leaf(detached.root()).unwrap());
    }
    assert_eq!(pairs.child_count(group).unwrap(), 0);
    assert!(!pairs.is_leaf(group).unwrap());
    assert_eq!(pairs.negative_level(group).unwrap(), -1);
}

#[rstest]
fn given_root_when_removing_then_cannot_remove_root(mut pairs: Tree<i32>) {
    let root = pairs.root();
    assert!(matches!(
        pairs.remove(root),
        Err(TreeError::CannotRemoveRoot)
    ));
    assert_eq!(pairs.node_count(), 13);
}
