use super::*;

use proptest::prelude::*;
use std::collections::BTreeMap;

/// A reference tree keyed by element, with children kept in `Vec`s.
#[derive(Debug, Default)]
struct Model {
    children: BTreeMap<u32, Vec<u32>>,
    parent: BTreeMap<u32, u32>,
}

impl Model {
    const ROOT: u32 = 0;

    fn new() -> Self {
        let mut model = Self::default();
        model.children.insert(Self::ROOT, vec![]);
        model
    }

    fn add_child(&mut self, parent: u32, child: u32) {
        self.children.entry(parent).or_default().push(child);
        self.children.insert(child, vec![]);
        self.parent.insert(child, parent);
    }

    fn remove(&mut self, node: u32) {
        let Some(parent) = self.parent.remove(&node) else {
            return;
        };
        let orphans = self.children.remove(&node).unwrap_or_default();
        for &orphan in &orphans {
            self.parent.insert(orphan, parent);
        }
        let siblings = self.children.entry(parent).or_default();
        if let Some(slot) = siblings.iter().position(|&s| s == node) {
            siblings.splice(slot..=slot, orphans);
        }
    }

    fn preorder(&self) -> Vec<(usize, u32)> {
        fn walk(model: &Model, node: u32, depth: usize, out: &mut Vec<(usize, u32)>) {
            out.push((depth, node));
            for &child in model.children.get(&node).into_iter().flatten() {
                walk(model, child, depth + 1, out);
            }
        }
        let mut out = vec![];
        walk(self, Self::ROOT, 0, &mut out);
        out
    }
}

#[derive(Clone, Debug)]
enum Op {
    AddChild(usize),
    Remove(usize),
    UseStale(usize),
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let selector = any::<usize>();
    let op = prop_oneof![
        50 => selector.clone().prop_map(Op::AddChild),
        35 => selector.clone().prop_map(Op::Remove),
        15 => selector.prop_map(Op::UseStale),
    ];
    prop::collection::vec(op, 0..=300)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_matches_model(ops in ops_strategy()) {
        let mut tree: OrderedTree<u32> = OrderedTree::new();
        let mut model = Model::new();
        let root = tree.add_root(Model::ROOT).unwrap();
        let mut live: Vec<(u32, Position)> = vec![(Model::ROOT, root)];
        let mut dead: Vec<Position> = vec![];
        let mut next_element = 1;

        for op in ops {
            match op {
                Op::AddChild(sel) => {
                    let (parent, ppos) = live[sel % live.len()];
                    let pos = tree.add_child(ppos, next_element).unwrap();
                    model.add_child(parent, next_element);
                    live.push((next_element, pos));
                    next_element += 1;
                }
                Op::Remove(sel) => {
                    let slot = sel % live.len();
                    let (element, pos) = live[slot];
                    let removed = tree.remove(pos).unwrap();
                    model.remove(element);
                    if element == Model::ROOT {
                        prop_assert_eq!(removed, None);
                    } else {
                        prop_assert_eq!(removed, Some(element));
                        live.swap_remove(slot);
                        dead.push(pos);
                    }
                }
                Op::UseStale(sel) => {
                    if dead.is_empty() {
                        continue;
                    }
                    let pos = dead[sel % dead.len()];
                    prop_assert_eq!(tree.parent(pos), Err(Error::StalePosition { pos }));
                    prop_assert_eq!(tree.remove(pos), Err(Error::StalePosition { pos }));
                    prop_assert_eq!(
                        tree.add_child(pos, u32::MAX),
                        Err(Error::StalePosition { pos })
                    );
                }
            }

            prop_assert_eq!(tree.check_invariants(), Ok(()));
            prop_assert_eq!(tree.size(), live.len());
            prop_assert_eq!(tree.positions().len(), live.len());
        }

        let shape: Vec<(usize, u32)> = tree.display_tree()
            .into_iter()
            .map(|(depth, &element)| (depth, element))
            .collect();
        prop_assert_eq!(shape, model.preorder());

        for &(element, pos) in &live {
            let children: Vec<u32> = tree.children(pos).unwrap()
                .into_iter()
                .map(|cpos| *tree.element(cpos).unwrap())
                .collect();
            prop_assert_eq!(&children, &model.children[&element]);
            let parent = tree.parent(pos).unwrap().map(|ppos| *tree.element(ppos).unwrap());
            prop_assert_eq!(parent, model.parent.get(&element).copied());
        }
    }

    #[test]
    fn prop_unrelated_removal_keeps_sibling_order(
        fanout in 1usize..8,
        victim in 0usize..8,
    ) {
        let mut tree: OrderedTree<usize> = OrderedTree::new();
        let root = tree.add_root(0).unwrap();
        let left = tree.add_child(root, 1).unwrap();
        let right = tree.add_child(root, 2).unwrap();
        let kids: Vec<Position> = (0..fanout)
            .map(|i| tree.add_child(left, 100 + i).unwrap())
            .collect();
        let others: Vec<Position> = (0..8)
            .map(|i| tree.add_child(right, 200 + i).unwrap())
            .collect();

        tree.remove(others[victim]).unwrap();

        prop_assert_eq!(tree.children(left).unwrap(), kids);
        prop_assert_eq!(tree.num_children(right).unwrap(), 7);
    }
}

#[test]
fn stale_positions_survive_slot_reuse() {
    let mut tree = OrderedTree::new();
    let root = tree.add_root("root").unwrap();
    let mut stale = vec![];
    for round in 0..16 {
        let pos = tree.add_child(root, "child").unwrap();
        assert_eq!(pos.generation(), round);
        stale.push(pos);
        tree.remove(pos).unwrap();
    }
    assert_eq!(tree.physical_size(), 2);
    for pos in stale {
        assert_eq!(tree.element(pos), Err(Error::StalePosition { pos }));
    }
}
