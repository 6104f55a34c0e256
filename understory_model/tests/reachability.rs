// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reachability, attachment and cycle tests.
//!
//! The property test drives a document through random edits and checks that
//! after every recompute the attached set equals a closure computed
//! independently from [`Document::references`].

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use proptest::prelude::*;
use understory_model::{
    Constraint, Document, Error, GraphDeserializer, ModelId, PropertySpec, TypeBuilder,
    TypeRegistry, Value, serialize,
};

fn registry() -> Arc<TypeRegistry> {
    let mut registry = TypeRegistry::new();
    registry
        .register(
            TypeBuilder::new("Node")
                .property(PropertySpec::new(
                    "next",
                    Constraint::nullable(Constraint::any_instance()),
                ))
                .property(PropertySpec::new(
                    "children",
                    Constraint::seq_of(Constraint::any_instance()),
                )),
        )
        .unwrap();
    Arc::new(registry)
}

fn closure(doc: &Document) -> HashSet<ModelId> {
    let mut seen: HashSet<ModelId> = doc.roots().iter().copied().collect();
    let mut queue: VecDeque<ModelId> = doc.roots().iter().copied().collect();
    while let Some(id) = queue.pop_front() {
        for target in doc.references(id).unwrap() {
            if seen.insert(target) {
                queue.push_back(target);
            }
        }
    }
    seen
}

#[derive(Clone, Debug)]
enum Op {
    Create,
    Link(usize, usize),
    Point(usize, usize),
    Unlink(usize),
    AddRoot(usize),
    RemoveRoot(usize),
    Recompute,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        2 => Just(Op::Create),
        3 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::Link(a, b)),
        2 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::Point(a, b)),
        2 => any::<usize>().prop_map(Op::Unlink),
        2 => any::<usize>().prop_map(Op::AddRoot),
        1 => any::<usize>().prop_map(Op::RemoveRoot),
        1 => Just(Op::Recompute),
    ]
}

proptest! {
    #[test]
    fn attached_set_is_the_closure_of_the_roots(ops in prop::collection::vec(op(), 1..60)) {
        let mut doc = Document::new(registry());
        let mut models = vec![doc.create("Node").unwrap()];

        for op in ops {
            if let Op::Create = op {
                models.push(doc.create("Node").unwrap());
                continue;
            }
            let pick = |i: usize| models[i % models.len()];
            match op {
                Op::Link(a, b) => doc.push(pick(a), "children", pick(b)).unwrap(),
                Op::Point(a, b) => {
                    doc.set(pick(a), "next", pick(b)).unwrap();
                }
                Op::Unlink(a) => {
                    let a = pick(a);
                    doc.set(a, "next", Value::Null).unwrap();
                    doc.set(a, "children", Value::Seq(Vec::new())).unwrap();
                }
                Op::AddRoot(a) => doc.add_root(pick(a)).unwrap(),
                Op::RemoveRoot(a) => {
                    let a = pick(a);
                    let was_root = doc.is_root(a);
                    prop_assert_eq!(doc.remove_root(a).is_ok(), was_root);
                }
                Op::Create | Op::Recompute => {}
            }
            doc.recompute_reachability();

            let attached: HashSet<ModelId> = doc.all_nodes().iter().copied().collect();
            prop_assert_eq!(attached.len(), doc.all_nodes().len());
            prop_assert_eq!(&attached, &closure(&doc));
            for &model in &models {
                prop_assert_eq!(doc.is_attached(model), attached.contains(&model));
            }
            prop_assert!(doc.all_nodes().starts_with(doc.roots()));
        }

        // A second recompute without edits changes nothing.
        prop_assert!(doc.recompute_reachability().is_empty());
    }
}

#[test]
fn unreferenced_models_detach_but_survive() {
    let mut doc = Document::new(registry());
    let root = doc.create("Node").unwrap();
    let child = doc.create("Node").unwrap();
    doc.set(root, "next", child).unwrap();
    doc.add_root(root).unwrap();
    assert!(doc.is_attached(child));

    doc.set(root, "next", Value::Null).unwrap();
    let delta = doc.recompute_reachability();
    assert_eq!(delta.detached, [child]);
    assert!(!doc.is_attached(child));
    assert!(doc.contains(child));

    // Reattaching through a reference works because the node is still owned.
    doc.push(root, "children", child).unwrap();
    let delta = doc.recompute_reachability();
    assert_eq!(delta.attached, [child]);

    doc.set(root, "children", Value::Seq(Vec::new())).unwrap();
    doc.recompute_reachability();
    assert_eq!(doc.collect_garbage(), 1);
    assert!(!doc.contains(child));
}

#[test]
fn models_belong_to_one_document() {
    let registry = registry();
    let mut first = Document::new(Arc::clone(&registry));
    let mut second = Document::new(registry);
    let shared = first.create("Node").unwrap();
    let local = second.create("Node").unwrap();

    assert_eq!(
        second.add_root(shared),
        Err(Error::AlreadyAttached {
            model: shared,
            owner: first.id(),
        })
    );
    assert!(matches!(
        second.set(local, "next", shared),
        Err(Error::AlreadyAttached { .. })
    ));
    assert!(matches!(
        second.push(local, "children", shared),
        Err(Error::AlreadyAttached { .. })
    ));
    assert_eq!(second.get(local, "next").unwrap(), &Value::Null);
    assert!(second.roots().is_empty());
}

#[test]
fn cycles_attach_serialize_and_rebuild() {
    let registry = registry();
    let mut doc = Document::new(Arc::clone(&registry));
    let a = doc.create("Node").unwrap();
    let b = doc.create("Node").unwrap();
    doc.set(a, "next", b).unwrap();
    doc.set(b, "next", a).unwrap();
    doc.push(a, "children", a).unwrap();
    doc.add_root(a).unwrap();

    assert_eq!(doc.all_nodes(), [a, b]);

    let graph = serialize(&doc);
    assert_eq!(graph.nodes.len(), 2);
    let rebuilt = GraphDeserializer::new(registry).deserialize(&graph).unwrap();
    assert_eq!(serialize(&rebuilt), graph);

    let [x, y] = rebuilt.all_nodes() else {
        panic!("expected two attached nodes");
    };
    assert_eq!(rebuilt.get(*x, "next").unwrap(), &Value::Ref(*y));
    assert_eq!(rebuilt.get(*y, "next").unwrap(), &Value::Ref(*x));
    assert_eq!(
        rebuilt.get(*x, "children").unwrap(),
        &Value::Seq(vec![Value::Ref(*x)])
    );
}
