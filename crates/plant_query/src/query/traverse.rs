//! Depth-first expansion of a plant template into branch instances.
//!
//! For every branch a branching algorithm generates, [`Traversal::expand`]:
//! 1. creates the node's stem instance (if the node has a stem model),
//! 2. lets the active [`BranchVisitor`] observe the node, its group and the instance,
//! 3. runs each child's branching algorithm, in declared order, with a factory scoped to
//!    that child and the fresh instance as parent,
//! 4. drops the instance once every child subtree is done.
//!
//! The random stream is threaded through steps 1 and 3 strictly in that order, which makes
//! the generated structure a pure function of the model, the seed and the dummies setting.
//! Recursion depth equals template depth.
use glam::{Quat, Vec3};
use rand::Rng as RngCore;

use crate::model::{BranchModel, BranchingFactory, PlantModel, StemInstance};
use crate::query::group::{count_qualifying, is_qualifying};
use crate::rng::{reborrow, seeded_stream};

/// Per-query action invoked once per generated branch.
pub(crate) trait BranchVisitor {
    /// `group` is the node's group index, `None` for the plant base and skipped dummies.
    fn visit(&mut self, node: &BranchModel, group: Option<usize>, instance: Option<&dyn StemInstance>);
}

/// Runs `visitor` over the whole plant generated from `model` with `seed`.
pub(crate) fn run<V: BranchVisitor>(model: &PlantModel, seed: u32, dummies_enabled: bool, visitor: &mut V) {
    let mut stream = seeded_stream(seed);
    let rng: Option<&mut dyn RngCore> = if model.is_randomness_enabled() {
        Some(&mut stream)
    } else {
        None
    };

    let mut traversal = Traversal {
        dummies_enabled,
        visitor,
    };
    traversal.expand(
        model.plant_base(),
        Slot::PlantBase,
        None,
        rng,
        Vec3::ZERO,
        Quat::IDENTITY,
    );
}

/// Group bookkeeping of the node being expanded.
#[derive(Clone, Copy, Debug)]
enum Slot {
    PlantBase,
    /// First group index available to this node.
    At(usize),
}

struct Traversal<'v, V> {
    dummies_enabled: bool,
    visitor: &'v mut V,
}

impl<V: BranchVisitor> Traversal<'_, V> {
    fn expand(
        &mut self,
        node: &BranchModel,
        slot: Slot,
        parent: Option<&dyn StemInstance>,
        mut rng: Option<&mut dyn RngCore>,
        offset: Vec3,
        orientation: Quat,
    ) {
        let instance = node
            .stem_model()
            .map(|stem| stem.create_instance(reborrow(&mut rng), parent, offset, orientation));
        let instance = instance.as_deref();

        let (group, mut next_group) = match slot {
            Slot::PlantBase => (None, 0),
            Slot::At(index) if is_qualifying(node, self.dummies_enabled) => (Some(index), index + 1),
            Slot::At(index) => (None, index),
        };

        self.visitor.visit(node, group, instance);

        for child in &node.children {
            if let Some(alg) = child.branching_alg() {
                let mut factory = ScopedFactory {
                    traversal: &mut *self,
                    node: child,
                    parent: instance,
                    first_group: next_group,
                };
                alg.create_branches(&mut factory, instance, reborrow(&mut rng));
            }
            next_group += count_qualifying(child, self.dummies_enabled);
        }
    }
}

/// Factory handed to a child's branching algorithm; re-enters the traversal per branch.
struct ScopedFactory<'t, 'v, 'p, V> {
    traversal: &'t mut Traversal<'v, V>,
    node: &'p BranchModel,
    parent: Option<&'p dyn StemInstance>,
    first_group: usize,
}

impl<V: BranchVisitor> BranchingFactory for ScopedFactory<'_, '_, '_, V> {
    fn generate_branch(&mut self, rng: Option<&mut dyn RngCore>, offset: Vec3, orientation: Quat) {
        self.traversal.expand(
            self.node,
            Slot::At(self.first_group),
            self.parent,
            rng,
            offset,
            orientation,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::testing::{counting_tree, fixture_model};

    #[derive(Default)]
    struct Recorder {
        visits: Vec<(String, Option<usize>, bool)>,
    }

    impl BranchVisitor for Recorder {
        fn visit(&mut self, node: &BranchModel, group: Option<usize>, instance: Option<&dyn StemInstance>) {
            self.visits.push((node.name.clone(), group, instance.is_some()));
        }
    }

    #[test]
    fn visits_depth_first_in_declared_order() {
        let model = counting_tree();
        let mut rec = Recorder::default();
        run(&model, 1, false, &mut rec);

        let order: Vec<_> = rec.visits.iter().map(|(n, g, _)| (n.as_str(), *g)).collect();
        assert_eq!(
            order,
            vec![
                ("base", None),
                ("trunk", Some(0)),
                ("branch", Some(1)),
                ("leaf", Some(2)),
                ("leaf", Some(2)),
                ("branch", Some(1)),
                ("leaf", Some(2)),
                ("leaf", Some(2)),
                ("twig", None),
                ("twig_leaf", Some(3)),
            ]
        );
    }

    #[test]
    fn dummies_enabled_shifts_following_groups() {
        let model = counting_tree();
        let mut rec = Recorder::default();
        run(&model, 1, true, &mut rec);

        let twig = rec.visits.iter().find(|(n, _, _)| n == "twig").unwrap();
        let twig_leaf = rec.visits.iter().find(|(n, _, _)| n == "twig_leaf").unwrap();
        assert_eq!(twig.1, Some(3));
        assert!(!twig.2, "dummy has no stem instance");
        assert_eq!(twig_leaf.1, Some(4));
    }

    #[test]
    fn same_seed_replays_identical_structure() {
        let model = fixture_model(false);
        let mut a = Recorder::default();
        let mut b = Recorder::default();
        run(&model, 42, false, &mut a);
        run(&model, 42, false, &mut b);
        assert_eq!(a.visits, b.visits);
    }
}
