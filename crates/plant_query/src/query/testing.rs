//! Reference templates shared by the query tests.
use std::f32::consts::FRAC_PI_4;

use crate::builtin::{FixedBranching, QuadStem, RandomBranching, TubeStem};
use crate::model::{BranchModel, MaterialDef, ModelFlags, PlantModel, VisRange};

/// Fully fixed structure:
///
/// ```text
/// base -> trunk x1 -> branch x2 -> leaf x2
///                  -> twig (dummy, no stem) x1 -> twig_leaf x1
/// ```
pub(crate) fn counting_tree() -> PlantModel {
    let leaf = BranchModel::new("leaf")
        .with_stem(QuadStem::new(0.2, 0.3))
        .with_branching(FixedBranching::new(2).with_span(0.5, 1.0));
    let branch = BranchModel::new("branch")
        .with_stem(TubeStem::new(1.0, 0.05).with_sections(3))
        .with_branching(FixedBranching::new(2).with_declination(FRAC_PI_4))
        .with_child(leaf);
    let twig_leaf = BranchModel::new("twig_leaf")
        .with_stem(QuadStem::billboard(0.4, 0.4))
        .with_branching(FixedBranching::new(1));
    let twig = BranchModel::dummy("twig")
        .with_branching(FixedBranching::new(1).with_span(1.0, 1.0))
        .with_child(twig_leaf);
    let trunk = BranchModel::new("trunk")
        .with_stem(TubeStem::new(3.0, 0.2).with_tip_radius(0.1).with_axis_segments(2))
        .with_branching(FixedBranching::new(1))
        .with_child(branch)
        .with_child(twig);

    PlantModel::new(BranchModel::new("base").with_child(trunk), 17)
}

/// Seed-dependent structure with random counts and random stem variation.
pub(crate) fn fixture_model(no_randomness: bool) -> PlantModel {
    let leaf = BranchModel::new("leaf")
        .with_stem(QuadStem::billboard(0.3, 0.4).with_scale_variation(0.25))
        .with_branching(RandomBranching::new(0, 3).with_span(0.3, 1.0))
        .with_material(MaterialDef::default().with_billboard(true).with_texture("leaf.png"))
        .with_vis_range(VisRange::new(0.0, 0.6));
    let branch = BranchModel::new("branch")
        .with_stem(TubeStem::new(1.5, 0.08).with_sections(4).with_length_variation(0.3))
        .with_branching(RandomBranching::new(1, 4).with_declination(FRAC_PI_4, 0.2).with_span(0.2, 0.9))
        .with_child(leaf);
    let bud = BranchModel::new("bud")
        .with_stem(QuadStem::new(0.1, 0.1))
        .with_branching(RandomBranching::new(1, 2));
    let cluster = BranchModel::dummy("cluster")
        .with_branching(FixedBranching::new(1).with_span(1.0, 1.0))
        .with_child(bud);
    let trunk = BranchModel::new("trunk")
        .with_stem(
            TubeStem::new(4.0, 0.3)
                .with_tip_radius(0.1)
                .with_axis_segments(3)
                .with_sections(5)
                .with_length_variation(0.2),
        )
        .with_branching(FixedBranching::new(1))
        .with_child(branch)
        .with_child(cluster);

    PlantModel::new(BranchModel::new("base").with_child(trunk), 7)
        .with_flags(ModelFlags::default().with_no_randomness(no_randomness))
}

/// `base -> { A (two instances), B (dummy, no children) }`.
pub(crate) fn scenario_model() -> PlantModel {
    let a = BranchModel::new("A")
        .with_stem(QuadStem::new(1.0, 1.0))
        .with_branching(FixedBranching::new(2));
    let b = BranchModel::dummy("B");
    PlantModel::new(BranchModel::new("base").with_child(a).with_child(b), 1)
}
