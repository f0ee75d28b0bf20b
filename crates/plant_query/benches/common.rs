use std::f32::consts::FRAC_PI_4;
use std::time::Duration;

use criterion::{Criterion, Throughput};
use plant_query::prelude::*;

/// Children per branching step; the generated tree grows roughly with the cube.
pub const FANOUTS: [u32; 4] = [2, 4, 8, 12];
pub const SEED: u32 = 0xA11CE;

// Small fanouts finish in microseconds, the largest in milliseconds.
const SAMPLE_SIZE: usize = 30;
const WARM_UP: Duration = Duration::from_millis(500);
const MEASUREMENT_TIME: Duration = Duration::from_secs(3);

pub fn traversal_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .sample_size(SAMPLE_SIZE)
        .warm_up_time(WARM_UP)
        .measurement_time(MEASUREMENT_TIME)
        .noise_threshold(0.03)
}

/// Trunk, `fanout` branches, random twigs and billboard leaves under a plain base.
pub fn plant(fanout: u32) -> PlantTemplate {
    let leaf = BranchModel::new("leaf")
        .with_stem(QuadStem::billboard(0.2, 0.3).with_scale_variation(0.2))
        .with_branching(RandomBranching::new(fanout / 2, fanout).with_span(0.4, 1.0));
    let twig = BranchModel::new("twig")
        .with_stem(TubeStem::new(0.6, 0.02).with_sections(3).with_length_variation(0.2))
        .with_branching(RandomBranching::new(fanout / 2, fanout).with_declination(FRAC_PI_4, 0.3))
        .with_child(leaf);
    let branch = BranchModel::new("branch")
        .with_stem(TubeStem::new(2.0, 0.08).with_axis_segments(4).with_sections(6))
        .with_branching(FixedBranching::new(fanout).with_declination(FRAC_PI_4).with_span(0.3, 1.0))
        .with_child(twig);
    let trunk = BranchModel::new("trunk")
        .with_stem(TubeStem::new(6.0, 0.3).with_tip_radius(0.1).with_axis_segments(8).with_sections(8))
        .with_branching(FixedBranching::new(1))
        .with_child(branch);
    PlantTemplate::new(PlantModel::new(BranchModel::new("base").with_child(trunk), 1))
}

/// Seeded instance of [`plant`] with its generated branch total.
pub fn instance(fanout: u32) -> (PlantInstance, usize) {
    let instance = plant(fanout).create_instance(SEED);
    let total = instance.branch_count_multi().iter().sum();
    (instance, total)
}

/// Throughput in generated elements; never zero so criterion keeps a rate.
pub fn elements_throughput(elements: usize) -> Throughput {
    Throughput::Elements(elements.max(1) as u64)
}
