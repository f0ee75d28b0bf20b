#![forbid(unsafe_code)]

mod obj;

use std::f32::consts::FRAC_PI_4;

use plant_query::prelude::*;
use tracing_subscriber::EnvFilter;

pub use obj::write_obj;

/// Installs a formatting subscriber honouring `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// A small shrub: trunk, random branches carrying billboard leaves, and a dummy cluster
/// node holding buds at the trunk tip.
pub fn demo_plant() -> PlantTemplate {
    let leaf = BranchModel::new("leaf")
        .with_stem(QuadStem::billboard(0.25, 0.35).with_scale_variation(0.2))
        .with_branching(RandomBranching::new(2, 5).with_span(0.3, 1.0))
        .with_material(
            MaterialDef::default()
                .with_color([0.25, 0.6, 0.2])
                .with_texture("leaf.png")
                .with_billboard(true)
                .with_double_sided(true),
        )
        .with_vis_range(VisRange::new(0.0, 0.7));
    let branch = BranchModel::new("branch")
        .with_stem(
            TubeStem::new(1.6, 0.06)
                .with_tip_radius(0.02)
                .with_axis_segments(3)
                .with_sections(5)
                .with_length_variation(0.25),
        )
        .with_branching(RandomBranching::new(3, 6).with_declination(FRAC_PI_4, 0.25).with_span(0.25, 0.95))
        .with_material(MaterialDef::default().with_color([0.4, 0.3, 0.2]))
        .with_child(leaf);
    let bud = BranchModel::new("bud")
        .with_stem(QuadStem::new(0.08, 0.1))
        .with_branching(FixedBranching::new(3).with_declination(0.3));
    let cluster = BranchModel::dummy("cluster")
        .with_branching(FixedBranching::new(1).with_span(1.0, 1.0))
        .with_child(bud);
    let trunk = BranchModel::new("trunk")
        .with_stem(
            TubeStem::new(3.0, 0.15)
                .with_tip_radius(0.05)
                .with_axis_segments(6)
                .with_sections(8),
        )
        .with_branching(FixedBranching::new(1))
        .with_material(MaterialDef::default().with_color([0.35, 0.25, 0.15]))
        .with_child(branch)
        .with_child(cluster);

    let model = PlantModel::new(BranchModel::new("base").with_child(trunk), 2025).with_meta_info(ModelMetaInfo {
        author: Some("plant_query examples".into()),
        license: Some("CC0".into()),
        plant_info: Some("demo shrub".into()),
    });
    PlantTemplate::new(model)
}

/// Reads native-endian `f32`s from an unaligned byte buffer.
pub fn read_floats(bytes: &[u8]) -> Vec<f32> {
    bytes.chunks_exact(4).map(bytemuck::pod_read_unaligned::<f32>).collect()
}

pub fn format_aabb(aabb: &Aabb) -> String {
    format!(
        "min ({:.3}, {:.3}, {:.3}) max ({:.3}, {:.3}, {:.3})",
        aabb.min.x, aabb.min.y, aabb.min.z, aabb.max.x, aabb.max.y, aabb.max.z
    )
}
