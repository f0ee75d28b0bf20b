use glam::{EulerRot, Quat};
use plant_query_examples::{demo_plant, format_aabb, init_tracing};

fn main() -> anyhow::Result<()> {
    init_tracing();
    let template = demo_plant();

    for seed in [1, 2, 3] {
        let instance = template.create_instance(seed);
        println!("seed {seed}: {}", format_aabb(&instance.bounding_box()));
    }

    let instance = template.create_instance(0);
    let group = 1;
    let count = instance.branch_count(group)?;
    let mut offsets = vec![0.0f32; count * 3];
    let mut orientations = vec![0.0f32; count * 4];
    let mut scales = vec![0.0f32; count];
    instance.fill_clone_transform_buffer(group, Some(&mut offsets), Some(&mut orientations), Some(&mut scales))?;

    println!(
        "{} x{} (cloneable: {})",
        template.group_name(group)?,
        count,
        template.is_cloneable(group, true)?
    );
    for i in 0..count {
        let q = Quat::from_slice(&orientations[i * 4..i * 4 + 4]);
        let (yaw, pitch, roll) = q.to_euler(EulerRot::YXZ);
        println!(
            "  #{i}: offset ({:.3}, {:.3}, {:.3}) yaw {:.1} pitch {:.1} roll {:.1} scale {:.3}",
            offsets[i * 3],
            offsets[i * 3 + 1],
            offsets[i * 3 + 2],
            yaw.to_degrees(),
            pitch.to_degrees(),
            roll.to_degrees(),
            scales[i]
        );
    }

    let leaf = template.group_names().iter().position(|n| *n == "leaf").unwrap_or(0);
    if let Ok((w, h)) = template.billboard_size(leaf) {
        let (near, far) = template.lod_vis_range(leaf)?;
        println!("leaf billboard {w} x {h}, visible in [{near}, {far}]");
    }
    Ok(())
}
