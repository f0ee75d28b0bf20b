use plant_query::prelude::*;
use plant_query_examples::{demo_plant, init_tracing, read_floats};

fn main() -> anyhow::Result<()> {
    init_tracing();
    let template = demo_plant();
    let instance = template.create_instance(7);

    // position | normal | uv | 4 bytes padding
    let format = VAttrFormat::new(36)
        .with_attr(AttrKind::Vertex, 0)
        .with_attr(AttrKind::Normal, 12)
        .with_attr(AttrKind::TexCoord0, 24);
    format.validate()?;

    for group in 0..template.group_count() {
        let vertices = instance.vattr_count_i(group)?;
        let mut dst = vec![0u8; format.required_len(vertices)?];
        instance.fill_vattr_buffer_i(group, &format, &mut dst)?;

        let floats = read_floats(&dst);
        let mut min_y = f32::INFINITY;
        let mut max_y = f32::NEG_INFINITY;
        for record in floats.chunks(9) {
            min_y = min_y.min(record[1]);
            max_y = max_y.max(record[1]);
        }
        println!(
            "{:<8} {:>6} vertices {:>8} bytes  y in [{:.3}, {:.3}]",
            template.group_name(group)?,
            vertices,
            dst.len(),
            min_y,
            max_y
        );
    }

    // The same data for one group through separate strided buffers
    let group = 1;
    let vertices = instance.vattr_count_i(group)?;
    let mut positions = vec![0u8; vertices * 16];
    let mut uvs = vec![0u8; vertices * 8];
    instance.fill_vattr_buffers_i(
        group,
        VAttrBuffers::new()
            .with_attr(AttrKind::Vertex, &mut positions, 0, 16)
            .with_attr(AttrKind::TexCoord0, &mut uvs, 0, 8),
    )?;
    let first = read_floats(&positions[..12]);
    println!("first {} vertex: {:?}", template.group_name(group)?, first);
    Ok(())
}
