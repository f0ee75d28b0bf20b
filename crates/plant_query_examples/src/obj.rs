use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use plant_query::prelude::*;
use tracing::info;

use crate::read_floats;

const ATTRS: [AttrKind; 3] = [AttrKind::Vertex, AttrKind::Normal, AttrKind::TexCoord0];

/// Writes every group of `instance` that has geometry as one OBJ object.
pub fn write_obj(instance: &PlantInstance, path: impl AsRef<Path>) -> anyhow::Result<usize> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);
    let template = instance.template();
    let format = VAttrFormat::packed(&ATTRS);
    let stride_floats = format.stride() / 4;

    writeln!(out, "# plant_query export, seed {}", instance.base_seed())?;
    let mut written = 0usize;
    for group in 0..template.group_count() {
        let Ok(per_copy) = template.vattr_count_i(group) else {
            continue;
        };
        let copies = instance.branch_count(group)?;
        if copies == 0 || per_copy == 0 {
            continue;
        }

        let mut bytes = vec![0u8; format.required_len(copies * per_copy)?];
        instance.fill_vattr_buffer_i(group, &format, &mut bytes)?;
        let floats = read_floats(&bytes);

        writeln!(out, "o {}", template.group_name(group)?)?;
        for v in floats.chunks_exact(stride_floats) {
            writeln!(out, "v {} {} {}", v[0], v[1], v[2])?;
            writeln!(out, "vn {} {} {}", v[3], v[4], v[5])?;
            writeln!(out, "vt {} {}", v[6], v[7])?;
        }

        let mut indices = vec![0u32; template.index_count(group, IndexTopology::TriangleList)?];
        for copy in 0..copies {
            let base = (written + copy * per_copy + 1) as u32;
            template.fill_index_buffer(group, IndexTopology::TriangleList, &mut IndexBuffer::U32(&mut indices), base)?;
            for tri in indices.chunks_exact(3) {
                writeln!(out, "f {0}/{0}/{0} {1}/{1}/{1} {2}/{2}/{2}", tri[0], tri[1], tri[2])?;
            }
        }
        written += copies * per_copy;
    }

    out.flush()?;
    info!("Wrote {} vertices to '{}'.", written, path.display());
    Ok(written)
}
