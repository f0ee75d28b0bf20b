use plant_query::prelude::*;
use plant_query_examples::{demo_plant, init_tracing};

fn main() -> anyhow::Result<()> {
    init_tracing();
    let mut template = demo_plant();

    // Same plant, once with dummies hidden and once with them numbered
    for dummies in [false, true] {
        template.set_dummies_enabled(dummies);
        let instance = template.create_instance(0);
        let counts = instance.branch_count_multi();

        println!("dummies enabled: {dummies} (seed {})", instance.base_seed());
        println!("{:>5}  {:<10} {:>5} {:>8} {:>9}", "group", "name", "dummy", "branches", "vertices");
        for (group, count) in counts.iter().enumerate() {
            let vertices = match instance.vattr_count(group, AttrKind::Vertex) {
                Ok(n) => n.to_string(),
                Err(Error::MissingStemModel { .. }) => "-".to_string(),
                Err(err) => return Err(err.into()),
            };
            println!(
                "{:>5}  {:<10} {:>5} {:>8} {:>9}",
                group,
                template.group_name(group)?,
                template.is_dummy(group)?,
                count,
                vertices
            );
        }
        println!();
    }

    if let Some(author) = &template.meta_info().author {
        println!("author: {author}");
    }
    Ok(())
}
