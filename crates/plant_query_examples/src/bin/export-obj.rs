use plant_query_examples::{demo_plant, init_tracing, write_obj};

fn main() -> anyhow::Result<()> {
    init_tracing();
    let seed = std::env::args()
        .nth(1)
        .map(|s| s.parse::<u32>())
        .transpose()?
        .unwrap_or(0);

    let instance = demo_plant().create_instance(seed);
    let out = "export-obj.obj";
    let vertices = write_obj(&instance, out)?;
    println!("{vertices} vertices written to {out}");
    Ok(())
}
