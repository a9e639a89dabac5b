//! List the effect catalog.

use reelsync_sync_engine::EffectCatalog;

pub fn run() -> anyhow::Result<()> {
    let catalog = EffectCatalog::builtin();

    println!("Effects");
    println!("{}", "=".repeat(50));
    for entry in catalog.entries() {
        let ops = if entry.is_identity() {
            "identity".to_string()
        } else {
            entry.description.op_names().join(" -> ")
        };
        let live = match entry.shader_amount {
            Some(amount) => format!("live {amount:.1}"),
            None => "baked only".to_string(),
        };
        println!("  {:<12} {:<40} {}", entry.name, ops, live);
    }

    Ok(())
}
