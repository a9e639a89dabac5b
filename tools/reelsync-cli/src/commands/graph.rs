//! Print the filter graph for an effect.

use reelsync_sync_engine::EffectCatalog;
use reelsync_transform_engine::render_filter_graph;

pub fn run(effect: &str, json: bool) -> anyhow::Result<()> {
    let catalog = EffectCatalog::builtin();
    let entry = catalog.lookup(effect)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entry.description)?);
    } else {
        println!("{}", render_filter_graph(&entry.description));
    }
    Ok(())
}
