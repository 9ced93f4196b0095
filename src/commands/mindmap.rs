use anyhow::Result;

use super::{App, ArticleArgs};
use crate::palette::Palette;

pub async fn run(app: &App, article: &ArticleArgs, json: bool) -> Result<()> {
    let text = article.resolve(app).await?;
    let map = app.mind_map(&text).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }
    print!("{}", map.render_tree());
    println!(
        "{}",
        Palette::dim(format!("{} nodes, {} levels", map.node_count(), map.depth()))
    );
    Ok(())
}
