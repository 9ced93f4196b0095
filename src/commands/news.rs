use anyhow::{Context, Result};

use crate::commands::App;
use crate::news::{NewsBatch, NewsCategory};
use crate::palette::Palette;
use crate::store::{ArtifactKey, load};
use crate::utils::{pluralize, preview};

pub async fn run(app: &App, category: Option<NewsCategory>, refresh: bool) -> Result<()> {
    let Some(category) = category else {
        return list_stored(app).await;
    };

    let batch = app
        .news_by_category(category, refresh)
        .await
        .with_context(|| format!("Failed to get {category} news"))?;

    println!(
        "{} {}",
        Palette::bold(format!("BBC {category}")),
        Palette::dim(format!("({})", pluralize("article", batch.articles.len())))
    );
    for article in &batch.articles {
        println!(
            "{:>3}. {}",
            Palette::paint(Palette::ACCENT, article.id),
            article.title
        );
        println!("     {}", Palette::dim(&article.link));
    }
    println!(
        "\n{}",
        Palette::dim(format!("Read one with `newsdrill read {category} <ID>`."))
    );
    Ok(())
}

async fn list_stored(app: &App) -> Result<()> {
    let mut any = false;
    for category in NewsCategory::ALL {
        let batch: Option<NewsBatch> = load(app.store(), &ArtifactKey::News(category)).await?;
        if let Some(batch) = batch {
            any = true;
            println!(
                "{:<12} {}",
                Palette::paint(Palette::ACCENT, category),
                pluralize("article", batch.articles.len())
            );
        }
    }
    if !any {
        println!("No news stored yet. Fetch some with `newsdrill news <CATEGORY>`.");
    }
    Ok(())
}

pub async fn read(app: &App, category: NewsCategory, id: usize, open_link: bool) -> Result<()> {
    let article = app
        .article(category, id)
        .await
        .with_context(|| format!("Run `newsdrill news {category}` first"))?;

    println!("{}\n", Palette::bold(&article.title));
    for paragraph in article.content.lines() {
        println!("{paragraph}\n");
    }
    println!("{}", Palette::dim(&article.link));

    if open_link {
        open::that(&article.link)
            .with_context(|| format!("Failed to open {}", preview(&article.link, 80)))?;
    }
    Ok(())
}
