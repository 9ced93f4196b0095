//! HTML extraction for BBC category and article pages.

use std::collections::BTreeSet;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::CrawlError;

const INTERNAL_LINK_TESTID: &str = "internal-link";
const SPORT_CONTAINER: &str = "ul.ssrcss-uy86gw-Grid.e12imr580";
const SPORT_PROMO: &str = r#"div[data-testid="promo"][type="article"]"#;
const ARTICLE_BLOCKS: [&str; 2] = ["text-block", "layout-block"];

fn selector(css: &str) -> Result<Selector, CrawlError> {
    Selector::parse(css).map_err(|_| CrawlError::Selector(css.to_string()))
}

/// Text of an element with each text node trimmed and joined by a space.
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Video and live pages have no article body.
pub fn is_useless_url(url: &Url) -> bool {
    let path = url.path();
    path.contains("/videos/") || path.contains("/live/")
}

fn resolve_links<'a, I>(hrefs: I, base: &Url) -> Vec<Url>
where
    I: IntoIterator<Item = &'a str>,
{
    let unique: BTreeSet<Url> = hrefs
        .into_iter()
        .filter_map(|href| base.join(href.trim()).ok())
        .filter(|url| !is_useless_url(url))
        .collect();
    unique.into_iter().collect()
}

/// Article links inside the `div[data-testid=section_testid]` block.
pub fn extract_grid_links(html: &str, section_testid: &str, base: &Url) -> Result<Vec<Url>, CrawlError> {
    let document = Html::parse_document(html);
    let section_selector = selector(&format!(r#"div[data-testid="{section_testid}"]"#))?;
    let link_selector = selector("a[href]")?;

    let Some(section) = document.select(&section_selector).next() else {
        return Ok(Vec::new());
    };

    let hrefs = section
        .select(&link_selector)
        .filter(|a| a.value().attr("data-testid") == Some(INTERNAL_LINK_TESTID))
        .filter_map(|a| a.value().attr("href"));

    Ok(resolve_links(hrefs, base))
}

pub fn extract_sport_links(html: &str, base: &Url) -> Result<Vec<Url>, CrawlError> {
    let document = Html::parse_document(html);
    let container_selector = selector(SPORT_CONTAINER)?;
    let promo_selector = selector(SPORT_PROMO)?;
    let link_selector = selector("h3 > a[href]")?;

    let Some(container) = document.select(&container_selector).next() else {
        return Ok(Vec::new());
    };

    let hrefs = container
        .select(&promo_selector)
        .filter_map(|promo| promo.select(&link_selector).next())
        .filter_map(|a| a.value().attr("href"));

    Ok(resolve_links(hrefs, base))
}

/// Text of the first `<h1>`, or an empty string.
pub fn extract_title(html: &str) -> Result<String, CrawlError> {
    let document = Html::parse_document(html);
    let h1 = selector("h1")?;
    Ok(document.select(&h1).next().map(element_text).unwrap_or_default())
}

/// Body paragraphs, one per line.
///
/// Only `<p>` elements inside a text or layout block count; captions,
/// related links and footers live elsewhere on the page.
pub fn extract_paragraphs(html: &str) -> Result<String, CrawlError> {
    let document = Html::parse_document(html);
    let p = selector("p")?;

    let paragraphs: Vec<String> = document
        .select(&p)
        .filter(|p| in_article_block(*p))
        .map(element_text)
        .filter(|text| !text.is_empty())
        .collect();

    Ok(paragraphs.join("\n"))
}

fn in_article_block(element: ElementRef<'_>) -> bool {
    element.ancestors().filter_map(ElementRef::wrap).any(|ancestor| {
        ancestor.value().name() == "div"
            && ancestor
                .value()
                .attr("data-component")
                .is_some_and(|component| ARTICLE_BLOCKS.contains(&component))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://www.bbc.com").unwrap()
    }

    const GRID_PAGE: &str = r#"
        <html><body>
          <div data-testid="virginia-section-8">
            <a data-testid="internal-link" href="/news/articles/b2">B</a>
            <a data-testid="internal-link" href="/news/articles/a1">A</a>
            <a data-testid="internal-link" href="/news/articles/a1">A again</a>
            <a data-testid="internal-link" href="/news/videos/v1">Video</a>
            <a data-testid="internal-link" href="https://www.bbc.com/news/live/l1">Live</a>
            <a data-testid="external-link" href="/elsewhere">Other</a>
          </div>
          <div data-testid="alaska-grid">
            <a data-testid="internal-link" href="/culture/article/c1">C</a>
          </div>
        </body></html>"#;

    #[test]
    fn grid_links_are_filtered_resolved_and_sorted() {
        let links = extract_grid_links(GRID_PAGE, "virginia-section-8", &base()).unwrap();
        let links: Vec<&str> = links.iter().map(Url::as_str).collect();
        assert_eq!(
            links,
            vec![
                "https://www.bbc.com/news/articles/a1",
                "https://www.bbc.com/news/articles/b2",
            ]
        );
    }

    #[test]
    fn missing_section_gives_no_links() {
        let links = extract_grid_links(GRID_PAGE, "no-such-section", &base()).unwrap();
        assert!(links.is_empty());
    }

    #[test]
    fn sport_links_come_from_article_promos() {
        let html = r#"
            <ul class="ssrcss-uy86gw-Grid e12imr580">
              <li><div data-testid="promo" type="article"><h3><a href="/sport/football/articles/f1">F</a></h3></div></li>
              <li><div data-testid="promo" type="video"><h3><a href="/sport/football/videos/x">V</a></h3></div></li>
              <li><div data-testid="promo" type="article"><h3>No link</h3></div></li>
            </ul>
            <a href="/sport/outside">Outside</a>"#;
        let links = extract_sport_links(html, &base()).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].as_str(), "https://www.bbc.com/sport/football/articles/f1");
    }

    #[test]
    fn article_text_comes_from_text_blocks() {
        let html = r#"
            <html><body>
              <h1>  Markets <span>rally</span> </h1>
              <div data-component="text-block"><p>First   <b>paragraph</b>.</p></div>
              <div data-component="caption-block"><p>A caption.</p></div>
              <div data-component="layout-block"><section><p>Second paragraph.</p><p>  </p></section></div>
              <footer><p>Copyright</p></footer>
            </body></html>"#;

        assert_eq!(extract_title(html).unwrap(), "Markets rally");
        assert_eq!(
            extract_paragraphs(html).unwrap(),
            "First paragraph .\nSecond paragraph."
        );
    }

    #[test]
    fn page_without_title_or_body() {
        assert_eq!(extract_title("<p>hi</p>").unwrap(), "");
        assert_eq!(extract_paragraphs("<p>hi</p>").unwrap(), "");
    }

    #[test]
    fn video_and_live_paths_are_useless() {
        assert!(is_useless_url(&Url::parse("https://www.bbc.com/news/videos/x").unwrap()));
        assert!(is_useless_url(&Url::parse("https://www.bbc.com/sport/live/x").unwrap()));
        assert!(!is_useless_url(&Url::parse("https://www.bbc.com/news/articles/x").unwrap()));
    }
}
