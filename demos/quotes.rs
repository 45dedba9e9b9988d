//! Crawl quotes.toscrape.com and print every quote as a JSON line,
//! following the pagination links until the last page.
//!
//! Run with `cargo run --example quotes`.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use serde_json::json;
use spindle::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    // The handler follows pagination through itself, so its callback gets
    // the submission handle once registration has produced it.
    let next_page: Arc<OnceLock<HandlerRef>> = Arc::new(OnceLock::new());

    let handler = {
        let next_page = Arc::clone(&next_page);
        Handler::new("quotes")
            .on_html(move |_, response, document| {
                for quote in document.select("div.quote").unwrap() {
                    let text = quote.select("span.text").unwrap().first().map(|e| e.text());
                    let author = quote
                        .select("small.author")
                        .unwrap()
                        .first()
                        .map(|e| e.text());
                    let tags: Vec<String> = quote
                        .select("div.tags a.tag")
                        .unwrap()
                        .iter()
                        .map(|tag| tag.text())
                        .collect();

                    println!("{}", json!({ "text": text, "author": author, "tags": tags }));
                }

                for next in document.select("li.next a").unwrap() {
                    if let Some(href) = next.attr("href") {
                        if let Ok(url) = response.url.join(href) {
                            if let Err(error) = next_page.get().unwrap().submit(url.as_str()) {
                                eprintln!("could not queue {}: {}", url, error);
                            }
                        }
                    }
                }
            })
            .on_error(|_, error| {
                eprintln!("crawl error: {}", error);
            })
    };

    let config = EngineConfig::default()
        .with_workers(2)
        .with_delay(Duration::from_millis(500));

    let mut builder = Engine::builder(config);
    let quotes = builder.register(handler);
    let _ = next_page.set(quotes.clone());

    quotes.submit("https://quotes.toscrape.com/")?;

    let mut engine = builder.build()?;
    engine.run();

    while engine.pending() > 0 {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    engine.shutdown();
    engine.wait().await;

    let stats = engine.stats();
    println!(
        "done: {} pages fetched, {} fetch errors, {} parse errors",
        stats.pages_fetched, stats.fetch_errors, stats.parse_errors
    );

    Ok(())
}
