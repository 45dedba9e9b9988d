//! Two handlers sharing one worker pool at different priorities.
//!
//! Listing pages are crawled at a lower urgency than the product pages
//! they discover, so product detail fetches jump ahead of further
//! listing traversal whenever both are queued.
//!
//! Run with `cargo run --example two_handlers`.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use spindle::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let product_pages: Arc<OnceLock<HandlerRef>> = Arc::new(OnceLock::new());
    let listing_pages: Arc<OnceLock<HandlerRef>> = Arc::new(OnceLock::new());

    let listing = {
        let product_pages = Arc::clone(&product_pages);
        let listing_pages = Arc::clone(&listing_pages);
        Handler::new("listing")
            .with_priority(3)
            .on_request(|request| {
                println!("listing: {}", request.url);
            })
            .on_html(move |_, response, document| {
                for link in document.select("article.product_pod h3 a").unwrap() {
                    if let Some(href) = link.attr("href") {
                        if let Ok(url) = response.url.join(href) {
                            let _ = product_pages.get().unwrap().submit(url.as_str());
                        }
                    }
                }
                for next in document.select("li.next a").unwrap() {
                    if let Some(href) = next.attr("href") {
                        if let Ok(url) = response.url.join(href) {
                            let _ = listing_pages.get().unwrap().submit(url.as_str());
                        }
                    }
                }
            })
            .on_error(|_, error| {
                eprintln!("listing failed: {}", error);
            })
    };

    let product = Handler::new("product")
        .with_priority(0)
        .on_html(|_, response, document| {
            let title = document
                .select("div.product_main h1")
                .unwrap()
                .first()
                .map(|e| e.text())
                .unwrap_or_default();
            let price = document
                .select("p.price_color")
                .unwrap()
                .first()
                .map(|e| e.text())
                .unwrap_or_default();
            println!("product: {} ({}) at {}", title, price, response.url);
        })
        .on_error(|_, error| {
            eprintln!("product failed: {}", error);
        });

    let config = EngineConfig::default()
        .with_workers(5)
        .with_delay(Duration::from_secs(1));

    let mut builder = Engine::builder(config);
    let products = builder.register(product);
    let listings = builder.register(listing);
    let _ = product_pages.set(products);
    let _ = listing_pages.set(listings.clone());

    listings.submit("https://books.toscrape.com/")?;

    let mut engine = builder.build()?;
    engine.run();

    while engine.pending() > 0 {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    engine.shutdown();
    engine.wait().await;

    println!("{:?}", engine.stats());
    Ok(())
}
