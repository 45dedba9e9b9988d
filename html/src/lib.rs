//! Parsed HTML documents and the queries callbacks run against them.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use spindle_core::error::{Error, Result};

/// A parsed HTML document.
///
/// Post-parse callbacks receive a reference to one of these and query it
/// with CSS selectors. The underlying DOM is not `Send`; documents live
/// only for the duration of a single dispatch and are never moved across
/// threads.
#[derive(Debug)]
pub struct Document {
    html: Html,
    url: Url,
}

impl Document {
    /// Parse a response body into a document.
    ///
    /// The body must be valid UTF-8. Malformed HTML is not an error; the
    /// parser recovers the way browsers do.
    pub fn parse(body: &[u8], url: Url) -> Result<Self> {
        let text = std::str::from_utf8(body)
            .map_err(|e| Error::parse(url.as_str(), format!("body is not valid UTF-8: {}", e)))?;
        Ok(Self {
            html: Html::parse_document(text),
            url,
        })
    }

    /// Build a document directly from HTML text
    pub fn from_html(html: &str, url: Url) -> Self {
        Self {
            html: Html::parse_document(html),
            url,
        }
    }

    /// The URL this document was fetched from
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// All elements matching a CSS selector, in document order.
    ///
    /// Fails only if the selector itself does not compile.
    pub fn select(&self, css: &str) -> Result<Vec<Element<'_>>> {
        let selector = Selector::parse(css).map_err(|e| Error::selector(css, e.to_string()))?;
        Ok(self.html.select(&selector).map(Element).collect())
    }

    /// The first element matching a CSS selector, if any
    pub fn select_first(&self, css: &str) -> Result<Option<Element<'_>>> {
        let selector = Selector::parse(css).map_err(|e| Error::selector(css, e.to_string()))?;
        Ok(self.html.select(&selector).next().map(Element))
    }

    /// Every text node of the document concatenated in document order.
    ///
    /// Whitespace and newlines are kept as they appear in the markup.
    pub fn text(&self) -> String {
        self.html.root_element().text().collect()
    }

    /// Absolute URLs of all anchors, resolved against the document URL.
    ///
    /// Anchors whose `href` does not resolve to a valid URL are skipped.
    pub fn links(&self) -> Vec<Url> {
        let selector = Selector::parse("a[href]").unwrap();
        self.html
            .select(&selector)
            .filter_map(|element| element.value().attr("href"))
            .filter_map(|href| self.url.join(href).ok())
            .collect()
    }
}

/// One element matched by a selector
#[derive(Debug)]
pub struct Element<'a>(ElementRef<'a>);

impl<'a> Element<'a> {
    /// Attribute value, if the attribute is present
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.0.value().attr(name)
    }

    /// The element's tag name
    pub fn name(&self) -> &str {
        self.0.value().name()
    }

    /// Descendant text nodes concatenated in document order, whitespace kept
    pub fn text(&self) -> String {
        self.0.text().collect()
    }

    /// The element's own markup, including the tag itself
    pub fn html(&self) -> String {
        self.0.html()
    }

    /// Descendant elements matching a CSS selector
    pub fn select(&self, css: &str) -> Result<Vec<Element<'a>>> {
        let selector = Selector::parse(css).map_err(|e| Error::selector(css, e.to_string()))?;
        Ok(self.0.select(&selector).map(Element).collect())
    }
}
