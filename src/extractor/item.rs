//! Item detail page extraction

use regex::Regex;
use scraper::{ElementRef, Html};
use tracing::{debug, warn};

use super::{selector, ExtractError, ItemRecord};

/// Parse an item detail page into a structured record
///
/// Returns `Ok(None)` for an empty body (nothing was fetched). A non-empty
/// body without a product title fails with `ExtractError::MissingElement`;
/// every other field is optional and becomes `None` when absent.
pub fn parse_item(html: &str) -> Result<Option<ItemRecord>, ExtractError> {
    if html.trim().is_empty() {
        return Ok(None);
    }

    let document = Html::parse_document(html);

    let name = parse_name(&document)?;
    let extra = parse_extra_attributes(&document)?;

    let record = ItemRecord {
        price: parse_price(&document)?,
        rating: parse_rating(&document)?,
        description: parse_description(&document)?,
        category: parse_category(&document)?,
        external_code: extra.external_code,
        availability: extra.availability,
        stock_count: extra.stock_count,
        name,
    };

    debug!("Extracted item '{}'", record.name);
    Ok(Some(record))
}

/// Attributes from the product information table
#[derive(Debug, Default, PartialEq)]
struct ExtraAttributes {
    external_code: Option<String>,
    availability: Option<String>,
    stock_count: Option<u32>,
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn parse_name(document: &Html) -> Result<String, ExtractError> {
    let title_selector = selector("div.product_main h1")?;
    document
        .select(&title_selector)
        .next()
        .map(element_text)
        .ok_or_else(|| ExtractError::MissingElement("product title (div.product_main h1)".to_string()))
}

fn parse_price(document: &Html) -> Result<Option<f64>, ExtractError> {
    let price_selector = selector("p.price_color")?;
    let Some(element) = document.select(&price_selector).next() else {
        return Ok(None);
    };

    let text = element_text(element);
    let digits = text.trim_start_matches(|c: char| !c.is_ascii_digit() && c != '.');
    match digits.parse::<f64>() {
        Ok(price) => Ok(Some(price)),
        Err(e) => {
            warn!("Unparseable price '{}': {}", text, e);
            Ok(None)
        }
    }
}

/// Map the ordinal class of the star rating element to 1..=5
fn rating_from_class(class: &str) -> Option<u8> {
    match class.to_ascii_lowercase().as_str() {
        "one" => Some(1),
        "two" => Some(2),
        "three" => Some(3),
        "four" => Some(4),
        "five" => Some(5),
        _ => None,
    }
}

fn parse_rating(document: &Html) -> Result<Option<u8>, ExtractError> {
    let rating_selector = selector("p.star-rating")?;
    let rating = document.select(&rating_selector).next().and_then(|element| {
        element
            .value()
            .classes()
            .filter(|class| *class != "star-rating")
            .find_map(rating_from_class)
    });
    Ok(rating)
}

fn parse_description(document: &Html) -> Result<Option<String>, ExtractError> {
    // The description text is the paragraph following the header block
    let description_selector = selector("#product_description ~ p")?;
    Ok(document
        .select(&description_selector)
        .next()
        .map(element_text))
}

fn parse_category(document: &Html) -> Result<Option<String>, ExtractError> {
    let crumb_selector = selector("ul.breadcrumb li a")?;
    let crumbs: Vec<String> = document.select(&crumb_selector).map(element_text).collect();

    let category = match crumbs.len() {
        0 | 1 => None,
        2 => Some(crumbs[1].clone()),
        _ => Some(crumbs[2].clone()),
    };
    Ok(category)
}

fn parse_stock_count(availability: &str) -> Result<Option<u32>, ExtractError> {
    let pattern = Regex::new(r"\((\d+) available\)")?;
    Ok(pattern
        .captures(availability)
        .and_then(|captures| captures.get(1))
        .and_then(|count| count.as_str().parse().ok()))
}

fn parse_extra_attributes(document: &Html) -> Result<ExtraAttributes, ExtractError> {
    let row_selector = selector("table.table-striped tr")?;
    let header_selector = selector("th")?;
    let value_selector = selector("td")?;

    let mut extra = ExtraAttributes::default();
    for row in document.select(&row_selector) {
        let Some(header) = row.select(&header_selector).next().map(element_text) else {
            continue;
        };
        let value = row.select(&value_selector).next().map(element_text);

        match header.as_str() {
            "UPC" => extra.external_code = value,
            "Availability" => extra.availability = value,
            _ => {}
        }
    }

    if let Some(availability) = &extra.availability {
        extra.stock_count = parse_stock_count(availability)?;
    }

    Ok(extra)
}
