use log::*;
use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::Value;
use sup_common::Cents;

use crate::{
    error::SourceError,
    helpers::strip_query,
    records::{ProductRecord, VariantRecord},
    sources::{ProductSource, SourceFormat},
};

/// Parses one scraped product page. The storefront pages embed their product state in three
/// places, all of which are read here:
/// - a `var dataObject = {...};` script holding SKU, title and the variant list,
/// - an `application/ld+json` block with description, brand, category and images,
/// - a `div#recentData` element carrying current and previous price attributes.
/// Image fallback comes from the `#owl-zoom` carousel; a `btn-<variant>` button marks a variant
/// as sold out.
///
/// A page without a `dataObject` is unusable input. A page without price data yields no record
/// but is only a warning, matching how listing runs skip incomplete products.
pub struct HtmlListing;

#[derive(Deserialize)]
struct DataObject {
    plu: String,
    description: String,
    #[serde(default)]
    variants: Vec<DataObjectVariant>,
}

#[derive(Deserialize)]
struct DataObjectVariant {
    name: String,
    #[serde(default)]
    sku: String,
    #[serde(default)]
    upc: Option<String>,
    #[serde(default)]
    page_id_variant: Option<String>,
}

impl ProductSource for HtmlListing {
    fn format(&self) -> SourceFormat {
        SourceFormat::Html
    }

    fn parse(&self, input: &str) -> Result<Vec<ProductRecord>, SourceError> {
        let doc = Html::parse_document(input);
        let data = extract_data_object(&doc)?;
        let ld = extract_product_ld_json(&doc);

        let Some((price, compare_at_price)) = extract_price_data(&doc)? else {
            warn!("Skipping product {}: no usable price data on the page", data.plu);
            return Ok(vec![]);
        };

        let mut images = ld
            .as_ref()
            .and_then(|p| p.get("image"))
            .and_then(Value::as_array)
            .map(|urls| urls.iter().filter_map(Value::as_str).map(str::to_string).collect::<Vec<_>>())
            .unwrap_or_default();
        // The feed sometimes emits a single placeholder entry instead of real image links.
        if images.is_empty() || (images.len() == 1 && images[0] == "?v=1") {
            images = scrape_carousel_images(&doc)?;
        }
        let images = images.iter().map(|url| strip_query(url).to_string()).collect::<Vec<_>>();

        let description = ld
            .as_ref()
            .and_then(|p| p.get("description"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let vendor = ld
            .as_ref()
            .and_then(|p| p.get("brand"))
            .and_then(|b| b.get("name"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let category = ld
            .as_ref()
            .and_then(|p| p.get("category"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        let mut parts = category.split('/').map(str::trim);
        let gender = parts.next().unwrap_or_default().to_string();
        let product_type = parts.next().unwrap_or_default().to_string();

        let variants = data
            .variants
            .into_iter()
            .map(|v| {
                let quantity = match v.page_id_variant.as_deref() {
                    Some(page_id) => variant_quantity(&doc, page_id)?,
                    None => 1,
                };
                Ok(VariantRecord { name: v.name, sku: v.sku, barcode: v.upc, quantity, price: None })
            })
            .collect::<Result<Vec<_>, SourceError>>()?;

        let tags = if gender.is_empty() { vec![] } else { vec![gender] };
        Ok(vec![ProductRecord {
            title: data.description,
            description,
            vendor,
            product_type,
            tags,
            sku: data.plu,
            price,
            compare_at_price,
            variants,
            images,
        }])
    }
}

fn selector(s: &'static str) -> Result<Selector, SourceError> {
    Selector::parse(s).map_err(|e| SourceError::Malformed(format!("bad selector '{s}': {e}")))
}

fn extract_data_object(doc: &Html) -> Result<DataObject, SourceError> {
    let script_sel = selector("script")?;
    let re = Regex::new(r"(?s)var\s+dataObject\s*=\s*(\{.*?\});")
        .map_err(|e| SourceError::Malformed(e.to_string()))?;
    for script in doc.select(&script_sel) {
        let text = script.text().collect::<String>();
        if !text.contains("var dataObject") {
            continue;
        }
        let Some(captures) = re.captures(&text) else { continue };
        return serde_json::from_str::<DataObject>(&captures[1])
            .map_err(|e| SourceError::Malformed(format!("dataObject: {e}")));
    }
    Err(SourceError::Malformed("dataObject not found in page".to_string()))
}

fn extract_product_ld_json(doc: &Html) -> Option<Value> {
    let sel = selector(r#"script[type="application/ld+json"]"#).ok()?;
    for script in doc.select(&sel) {
        let text = script.text().collect::<String>();
        match serde_json::from_str::<Value>(text.trim()) {
            Ok(data) if data["@type"] == "Product" => return Some(data),
            Ok(_) => continue,
            Err(e) => {
                warn!("Ignoring unparseable ld+json block: {e}");
                continue;
            },
        }
    }
    None
}

/// Reads `data-price` and `data-previous-price` off the `#recentData` div. `Ok(None)` means the
/// div is absent or carries no price, which disqualifies the product rather than the whole run.
fn extract_price_data(doc: &Html) -> Result<Option<(Cents, Option<Cents>)>, SourceError> {
    let sel = selector("div#recentData")?;
    let Some(div) = doc.select(&sel).next() else {
        return Ok(None);
    };
    let price = match div.value().attr("data-price").map(str::trim) {
        None | Some("") => return Ok(None),
        Some(raw) => match Cents::from_decimal_str(raw) {
            Ok(p) => p,
            Err(e) => {
                warn!("Unreadable data-price attribute: {e}");
                return Ok(None);
            },
        },
    };
    let compare = div
        .value()
        .attr("data-previous-price")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|raw| match Cents::from_decimal_str(raw) {
            Ok(p) => Some(p),
            Err(e) => {
                warn!("Ignoring unreadable data-previous-price attribute: {e}");
                None
            },
        });
    Ok(Some((price, compare)))
}

fn scrape_carousel_images(doc: &Html) -> Result<Vec<String>, SourceError> {
    let sel = selector("ul#owl-zoom li img")?;
    let images = doc
        .select(&sel)
        .filter_map(|img| img.value().attr("data-src"))
        .map(|src| strip_query(src).to_string())
        .collect();
    Ok(images)
}

/// A `btn-<page_id>` button on the page is the sold-out marker for that variant.
fn variant_quantity(doc: &Html, page_id_variant: &str) -> Result<i64, SourceError> {
    let btn_class = format!("btn-{}", page_id_variant.replace('.', "-"));
    let sel = selector("button")?;
    let sold_out = doc
        .select(&sel)
        .any(|button| button.value().attr("class").is_some_and(|classes| classes.contains(&btn_class)));
    Ok(if sold_out { 0 } else { 1 })
}

#[cfg(test)]
mod test {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html><head>
<script type="text/javascript">
var pageTracking = {};
var dataObject = {"plu": "JD-1001", "description": "Gazelle Bold Shoes",
 "variants": [
   {"name": "7", "sku": "JD-1001-7", "upc": "0001", "page_id_variant": "1001.7"},
   {"name": "8", "sku": "JD-1001-8", "upc": "0002", "page_id_variant": "1001.8"}
 ]};
</script>
<script type="application/ld+json">
{"@type": "Product", "description": "Suede upper.", "category": "Women/Trainers",
 "brand": {"name": "adidas Originals"}, "image": []}
</script>
</head><body>
<div id="recentData" data-price="180.00" data-previous-price="220.00"></div>
<ul id="owl-zoom">
  <li><img data-src="https://cdn.example.com/gazelle-1.jpg?v=3"></li>
  <li><img data-src="https://cdn.example.com/gazelle-2.jpg"></li>
</ul>
<button class="size-btn btn-1001-8">8</button>
</body></html>"#;

    #[test]
    fn extracts_a_full_record_from_a_product_page() {
        let records = HtmlListing.parse(PAGE).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.sku, "JD-1001");
        assert_eq!(record.title, "Gazelle Bold Shoes");
        assert_eq!(record.vendor, "adidas Originals");
        assert_eq!(record.product_type, "Trainers");
        assert_eq!(record.tags, vec!["Women"]);
        assert_eq!(record.price, Cents::from_units(180));
        assert_eq!(record.compare_at_price, Some(Cents::from_units(220)));
        // ld+json images were empty, so the carousel is the source, query strings stripped.
        assert_eq!(
            record.images,
            vec!["https://cdn.example.com/gazelle-1.jpg", "https://cdn.example.com/gazelle-2.jpg"]
        );
        // The btn-1001-8 button marks size 8 as sold out.
        assert_eq!(record.variants[0].quantity, 1);
        assert_eq!(record.variants[1].quantity, 0);
    }

    #[test]
    fn page_without_data_object_is_fatal() {
        let err = HtmlListing.parse("<html><body>nothing here</body></html>").unwrap_err();
        assert!(matches!(err, SourceError::Malformed(ref m) if m.contains("dataObject")));
    }

    #[test]
    fn page_without_price_data_yields_no_record() {
        let page = r#"<html><script>var dataObject = {"plu": "X", "description": "Y"};</script></html>"#;
        let records = HtmlListing.parse(page).unwrap();
        assert!(records.is_empty());
    }
}
