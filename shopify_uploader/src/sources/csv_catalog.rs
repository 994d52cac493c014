use std::collections::HashMap;

use log::*;
use sup_common::Cents;

use crate::{
    error::SourceError,
    records::{ProductRecord, VariantRecord},
    sources::{ProductSource, SourceFormat},
};

/// Parses a comma-separated catalog with a header row. One row per variant; consecutive rows
/// sharing a SKU are folded into one product. Values must not contain commas.
///
/// Required columns: `sku`, `title`, `price`. Recognized optional columns: `compare_at_price`,
/// `vendor`, `product_type`, `tags` (`;`-separated), `variant`, `variant_sku`, `barcode`,
/// `quantity`, `images` (`;`-separated), `description`.
pub struct CsvCatalog;

const REQUIRED: [&str; 3] = ["sku", "title", "price"];

type Columns = HashMap<String, usize>;

impl ProductSource for CsvCatalog {
    fn format(&self) -> SourceFormat {
        SourceFormat::Csv
    }

    fn parse(&self, input: &str) -> Result<Vec<ProductRecord>, SourceError> {
        let mut lines = input.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());
        let (_, header) = lines
            .next()
            .ok_or_else(|| SourceError::Malformed("CSV catalog is empty".to_string()))?;
        let columns = parse_header(header)?;

        let mut records: Vec<ProductRecord> = vec![];
        for (line_no, line) in lines {
            let fields = line.split(',').map(str::trim).collect::<Vec<_>>();
            let sku = field(&columns, &fields, "sku");
            let title = field(&columns, &fields, "title");
            if sku.is_empty() && title.is_empty() {
                warn!("Skipping CSV row {}: no sku or title", line_no + 1);
                continue;
            }
            let price = match Cents::from_decimal_str(field(&columns, &fields, "price")) {
                Ok(p) => p,
                Err(e) => {
                    warn!("Skipping CSV row {} ({sku}): {e}", line_no + 1);
                    continue;
                },
            };
            let variant = variant_from_row(&columns, &fields, price);

            // Rows that continue the previous SKU only contribute a variant.
            if let Some(last) = records.last_mut() {
                if !sku.is_empty() && last.sku == sku {
                    if let Some(v) = variant {
                        last.variants.push(v);
                    }
                    continue;
                }
            }

            let compare_at_price = match field(&columns, &fields, "compare_at_price") {
                "" => None,
                p => match Cents::from_decimal_str(p) {
                    Ok(c) => Some(c),
                    Err(e) => {
                        warn!("Ignoring bad compare-at price on CSV row {} ({sku}): {e}", line_no + 1);
                        None
                    },
                },
            };
            records.push(ProductRecord {
                title: title.to_string(),
                description: field(&columns, &fields, "description").to_string(),
                vendor: field(&columns, &fields, "vendor").to_string(),
                product_type: field(&columns, &fields, "product_type").to_string(),
                tags: split_list(field(&columns, &fields, "tags")),
                sku: sku.to_string(),
                price,
                compare_at_price,
                variants: variant.into_iter().collect(),
                images: split_list(field(&columns, &fields, "images")),
            });
        }
        Ok(records)
    }
}

fn parse_header(header: &str) -> Result<Columns, SourceError> {
    let columns = header
        .split(',')
        .enumerate()
        .map(|(i, name)| (name.trim().to_ascii_lowercase(), i))
        .collect::<Columns>();
    for required in REQUIRED {
        if !columns.contains_key(required) {
            return Err(SourceError::Malformed(format!("CSV header is missing the '{required}' column")));
        }
    }
    Ok(columns)
}

fn field<'a>(columns: &Columns, fields: &[&'a str], name: &str) -> &'a str {
    columns.get(name).and_then(|&i| fields.get(i)).copied().unwrap_or("")
}

fn variant_from_row(columns: &Columns, fields: &[&str], row_price: Cents) -> Option<VariantRecord> {
    let name = field(columns, fields, "variant");
    if name.is_empty() {
        return None;
    }
    let quantity = field(columns, fields, "quantity").parse::<i64>().unwrap_or(0);
    let barcode = match field(columns, fields, "barcode") {
        "" => None,
        b => Some(b.to_string()),
    };
    Some(VariantRecord {
        name: name.to_string(),
        sku: field(columns, fields, "variant_sku").to_string(),
        barcode,
        quantity,
        price: Some(row_price),
    })
}

fn split_list(value: &str) -> Vec<String> {
    value.split(';').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    const CATALOG: &str = "\
sku,title,price,compare_at_price,vendor,product_type,tags,variant,variant_sku,barcode,quantity,images
JD-1001,Gazelle Bold Shoes,180.00,220.00,adidas Originals,Trainers,new;women,7,JD-1001-7,0001,1,https://cdn.example.com/gazelle.jpg
JD-1001,Gazelle Bold Shoes,180.00,220.00,adidas Originals,Trainers,new;women,8,JD-1001-8,0002,0,
JD-1002,Bad Row,free,,,,,,,,,
JD-1003,Samba OG Shoes,150,,adidas Originals,Trainers,,,,,,";

    #[test]
    fn folds_rows_into_products_and_skips_bad_rows() {
        let records = CsvCatalog.parse(CATALOG).unwrap();
        assert_eq!(records.len(), 2);
        let gazelle = &records[0];
        assert_eq!(gazelle.sku, "JD-1001");
        assert_eq!(gazelle.variants.len(), 2);
        assert_eq!(gazelle.variants[0].name, "7");
        assert_eq!(gazelle.variants[1].quantity, 0);
        assert_eq!(gazelle.tags, vec!["new", "women"]);
        assert_eq!(gazelle.compare_at_price, Some(Cents::from_units(220)));
        assert_eq!(records[1].sku, "JD-1003");
        assert!(records[1].variants.is_empty());
    }

    #[test]
    fn missing_required_column_is_fatal() {
        let err = CsvCatalog.parse("title,price\nA,1.00").unwrap_err();
        assert!(matches!(err, SourceError::Malformed(ref m) if m.contains("sku")));
    }

    #[test]
    fn empty_input_is_fatal() {
        assert!(matches!(CsvCatalog.parse("\n\n"), Err(SourceError::Malformed(_))));
    }
}
