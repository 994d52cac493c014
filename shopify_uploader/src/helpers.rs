/// Derives the Shopify handle for a record: a slug of the title followed by the parent SKU,
/// so that re-runs of the same source land on the same handle. Deterministic for identical input.
pub fn product_handle(title: &str, sku: &str) -> String {
    [title, sku].iter().map(|part| slugify(part)).filter(|s| !s.is_empty()).collect::<Vec<_>>().join("-")
}

/// Lowercases and collapses every run of non-alphanumeric characters into a single dash.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut last_was_dash = true;
    for c in value.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_dash = false;
        } else if !last_was_dash {
            slug.push('-');
            last_was_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Drops the query string from an image URL. CDN links carry cache-busting parameters that make
/// otherwise-identical images look distinct to the API.
pub fn strip_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn handles_are_deterministic_slugs() {
        assert_eq!(product_handle("Gazelle Bold Shoes", "JD-1001"), "gazelle-bold-shoes-jd-1001");
        assert_eq!(product_handle("Gazelle Bold Shoes", "JD-1001"), product_handle("Gazelle Bold Shoes", "JD-1001"));
        assert_eq!(product_handle("  Éclair -- Tee  ", ""), "clair-tee");
        assert_eq!(product_handle("", ""), "");
    }

    #[test]
    fn slugify_collapses_punctuation_runs() {
        assert_eq!(slugify("A  B--C!!d"), "a-b-c-d");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn query_strings_are_stripped_from_image_urls() {
        assert_eq!(strip_query("https://cdn.example.com/a.jpg?v=123&w=800"), "https://cdn.example.com/a.jpg");
        assert_eq!(strip_query("https://cdn.example.com/a.jpg"), "https://cdn.example.com/a.jpg");
    }
}
