use std::fmt::Write as _;

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::store::Row;

/// Which CSV columns feed each field of a [`ProductRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct ColumnMapping {
    #[builder(into, default = "Name".to_string())]
    pub name: String,
    #[builder(into, default = "Brand".to_string())]
    pub brand: String,
    #[builder(into, default = "Original Price".to_string())]
    pub original_price: String,
    #[builder(into, default = "Discounted Price".to_string())]
    pub discounted_price: String,
    #[builder(into, default = "Discount Ratio (%)".to_string())]
    pub discount_percent: String,
    #[builder(into, default = "Total Ratings".to_string())]
    pub rating: String,
    #[builder(into, default = "First Image URL".to_string())]
    pub image_url: String,
    #[builder(into, default = "Product URL".to_string())]
    pub url: String,
    #[builder(into, default = "Kategori".to_string())]
    pub category: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A product as forwarded to the messaging sink.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductRecord {
    pub name: String,
    pub brand: String,
    pub original_price: Option<String>,
    pub discounted_price: String,
    pub discount_percent: String,
    pub rating: Option<String>,
    pub image_url: Option<String>,
    pub url: String,
    pub category: String,
}

impl ProductRecord {
    /// Missing required cells become empty strings; missing or empty optional
    /// cells become `None`.
    pub fn from_row(row: &Row, mapping: &ColumnMapping) -> Self {
        let text = |column: &str| row.get(column).unwrap_or_default().to_string();
        let optional = |column: &str| {
            row.get(column)
                .filter(|v| !v.trim().is_empty())
                .map(str::to_string)
        };

        Self {
            name: text(&mapping.name),
            brand: text(&mapping.brand),
            original_price: optional(&mapping.original_price),
            discounted_price: text(&mapping.discounted_price),
            discount_percent: text(&mapping.discount_percent),
            rating: optional(&mapping.rating),
            image_url: optional(&mapping.image_url),
            url: text(&mapping.url),
            category: text(&mapping.category),
        }
    }

    /// The photo to post, if the record has one.
    pub fn photo(&self) -> Option<&str> {
        self.image_url.as_deref().filter(|u| !u.trim().is_empty())
    }

    /// HTML caption: the name in bold, then one labelled line per field.
    /// Optional fields that are absent are left out.
    pub fn caption(&self) -> String {
        let mut out = format!("<b>{}</b>", escape_html(&self.name));
        let mut line = |label: &str, value: &str| {
            let _ = write!(out, "\n{label}: {}", escape_html(value));
        };

        line("Brand", &self.brand);
        if let Some(price) = &self.original_price {
            line("Original Price", price);
        }
        line("Discounted Price", &self.discounted_price);
        line("Discount Percent", &self.discount_percent);
        if let Some(rating) = &self.rating {
            line("Rating", rating);
        }
        line("Category", &self.category);
        line("URL", &self.url);
        out
    }
}

/// Escape the characters Telegram's HTML parse mode treats as markup.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
