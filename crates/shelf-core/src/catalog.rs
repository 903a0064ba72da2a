//! Product listing queries: distinct filter values per dimension and a capped
//! product list ordered by discount ratio.
//!
//! [`Catalog`] is the contract a listing backend fulfils; [`MemoryCatalog`]
//! answers it from rows held in memory. Query parameters are forgiving: blank
//! or malformed values are dropped rather than rejected.

use std::{cmp::Ordering, collections::HashSet, io};

use bon::Builder;
use rayon::slice::ParallelSliceMut;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    ingest::{CsvChunks, DEFAULT_CHUNK_SIZE},
    query::compare_cells,
    store::{Row, RowStore},
};

/// Upper bound on rows returned by [`Catalog::products`].
pub const PRODUCT_LIMIT: usize = 1_000;

/// Optional equality and range constraints of a listing query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Builder)]
pub struct CatalogQuery {
    #[builder(into)]
    pub primary_category: Option<String>,
    #[builder(into)]
    pub sub_category: Option<String>,
    #[builder(into)]
    pub category: Option<String>,
    /// Accepted from request parameters but not applied: no listing narrows
    /// by brand.
    #[builder(into)]
    pub brand: Option<String>,
    /// Keep products whose discount ratio is strictly below this.
    pub discount_ratio_lt: Option<f64>,
    /// Keep products whose discount ratio is strictly above this.
    pub discount_ratio_gt: Option<f64>,
}

impl CatalogQuery {
    /// Build a query from request-style key/value pairs. Unknown keys, blank
    /// values and unparsable numbers are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut query = CatalogQuery::default();
        for (key, value) in pairs {
            let value = value.as_ref().trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "primary_category" | "ana_kategori" | "anaKategori" => {
                    query.primary_category = Some(value.to_string())
                }
                "sub_category" | "alt_kategori" | "altKategori" => {
                    query.sub_category = Some(value.to_string())
                }
                "category" | "kategori" => query.category = Some(value.to_string()),
                "brand" => query.brand = Some(value.to_string()),
                "discount_ratio_lt" | "discountRatio_lt" => {
                    query.discount_ratio_lt = parse_finite(value).or(query.discount_ratio_lt)
                }
                "discount_ratio_gt" | "discountRatio_gt" => {
                    query.discount_ratio_gt = parse_finite(value).or(query.discount_ratio_gt)
                }
                other => tracing::debug!(key = other, "ignoring unknown catalog parameter"),
            }
        }
        query
    }
}

fn parse_finite(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Read-only listing operations over a product table.
pub trait Catalog {
    /// Every distinct primary category.
    fn primary_categories(&self) -> Result<Vec<String>>;

    /// Distinct sub-categories, narrowed by `primary_category`.
    fn sub_categories(&self, query: &CatalogQuery) -> Result<Vec<String>>;

    /// Distinct categories, narrowed by `primary_category` and `sub_category`.
    fn categories(&self, query: &CatalogQuery) -> Result<Vec<String>>;

    /// Distinct brands in ascending order, narrowed by `primary_category`,
    /// `sub_category` and `category`.
    fn brands(&self, query: &CatalogQuery) -> Result<Vec<String>>;

    /// Products narrowed by `primary_category` and the discount ratio
    /// bounds, highest discount ratio first, at most [`PRODUCT_LIMIT`] rows.
    fn products(&self, query: &CatalogQuery) -> Result<Vec<Row>>;
}

/// Column names of the product table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct CatalogColumns {
    #[builder(into, default = "ana_kategori".to_string())]
    pub primary_category: String,
    #[builder(into, default = "alt_kategori".to_string())]
    pub sub_category: String,
    #[builder(into, default = "kategori".to_string())]
    pub category: String,
    #[builder(into, default = "brand".to_string())]
    pub brand: String,
    #[builder(into, default = "discount_ratio".to_string())]
    pub discount_ratio: String,
}

impl Default for CatalogColumns {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// [`Catalog`] over rows kept in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    rows: Vec<Row>,
    columns: CatalogColumns,
}

impl MemoryCatalog {
    pub fn new(rows: Vec<Row>, columns: CatalogColumns) -> Self {
        Self { rows, columns }
    }

    pub fn from_store(store: &RowStore, columns: CatalogColumns) -> Self {
        Self::new(store.rows().to_vec(), columns)
    }

    /// Load the product table from CSV. Unlike a dashboard load, a decode
    /// error here fails the whole catalog.
    pub fn from_reader<R: io::Read>(rdr: R, columns: CatalogColumns) -> Result<Self> {
        let mut rows = Vec::new();
        for chunk in CsvChunks::new(rdr, DEFAULT_CHUNK_SIZE) {
            let chunk = chunk.map_err(|e| Error::Backend(format!("loading products: {e}")))?;
            rows.extend(chunk.rows);
        }
        tracing::info!(rows = rows.len(), "catalog loaded");
        Ok(Self::new(rows, columns))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn discount_ratio(&self, row: &Row) -> Option<f64> {
        row.get(&self.columns.discount_ratio)
            .and_then(|v| parse_finite(v.trim()))
    }

    /// Distinct non-empty values of `column` over rows matching every
    /// `(column, value)` constraint, in first-seen order.
    fn distinct(&self, column: &str, constraints: &[(&str, Option<&str>)]) -> Vec<String> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter(|row| {
                constraints.iter().all(|(c, wanted)| match wanted {
                    Some(wanted) => row.get(c) == Some(*wanted),
                    None => true,
                })
            })
            .filter_map(|row| row.get(column))
            .filter(|v| !v.is_empty())
            .filter(|v| seen.insert(*v))
            .map(str::to_string)
            .collect()
    }
}

impl Catalog for MemoryCatalog {
    fn primary_categories(&self) -> Result<Vec<String>> {
        Ok(self.distinct(&self.columns.primary_category, &[]))
    }

    fn sub_categories(&self, query: &CatalogQuery) -> Result<Vec<String>> {
        Ok(self.distinct(
            &self.columns.sub_category,
            &[(&self.columns.primary_category, query.primary_category.as_deref())],
        ))
    }

    fn categories(&self, query: &CatalogQuery) -> Result<Vec<String>> {
        Ok(self.distinct(
            &self.columns.category,
            &[
                (&self.columns.primary_category, query.primary_category.as_deref()),
                (&self.columns.sub_category, query.sub_category.as_deref()),
            ],
        ))
    }

    fn brands(&self, query: &CatalogQuery) -> Result<Vec<String>> {
        let mut brands = self.distinct(
            &self.columns.brand,
            &[
                (&self.columns.primary_category, query.primary_category.as_deref()),
                (&self.columns.sub_category, query.sub_category.as_deref()),
                (&self.columns.category, query.category.as_deref()),
            ],
        );
        // mixed numeric and text keys are not a total order
        brands.par_sort_by(|a, b| compare_cells(a, b));
        Ok(brands)
    }

    fn products(&self, query: &CatalogQuery) -> Result<Vec<Row>> {
        let primary = query.primary_category.as_deref();
        let mut hits: Vec<(Option<f64>, &Row)> = self
            .rows
            .iter()
            .filter(|row| {
                primary.is_none_or(|p| row.get(&self.columns.primary_category) == Some(p))
            })
            .map(|row| (self.discount_ratio(row), row))
            .filter(|(ratio, _)| match (query.discount_ratio_lt, ratio) {
                (Some(lt), Some(r)) => *r < lt,
                (Some(_), None) => false,
                (None, _) => true,
            })
            .filter(|(ratio, _)| match (query.discount_ratio_gt, ratio) {
                (Some(gt), Some(r)) => *r > gt,
                (Some(_), None) => false,
                (None, _) => true,
            })
            .collect();

        // descending, rows without a ratio first (NULLS FIRST)
        hits.sort_by(|(a, _), (b, _)| match (a, b) {
            (Some(a), Some(b)) => b.partial_cmp(a).unwrap_or(Ordering::Equal),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });

        Ok(hits
            .into_iter()
            .take(PRODUCT_LIMIT)
            .map(|(_, row)| row.clone())
            .collect())
    }
}
