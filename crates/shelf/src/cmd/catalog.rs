use std::{fs::File, io, path::Path};

use anyhow::Context;
use shelf_core::{Catalog, CatalogColumns, CatalogQuery, MemoryCatalog};

use crate::{cli::CatalogCommand, util::parse_param};

pub fn run(input: &Path, command: CatalogCommand, params: &[String]) -> anyhow::Result<()> {
    let pairs = params
        .iter()
        .map(|p| parse_param(p))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let query = CatalogQuery::from_pairs(pairs);

    let file = File::open(input).with_context(|| format!("opening {}", input.display()))?;
    let catalog = MemoryCatalog::from_reader(file, CatalogColumns::default())?;

    let value = match command {
        CatalogCommand::PrimaryCategories => serde_json::to_value(catalog.primary_categories()?)?,
        CatalogCommand::SubCategories => serde_json::to_value(catalog.sub_categories(&query)?)?,
        CatalogCommand::Categories => serde_json::to_value(catalog.categories(&query)?)?,
        CatalogCommand::Brands => serde_json::to_value(catalog.brands(&query)?)?,
        CatalogCommand::Products => serde_json::to_value(catalog.products(&query)?)?,
    };
    serde_json::to_writer_pretty(io::stdout().lock(), &value)?;
    println!();
    Ok(())
}
