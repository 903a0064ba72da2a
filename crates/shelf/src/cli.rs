use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "shelf", about = "Browse, facet and forward CSV product rows", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Load, search, filter, sort and page a CSV file.
#[derive(Args, Debug, Clone)]
pub struct ViewArgs {
    /// CSV file to load
    pub input: PathBuf,

    /// Case-insensitive text that some cell of a row must contain
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Keep rows whose COL is one of the listed values (repeatable)
    #[arg(long = "filter", short = 'f', value_name = "COL=V1,V2")]
    pub filters: Vec<String>,

    /// Column to sort by
    #[arg(long)]
    pub sort: Option<String>,

    /// Sort descending
    #[arg(long, requires = "sort")]
    pub desc: bool,

    /// 1-based page number
    #[arg(long, default_value_t = 1)]
    pub page: usize,

    #[arg(long, env = "SHELF_PAGE_SIZE")]
    pub page_size: Option<usize>,

    /// Rows per ingested chunk
    #[arg(long, env = "SHELF_CHUNK_SIZE")]
    pub chunk_size: Option<usize>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print one page of the view
    View {
        #[command(flatten)]
        view: ViewArgs,

        /// Print the page as a JSON array instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List the values a column can take under the other filters
    Facets {
        #[command(flatten)]
        view: ViewArgs,

        /// Column to list
        #[arg(long, short = 'c')]
        column: String,
    },

    /// Forward selected rows to the Telegram chat as photo posts
    Send {
        #[command(flatten)]
        view: ViewArgs,

        /// 0-based view indices to send
        #[arg(long, value_delimiter = ',', conflicts_with = "select_page")]
        rows: Vec<usize>,

        /// Send every row of the current page
        #[arg(long)]
        select_page: bool,

        /// Print the captions instead of sending
        #[arg(long)]
        dry_run: bool,
    },

    /// Query a product table the way the listing API does
    Catalog {
        /// Products CSV file
        input: PathBuf,

        #[arg(value_enum)]
        query: CatalogCommand,

        /// Query parameter, e.g. ana_kategori=Moda (repeatable)
        #[arg(long = "param", short = 'p', value_name = "KEY=VALUE")]
        params: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CatalogCommand {
    PrimaryCategories,
    SubCategories,
    Categories,
    Brands,
    Products,
}
