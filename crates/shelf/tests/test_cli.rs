use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

const PRODUCTS: &str = "\
Name,Brand,Original Price,Discounted Price,Discount Ratio (%),Total Ratings,First Image URL,Product URL,Kategori,ana_kategori,discount_ratio
Trail Runner,Acme,1200,899,25,4.6,https://img.example.com/1.jpg,https://shop.example.com/p/1,Shoes,Fashion,0.25
City Sneaker,Zeta,950,499,47,4.1,https://img.example.com/2.jpg,https://shop.example.com/p/2,Shoes,Fashion,0.47
Canvas Tote,Beta,300,210,30,,https://img.example.com/3.jpg,https://shop.example.com/p/3,Bags,Fashion,0.30
Leather Boot,acme,2100,1680,20,4.8,,https://shop.example.com/p/4,Shoes,Fashion,0.20
Frying Pan,Chef,400,300,25,4.0,https://img.example.com/5.jpg,https://shop.example.com/p/5,Pans,Home,0.25
";

fn products_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(PRODUCTS.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn shelf() -> Command {
    let mut cmd = Command::cargo_bin("shelf").unwrap();
    cmd.env("SHELF_DOTENV_PATH", "<NONE>")
        .env_remove("SHELF_LOG_LEVEL")
        .env_remove("SHELF_PAGE_SIZE")
        .env_remove("SHELF_CHUNK_SIZE");
    cmd
}

#[test]
fn test_view_filter_sort_page() {
    let file = products_file();
    shelf()
        .arg("view")
        .arg(file.path())
        .args(["--filter", "Kategori=Shoes", "--sort", "Discount Ratio (%)", "--desc"])
        .args(["--page-size", "2", "--page", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Leather Boot\tacme"))
        .stdout(predicate::str::contains("City Sneaker").not())
        .stdout(predicate::str::contains("Showing 1 of 3 rows (page 2 of 2)"));
}

#[test]
fn test_view_json() {
    let file = products_file();
    let output = shelf()
        .arg("view")
        .arg(file.path())
        .args(["--search", "ACME", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<_> = rows
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["Name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["Trail Runner", "Leather Boot"]);
}

#[test]
fn test_facets_ignore_own_column_filter() {
    let file = products_file();
    shelf()
        .arg("facets")
        .arg(file.path())
        .args(["--column", "Kategori", "--filter", "Kategori=Bags"])
        .args(["--filter", "ana_kategori=Fashion"])
        .assert()
        .success()
        .stdout("Shoes\nBags\n");
}

#[test]
fn test_facets_unknown_column() {
    let file = products_file();
    shelf()
        .arg("facets")
        .arg(file.path())
        .args(["--column", "Colour"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown column 'Colour'"));
}

#[test]
fn test_send_dry_run_skips_rows_without_image() {
    let file = products_file();
    shelf()
        .arg("send")
        .arg(file.path())
        .args(["--filter", "Kategori=Shoes", "--select-page", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "photo: https://img.example.com/1.jpg\n<b>Trail Runner</b>",
        ))
        .stdout(predicate::str::contains("skip: Leather Boot has no image"));
}

#[test]
fn test_send_requires_selection() {
    let file = products_file();
    shelf()
        .arg("send")
        .arg(file.path())
        .arg("--dry-run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no rows selected"));
}

#[test]
fn test_send_without_credentials_fails() {
    let file = products_file();
    shelf()
        .env_remove("SHELF_TELEGRAM_BOT_TOKEN")
        .env_remove("SHELF_TELEGRAM_CHAT_ID")
        .arg("send")
        .arg(file.path())
        .args(["--rows", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("SHELF_TELEGRAM_BOT_TOKEN"));
}

#[test]
fn test_catalog_products_with_params() {
    let file = products_file();
    let output = shelf()
        .arg("catalog")
        .arg(file.path())
        .arg("products")
        .args(["--param", "anaKategori=Fashion", "--param", "discountRatio_gt=0.2"])
        .args(["--param", "discountRatio_lt=oops"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let products: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<_> = products
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["Name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["City Sneaker", "Canvas Tote", "Trail Runner"]);
}

#[test]
fn test_catalog_brands() {
    let file = products_file();
    shelf()
        .arg("catalog")
        .arg(file.path())
        .arg("brands")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"acme\",\n  \"Acme\",\n  \"Beta\""));
}
