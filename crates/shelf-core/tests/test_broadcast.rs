use std::{
    sync::Mutex,
    time::{Duration, Instant},
};

use shelf_core::{
    Dashboard, Error, Result,
    sink::{ColumnMapping, PhotoPost, PhotoSender, ProductRecord, broadcast},
};

/// Records every post and fails the ones whose caption mentions `fail_on`.
#[derive(Default)]
struct RecordingSender {
    posts: Mutex<Vec<(PhotoPost, Instant)>>,
    fail_on: Option<&'static str>,
}

impl PhotoSender for RecordingSender {
    async fn send_photo(&self, post: &PhotoPost) -> Result<i64> {
        let mut posts = self.posts.lock().unwrap();
        posts.push((post.clone(), Instant::now()));
        match self.fail_on {
            Some(needle) if post.caption.contains(needle) => {
                Err(Error::Telegram("Bad Request: wrong file identifier".to_string()))
            }
            _ => Ok(posts.len() as i64),
        }
    }
}

fn record(name: &str, image: Option<&str>) -> ProductRecord {
    ProductRecord {
        name: name.to_string(),
        brand: "Acme".to_string(),
        discounted_price: "10".to_string(),
        discount_percent: "50".to_string(),
        image_url: image.map(str::to_string),
        url: format!("https://shop.example.com/{name}"),
        category: "Shoes".to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_records_without_image_are_skipped() {
    let sender = RecordingSender::default();
    let records = vec![
        record("one", Some("https://img.example.com/1.jpg")),
        record("two", None),
        record("three", Some("  ")),
        record("four", Some("https://img.example.com/4.jpg")),
    ];

    let report = broadcast(&sender, &records, Duration::ZERO).await;

    assert!(report.is_success());
    assert_eq!(report.skipped, ["two", "three"]);
    let sent: Vec<_> = report.sent.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(sent, ["one", "four"]);
    assert_eq!(sender.posts.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_failure_does_not_stop_the_batch() {
    let sender = RecordingSender {
        fail_on: Some("<b>two</b>"),
        ..Default::default()
    };
    let records = vec![
        record("one", Some("https://img.example.com/1.jpg")),
        record("two", Some("https://img.example.com/2.jpg")),
        record("three", Some("https://img.example.com/3.jpg")),
    ];

    let report = broadcast(&sender, &records, Duration::ZERO).await;

    assert!(!report.is_success());
    assert_eq!(report.attempted(), 3);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].name, "two");
    assert!(report.failed[0].reason.contains("wrong file identifier"));
    assert_eq!(report.sent.last().map(|s| s.message_id), Some(3));
}

#[tokio::test]
async fn test_requests_are_spaced_by_delay() {
    let sender = RecordingSender::default();
    let records = vec![
        record("one", Some("https://img.example.com/1.jpg")),
        record("two", Some("https://img.example.com/2.jpg")),
        record("three", Some("https://img.example.com/3.jpg")),
    ];
    let delay = Duration::from_millis(20);

    let started = Instant::now();
    broadcast(&sender, &records, delay).await;

    let posts = sender.posts.lock().unwrap();
    assert!(posts[0].1.duration_since(started) < delay);
    for pair in posts.windows(2) {
        assert!(pair[1].1.duration_since(pair[0].1) >= delay);
    }
}

#[tokio::test]
async fn test_dashboard_selection_to_broadcast() -> anyhow::Result<()> {
    let path = format!("{}/tests/data/products.csv", env!("CARGO_MANIFEST_DIR"));
    let mut dashboard = Dashboard::default();
    dashboard.load_path(path).await?;
    dashboard.add_filter("Kategori", ["Shoes"]);
    dashboard.toggle_page();

    let records = dashboard.selected_records(&ColumnMapping::default());
    assert_eq!(records.len(), 3);

    let sender = RecordingSender::default();
    let report = broadcast(&sender, &records, Duration::ZERO).await;
    assert_eq!(report.skipped, ["Leather Boot"]);

    let posts = sender.posts.lock().unwrap();
    assert_eq!(posts[0].0.photo, "https://img.example.com/1.jpg");
    assert!(posts[0].0.caption.starts_with("<b>Trail Runner</b>\nBrand: Acme\n"));
    assert!(posts[0].0.caption.contains("\nRating: 4.6\n"));
    Ok(())
}
