// End-to-end pipeline tests that run without a browser: filter → search URL,
// captured detail HTML → parsed fields, parsed records → store → CSV export.

use jobscout::engine::extract::{parse_detail_html, DetailFields};
use jobscout::engine::query::search_url;
use jobscout::engine::selectors;
use jobscout::records::{to_csv, RecordStore, StoredJob};
use jobscout::types::{JobFilter, JobListing};
use url::Url;

fn init_logger() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_test_writer()
        .try_init();
}

fn full_filter() -> JobFilter {
    JobFilter {
        keywords: "rust developer".to_string(),
        location: Some("Berlin".to_string()),
        date_posted: Some("1w".to_string()),
        experience_level: Some("mid".to_string()),
        job_type: Some("full-time".to_string()),
        remote: true,
        salary_min: Some("100000".to_string()),
        max_jobs: 10,
    }
}

#[test]
fn search_url_carries_every_set_filter() {
    init_logger();
    let base = Url::parse("https://www.linkedin.com/jobs/search").unwrap();
    let url = search_url(&base, &full_filter());

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    assert!(pairs.contains(&("keywords".into(), "rust developer".into())));
    assert!(pairs.contains(&("location".into(), "Berlin".into())));
    assert!(pairs.contains(&("f_TPR".into(), "r604800".into())));
    assert!(pairs.contains(&("f_E".into(), "4".into())));
    assert!(pairs.contains(&("f_JT".into(), "F".into())));
    assert!(pairs.contains(&("f_WT".into(), "2".into())));
    assert!(pairs.contains(&("f_SB2".into(), "100000".into())));
}

#[test]
fn detail_html_flows_into_csv_export() {
    init_logger();

    let html = r#"
        <html><body>
          <div class="show-more-less-html__markup">
            We build infrastructure in Rust. Reach out at hiring@example.com
            or talent@example.com for details. hiring@example.com again.
          </div>
          <div class="salary compensation__salary">$140,000 - $180,000</div>
        </body></html>
    "#;

    let fields: DetailFields =
        parse_detail_html(html, &selectors::V1).expect("fixture has a description node");
    assert!(fields.description.contains("infrastructure in Rust"));
    assert_eq!(fields.salary, "$140,000 - $180,000");
    // First-seen order, duplicates dropped.
    assert_eq!(
        fields.emails,
        vec!["hiring@example.com".to_string(), "talent@example.com".to_string()]
    );

    let listing = JobListing {
        title: "Senior Rust Engineer".to_string(),
        company: "Example, GmbH".to_string(),
        location: "Berlin, Germany".to_string(),
        url: "https://www.linkedin.com/jobs/view/12345".to_string(),
        posted_date: "2026-08-20".to_string(),
        description: fields.description,
        salary: fields.salary,
        emails: fields.emails,
    };

    let store = RecordStore::new();
    store.insert_many(vec![StoredJob::from_listing(listing)]);
    assert_eq!(store.len(), 1);

    let csv = to_csv(&store.all());
    let mut lines = csv.lines();
    let header = lines.next().unwrap();
    assert!(header.starts_with("title,company,location"));
    let row = lines.next().expect("one exported row");
    assert!(row.contains("Senior Rust Engineer"));
    assert!(row.contains("\"Example, GmbH\""));
    assert!(row.contains("\"hiring@example.com, talent@example.com\""));

    assert_eq!(store.clear(), 1);
    assert!(to_csv(&store.all()).lines().count() == 1);
}

#[test]
fn degraded_detail_still_yields_a_record() {
    init_logger();

    // No description node anywhere: the detail pass must degrade to
    // placeholders rather than drop the record.
    let html = "<html><body><p>nothing useful</p></body></html>";
    let degraded = parse_detail_html(html, &selectors::V1).unwrap_err();
    let fields = degraded.into_placeholders();
    assert_eq!(fields.description, "N/A");
    assert_eq!(fields.salary, "N/A");
    assert!(fields.emails.is_empty());
}

#[test]
fn minimal_filter_produces_minimal_query() {
    let base = Url::parse("https://www.linkedin.com/jobs/search").unwrap();
    let filter = JobFilter {
        keywords: "devops".to_string(),
        location: None,
        date_posted: None,
        experience_level: None,
        job_type: None,
        remote: false,
        salary_min: None,
        max_jobs: 50,
    };
    let url = search_url(&base, &filter);
    let keys: Vec<String> = url.query_pairs().map(|(k, _)| k.to_string()).collect();
    assert_eq!(keys, vec!["keywords".to_string()]);
}
