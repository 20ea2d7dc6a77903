// src/tests/scraper_tests/details_tests.rs

use crate::config::SiteSelectors;
use crate::scraper::details::{DetailExtractor, DetailRow};
use crate::tests::utils::{detail_page, link, standard_detail, FixtureFetcher};

fn extractor() -> DetailExtractor {
    DetailExtractor::new(&SiteSelectors::default()).expect("default selectors compile")
}

#[test]
fn two_and_four_cell_rows_are_both_read() {
    let html = detail_page(
        r#"
        <tr><td>Make</td><td>Honda</td><td>Model</td><td>Fit</td></tr>
        <tr><td>Contact</td><td>071 000 0000</td></tr>
        <tr><td>Gear</td><td>Manual</td><td>Fuel Type</td><td>Petrol</td></tr>
        <tr><td>Details</td><td>Mint condition</td></tr>
        "#,
    );

    let detail = extractor().parse_details(&html);

    assert_eq!(detail.len(), 6);
    assert_eq!(detail["Make"], "Honda");
    assert_eq!(detail["Model"], "Fit");
    assert_eq!(detail["Contact"], "071 000 0000");
    assert_eq!(detail["Gear"], "Manual");
    assert_eq!(detail["Fuel Type"], "Petrol");
    assert_eq!(detail["Details"], "Mint condition");
}

#[test]
fn rows_of_other_shapes_contribute_nothing() {
    let html = detail_page(
        r#"
        <tr><td>Make</td><td>Honda</td></tr>
        <tr><td>Odd</td><td>row</td><td>here</td></tr>
        <tr><td colspan="4">Banner</td></tr>
        <tr><td>a</td><td>b</td><td>c</td><td>d</td><td>e</td></tr>
        "#,
    );

    let detail = extractor().parse_details(&html);

    assert_eq!(detail.len(), 1);
    assert_eq!(detail["Make"], "Honda");
}

#[test]
fn later_keys_overwrite_earlier_ones() {
    let html = detail_page(
        r#"
        <tr><td>Price</td><td>Rs. 1</td></tr>
        <tr><td>Make</td><td>Nissan</td><td>Price</td><td>Rs. 2</td></tr>
        "#,
    );

    let detail = extractor().parse_details(&html);

    assert_eq!(detail["Price"], "Rs. 2");
}

#[test]
fn nested_markup_is_flattened_and_trimmed() {
    let detail = extractor().parse_details(&standard_detail());

    assert_eq!(detail["Contact"], "077 123 4567");
    assert_eq!(detail["Details"], "Well maintained, first owner");
}

#[test]
fn page_without_table_gives_empty_mapping() {
    let html = "<html><body><p>Listing removed</p></body></html>";

    assert!(extractor().parse_details(html).is_empty());
}

#[test]
fn fetch_failure_gives_empty_mapping() {
    let fetcher = FixtureFetcher::new().with_status(link("gone"), 500);

    let detail = extractor().extract_details(&fetcher, &link("gone"));

    assert!(detail.is_empty());
    assert_eq!(fetcher.count(&link("gone")), 1);
}

#[test]
fn classify_by_cell_count() {
    let cells = |n: usize| (0..n).map(|i| i.to_string()).collect::<Vec<_>>();

    assert_eq!(
        DetailRow::classify(cells(2)),
        DetailRow::KeyValue("0".into(), "1".into())
    );
    assert_eq!(
        DetailRow::classify(cells(4)),
        DetailRow::DoubleKeyValue("0".into(), "1".into(), "2".into(), "3".into())
    );
    for n in [0, 1, 3, 5] {
        assert_eq!(DetailRow::classify(cells(n)), DetailRow::Unknown);
    }
}
