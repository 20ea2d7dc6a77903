// src/tests/scraper_tests/listings_tests.rs

use crate::config::SiteSelectors;
use crate::scraper::listings::{is_mileage_reading, ListingExtractor};
use crate::scraper::models::MILEAGE_UNKNOWN;
use crate::scraper::ParseError;
use crate::tests::utils::{item, items, link, list_page, page};
use url::Url;

fn extractor(skip: usize) -> ListingExtractor {
    ListingExtractor::new(&SiteSelectors::default(), skip).expect("default selectors compile")
}

fn page_url() -> Url {
    Url::parse(&page(1)).unwrap()
}

#[test]
fn extracts_every_field_in_document_order() {
    let html = list_page(&items(&["a1", "b2", "c3"]));

    let summaries = extractor(0).summaries(&html, &page_url());

    assert_eq!(summaries.len(), 3);
    let names: Vec<_> = summaries.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["Toyota Aqua a1", "Toyota Aqua b2", "Toyota Aqua c3"]);

    let first = &summaries[0];
    assert_eq!(first.permalink, link("a1"));
    assert_eq!(first.image_url, "https://img.cars.test/a1.jpg");
    assert_eq!(first.place, "Colombo");
    assert_eq!(first.price, "Rs. 7,250,000");
    assert_eq!(first.mileage, "85000 km");
    assert_eq!(first.date_added, "2024-06-01");
}

#[test]
fn skip_count_drops_leading_containers() {
    let slugs = ["ad1", "ad2", "ad3", "ad4", "car5", "car6"];
    let html = list_page(&items(&slugs));

    let summaries = extractor(4).summaries(&html, &page_url());

    let links: Vec<_> = summaries.iter().map(|s| s.permalink.clone()).collect();
    assert_eq!(links, [link("car5"), link("car6")]);
}

#[test]
fn skip_count_at_or_above_container_count_yields_nothing() {
    for n in [0, 3, 4] {
        let slugs: Vec<String> = (0..n).map(|i| format!("s{i}")).collect();
        let refs: Vec<&str> = slugs.iter().map(String::as_str).collect();
        let html = list_page(&items(&refs));

        assert!(
            extractor(4).extract_summaries(&html, &page_url()).is_empty(),
            "{n} containers with skip 4"
        );
    }
}

#[test]
fn missing_required_field_only_drops_that_container() {
    for field in ["title", "image", "place", "price", "date"] {
        let html = list_page(&[item("a", &[]), item("b", &[field]), item("c", &[])]);

        let results = extractor(0).extract_summaries(&html, &page_url());

        assert_eq!(results.len(), 3, "omitting {field}");
        assert!(results[0].is_ok());
        assert!(results[1].is_err(), "omitting {field} should fail");
        assert!(results[2].is_ok());

        let kept = extractor(0).summaries(&html, &page_url());
        let links: Vec<_> = kept.iter().map(|s| s.permalink.clone()).collect();
        assert_eq!(links, [link("a"), link("c")]);
    }
}

#[test]
fn missing_price_reports_the_field() {
    let html = list_page(&[item("a", &["price"])]);

    let results = extractor(0).extract_summaries(&html, &page_url());

    assert_eq!(results[0], Err(ParseError::MissingField("price")));
}

#[test]
fn missing_mileage_uses_sentinel() {
    let html = list_page(&[item("a", &["mileage"])]);

    let summaries = extractor(0).summaries(&html, &page_url());

    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].mileage, MILEAGE_UNKNOWN);
}

#[test]
fn place_containing_the_mileage_letters_is_still_the_place() {
    let html = list_page(&[item("a", &[]).replace(">Colombo<", ">Akmeemana<")]);

    let results = extractor(0).extract_summaries(&html, &page_url());

    let summary = results[0].as_ref().expect("all fields are present");
    assert_eq!(summary.place, "Akmeemana");
    assert_eq!(summary.mileage, "85000 km");
}

#[test]
fn mileage_needs_a_number_before_the_marker() {
    assert!(is_mileage_reading("85000 km", "km"));
    assert!(is_mileage_reading("1,20,000km", "km"));
    assert!(is_mileage_reading("Mileage: 42000 KM.", "km"));
    assert!(!is_mileage_reading("Akmeemana", "km"));
    assert!(!is_mileage_reading("km", "km"));
    assert!(!is_mileage_reading("Colombo", "km"));
}

#[test]
fn absolute_links_are_kept() {
    let html = list_page(&[item("a", &[]).replace(
        r#"<a href="/buy/a" title"#,
        r#"<a href="https://other.test/ad/a" title"#,
    )]);

    let summaries = extractor(0).summaries(&html, &page_url());

    assert_eq!(summaries[0].permalink, "https://other.test/ad/a");
}

#[test]
fn page_without_containers_is_empty() {
    let html = "<html><body><p>No results</p></body></html>";

    assert!(extractor(0).extract_summaries(html, &page_url()).is_empty());
}

#[test]
fn invalid_selector_is_rejected_up_front() {
    let selectors = SiteSelectors {
        listing: "li..item".to_string(),
        ..SiteSelectors::default()
    };

    let err = ListingExtractor::new(&selectors, 0).err().expect("selector must fail");

    assert!(matches!(err, ParseError::Selector { .. }));
}
