// listings.rs
use crate::config::SiteSelectors;
use crate::scraper::models::{ListingSummary, MILEAGE_UNKNOWN};
use crate::scraper::ParseError;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

/// Parses one list page into per-container results.
pub struct ListingExtractor {
    listing: Selector,
    title_link: Selector,
    info_cell: Selector,
    image: Selector,
    price_class: String,
    date_class: String,
    mileage_marker: String,
    skip_leading: usize,
}

impl ListingExtractor {
    pub fn new(selectors: &SiteSelectors, skip_leading: usize) -> Result<Self, ParseError> {
        Ok(Self {
            listing: compile(&selectors.listing)?,
            title_link: compile(&selectors.title_link)?,
            info_cell: compile(&selectors.info_cell)?,
            image: compile(&selectors.image)?,
            price_class: selectors.price_class.clone(),
            date_class: selectors.date_class.clone(),
            mileage_marker: selectors.mileage_marker.clone(),
            skip_leading,
        })
    }

    /// One entry per listing container in document order, after dropping
    /// the first `skip_leading` containers (ad cards on some search views).
    pub fn extract_summaries(
        &self,
        body: &str,
        page_url: &Url,
    ) -> Vec<Result<ListingSummary, ParseError>> {
        let document = Html::parse_document(body);

        document
            .select(&self.listing)
            .skip(self.skip_leading)
            .map(|item| self.parse_item(item, page_url))
            .collect()
    }

    /// Well-formed summaries only; malformed containers are logged and dropped.
    pub fn summaries(&self, body: &str, page_url: &Url) -> Vec<ListingSummary> {
        self.extract_summaries(body, page_url)
            .into_iter()
            .enumerate()
            .filter_map(|(i, item)| match item {
                Ok(summary) => Some(summary),
                Err(e) => {
                    debug!("Skipping listing #{i} on {page_url}: {e}");
                    None
                }
            })
            .collect()
    }

    fn parse_item(&self, item: ElementRef, page_url: &Url) -> Result<ListingSummary, ParseError> {
        let link = item
            .select(&self.title_link)
            .next()
            .ok_or(ParseError::MissingField("name"))?;

        let name = non_empty(link.value().attr("title")).ok_or(ParseError::MissingField("name"))?;
        let href =
            non_empty(link.value().attr("href")).ok_or(ParseError::MissingField("permalink"))?;
        let permalink = resolve_url(page_url, href)?;

        let src = item
            .select(&self.image)
            .next()
            .and_then(|img| non_empty(img.value().attr("src")))
            .ok_or(ParseError::MissingField("image_url"))?;
        let image_url = resolve_url(page_url, src)?;

        let mut place = None;
        let mut price = None;
        let mut date_added = None;
        let mut mileage = None;

        for cell in item.select(&self.info_cell) {
            let text = element_text(cell);
            if text.is_empty() {
                continue;
            }

            let classes: Vec<&str> = cell.value().classes().collect();
            if classes.contains(&self.price_class.as_str()) {
                price.get_or_insert(text);
            } else if classes.contains(&self.date_class.as_str()) {
                date_added.get_or_insert(text);
            } else if is_mileage_reading(&text, &self.mileage_marker) {
                mileage.get_or_insert(text);
            } else {
                place.get_or_insert(text);
            }
        }

        Ok(ListingSummary {
            name: name.to_string(),
            permalink,
            image_url,
            place: place.ok_or(ParseError::MissingField("place"))?,
            price: price.ok_or(ParseError::MissingField("price"))?,
            mileage: mileage.unwrap_or_else(|| MILEAGE_UNKNOWN.to_string()),
            date_added: date_added.ok_or(ParseError::MissingField("date_added"))?,
        })
    }
}

pub fn compile(selector: &str) -> Result<Selector, ParseError> {
    Selector::parse(selector).map_err(|e| ParseError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Resolves relative and scheme-relative references against the page URL.
pub fn resolve_url(base: &Url, reference: &str) -> Result<String, ParseError> {
    base.join(reference)
        .map(String::from)
        .map_err(|e| ParseError::InvalidUrl {
            value: reference.to_string(),
            reason: e.to_string(),
        })
}

pub fn element_text(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// True for texts like `85000 km` or `1,20,000km`: a number directly
/// followed by the marker. Place names that merely contain the marker
/// letters (`Akmeemana`) do not qualify.
pub fn is_mileage_reading(text: &str, marker: &str) -> bool {
    let marker = marker.to_lowercase();
    let mut previous_numeric = false;

    for token in text.split_whitespace() {
        let token = token.to_lowercase();
        let token = token.trim_end_matches(['.', ',', ')']);
        if let Some(number) = token.strip_suffix(marker.as_str()) {
            if is_numeric(number) || (number.is_empty() && previous_numeric) {
                return true;
            }
        }
        previous_numeric = is_numeric(token);
    }
    false
}

fn is_numeric(token: &str) -> bool {
    token.chars().any(|c| c.is_ascii_digit())
        && token.chars().all(|c| c.is_ascii_digit() || c == ',' || c == '.')
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
