use super::{ImageStore, ListingItem, ProductRecord};
use crate::error::ScraperError;
use crate::fetch::Fetcher;
use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::time::Duration;
use tokio::time;
use tracing::{debug, info, warn};

const E: &str = "Invalid selector";
lazy_static! {
    static ref ITEM_BLOCK: Selector = Selector::parse(".cl-item-block").expect(E);
    static ref ITEM_NAME_LINK: Selector = Selector::parse(".link-line").expect(E);
    static ref ITEM_CODE: Selector = Selector::parse(".cl-item-article").expect(E);
    static ref ITEM_IMAGE: Selector = Selector::parse("img").expect(E);
    static ref PROPERTY_ROW: Selector = Selector::parse(".property").expect(E);
    static ref PROPERTY_NAME: Selector = Selector::parse(".property__name").expect(E);
    static ref PROPERTY_VALUE: Selector = Selector::parse(".property__val").expect(E);
}

lazy_static! {
    /// Detail-page labels that map onto canonical record keys. Rows with any
    /// other label end up in `additional_properties`.
    static ref GENERAL_PROPERTY_KEYS: HashMap<&'static str, &'static str> = HashMap::from([
        ("Код", "code"),
        ("Применяемость", "applicability"),
        ("Производитель", "manufacturer"),
        ("Вес", "weight"),
        ("Емкость", "capacity"),
        ("Пусковой ток", "inrush_current"),
        ("Полярность", "polarity"),
        ("Тип корпуса", "housing"),
        ("Тип клемм", "cleat_type"),
        ("Напряжение", "voltage"),
        ("Типоразмер", "size_type"),
        ("Крепление", "holder"),
        ("Технология", "technology"),
        ("Классификация АКБ", "type"),
        ("Длина", "length"),
        ("Ширина", "width"),
        ("Высота", "height"),
    ]);
}

// Length of the "Артикул:" label that prefixes the code element's text.
const CODE_PREFIX_LEN: usize = 8;

const DEFAULT_IMAGE_DIR: &str = "images";

// Pause between items; in seconds.
const DETAIL_PAUSE: Duration = Duration::from_secs(2);

type PropertyMaps = (BTreeMap<String, String>, BTreeMap<String, String>);

/// Walks the catalog listing and one detail page per item, producing one
/// [`ProductRecord`] per item block.
pub struct CatalogExtractor<F> {
    fetcher: F,
    base_url: String,
    listing_path: String,
    images: Option<ImageStore>,
    detail_pause: Duration,
}

impl<F: Fetcher> CatalogExtractor<F> {
    /// `images_dir` of `None` selects the default `images` directory. When
    /// the directory cannot be created the run continues without image
    /// persistence and records keep their remote image URLs.
    pub fn new(
        fetcher: F,
        base_url: &str,
        listing_path: &str,
        images_dir: Option<PathBuf>,
    ) -> CatalogExtractor<F> {
        let images =
            ImageStore::create(images_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_IMAGE_DIR)));

        CatalogExtractor {
            fetcher,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            listing_path: listing_path.trim_start_matches('/').to_string(),
            images,
            detail_pause: DETAIL_PAUSE,
        }
    }

    pub fn with_detail_pause(mut self, pause: Duration) -> CatalogExtractor<F> {
        self.detail_pause = pause;
        self
    }

    /// Runs the whole pipeline: the listing page first, then one detail page
    /// (and optionally one image download) per item, pausing between items.
    /// Only a listing failure ends the run; everything below that scope is
    /// logged and the scrape moves on to the next item.
    pub async fn scrape(&self) -> Result<Vec<ProductRecord>, ScraperError> {
        let listing_url = format!("{}/{}", self.base_url, self.listing_path);
        debug!("Visit {}", listing_url);
        let body = self
            .fetcher
            .fetch_text(&listing_url)
            .await
            .map_err(|source| ScraperError::ListingRetrieval {
                url: listing_url,
                source,
            })?;

        let items = {
            let doc = Html::parse_document(&body);
            parse_listing(&doc, &self.base_url)
        };
        info!("Found {} item blocks on the listing page", items.len());

        let total = items.len();
        let mut records = Vec::with_capacity(total);
        for (i, item) in items.into_iter().enumerate() {
            let record = self.build_record(item).await;
            info!("[{}/{}] Extracted {} ({})", i + 1, total, record.code, record.name);
            records.push(record);
            time::sleep(self.detail_pause).await;
        }

        Ok(records)
    }

    async fn build_record(&self, item: ListingItem) -> ProductRecord {
        let img = self.store_image(&item).await;

        let (general, additional) = match item.detail_url.as_deref() {
            Some(url) => match self.fetch_properties(url).await {
                Ok(maps) => maps,
                Err(err) => {
                    warn!("{}", err);
                    (BTreeMap::new(), BTreeMap::new())
                }
            },
            None => {
                warn!("Item {} has no detail link, properties left empty", item.code);
                (BTreeMap::new(), BTreeMap::new())
            }
        };

        ProductRecord::assemble(item.name, item.code, img, general, &additional)
    }

    /// Local path when the image could be fetched and written, the remote
    /// URL otherwise.
    async fn store_image(&self, item: &ListingItem) -> String {
        let Some(store) = &self.images else {
            return item.image_url.clone();
        };
        match self.save_image(store, item).await {
            Ok(path) => path.display().to_string(),
            Err(err) => {
                warn!("{}; keeping remote URL", err);
                item.image_url.clone()
            }
        }
    }

    async fn save_image(
        &self,
        store: &ImageStore,
        item: &ListingItem,
    ) -> Result<PathBuf, ScraperError> {
        let bytes = self
            .fetcher
            .fetch_bytes(&item.image_url)
            .await
            .map_err(|source| ScraperError::ImageFetch {
                url: item.image_url.clone(),
                source,
            })?;
        store.save(&item.image_url, &item.code_text, &bytes).await
    }

    async fn fetch_properties(&self, url: &str) -> Result<PropertyMaps, ScraperError> {
        debug!("Visit {}", url);
        let body = self
            .fetcher
            .fetch_text(url)
            .await
            .map_err(|source| ScraperError::DetailRetrieval {
                url: url.to_string(),
                source,
            })?;
        let doc = Html::parse_document(&body);
        Ok(classify_properties(&doc))
    }
}

fn parse_listing(doc: &Html, base_url: &str) -> Vec<ListingItem> {
    doc.select(&ITEM_BLOCK)
        .map(|block| parse_item_block(block, base_url))
        .collect()
}

fn parse_item_block(block: ElementRef, base_url: &str) -> ListingItem {
    let code_element = block.select(&ITEM_CODE).next();
    let code_text = code_element.map(element_text).unwrap_or_default();
    let code = match code_element {
        Some(_) => {
            let rest: String = code_text.chars().skip(CODE_PREFIX_LEN).collect();
            rest.trim().to_string()
        }
        None => "0".to_string(),
    };

    let src = block
        .select(&ITEM_IMAGE)
        .next()
        .and_then(|el| el.value().attr("src"))
        .unwrap_or_default();
    let image_url = format!("{}/{}", base_url, src);

    let name_link = block.select(&ITEM_NAME_LINK).next();
    let name = name_link.map(element_text).unwrap_or_default();
    let detail_url = name_link
        .and_then(|el| el.value().attr("href"))
        .map(|href| format!("{}{}", base_url, href.trim()));

    ListingItem {
        code,
        code_text,
        image_url,
        name,
        detail_url,
    }
}

fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn classify_properties(doc: &Html) -> PropertyMaps {
    let mut general = BTreeMap::new();
    let mut additional = BTreeMap::new();

    for row in doc.select(&PROPERTY_ROW) {
        let Some(label) = row.select(&PROPERTY_NAME).next().map(element_text) else {
            debug!("Skipping property row without a name element");
            continue;
        };
        let value = row
            .select(&PROPERTY_VALUE)
            .next()
            .map(element_text)
            .unwrap_or_default();

        match GENERAL_PROPERTY_KEYS.get(label.as_str()) {
            Some(key) => {
                general.insert((*key).to_string(), value);
            }
            None => {
                additional.insert(label, value);
            }
        }
    }

    (general, additional)
}
