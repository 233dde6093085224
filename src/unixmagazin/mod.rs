mod extractor;
mod images;

pub use extractor::CatalogExtractor;
pub use images::ImageStore;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// One catalog entry as it appears on the listing page, before its detail
/// page has been visited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingItem {
    /// Item code with the label prefix stripped; "0" when the listing block
    /// carries no code element.
    pub code: String,
    /// Raw trimmed text of the code element, kept as the filename fallback.
    pub code_text: String,
    pub image_url: String,
    pub name: String,
    /// Absent when the block has no name link to follow.
    pub detail_url: Option<String>,
}

/// The flat record emitted per item. Recognized detail properties are
/// flattened next to the identity fields; everything unrecognized is kept
/// verbatim inside the `additional_properties` JSON blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub name: String,
    pub code: String,
    pub img: String,
    #[serde(flatten)]
    pub properties: BTreeMap<String, String>,
    pub additional_properties: String,
}

impl ProductRecord {
    pub fn assemble(
        name: String,
        code: String,
        img: String,
        mut general: BTreeMap<String, String>,
        additional: &BTreeMap<String, String>,
    ) -> ProductRecord {
        // A recognized "Код" row overrides the code scraped off the listing.
        let code = general.remove("code").unwrap_or(code);

        let additional_properties = match serde_json::to_string(additional) {
            Ok(blob) => blob,
            Err(err) => {
                warn!("failed to encode additional properties: {}", err);
                "{}".to_string()
            }
        };

        ProductRecord {
            name,
            code,
            img,
            properties: general,
            additional_properties,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn props(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn assembles_identity_fields_and_empty_blob() {
        let record = ProductRecord::assemble(
            "Батарея Alpha 60".to_string(),
            "ABC123".to_string(),
            "https://shop.example/upload/abc123.png".to_string(),
            BTreeMap::new(),
            &BTreeMap::new(),
        );

        assert_eq!(record.name, "Батарея Alpha 60");
        assert_eq!(record.code, "ABC123");
        assert_eq!(record.img, "https://shop.example/upload/abc123.png");
        assert!(record.properties.is_empty());
        assert_eq!(record.additional_properties, "{}");
    }

    #[test]
    fn general_code_overrides_listing_code() {
        let record = ProductRecord::assemble(
            "Батарея Alpha 60".to_string(),
            "ABC123".to_string(),
            "img".to_string(),
            props(&[("code", "XYZ-9"), ("manufacturer", "Alpha")]),
            &BTreeMap::new(),
        );

        assert_eq!(record.code, "XYZ-9");
        assert!(!record.properties.contains_key("code"));
        assert_eq!(record.properties["manufacturer"], "Alpha");
    }

    #[test]
    fn serializes_with_stable_key_order() {
        let record = ProductRecord::assemble(
            "Батарея Alpha 60".to_string(),
            "ABC123".to_string(),
            "images/abc123.png".to_string(),
            props(&[("manufacturer", "Alpha"), ("capacity", "60 Ач")]),
            &props(&[("Гарантия", "2 года")]),
        );

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            "{\"name\":\"Батарея Alpha 60\",\"code\":\"ABC123\",\
             \"img\":\"images/abc123.png\",\"capacity\":\"60 Ач\",\
             \"manufacturer\":\"Alpha\",\
             \"additional_properties\":\"{\\\"Гарантия\\\":\\\"2 года\\\"}\"}"
        );
    }

    #[test]
    fn additional_blob_round_trips_byte_identically() {
        let record = ProductRecord::assemble(
            String::new(),
            "0".to_string(),
            String::new(),
            BTreeMap::new(),
            &props(&[("Гарантия", "2 года"), ("Серия", "Standart")]),
        );

        let decoded: BTreeMap<String, String> =
            serde_json::from_str(&record.additional_properties).unwrap();
        assert_eq!(decoded["Гарантия"], "2 года");
        assert_eq!(
            serde_json::to_string(&decoded).unwrap(),
            record.additional_properties
        );
    }

    #[test]
    fn record_round_trips_through_json() {
        let record = ProductRecord::assemble(
            "Батарея Beta 75".to_string(),
            "B-75".to_string(),
            "images/b75.jpg".to_string(),
            props(&[("capacity", "75 Ач"), ("polarity", "обратная")]),
            &props(&[("Гарантия", "3 года")]),
        );

        let json = serde_json::to_string(&record).unwrap();
        let parsed: ProductRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }
}
