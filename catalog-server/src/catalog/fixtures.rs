//! Demo catalog
//!
//! Electronics with phone and laptop branches, ten attributes and four
//! products. Loaded into an empty store, IDs come out as the constants below.
//!
//! ```text
//! Electronics (1)
//! ├── Mobile Phones (2)
//! │   ├── Android Phones (4)
//! │   └── iPhones (5)
//! └── Laptops (3)
//!     ├── Gaming Laptops (6)
//!     └── Business Laptops (7)
//! ```

use shared::models::{AttributeCreate, AttributeType, CategoryCreate, ProductCreate};
use sqlx::SqlitePool;

use super::memory::MemoryCatalog;
use crate::db::repository::{self, RepoResult};

pub const ELECTRONICS: i64 = 1;
pub const MOBILE_PHONES: i64 = 2;
pub const LAPTOPS: i64 = 3;
pub const ANDROID_PHONES: i64 = 4;
pub const IPHONES: i64 = 5;
pub const GAMING_LAPTOPS: i64 = 6;
pub const BUSINESS_LAPTOPS: i64 = 7;

pub const BRAND: i64 = 1;
pub const MODEL: i64 = 2;
pub const WARRANTY_PERIOD: i64 = 3;
pub const OS_VERSION: i64 = 6;
pub const GPU_MODEL: i64 = 10;

/// Creation timestamp of the first seeded attribute; each next one is 1ms later
pub const SEEDED_AT: i64 = 1_700_000_000_000;

/// `(key, name, parent)` in insertion order
const CATEGORIES: &[(&str, &str, Option<i64>)] = &[
    ("electronics", "Electronics", None),
    ("mobile_phones", "Mobile Phones", Some(ELECTRONICS)),
    ("laptops", "Laptops", Some(ELECTRONICS)),
    ("android_phones", "Android Phones", Some(MOBILE_PHONES)),
    ("iphones", "iPhones", Some(MOBILE_PHONES)),
    ("gaming_laptops", "Gaming Laptops", Some(LAPTOPS)),
    ("business_laptops", "Business Laptops", Some(LAPTOPS)),
];

/// `(key, name, type, linked categories)`; no links means global
const ATTRIBUTES: &[(&str, &str, AttributeType, &[i64])] = &[
    ("brand", "Brand", AttributeType::ShortText, &[]),
    ("model", "Model", AttributeType::ShortText, &[ELECTRONICS]),
    ("warranty_period", "Warranty Period", AttributeType::MultiSelect, &[ELECTRONICS]),
    ("battery_capacity", "Battery Capacity", AttributeType::ShortText, &[MOBILE_PHONES]),
    ("camera_megapixels", "Camera Megapixels", AttributeType::ShortText, &[MOBILE_PHONES]),
    ("os_version", "OS Version", AttributeType::ShortText, &[MOBILE_PHONES]),
    ("ram_size", "RAM Size", AttributeType::ShortText, &[LAPTOPS]),
    ("cpu_model", "CPU Model", AttributeType::ShortText, &[LAPTOPS]),
    ("storage_type", "Storage Type", AttributeType::ShortText, &[LAPTOPS]),
    ("gpu_model", "GPU Model", AttributeType::ShortText, &[GAMING_LAPTOPS]),
];

const WARRANTY_OPTIONS: &[&str] = &["6 months", "12 months", "24 months"];

/// `(name, sku, category)`
const PRODUCTS: &[(&str, &str, i64)] = &[
    ("Samsung Galaxy S24 Ultra", "GALAXY-S24U", ANDROID_PHONES),
    ("iPhone 15 Pro", "IPH15PRO", IPHONES),
    ("ASUS ROG Strix G16", "ROG-G16", GAMING_LAPTOPS),
    ("Dell Latitude 7440", "LAT7440", BUSINESS_LAPTOPS),
];

/// `(product index, attribute key, free-text value)`
const VALUES: &[(usize, &str, &str)] = &[
    (0, "brand", "Samsung"),
    (0, "model", "Galaxy S24 Ultra"),
    (0, "os_version", "Android 14"),
    (1, "brand", "Apple"),
    (1, "model", "iPhone 15 Pro"),
    (1, "os_version", "iOS 18"),
    (2, "brand", "ASUS"),
    (2, "gpu_model", "NVIDIA RTX 4070"),
    (3, "brand", "Dell"),
    (3, "ram_size", "16GB"),
];

fn category(index: usize) -> CategoryCreate {
    let (key, name, parent_id) = CATEGORIES[index];
    CategoryCreate {
        name: name.into(),
        key: key.into(),
        parent_id,
    }
}

fn attribute(index: usize) -> AttributeCreate {
    let (key, name, attr_type, _) = ATTRIBUTES[index];
    AttributeCreate {
        key: key.into(),
        name: name.into(),
        attr_type,
    }
}

fn product(index: usize) -> ProductCreate {
    let (name, sku, category_id) = PRODUCTS[index];
    ProductCreate {
        name: name.into(),
        sku: sku.into(),
        category_id,
    }
}

/// Fresh in-memory store holding the demo catalog
pub fn memory_catalog() -> RepoResult<MemoryCatalog> {
    let store = MemoryCatalog::new();
    for index in 0..CATEGORIES.len() {
        store.create_category(category(index))?;
    }
    for (index, (_, _, _, linked)) in ATTRIBUTES.iter().enumerate() {
        let created = store.create_attribute(attribute(index), SEEDED_AT + index as i64)?;
        for category_id in *linked {
            store.link_attribute(*category_id, created.id)?;
        }
    }
    for index in 0..PRODUCTS.len() {
        store.create_product(product(index))?;
    }
    Ok(store)
}

/// Load the demo catalog into an empty database.
///
/// Returns `false` without writing when categories already exist.
pub async fn seed_sqlite(pool: &SqlitePool) -> RepoResult<bool> {
    if !repository::category::find_all(pool).await?.is_empty() {
        return Ok(false);
    }

    for index in 0..CATEGORIES.len() {
        repository::category::create(pool, category(index)).await?;
    }

    let mut attribute_ids = Vec::with_capacity(ATTRIBUTES.len());
    for (index, (key, _, _, linked)) in ATTRIBUTES.iter().enumerate() {
        let created =
            repository::attribute::create(pool, attribute(index), SEEDED_AT + index as i64).await?;
        for category_id in *linked {
            repository::attribute::link(pool, *category_id, created.id).await?;
        }
        if *key == "warranty_period" {
            for value in WARRANTY_OPTIONS {
                repository::attribute::add_option(pool, created.id, value).await?;
            }
        }
        attribute_ids.push((*key, created.id));
    }

    let mut product_ids = Vec::with_capacity(PRODUCTS.len());
    for index in 0..PRODUCTS.len() {
        product_ids.push(repository::product::create(pool, product(index)).await?.id);
    }
    for (product_index, key, value) in VALUES {
        if let Some((_, attribute_id)) = attribute_ids.iter().find(|(k, _)| k == key) {
            repository::product::set_value(pool, product_ids[*product_index], *attribute_id, value)
                .await?;
        }
    }

    tracing::info!(
        categories = CATEGORIES.len(),
        attributes = ATTRIBUTES.len(),
        products = PRODUCTS.len(),
        "Demo catalog seeded"
    );
    Ok(true)
}
