//! Photo gallery records and helpers shared by the public gallery, the
//! admin upload form and the bulk upload command.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::{CollectionId, CollectionType, PhotoId};

static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^0-9])(20[0-9]{2})(?:[^0-9]|$)").expect("Invalid regex"));

/// A named, sluggable group of photos (e.g. "Camp 2023").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryCollection {
    pub id: CollectionId,
    pub name: String,
    pub slug: String,
    pub year: Option<i32>,
    pub collection_type: CollectionType,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Data for creating a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCollection {
    pub name: String,
    pub slug: String,
    pub year: Option<i32>,
    pub collection_type: CollectionType,
    pub description: Option<String>,
}

impl NewCollection {
    /// Derive slug, year and type from a display name.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        Self {
            name: name.to_string(),
            slug: slugify(name),
            year: infer_year(name),
            collection_type: infer_collection_type(name),
            description: None,
        }
    }
}

/// A single gallery photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryPhoto {
    pub id: PhotoId,
    pub collection_id: Option<CollectionId>,
    pub url: String,
    pub alt_text: String,
    pub category: Option<String>,
    pub year: Option<i32>,
    pub sort_order: i32,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
}

/// Data for inserting a photo row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPhoto {
    pub collection_id: Option<CollectionId>,
    pub url: String,
    pub alt_text: String,
    pub category: Option<String>,
    pub year: Option<i32>,
    pub sort_order: i32,
    pub featured: bool,
}

/// A collection with the numbers shown on the gallery overview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSummary {
    pub collection: GalleryCollection,
    pub photo_count: usize,
    pub cover_url: Option<String>,
}

/// Count photos per collection and pick a cover for each.
///
/// The cover is the featured photo with the lowest sort order, or the first
/// photo by sort order when none is featured. Collections are returned
/// newest year first, then by name.
#[must_use]
pub fn summarize_collections(
    collections: &[GalleryCollection],
    photos: &[GalleryPhoto],
) -> Vec<CollectionSummary> {
    let mut by_collection: HashMap<CollectionId, Vec<&GalleryPhoto>> = HashMap::new();
    for photo in photos {
        if let Some(collection_id) = photo.collection_id {
            by_collection.entry(collection_id).or_default().push(photo);
        }
    }

    let mut summaries: Vec<CollectionSummary> = collections
        .iter()
        .map(|collection| {
            let mut members = by_collection.remove(&collection.id).unwrap_or_default();
            members.sort_by_key(|p| (!p.featured, p.sort_order, p.id));
            CollectionSummary {
                collection: collection.clone(),
                photo_count: members.len(),
                cover_url: members.first().map(|p| p.url.clone()),
            }
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.collection
            .year
            .cmp(&a.collection.year)
            .then_with(|| a.collection.name.cmp(&b.collection.name))
    });
    summaries
}

/// Photos of one collection in display order.
#[must_use]
pub fn photos_in_collection(
    photos: &[GalleryPhoto],
    collection_id: CollectionId,
) -> Vec<GalleryPhoto> {
    let mut members: Vec<GalleryPhoto> = photos
        .iter()
        .filter(|p| p.collection_id == Some(collection_id))
        .cloned()
        .collect();
    members.sort_by_key(|p| (p.sort_order, p.id));
    members
}

/// Turn a display name into a URL slug.
///
/// Lower-cases, folds common accented letters to ASCII and collapses every
/// run of other characters into a single dash.
///
/// ```
/// use summer_camp_core::gallery::slugify;
///
/// assert_eq!(slugify("Città Camp 2023!"), "citta-camp-2023");
/// ```
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars().flat_map(char::to_lowercase) {
        let c = fold_accent(c);
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug
}

const fn fold_accent(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ä' | 'ã' | 'å' => 'a',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ò' | 'ó' | 'ô' | 'ö' | 'õ' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

/// Find a year (2000-2099) in a folder or collection name.
#[must_use]
pub fn infer_year(name: &str) -> Option<i32> {
    YEAR_RE
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Guess the collection type from keywords in its name.
#[must_use]
pub fn infer_collection_type(name: &str) -> CollectionType {
    let lower = name.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if has(&["camp", "campus"]) {
        CollectionType::Camp
    } else if has(&["torneo", "tournament", "event", "evento", "festa"]) {
        CollectionType::Event
    } else if has(&["allenament", "training", "clinic"]) {
        CollectionType::Training
    } else {
        CollectionType::Other
    }
}

/// Build readable alt text from an image file name.
///
/// `beach-volley_01.jpg` becomes `Beach volley 01`.
#[must_use]
pub fn alt_from_filename(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);

    let words: Vec<&str> = stem
        .split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .collect();
    let joined = words.join(" ");

    let mut chars = joined.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Whether a file name has an extension the gallery accepts.
#[must_use]
pub fn is_supported_image(file_name: &str) -> bool {
    image_content_type(file_name).is_some()
}

/// MIME type for a supported image file name.
#[must_use]
pub fn image_content_type(file_name: &str) -> Option<&'static str> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())?
        .to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn collection(id: i32, name: &str, year: Option<i32>) -> GalleryCollection {
        GalleryCollection {
            id: CollectionId::new(id),
            name: name.to_string(),
            slug: slugify(name),
            year,
            collection_type: CollectionType::Camp,
            description: None,
            created_at: Utc::now(),
        }
    }

    fn photo(id: i32, collection: Option<i32>, sort_order: i32, featured: bool) -> GalleryPhoto {
        GalleryPhoto {
            id: PhotoId::new(id),
            collection_id: collection.map(CollectionId::new),
            url: format!("https://cdn.example.com/{id}.jpg"),
            alt_text: String::new(),
            category: None,
            year: None,
            sort_order,
            featured,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Camp 2023"), "camp-2023");
        assert_eq!(slugify("  --Torneo di Natale--  "), "torneo-di-natale");
        assert_eq!(slugify("Perché così?"), "perche-cosi");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_infer_year() {
        assert_eq!(infer_year("Camp 2023"), Some(2023));
        assert_eq!(infer_year("camp_2024_week2"), Some(2024));
        assert_eq!(infer_year("Torneo 12345"), None);
        assert_eq!(infer_year("Allenamenti"), None);
    }

    #[test]
    fn test_infer_collection_type() {
        assert_eq!(infer_collection_type("Summer Camp 2023"), CollectionType::Camp);
        assert_eq!(infer_collection_type("Torneo finale"), CollectionType::Event);
        assert_eq!(infer_collection_type("Allenamenti invernali"), CollectionType::Training);
        assert_eq!(infer_collection_type("Misc"), CollectionType::Other);
    }

    #[test]
    fn test_alt_from_filename() {
        assert_eq!(alt_from_filename("beach-volley_01.jpg"), "Beach volley 01");
        assert_eq!(alt_from_filename("IMG_2040.JPG"), "IMG 2040");
        assert_eq!(alt_from_filename(".jpg"), ".jpg");
    }

    #[test]
    fn test_image_content_type() {
        assert_eq!(image_content_type("a.JPG"), Some("image/jpeg"));
        assert_eq!(image_content_type("a.webp"), Some("image/webp"));
        assert_eq!(image_content_type("notes.txt"), None);
        assert!(!is_supported_image("README"));
    }

    #[test]
    fn test_photo_counts_match_collection_rows() {
        let collections = vec![
            collection(1, "Camp 2023", Some(2023)),
            collection(2, "Camp 2024", Some(2024)),
            collection(3, "Empty", None),
        ];
        let photos = vec![
            photo(1, Some(1), 2, false),
            photo(2, Some(1), 1, false),
            photo(3, Some(2), 5, true),
            photo(4, Some(2), 1, false),
            photo(5, Some(2), 2, false),
            photo(6, None, 1, true),
        ];

        let summaries = summarize_collections(&collections, &photos);
        for summary in &summaries {
            let expected = photos
                .iter()
                .filter(|p| p.collection_id == Some(summary.collection.id))
                .count();
            assert_eq!(summary.photo_count, expected);
        }

        // Newest year first, collections without a year last
        assert_eq!(summaries[0].collection.name, "Camp 2024");
        assert_eq!(summaries[2].collection.name, "Empty");

        // Featured photo wins the cover, else lowest sort order
        assert_eq!(summaries[0].cover_url.as_deref(), Some("https://cdn.example.com/3.jpg"));
        assert_eq!(summaries[1].cover_url.as_deref(), Some("https://cdn.example.com/2.jpg"));
        assert_eq!(summaries[2].cover_url, None);
    }

    #[test]
    fn test_photos_in_collection_sorted() {
        let photos = vec![
            photo(1, Some(1), 3, false),
            photo(2, Some(1), 1, false),
            photo(3, Some(2), 0, false),
        ];
        let ids: Vec<i32> = photos_in_collection(&photos, CollectionId::new(1))
            .iter()
            .map(|p| p.id.as_i32())
            .collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_new_collection_from_name() {
        let new = NewCollection::from_name(" Torneo 2022 ");
        assert_eq!(new.name, "Torneo 2022");
        assert_eq!(new.slug, "torneo-2022");
        assert_eq!(new.year, Some(2022));
        assert_eq!(new.collection_type, CollectionType::Event);
    }
}
