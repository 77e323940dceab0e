//! Bulk gallery upload from a local folder tree.
//!
//! # Usage
//!
//! ```bash
//! # Show what would be uploaded
//! camp-cli gallery upload ./photos --dry-run
//!
//! # Upload to the default bucket
//! camp-cli gallery upload ./photos
//! ```
//!
//! Every first-level folder under the root becomes a collection; images
//! anywhere below it are uploaded to `{slug}/{path}` and added in file name
//! order.
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `SUPABASE_URL`, `SUPABASE_ANON_KEY`, `SUPABASE_SERVICE_ROLE_KEY` -
//!   Supabase project used for Storage

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use thiserror::Error;

use summer_camp_core::gallery::{
    alt_from_filename, image_content_type, infer_collection_type, infer_year, slugify,
};
use summer_camp_core::{CollectionType, GalleryCollection, NewCollection, NewPhoto};
use summer_camp_data::supabase::{StorageClient, StorageError, SupabaseConfig, SupabaseConfigError};
use summer_camp_data::{Datastore, RepositoryError};

/// Errors that can occur during a gallery upload.
#[derive(Debug, Error)]
pub enum GalleryUploadError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Supabase configuration error: {0}")]
    Config(#[from] SupabaseConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// One image to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedImage {
    /// File on disk.
    pub source: PathBuf,
    /// Object path inside the bucket.
    pub storage_path: String,
    /// Folder path relative to the upload root, `/`-separated.
    pub category: String,
    pub alt_text: String,
    pub content_type: &'static str,
}

/// A first-level folder and the images below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedCollection {
    pub name: String,
    pub slug: String,
    pub year: Option<i32>,
    pub collection_type: CollectionType,
    pub images: Vec<PlannedImage>,
}

impl PlannedCollection {
    fn new_collection(&self) -> NewCollection {
        NewCollection {
            name: self.name.clone(),
            slug: self.slug.clone(),
            year: self.year,
            collection_type: self.collection_type,
            description: None,
        }
    }
}

/// Somewhere uploaded images end up; returns the public URL.
pub(crate) trait ImageSink {
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError>;
}

/// Supabase Storage bucket.
struct BucketSink {
    client: StorageClient,
    bucket: String,
}

impl ImageSink for BucketSink {
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        self.client
            .upload(&self.bucket, path, bytes, content_type)
            .await
    }
}

/// Totals reported after an upload.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UploadSummary {
    pub collections_created: usize,
    pub collections_reused: usize,
    pub photos: usize,
}

fn read_dir_sorted(dir: &Path) -> Result<Vec<PathBuf>, GalleryUploadError> {
    let io_err = |source| GalleryUploadError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = std::fs::read_dir(dir)
        .map_err(io_err)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_err)?;
    entries.sort();
    Ok(entries)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

/// `/`-joined components of `path` below `base`.
fn relative(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect::<Vec<_>>()
        .join("/")
}

fn collect_images(
    dir: &Path,
    root: &Path,
    collection_dir: &Path,
    slug: &str,
    images: &mut Vec<PlannedImage>,
) -> Result<(), GalleryUploadError> {
    for path in read_dir_sorted(dir)? {
        if is_hidden(&path) {
            continue;
        }
        if path.is_dir() {
            // Linked folders may point back up the tree
            if path.is_symlink() {
                tracing::warn!(path = %path.display(), "Skipping symlinked folder");
            } else {
                collect_images(&path, root, collection_dir, slug, images)?;
            }
            continue;
        }

        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(content_type) = image_content_type(file_name) else {
            tracing::debug!(path = %path.display(), "Skipping non-image file");
            continue;
        };

        images.push(PlannedImage {
            storage_path: format!("{slug}/{}", relative(&path, collection_dir)),
            category: relative(dir, root),
            alt_text: alt_from_filename(file_name),
            content_type,
            source: path,
        });
    }
    Ok(())
}

/// Walk `root` and work out what would be created.
///
/// Folders whose names produce an empty slug, hidden entries, symlinked
/// folders and files directly in `root` are skipped.
///
/// # Errors
///
/// Returns an error if `root` is not a directory or cannot be read.
pub fn plan(root: &Path) -> Result<Vec<PlannedCollection>, GalleryUploadError> {
    if !root.is_dir() {
        return Err(GalleryUploadError::NotADirectory(root.to_path_buf()));
    }

    let mut collections = Vec::new();
    for dir in read_dir_sorted(root)? {
        if is_hidden(&dir) {
            continue;
        }
        if !dir.is_dir() {
            tracing::warn!(path = %dir.display(), "Skipping file outside a collection folder");
            continue;
        }
        if dir.is_symlink() {
            tracing::warn!(path = %dir.display(), "Skipping symlinked folder");
            continue;
        }

        let name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .trim()
            .to_owned();
        let slug = slugify(&name);
        if slug.is_empty() {
            tracing::warn!(folder = %name, "Skipping folder without a usable name");
            continue;
        }

        let mut images = Vec::new();
        collect_images(&dir, root, &dir, &slug, &mut images)?;

        collections.push(PlannedCollection {
            year: infer_year(&name),
            collection_type: infer_collection_type(&name),
            name,
            slug,
            images,
        });
    }
    Ok(collections)
}

fn log_plan(collections: &[PlannedCollection]) {
    for collection in collections {
        tracing::info!(
            "{} ({}, year {}, {} images)",
            collection.name,
            collection.slug,
            collection
                .year
                .map_or_else(|| "-".to_owned(), |y| y.to_string()),
            collection.images.len()
        );
        for image in &collection.images {
            tracing::info!("  {} -> {}", image.source.display(), image.storage_path);
        }
    }
}

async fn find_or_create(
    data: &Datastore,
    planned: &PlannedCollection,
    summary: &mut UploadSummary,
) -> Result<GalleryCollection, GalleryUploadError> {
    if let Some(existing) = data.gallery.get_collection_by_slug(&planned.slug).await? {
        tracing::info!(slug = %planned.slug, "Reusing existing collection");
        summary.collections_reused += 1;
        return Ok(existing);
    }

    let created = data.gallery.create_collection(planned.new_collection()).await?;
    tracing::info!(slug = %created.slug, id = %created.id, "Collection created");
    summary.collections_created += 1;
    Ok(created)
}

/// Create missing collections, upload every image and insert its row.
///
/// Photos are appended after any already in the collection.
pub(crate) async fn apply(
    collections: &[PlannedCollection],
    data: &Datastore,
    sink: &impl ImageSink,
) -> Result<UploadSummary, GalleryUploadError> {
    let mut summary = UploadSummary::default();

    for planned in collections {
        let collection = find_or_create(data, planned, &mut summary).await?;
        let mut sort_order = data.gallery.next_sort_order(Some(collection.id)).await?;

        for image in &planned.images {
            let bytes = tokio::fs::read(&image.source)
                .await
                .map_err(|source| GalleryUploadError::Io {
                    path: image.source.clone(),
                    source,
                })?;
            let url = sink
                .put(&image.storage_path, bytes, image.content_type)
                .await?;

            data.gallery
                .create_photo(NewPhoto {
                    collection_id: Some(collection.id),
                    url,
                    alt_text: image.alt_text.clone(),
                    category: Some(image.category.clone()),
                    year: collection.year,
                    sort_order,
                    featured: false,
                })
                .await?;
            tracing::info!(path = %image.storage_path, sort_order, "Uploaded");
            sort_order += 1;
            summary.photos += 1;
        }
    }

    Ok(summary)
}

/// Upload a folder tree to the gallery.
///
/// # Arguments
///
/// * `dir` - Root folder; its subfolders are collections
/// * `bucket` - Storage bucket, defaults to `SUPABASE_STORAGE_BUCKET`
/// * `dry_run` - Only print the plan
///
/// # Errors
///
/// Returns an error if the folder cannot be read, configuration is missing,
/// or an upload or insert fails.
pub async fn upload(
    dir: &Path,
    bucket: Option<String>,
    dry_run: bool,
) -> Result<UploadSummary, GalleryUploadError> {
    dotenvy::dotenv().ok();

    let collections = plan(dir)?;
    let total: usize = collections.iter().map(|c| c.images.len()).sum();
    tracing::info!(collections = collections.len(), images = total, "Upload plan ready");

    if dry_run {
        log_plan(&collections);
        tracing::info!("Dry run, nothing uploaded");
        return Ok(UploadSummary::default());
    }

    let supabase = SupabaseConfig::from_env()?
        .ok_or(GalleryUploadError::MissingEnvVar("SUPABASE_URL"))?;
    let database_url = std::env::var("DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| GalleryUploadError::MissingEnvVar("DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = summer_camp_data::create_pool(&database_url).await?;
    let data = Datastore::postgres(pool);

    let sink = BucketSink {
        client: StorageClient::new(&supabase)?,
        bucket: bucket.unwrap_or_else(|| supabase.storage_bucket.clone()),
    };
    tracing::info!(bucket = %sink.bucket, "Uploading to Supabase Storage");

    let summary = apply(&collections, &data, &sink).await?;
    tracing::info!(
        created = summary.collections_created,
        reused = summary.collections_reused,
        photos = summary.photos,
        "Gallery upload complete"
    );
    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn write(root: &Path, path: &str) {
        let full = root.join(path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, b"image-bytes").unwrap();
    }

    fn sample_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "Camp 2026/spiaggia_01.jpg");
        write(root, "Camp 2026/Giorno 2/partita-finale.PNG");
        write(root, "Camp 2026/notes.txt");
        write(root, "Torneo di Pasqua 2026/podio.webp");
        write(root, "Camp 2026/.DS_Store");
        write(root, "loose.jpg");
        dir
    }

    #[derive(Default)]
    struct RecordingSink {
        paths: Mutex<Vec<String>>,
    }

    impl ImageSink for RecordingSink {
        async fn put(
            &self,
            path: &str,
            _bytes: Vec<u8>,
            _content_type: &str,
        ) -> Result<String, StorageError> {
            self.paths.lock().unwrap().push(path.to_owned());
            Ok(format!("https://cdn.example/{path}"))
        }
    }

    #[test]
    fn test_plan_maps_folders_to_collections() {
        let tree = sample_tree();
        let collections = plan(tree.path()).unwrap();

        assert_eq!(collections.len(), 2);
        let camp = &collections[0];
        assert_eq!(camp.name, "Camp 2026");
        assert_eq!(camp.slug, "camp-2026");
        assert_eq!(camp.year, Some(2026));
        assert_eq!(camp.collection_type, CollectionType::Camp);

        let paths: Vec<&str> = camp.images.iter().map(|i| i.storage_path.as_str()).collect();
        assert_eq!(
            paths,
            ["camp-2026/Giorno 2/partita-finale.PNG", "camp-2026/spiaggia_01.jpg"]
        );
        assert_eq!(camp.images[0].category, "Camp 2026/Giorno 2");
        assert_eq!(camp.images[0].content_type, "image/png");
        assert_eq!(camp.images[1].category, "Camp 2026");
        assert_eq!(camp.images[1].alt_text, "Spiaggia 01");

        let torneo = &collections[1];
        assert_eq!(torneo.slug, "torneo-di-pasqua-2026");
        assert_eq!(torneo.collection_type, CollectionType::Event);
        assert_eq!(torneo.images.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_plan_skips_symlinked_folders() {
        use std::os::unix::fs::symlink;

        let tree = sample_tree();
        let root = tree.path();
        // Loops back to the collection folder and to the root
        symlink(root.join("Camp 2026"), root.join("Camp 2026/Giorno 2/indietro")).unwrap();
        symlink(root, root.join("Torneo di Pasqua 2026/radice")).unwrap();
        symlink(root.join("Camp 2026"), root.join("Copia Camp")).unwrap();

        let collections = plan(root).unwrap();

        let slugs: Vec<&str> = collections.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(slugs, ["camp-2026", "torneo-di-pasqua-2026"]);
        assert_eq!(collections[0].images.len(), 2);
        assert_eq!(collections[1].images.len(), 1);
    }

    #[test]
    fn test_plan_rejects_missing_directory() {
        let tree = sample_tree();
        let err = plan(&tree.path().join("missing")).unwrap_err();
        assert!(matches!(err, GalleryUploadError::NotADirectory(_)));
    }

    #[tokio::test]
    async fn test_apply_creates_collections_and_photos() {
        let tree = sample_tree();
        let collections = plan(tree.path()).unwrap();
        let data = Datastore::demo();
        let sink = RecordingSink::default();

        let summary = apply(&collections, &data, &sink).await.unwrap();
        assert_eq!(summary.collections_created, 2);
        assert_eq!(summary.collections_reused, 0);
        assert_eq!(summary.photos, 3);
        assert_eq!(sink.paths.lock().unwrap().len(), 3);

        let camp = data
            .gallery
            .get_collection_by_slug("camp-2026")
            .await
            .unwrap()
            .unwrap();
        let photos = data
            .gallery
            .list_photos_in_collection(camp.id)
            .await
            .unwrap();
        assert_eq!(photos.len(), 2);
        assert!(photos[0].sort_order < photos[1].sort_order);
        assert!(photos.iter().all(|p| p.year == Some(2026) && !p.featured));
        assert!(photos[0].url.starts_with("https://cdn.example/camp-2026/"));
    }

    #[tokio::test]
    async fn test_apply_reuses_existing_collection() {
        let tree = sample_tree();
        let collections = plan(tree.path()).unwrap();
        let data = Datastore::demo();
        let sink = RecordingSink::default();

        apply(&collections, &data, &sink).await.unwrap();
        let again = apply(&collections, &data, &sink).await.unwrap();
        assert_eq!(again.collections_created, 0);
        assert_eq!(again.collections_reused, 2);

        let camp = data
            .gallery
            .get_collection_by_slug("camp-2026")
            .await
            .unwrap()
            .unwrap();
        let photos = data
            .gallery
            .list_photos_in_collection(camp.id)
            .await
            .unwrap();
        assert_eq!(photos.len(), 4);
        let orders: Vec<i32> = photos.iter().map(|p| p.sort_order).collect();
        let mut sorted = orders.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 4);
    }
}
