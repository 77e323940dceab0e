//! Gallery management route handlers.

use std::path::Path as FsPath;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Multipart, Path, State},
    response::{IntoResponse, Redirect},
};
use chrono::{Datelike, Utc};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use summer_camp_core::gallery::{
    alt_from_filename, image_content_type, photos_in_collection, slugify, summarize_collections,
};
use summer_camp_core::{
    CollectionId, CollectionSummary, GalleryPhoto, NewCollection, NewPhoto, PhotoId,
};
use summer_camp_data::RepositoryError;

use crate::{
    error::{AppError, Result},
    filters,
    middleware::{RequireAdminAuth, set_flash, take_flash},
    models::Flash,
    state::AppState,
};

use super::dashboard::AdminUserView;

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 15 * 1024 * 1024;

/// Folder for photos that belong to no collection.
const UNCATEGORIZED_FOLDER: &str = "uncategorized";

/// One collection with its photos in display order.
#[derive(Debug, Clone)]
pub struct CollectionSection {
    pub summary: CollectionSummary,
    pub photos: Vec<GalleryPhoto>,
}

/// Gallery management template.
#[derive(Template, WebTemplate)]
#[template(path = "gallery/index.html")]
pub struct GalleryIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub sections: Vec<CollectionSection>,
    /// Photos without a collection.
    pub loose_photos: Vec<GalleryPhoto>,
    pub uploads_enabled: bool,
}

/// Collections with their photos, plus photos outside any collection.
///
/// # Errors
///
/// Returns an error if the gallery tables cannot be read.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse> {
    let gallery = &state.data().gallery;
    let collections = gallery.list_collections().await?;
    let photos = gallery.list_photos().await?;

    let sections = summarize_collections(&collections, &photos)
        .into_iter()
        .map(|summary| CollectionSection {
            photos: photos_in_collection(&photos, summary.collection.id),
            summary,
        })
        .collect();
    let mut loose_photos: Vec<GalleryPhoto> = photos
        .iter()
        .filter(|p| p.collection_id.is_none())
        .cloned()
        .collect();
    loose_photos.sort_by_key(|p| (p.sort_order, p.id));

    Ok(GalleryIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/gallery".to_string(),
        flash: take_flash(&session).await,
        sections,
        loose_photos,
        uploads_enabled: state.storage().is_some(),
    })
}

/// Input for creating a collection.
#[derive(Debug, Deserialize)]
pub struct CollectionInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Create a collection; slug, year and type come from the name.
///
/// # Errors
///
/// Returns 400 for a name without any letters or digits.
#[instrument(skip(admin, state, session))]
pub async fn create_collection(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Form(input): Form<CollectionInput>,
) -> Result<impl IntoResponse> {
    let mut new = NewCollection::from_name(&input.name);
    if new.slug.is_empty() {
        return Err(AppError::BadRequest(
            "Collection name must contain letters or digits".to_string(),
        ));
    }
    new.description = Some(input.description.trim().to_string()).filter(|d| !d.is_empty());

    let flash = match state.data().gallery.create_collection(new).await {
        Ok(collection) => {
            tracing::info!(
                admin = %admin.email,
                slug = %collection.slug,
                "Gallery collection created"
            );
            Flash::success(format!("Collection \"{}\" created.", collection.name))
        }
        Err(RepositoryError::Conflict(reason)) => {
            Flash::error(format!("Could not create collection: {reason}."))
        }
        Err(e) => return Err(e.into()),
    };

    set_flash(&session, flash).await;
    Ok(Redirect::to("/gallery"))
}

/// Fields of the upload form.
#[derive(Debug, Default)]
struct UploadForm {
    collection_id: Option<CollectionId>,
    alt_text: Option<String>,
    featured: bool,
    file_name: Option<String>,
    bytes: Vec<u8>,
}

async fn read_upload(mut multipart: Multipart) -> Result<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid upload: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                form.file_name = field.file_name().map(str::to_string);
                form.bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid upload: {e}")))?
                    .to_vec();
            }
            "collection_id" | "alt_text" | "featured" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid upload: {e}")))?;
                let value = value.trim();
                match name.as_str() {
                    "collection_id" => {
                        form.collection_id = value.parse::<i32>().ok().map(CollectionId::new);
                    }
                    "alt_text" => {
                        form.alt_text = Some(value.to_string()).filter(|v| !v.is_empty());
                    }
                    _ => form.featured = matches!(value, "on" | "true" | "1"),
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Storage path for an upload: collection folder plus a timestamped,
/// slugified file name.
fn object_path(folder: &str, file_name: &str, timestamp: i64) -> String {
    let path = FsPath::new(file_name);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(slugify)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "photo".to_string());
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("jpg")
        .to_ascii_lowercase();
    format!("{folder}/{timestamp}-{stem}.{ext}")
}

/// Upload an image to Storage and add it to the gallery.
///
/// # Errors
///
/// Returns 400 for a missing or unsupported file or an unknown collection,
/// 502 if Storage rejects the upload.
#[instrument(skip(admin, state, session, multipart))]
pub async fn upload_photo(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let Some(storage) = state.storage() else {
        set_flash(
            &session,
            Flash::error("Photo uploads need Supabase Storage to be configured."),
        )
        .await;
        return Ok(Redirect::to("/gallery"));
    };

    let form = read_upload(multipart).await?;
    let file_name = form
        .file_name
        .filter(|_| !form.bytes.is_empty())
        .ok_or_else(|| AppError::BadRequest("Choose an image to upload".to_string()))?;
    let content_type = image_content_type(&file_name).ok_or_else(|| {
        AppError::BadRequest("Only JPG, PNG and WebP images are supported".to_string())
    })?;

    let collection = match form.collection_id {
        Some(id) => Some(
            state
                .data()
                .gallery
                .list_collections()
                .await?
                .into_iter()
                .find(|c| c.id == id)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown collection {id}")))?,
        ),
        None => None,
    };

    let folder = collection
        .as_ref()
        .map_or(UNCATEGORIZED_FOLDER, |c| c.slug.as_str());
    let path = object_path(folder, &file_name, Utc::now().timestamp_millis());
    let url = storage
        .upload(state.storage_bucket(), &path, form.bytes, content_type)
        .await?;

    let gallery = &state.data().gallery;
    let sort_order = gallery.next_sort_order(form.collection_id).await?;
    let photo = gallery
        .create_photo(NewPhoto {
            collection_id: form.collection_id,
            url,
            alt_text: form
                .alt_text
                .unwrap_or_else(|| alt_from_filename(&file_name)),
            category: collection.as_ref().map(|c| c.slug.clone()),
            year: collection
                .as_ref()
                .and_then(|c| c.year)
                .or_else(|| Some(Utc::now().year())),
            sort_order,
            featured: form.featured,
        })
        .await?;
    tracing::info!(admin = %admin.email, photo = %photo.id, %path, "Gallery photo uploaded");

    set_flash(&session, Flash::success("Photo uploaded.")).await;
    Ok(Redirect::to("/gallery"))
}

/// Input for the featured toggle.
#[derive(Debug, Deserialize)]
pub struct FeaturedInput {
    /// Desired value; an unchecked box sends nothing.
    #[serde(default)]
    pub featured: bool,
}

/// Set or clear the featured flag.
///
/// # Errors
///
/// Returns 404 for an unknown photo.
#[instrument(skip(admin, state, session))]
pub async fn set_featured(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<PhotoId>,
    Form(input): Form<FeaturedInput>,
) -> Result<impl IntoResponse> {
    let photo = state
        .data()
        .gallery
        .set_featured(id, input.featured)
        .await?;
    tracing::info!(
        admin = %admin.email,
        photo = %id,
        featured = photo.featured,
        "Photo featured flag changed"
    );

    let message = if photo.featured {
        "Photo added to the home page selection."
    } else {
        "Photo removed from the home page selection."
    };
    set_flash(&session, Flash::success(message)).await;
    Ok(Redirect::to("/gallery"))
}

/// Delete a photo row and its Storage object.
///
/// A failure to remove the object is logged; the row is already gone.
///
/// # Errors
///
/// Returns 404 for an unknown photo.
#[instrument(skip(admin, state, session))]
pub async fn delete_photo(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<PhotoId>,
) -> Result<impl IntoResponse> {
    let photo = state.data().gallery.delete_photo(id).await?;
    tracing::info!(admin = %admin.email, photo = %id, "Gallery photo deleted");

    if let Some(storage) = state.storage() {
        let bucket = state.storage_bucket();
        if let Some(path) = storage.object_path(bucket, &photo.url) {
            if let Err(e) = storage.remove(bucket, &path).await {
                tracing::warn!(error = %e, %path, "Failed to remove photo from storage");
            }
        }
    }

    set_flash(&session, Flash::success("Photo deleted.")).await;
    Ok(Redirect::to("/gallery"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_path_slugifies_file_name() {
        assert_eq!(
            object_path("camp-2025", "Tramonto sulla Spiaggia.JPG", 1_700_000_000_000),
            "camp-2025/1700000000000-tramonto-sulla-spiaggia.jpg"
        );
    }

    #[test]
    fn test_object_path_without_stem() {
        assert_eq!(
            object_path(UNCATEGORIZED_FOLDER, "???.png", 1),
            "uncategorized/1-photo.png"
        );
    }
}
