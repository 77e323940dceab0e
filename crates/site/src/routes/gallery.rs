//! Public gallery route handlers.
//!
//! Both pages read the live gallery tables; when a query fails the demo
//! photos are shown instead of an error page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::instrument;

use summer_camp_core::gallery::{photos_in_collection, summarize_collections};
use summer_camp_core::{CollectionSummary, GalleryCollection, GalleryPhoto};
use summer_camp_data::{RepositoryError, mock};

use crate::error::{AppError, Result};
use crate::filters;
use crate::state::AppState;

/// Gallery overview template.
#[derive(Template, WebTemplate)]
#[template(path = "gallery/index.html")]
pub struct GalleryIndexTemplate {
    pub collections: Vec<CollectionSummary>,
}

/// Single collection template.
#[derive(Template, WebTemplate)]
#[template(path = "gallery/collection.html")]
pub struct CollectionTemplate {
    pub collection: GalleryCollection,
    pub photos: Vec<GalleryPhoto>,
}

async fn load_gallery(
    state: &AppState,
) -> std::result::Result<(Vec<GalleryCollection>, Vec<GalleryPhoto>), RepositoryError> {
    let collections = state.data().gallery.list_collections().await?;
    let photos = state.data().gallery.list_photos().await?;
    Ok((collections, photos))
}

/// Live collections and photos, or the demo set when the query fails.
async fn gallery_or_fallback(state: &AppState) -> (Vec<GalleryCollection>, Vec<GalleryPhoto>) {
    match load_gallery(state).await {
        Ok(gallery) => gallery,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load gallery, using demo photos");
            (mock::data::collections(), mock::data::photos())
        }
    }
}

/// Display every collection with its photo count and cover.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let (collections, photos) = gallery_or_fallback(&state).await;

    GalleryIndexTemplate {
        collections: summarize_collections(&collections, &photos),
    }
}

async fn load_collection(
    state: &AppState,
    slug: &str,
) -> std::result::Result<Option<(GalleryCollection, Vec<GalleryPhoto>)>, RepositoryError> {
    let gallery = &state.data().gallery;
    let Some(collection) = gallery.get_collection_by_slug(slug).await? else {
        return Ok(None);
    };
    let photos = gallery.list_photos_in_collection(collection.id).await?;
    Ok(Some((collection, photos)))
}

/// Display the photos of one collection.
///
/// # Errors
///
/// Returns 404 if no collection has this slug.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let found = match load_collection(&state, &slug).await {
        Ok(found) => found,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load collection, using demo photos");
            mock::data::collections()
                .into_iter()
                .find(|c| c.slug == slug)
                .map(|collection| {
                    let photos = photos_in_collection(&mock::data::photos(), collection.id);
                    (collection, photos)
                })
        }
    };

    let (collection, photos) =
        found.ok_or_else(|| AppError::NotFound(format!("collection {slug}")))?;

    Ok(CollectionTemplate { collection, photos })
}
