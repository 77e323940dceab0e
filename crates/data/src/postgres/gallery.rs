//! `gallery_collections` and `gallery_photos` tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use summer_camp_core::{
    CollectionId, GalleryCollection, GalleryPhoto, NewCollection, NewPhoto, PhotoId,
};

use super::{PgStore, parse_column, sql_limit};
use crate::RepositoryError;
use crate::repository::GalleryRepository;

const COLLECTION_COLUMNS: &str = "id, name, slug, year, collection_type, description, created_at";
const PHOTO_COLUMNS: &str =
    "id, collection_id, url, alt_text, category, year, sort_order, featured, created_at";

#[derive(Debug, FromRow)]
struct CollectionRow {
    id: CollectionId,
    name: String,
    slug: String,
    year: Option<i32>,
    collection_type: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<CollectionRow> for GalleryCollection {
    type Error = RepositoryError;

    fn try_from(row: CollectionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            year: row.year,
            collection_type: parse_column("collection_type", &row.collection_type)?,
            description: row.description,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct PhotoRow {
    id: PhotoId,
    collection_id: Option<CollectionId>,
    url: String,
    alt_text: String,
    category: Option<String>,
    year: Option<i32>,
    sort_order: i32,
    featured: bool,
    created_at: DateTime<Utc>,
}

impl From<PhotoRow> for GalleryPhoto {
    fn from(row: PhotoRow) -> Self {
        Self {
            id: row.id,
            collection_id: row.collection_id,
            url: row.url,
            alt_text: row.alt_text,
            category: row.category,
            year: row.year,
            sort_order: row.sort_order,
            featured: row.featured,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl GalleryRepository for PgStore {
    async fn list_collections(&self) -> Result<Vec<GalleryCollection>, RepositoryError> {
        let rows = sqlx::query_as::<_, CollectionRow>(&format!(
            "SELECT {COLLECTION_COLUMNS} FROM gallery_collections \
             ORDER BY year DESC NULLS LAST, name"
        ))
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn get_collection_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<GalleryCollection>, RepositoryError> {
        let row = sqlx::query_as::<_, CollectionRow>(&format!(
            "SELECT {COLLECTION_COLUMNS} FROM gallery_collections WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool())
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn create_collection(
        &self,
        new: NewCollection,
    ) -> Result<GalleryCollection, RepositoryError> {
        let row = sqlx::query_as::<_, CollectionRow>(&format!(
            "INSERT INTO gallery_collections (name, slug, year, collection_type, description) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {COLLECTION_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(&new.slug)
        .bind(new.year)
        .bind(new.collection_type.as_str())
        .bind(&new.description)
        .fetch_one(self.pool())
        .await
        .map_err(|e| RepositoryError::from_insert(e, "slug already exists"))?;

        row.try_into()
    }

    async fn list_photos(&self) -> Result<Vec<GalleryPhoto>, RepositoryError> {
        let rows = sqlx::query_as::<_, PhotoRow>(&format!(
            "SELECT {PHOTO_COLUMNS} FROM gallery_photos \
             ORDER BY collection_id NULLS FIRST, sort_order, id"
        ))
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_photos_in_collection(
        &self,
        collection_id: CollectionId,
    ) -> Result<Vec<GalleryPhoto>, RepositoryError> {
        let rows = sqlx::query_as::<_, PhotoRow>(&format!(
            "SELECT {PHOTO_COLUMNS} FROM gallery_photos \
             WHERE collection_id = $1 ORDER BY sort_order, id"
        ))
        .bind(collection_id)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn featured_photos(&self, limit: usize) -> Result<Vec<GalleryPhoto>, RepositoryError> {
        let rows = sqlx::query_as::<_, PhotoRow>(&format!(
            "SELECT {PHOTO_COLUMNS} FROM gallery_photos \
             WHERE featured ORDER BY sort_order, id LIMIT $1"
        ))
        .bind(sql_limit(limit))
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_photo(&self, new: NewPhoto) -> Result<GalleryPhoto, RepositoryError> {
        let row = sqlx::query_as::<_, PhotoRow>(&format!(
            "INSERT INTO gallery_photos \
             (collection_id, url, alt_text, category, year, sort_order, featured) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {PHOTO_COLUMNS}"
        ))
        .bind(new.collection_id)
        .bind(&new.url)
        .bind(&new.alt_text)
        .bind(&new.category)
        .bind(new.year)
        .bind(new.sort_order)
        .bind(new.featured)
        .fetch_one(self.pool())
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                RepositoryError::NotFound
            }
            other => RepositoryError::Database(other),
        })?;

        Ok(row.into())
    }

    async fn set_featured(
        &self,
        id: PhotoId,
        featured: bool,
    ) -> Result<GalleryPhoto, RepositoryError> {
        let row = sqlx::query_as::<_, PhotoRow>(&format!(
            "UPDATE gallery_photos SET featured = $2 WHERE id = $1 RETURNING {PHOTO_COLUMNS}"
        ))
        .bind(id)
        .bind(featured)
        .fetch_optional(self.pool())
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    async fn delete_photo(&self, id: PhotoId) -> Result<GalleryPhoto, RepositoryError> {
        let row = sqlx::query_as::<_, PhotoRow>(&format!(
            "DELETE FROM gallery_photos WHERE id = $1 RETURNING {PHOTO_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    async fn next_sort_order(
        &self,
        collection_id: Option<CollectionId>,
    ) -> Result<i32, RepositoryError> {
        let next: Option<i32> = sqlx::query_scalar(
            "SELECT MAX(sort_order) + 1 FROM gallery_photos \
             WHERE collection_id IS NOT DISTINCT FROM $1",
        )
        .bind(collection_id)
        .fetch_one(self.pool())
        .await?;

        Ok(next.unwrap_or(0))
    }
}
