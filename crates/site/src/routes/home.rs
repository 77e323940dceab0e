//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use summer_camp_core::{GalleryPhoto, Package, format_eur};
use summer_camp_data::mock;

use crate::filters;
use crate::state::AppState;

/// Number of featured photos shown in the home page strip.
const FEATURED_PHOTO_COUNT: usize = 6;

/// A package as shown on the home page and in the wizard.
#[derive(Debug, Clone)]
pub struct PackageCard {
    pub value: &'static str,
    pub name: &'static str,
    pub price: String,
    pub deposit: String,
    pub services: &'static [&'static str],
    pub selected: bool,
}

impl PackageCard {
    /// Cards for every package, marking `selected` as chosen.
    #[must_use]
    pub fn all(selected: Option<Package>) -> Vec<Self> {
        Package::ALL
            .iter()
            .map(|&package| Self {
                value: package.as_str(),
                name: package.label(),
                price: format_eur(package.price()),
                deposit: format_eur(package.deposit()),
                services: package.included_services(),
                selected: selected == Some(package),
            })
            .collect()
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub packages: Vec<PackageCard>,
    pub photos: Vec<GalleryPhoto>,
    pub camp_start: String,
}

/// Featured photos, falling back to the demo set when the query fails.
async fn featured_photos(state: &AppState) -> Vec<GalleryPhoto> {
    match state.data().gallery.featured_photos(FEATURED_PHOTO_COUNT).await {
        Ok(photos) => photos,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load featured photos, using demo photos");
            mock::data::photos()
                .into_iter()
                .filter(|p| p.featured)
                .take(FEATURED_PHOTO_COUNT)
                .collect()
        }
    }
}

/// Display the home page.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> impl IntoResponse {
    HomeTemplate {
        packages: PackageCard::all(None),
        photos: featured_photos(&state).await,
        camp_start: state.config().camp_start_date.format("%d/%m/%Y").to_string(),
    }
}
