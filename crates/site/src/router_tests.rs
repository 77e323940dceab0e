//! Router tests against the demo datastore and simulated payments.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use rust_decimal::Decimal;
use secrecy::SecretString;
use tower::ServiceExt;
use tower_sessions::MemoryStore;

use summer_camp_core::{
    CollectionId, GalleryCollection, GalleryPhoto, NewCollection, NewPhoto, PaymentStatus,
    PhotoId, Registration, RegistrationDraft, RegistrationStatus,
};
use summer_camp_data::{Datastore, GalleryRepository, RepositoryError};

use crate::config::{SiteConfig, StripeConfig};
use crate::content::ContentStore;
use crate::payments::webhook::sign;
use crate::payments::{PaymentGateway, StripeClient};
use crate::routes::checkout::{CheckoutResponse, PaymentStatusResponse};
use crate::state::AppState;

const STEP_1: &str = "camper_first_name=Sofia&camper_last_name=Verdi&camper_birth_date=2013-05-20\
    &camper_birth_place=Roma&camper_fiscal_code=RSSLCU14C10H501X&camper_gender=female\
    &shirt_size=s&experience=beginner&club=&allergies=&medical_notes=";
const STEP_2: &str = "parent_first_name=Paola&parent_last_name=Verdi\
    &parent_email=paola.verdi%40example.com&parent_phone=%2B39+333+1112223\
    &parent_fiscal_code=RSSMRC80A01H501Z&address=Via+Roma+1&city=Roma&postal_code=00100";
const STEP_3: &str =
    "emergency_name=Anna+Verdi&emergency_phone=333+4445556&emergency_relationship=Aunt";
const STEP_4: &str = "package=standard&payment_option=deposit&privacy_consent=true\
    &regulations_consent=true";

fn demo_state() -> AppState {
    let content =
        ContentStore::load(&Path::new(env!("CARGO_MANIFEST_DIR")).join("content")).unwrap();
    AppState::with_gateway(SiteConfig::demo(), Datastore::demo(), content, PaymentGateway::Demo)
}

fn router(state: &AppState) -> Router {
    crate::app(state.clone(), MemoryStore::default())
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(uri).header(
        header::CONTENT_TYPE,
        "application/x-www-form-urlencoded",
    );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

/// The `name=value` part of the session cookie, if one was set.
fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

async fn pending_registration(state: &AppState) -> Registration {
    use axum::extract::FromRequest;

    let form = [STEP_1, STEP_2, STEP_3, STEP_4].join("&");
    let axum::Form(draft) =
        axum::Form::<RegistrationDraft>::from_request(post_form("/", &form, None), &())
            .await
            .unwrap();
    let new = draft
        .into_new_registration(state.config().camp_start_date)
        .unwrap();
    state.data().registrations.create(new).await.unwrap()
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = router(&demo_state());

    let response = send(&app, get("/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");

    let response = send(&app, get("/health/ready", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_home_page_lists_packages() {
    let app = router(&demo_state());

    let response = send(&app, get("/", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Standard"));
    assert!(html.contains("High Specialization"));
}

#[tokio::test]
async fn test_content_pages() {
    let app = router(&demo_state());

    for uri in ["/program", "/staff", "/faq", "/privacy", "/regulations"] {
        let response = send(&app, get(uri, None)).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }

    let response = send(&app, get("/no-such-page", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_contact_form() {
    let state = demo_state();
    let app = router(&state);
    let before = state.data().contacts.list_recent(100).await.unwrap().len();

    let response = send(&app, post_form("/contact", "name=&email=nope&message=", None)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(response).await.contains("field-error"));

    let body = "name=Giorgia&email=giorgia%40example.com&phone=&message=Is+there+a+bus%3F";
    let response = send(&app, post_form("/contact", body, None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let contacts = state.data().contacts.list_recent(100).await.unwrap();
    assert_eq!(contacts.len(), before + 1);
    assert_eq!(contacts[0].message, "Is there a bus?");
}

#[tokio::test]
async fn test_wizard_steps_cannot_be_skipped() {
    let app = router(&demo_state());

    let response = send(&app, get("/register", None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/register/step/1");

    let response = send(&app, get("/register/step/3", None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/register/step/1");

    let response = send(&app, get("/register/step/9", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_step_reports_field_errors() {
    let app = router(&demo_state());

    let body = STEP_1.replace("camper_first_name=Sofia", "camper_first_name=");
    let response = send(&app, post_form("/register/step/1", &body, None)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let html = body_text(response).await;
    assert!(html.contains("field-error"));
    // The other fields keep what was typed
    assert!(html.contains("Verdi"));
}

#[tokio::test]
async fn test_full_registration_with_simulated_payment() {
    let state = demo_state();
    let app = router(&state);
    let before = state.data().registrations.list().await.unwrap().len();

    let response = send(&app, post_form("/register/step/1", STEP_1, None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/register/step/2");
    let cookie = session_cookie(&response).unwrap();

    for (n, body) in [(2, STEP_2), (3, STEP_3), (4, STEP_4)] {
        let uri = format!("/register/step/{n}");
        let response = send(&app, post_form(&uri, body, Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "step {n}");
        assert_eq!(location(&response), format!("/register/step/{}", n + 1));
    }

    let response = send(&app, get("/register/step/5", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Sofia Verdi"));

    let response = send(&app, post_form("/register/submit", "", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let success = location(&response).to_string();
    assert!(success.starts_with("http://localhost:3000/register/success?session_id=cs_demo_"));

    let registrations = state.data().registrations.list().await.unwrap();
    assert_eq!(registrations.len(), before + 1);
    let created = registrations
        .iter()
        .find(|r| r.camper_first_name == "Sofia")
        .unwrap();
    assert_eq!(created.payment_status, PaymentStatus::DepositPaid);
    assert_eq!(created.status, RegistrationStatus::Confirmed);
    assert_eq!(created.amount_paid, Decimal::new(150, 0));

    let path = success.trim_start_matches("http://localhost:3000");
    let response = send(&app, get(path, Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Sofia Verdi"));
    assert!(!html.contains("Payment being confirmed"));
}

#[tokio::test]
async fn test_submit_with_incomplete_draft_redirects() {
    let app = router(&demo_state());

    let response = send(&app, post_form("/register/submit", "", None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/register/step/1");
}

#[tokio::test]
async fn test_success_page_placeholder_for_unknown_session() {
    let app = router(&demo_state());

    let response = send(&app, get("/register/success?session_id=cs_unknown", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Payment being confirmed"));
}

#[tokio::test]
async fn test_checkout_api_and_status() {
    let state = demo_state();
    let app = router(&state);
    let registration = pending_registration(&state).await;

    let uri = format!("/api/registrations/{}/status", registration.id);
    let response = send(&app, get(&uri, None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let status: PaymentStatusResponse = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(status.payment_status, PaymentStatus::Unpaid);
    assert_eq!(status.amount_due, Decimal::new(390, 0));

    let body = serde_json::json!({ "registration_id": registration.id });
    let response = send(&app, post_json("/api/checkout", &body)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let checkout: CheckoutResponse = serde_json::from_str(&body_text(response).await).unwrap();
    assert!(checkout.demo);
    assert!(checkout.session_id.starts_with("cs_demo_"));

    let response = send(&app, get(&uri, None)).await;
    let status: PaymentStatusResponse = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(status.payment_status, PaymentStatus::DepositPaid);
    assert_eq!(status.amount_due, Decimal::new(240, 0));
}

#[tokio::test]
async fn test_checkout_api_unknown_registration() {
    let app = router(&demo_state());

    let body = serde_json::json!({ "registration_id": uuid::Uuid::new_v4() });
    let response = send(&app, post_json("/api/checkout", &body)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

fn completed_event(registration: &Registration, session_id: &str, cents: i64) -> String {
    checkout_event(
        "checkout.session.completed",
        registration,
        session_id,
        cents,
        "paid",
    )
}

fn checkout_event(
    event_type: &str,
    registration: &Registration,
    session_id: &str,
    cents: i64,
    payment_status: &str,
) -> String {
    serde_json::json!({
        "id": "evt_test",
        "type": event_type,
        "data": { "object": {
            "id": session_id,
            "amount_total": cents,
            "payment_status": payment_status,
            "client_reference_id": registration.id.to_string(),
            "metadata": { "registration_id": registration.id.to_string() }
        }}
    })
    .to_string()
}

#[tokio::test]
async fn test_webhook_records_payment_once() {
    let state = demo_state();
    let app = router(&state);
    let registration = pending_registration(&state).await;
    let event = completed_event(&registration, "cs_live_1", 39_000);

    for _ in 0..2 {
        let request = Request::post("/api/webhooks/stripe")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(event.clone()))
            .unwrap();
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let updated = state
        .data()
        .registrations
        .get(registration.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.amount_paid, Decimal::new(390, 0));
    assert_eq!(updated.payment_status, PaymentStatus::Paid);
}

#[tokio::test]
async fn test_webhook_waits_for_delayed_payment() {
    let state = demo_state();
    let app = router(&state);
    let registration = pending_registration(&state).await;

    let completed = checkout_event(
        "checkout.session.completed",
        &registration,
        "cs_sepa_1",
        15_000,
        "unpaid",
    );
    let request = Request::post("/api/webhooks/stripe")
        .body(Body::from(completed))
        .unwrap();
    assert_eq!(send(&app, request).await.status(), StatusCode::OK);

    let unchanged = state
        .data()
        .registrations
        .get(registration.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.amount_paid, Decimal::ZERO);
    assert_eq!(unchanged.payment_status, PaymentStatus::Unpaid);
    assert_eq!(unchanged.status, RegistrationStatus::Pending);

    let succeeded = checkout_event(
        "checkout.session.async_payment_succeeded",
        &registration,
        "cs_sepa_1",
        15_000,
        "paid",
    );
    let request = Request::post("/api/webhooks/stripe")
        .body(Body::from(succeeded))
        .unwrap();
    assert_eq!(send(&app, request).await.status(), StatusCode::OK);

    let paid = state
        .data()
        .registrations
        .get(registration.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(paid.amount_paid, Decimal::new(150, 0));
    assert_eq!(paid.payment_status, PaymentStatus::DepositPaid);
    assert_eq!(paid.status, RegistrationStatus::Confirmed);
}

#[tokio::test]
async fn test_webhook_ignores_unknown_events() {
    let app = router(&demo_state());

    let request = Request::post("/api/webhooks/stripe")
        .body(Body::from(r#"{"id":"evt_1","type":"customer.created","data":{"object":{}}}"#))
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_webhook_signature_is_enforced_when_configured() {
    let secret = "whsec_Jq7vLm2XpR9tKz4N";
    let client = StripeClient::new(StripeConfig {
        secret_key: SecretString::from("sk_test_51NqYb2KfJ8xR3mPzT0cLwQ9"),
        webhook_secret: Some(SecretString::from(secret)),
        api_base: "http://127.0.0.1:9".to_string(),
    })
    .unwrap();
    let content = ContentStore::default();
    let state = AppState::with_gateway(
        SiteConfig::demo(),
        Datastore::demo(),
        content,
        PaymentGateway::Stripe(client),
    );
    let app = router(&state);
    let registration = pending_registration(&state).await;
    let event = completed_event(&registration, "cs_live_2", 15_000);

    let unsigned = Request::post("/api/webhooks/stripe")
        .body(Body::from(event.clone()))
        .unwrap();
    let response = send(&app, unsigned).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let signature = sign(event.as_bytes(), secret, chrono::Utc::now().timestamp());
    let signed = Request::post("/api/webhooks/stripe")
        .header("stripe-signature", signature)
        .body(Body::from(event))
        .unwrap();
    let response = send(&app, signed).await;
    assert_eq!(response.status(), StatusCode::OK);

    let updated = state
        .data()
        .registrations
        .get(registration.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.payment_status, PaymentStatus::DepositPaid);
}

#[tokio::test]
async fn test_gallery_pages() {
    let app = router(&demo_state());

    let response = send(&app, get("/gallery", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Camp 2024"));
    assert!(html.contains("/gallery/camp-2025"));

    let response = send(&app, get("/gallery/camp-2024", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Warm-up on the beach"));

    let response = send(&app, get("/gallery/no-such-collection", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// Gallery store whose database is down.
struct UnreachableGallery;

fn unavailable<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("connection refused".to_string()))
}

#[async_trait]
impl GalleryRepository for UnreachableGallery {
    async fn list_collections(&self) -> Result<Vec<GalleryCollection>, RepositoryError> {
        unavailable()
    }

    async fn get_collection_by_slug(
        &self,
        _slug: &str,
    ) -> Result<Option<GalleryCollection>, RepositoryError> {
        unavailable()
    }

    async fn create_collection(
        &self,
        _new: NewCollection,
    ) -> Result<GalleryCollection, RepositoryError> {
        unavailable()
    }

    async fn list_photos(&self) -> Result<Vec<GalleryPhoto>, RepositoryError> {
        unavailable()
    }

    async fn list_photos_in_collection(
        &self,
        _collection_id: CollectionId,
    ) -> Result<Vec<GalleryPhoto>, RepositoryError> {
        unavailable()
    }

    async fn featured_photos(&self, _limit: usize) -> Result<Vec<GalleryPhoto>, RepositoryError> {
        unavailable()
    }

    async fn create_photo(&self, _new: NewPhoto) -> Result<GalleryPhoto, RepositoryError> {
        unavailable()
    }

    async fn set_featured(
        &self,
        _id: PhotoId,
        _featured: bool,
    ) -> Result<GalleryPhoto, RepositoryError> {
        unavailable()
    }

    async fn delete_photo(&self, _id: PhotoId) -> Result<GalleryPhoto, RepositoryError> {
        unavailable()
    }

    async fn next_sort_order(
        &self,
        _collection_id: Option<CollectionId>,
    ) -> Result<i32, RepositoryError> {
        unavailable()
    }
}

#[tokio::test]
async fn test_gallery_falls_back_to_demo_photos() {
    let mut data = Datastore::demo();
    data.gallery = Arc::new(UnreachableGallery);
    let content =
        ContentStore::load(&Path::new(env!("CARGO_MANIFEST_DIR")).join("content")).unwrap();
    let state = AppState::with_gateway(SiteConfig::demo(), data, content, PaymentGateway::Demo);
    let app = router(&state);

    let response = send(&app, get("/gallery", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Camp 2024"));
    assert!(html.contains("/gallery/camp-2025"));

    let response = send(&app, get("/gallery/camp-2024", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Warm-up on the beach"));

    let response = send(&app, get("/gallery/no-such-collection", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
