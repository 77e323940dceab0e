//! Router tests against the demo datastore, demo sign-in and logged reminders.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use rust_decimal::Decimal;
use tower::ServiceExt;
use tower_sessions::MemoryStore;
use uuid::Uuid;

use summer_camp_core::{
    AdminRole, AdminUserId, Email, PaymentStatus, PhotoId, RegistrationId, RegistrationStatus,
};
use summer_camp_data::Datastore;
use summer_camp_data::mock::data::{DEMO_ADMIN_EMAIL, DEMO_SUBADMIN_EMAIL};

use crate::config::AdminConfig;
use crate::state::AppState;

/// Luca Rossi: standard package, deposit of 150 paid, 240 due.
const LUCA: u128 = 0x5c00_0001;
/// Giulia Bianchi: paid in full.
const GIULIA: u128 = 0x5c00_0002;
/// Matteo Conti: pending, nothing paid.
const MATTEO: u128 = 0x5c00_0003;

fn registration_id(n: u128) -> RegistrationId {
    RegistrationId::from_uuid(Uuid::from_u128(n))
}

fn demo_state() -> AppState {
    AppState::new(AdminConfig::demo(), Datastore::demo()).unwrap()
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

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

/// Sign in as a demo account and return the session cookie.
async fn login(app: &Router, email: &str) -> String {
    let body = format!("email={}&password=demo", urlencoding::encode(email));
    let response = send(app, post_form("/auth/login", &body, None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
        .unwrap()
}

/// Follow a redirect and return the rendered page.
async fn follow(app: &Router, response: &Response, cookie: &str) -> String {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let page = send(app, get(location(response), Some(cookie))).await;
    assert_eq!(page.status(), StatusCode::OK);
    body_text(page).await
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = router(&demo_state());

    let response = send(&app, get("/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, get("/health/ready", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_pages_require_sign_in() {
    let app = router(&demo_state());

    for uri in ["/", "/registrations", "/gallery", "/contacts", "/admin-users"] {
        let response = send(&app, get(uri, None)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(location(&response), "/auth/login", "{uri}");
    }

    let response = send(&app, get("/auth/login", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains(DEMO_ADMIN_EMAIL));
}

#[tokio::test]
async fn test_login_rejects_unknown_accounts() {
    let app = router(&demo_state());

    let body = "email=someone%40example.com&password=secret";
    let response = send(&app, post_form("/auth/login", body, None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_text(response).await.contains("invalid email or password"));

    let body = format!("email={}&password=", urlencoding::encode(DEMO_ADMIN_EMAIL));
    let response = send(&app, post_form("/auth/login", &body, None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_dashboard_and_logout() {
    let app = router(&demo_state());
    let cookie = login(&app, DEMO_ADMIN_EMAIL).await;

    let response = send(&app, get("/", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Dashboard"));
    assert!(html.contains("Latest registrations"));
    assert!(html.contains("Admin users"));

    let response = send(&app, post_form("/auth/logout", "", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login");

    let response = send(&app, get("/", Some(&cookie))).await;
    assert_eq!(location(&response), "/auth/login");
}

#[tokio::test]
async fn test_subadmin_is_kept_out_of_admin_sections() {
    let state = demo_state();
    let app = router(&state);
    let cookie = login(&app, DEMO_SUBADMIN_EMAIL).await;

    let response = send(&app, get("/registrations", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!body_text(response).await.contains("href=\"/admin-users\""));

    let response = send(&app, get("/admin-users", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(body_text(response).await.contains("Access denied"));

    let uri = format!("/registrations/{}/delete", registration_id(LUCA));
    let response = send(&app, post_form(&uri, "", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(
        state
            .data()
            .registrations
            .get(registration_id(LUCA))
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn test_registration_filters() {
    let app = router(&demo_state());
    let cookie = login(&app, DEMO_SUBADMIN_EMAIL).await;

    let response = send(&app, get("/registrations", Some(&cookie))).await;
    let html = body_text(response).await;
    assert!(html.contains("Luca Rossi"));
    assert!(html.contains("Alessandro Greco"));

    let response = send(&app, get("/registrations?status=cancelled", Some(&cookie))).await;
    let html = body_text(response).await;
    assert!(html.contains("Alessandro Greco"));
    assert!(!html.contains("Luca Rossi"));

    let response = send(
        &app,
        get("/registrations?payment=outstanding&size=m", Some(&cookie)),
    )
    .await;
    let html = body_text(response).await;
    assert!(html.contains("Luca Rossi"));
    assert!(html.contains("Chiara Marino"));
    assert!(!html.contains("Giulia Bianchi"));

    let response = send(
        &app,
        get("/registrations?status=pending&payment=paid", Some(&cookie)),
    )
    .await;
    assert!(body_text(response).await.contains("No registrations match"));

    // Unknown values are ignored rather than rejected
    let response = send(&app, get("/registrations?status=bogus&page=abc", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Luca Rossi"));
}

#[tokio::test]
async fn test_registration_detail() {
    let app = router(&demo_state());
    let cookie = login(&app, DEMO_ADMIN_EMAIL).await;

    let uri = format!("/registrations/{}", registration_id(LUCA));
    let response = send(&app, get(&uri, Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("RSSLCU14C10H501X"));
    assert!(html.contains("Send payment reminder"));
    assert!(html.contains("Delete registration"));

    let uri = format!("/registrations/{}", RegistrationId::generate());
    let response = send(&app, get(&uri, Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_status_and_notes_updates() {
    let state = demo_state();
    let app = router(&state);
    let cookie = login(&app, DEMO_SUBADMIN_EMAIL).await;
    let id = registration_id(MATTEO);

    let uri = format!("/registrations/{id}/status");
    let response = send(&app, post_form(&uri, "status=cancelled", Some(&cookie))).await;
    let html = follow(&app, &response, &cookie).await;
    assert!(html.contains("Matteo Conti is now cancelled."));

    let response = send(&app, post_form(&uri, "status=archived", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let uri = format!("/registrations/{id}/notes");
    let response = send(&app, post_form(&uri, "notes=Arrives+on+Monday", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let registration = state.data().registrations.get(id).await.unwrap().unwrap();
    assert_eq!(registration.status, RegistrationStatus::Cancelled);
    assert_eq!(registration.notes.as_deref(), Some("Arrives on Monday"));

    let response = send(&app, post_form(&uri, "notes=+++", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let registration = state.data().registrations.get(id).await.unwrap().unwrap();
    assert!(registration.notes.is_none());
}

#[tokio::test]
async fn test_manual_payment() {
    let state = demo_state();
    let app = router(&state);
    let cookie = login(&app, DEMO_SUBADMIN_EMAIL).await;
    let id = registration_id(LUCA);
    let uri = format!("/registrations/{id}/payment");

    let response = send(&app, post_form(&uri, "amount=-10", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, post_form(&uri, "amount=lots", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, post_form(&uri, "amount=240%2C00", Some(&cookie))).await;
    let html = follow(&app, &response, &cookie).await;
    assert!(html.contains("Recorded"));

    let registration = state.data().registrations.get(id).await.unwrap().unwrap();
    assert_eq!(registration.amount_paid, Decimal::new(390, 0));
    assert_eq!(registration.payment_status, PaymentStatus::Paid);
    assert!(registration.amount_due().is_zero());
}

#[tokio::test]
async fn test_payment_reminder_is_stamped() {
    let state = demo_state();
    let app = router(&state);
    let cookie = login(&app, DEMO_SUBADMIN_EMAIL).await;

    let id = registration_id(MATTEO);
    let uri = format!("/registrations/{id}/reminder");
    let response = send(&app, post_form(&uri, "", Some(&cookie))).await;
    let html = follow(&app, &response, &cookie).await;
    assert!(html.contains("the reminder was logged instead"));
    let registration = state.data().registrations.get(id).await.unwrap().unwrap();
    assert!(registration.reminder_sent_at.is_some());

    // Nothing owed, nothing sent
    let id = registration_id(GIULIA);
    let uri = format!("/registrations/{id}/reminder");
    let response = send(&app, post_form(&uri, "", Some(&cookie))).await;
    let html = follow(&app, &response, &cookie).await;
    assert!(html.contains("There is no balance due"));
    let registration = state.data().registrations.get(id).await.unwrap().unwrap();
    assert!(registration.reminder_sent_at.is_none());
}

#[tokio::test]
async fn test_admin_deletes_registration() {
    let state = demo_state();
    let app = router(&state);
    let cookie = login(&app, DEMO_ADMIN_EMAIL).await;
    let id = registration_id(GIULIA);

    let uri = format!("/registrations/{id}/delete");
    let response = send(&app, post_form(&uri, "", Some(&cookie))).await;
    assert_eq!(location(&response), "/registrations");
    assert!(state.data().registrations.get(id).await.unwrap().is_none());

    let response = send(&app, post_form(&uri, "", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_user_management() {
    let state = demo_state();
    let app = router(&state);
    let cookie = login(&app, DEMO_ADMIN_EMAIL).await;

    let response = send(&app, get("/admin-users", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains(DEMO_SUBADMIN_EMAIL));

    // Invite
    let body = "email=New.Coach%40Example.com&role=subadmin";
    let response = send(&app, post_form("/admin-users", body, Some(&cookie))).await;
    let html = follow(&app, &response, &cookie).await;
    assert!(html.contains("Invitation sent to new.coach@example.com"));

    let invited = state
        .data()
        .admin_users
        .get_by_email(&Email::parse("new.coach@example.com").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(invited.role, AdminRole::Subadmin);
    assert_eq!(invited.created_by.unwrap().as_str(), DEMO_ADMIN_EMAIL);

    // Inviting the same address twice is reported, not duplicated
    let response = send(&app, post_form("/admin-users", body, Some(&cookie))).await;
    let html = follow(&app, &response, &cookie).await;
    assert!(html.contains("is already an admin user"));

    // Promote, then remove someone else
    let uri = format!("/admin-users/{}/role", invited.id);
    let response = send(&app, post_form(&uri, "role=admin", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let promoted = state.data().admin_users.get(invited.id).await.unwrap().unwrap();
    assert_eq!(promoted.role, AdminRole::Admin);

    let uri = format!("/admin-users/{}/delete", invited.id);
    let response = send(&app, post_form(&uri, "", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(state.data().admin_users.get(invited.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_admin_cannot_modify_self() {
    let state = demo_state();
    let app = router(&state);
    let cookie = login(&app, DEMO_ADMIN_EMAIL).await;
    let me = AdminUserId::new(1);

    let response = send(
        &app,
        post_form(&format!("/admin-users/{me}/delete"), "", Some(&cookie)),
    )
    .await;
    let html = follow(&app, &response, &cookie).await;
    assert!(html.contains("you cannot change your own account"));

    let response = send(
        &app,
        post_form(&format!("/admin-users/{me}/role"), "role=subadmin", Some(&cookie)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let admin = state.data().admin_users.get(me).await.unwrap().unwrap();
    assert_eq!(admin.role, AdminRole::Admin);
}

#[tokio::test]
async fn test_contacts_page() {
    let app = router(&demo_state());
    let cookie = login(&app, DEMO_SUBADMIN_EMAIL).await;

    let response = send(&app, get("/contacts", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Valentina Moretti"));
    assert!(html.contains("Is there a discount for siblings?"));
}

#[tokio::test]
async fn test_gallery_management() {
    let state = demo_state();
    let app = router(&state);
    let cookie = login(&app, DEMO_SUBADMIN_EMAIL).await;

    let response = send(&app, get("/gallery", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Camp 2024"));
    assert!(html.contains("Uploads are disabled"));

    // Create a collection
    let body = "name=Camp+2026&description=Sixth+edition";
    let response = send(&app, post_form("/gallery/collections", body, Some(&cookie))).await;
    let html = follow(&app, &response, &cookie).await;
    assert!(html.contains("Camp 2026"));
    assert!(html.contains("created."));
    let collection = state
        .data()
        .gallery
        .get_collection_by_slug("camp-2026")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(collection.year, Some(2026));
    assert_eq!(collection.description.as_deref(), Some("Sixth edition"));

    let response = send(
        &app,
        post_form("/gallery/collections", "name=%21%21%21", Some(&cookie)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Unfeature the first demo photo
    let response = send(
        &app,
        post_form("/gallery/photos/1/featured", "featured=false", Some(&cookie)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let featured = state.data().gallery.featured_photos(20).await.unwrap();
    assert!(featured.iter().all(|p| p.id != PhotoId::new(1)));

    // Delete it
    let response = send(&app, post_form("/gallery/photos/1/delete", "", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let response = send(&app, post_form("/gallery/photos/1/delete", "", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_needs_storage() {
    let app = router(&demo_state());
    let cookie = login(&app, DEMO_ADMIN_EMAIL).await;

    let boundary = "camp-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"beach.jpg\"\r\n\
         Content-Type: image/jpeg\r\n\r\nnot-really-a-jpeg\r\n--{boundary}--\r\n"
    );
    let request = Request::post("/gallery/photos")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .header(header::COOKIE, &cookie)
        .body(Body::from(body))
        .unwrap();

    let response = send(&app, request).await;
    let html = follow(&app, &response, &cookie).await;
    assert!(html.contains("Photo uploads need Supabase Storage"));
}
