//! End-to-end wizard runs against an in-process assessment service.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use image::{ImageFormat, RgbImage};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::io::Cursor;
use std::sync::Arc;

use signcheck::error::CONFIG_LOAD_MESSAGE;
use signcheck::photo::ImageProcessor;
use signcheck::services::{ApiClient, DraftStore, MemorySessionStore};
use signcheck::wizard::{StepStatus, View, WizardController};
use signcheck::WizardError;

struct MockService {
    config: Value,
    config_status: StatusCode,
    assess_status: StatusCode,
    assess_body: Value,
    submit_status: StatusCode,
    submit_body: Value,
    assessed: Mutex<Vec<Value>>,
    submitted: Mutex<Vec<Value>>,
}

impl MockService {
    fn new(config: Value, assess_body: Value) -> Self {
        Self {
            config,
            config_status: StatusCode::OK,
            assess_status: StatusCode::OK,
            assess_body,
            submit_status: StatusCode::OK,
            submit_body: json!({"success": true}),
            assessed: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
        }
    }
}

async fn config(State(mock): State<Arc<MockService>>) -> (StatusCode, Json<Value>) {
    (mock.config_status, Json(mock.config.clone()))
}

async fn assess(
    State(mock): State<Arc<MockService>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    mock.assessed.lock().push(body);
    (mock.assess_status, Json(mock.assess_body.clone()))
}

async fn submit(
    State(mock): State<Arc<MockService>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    mock.submitted.lock().push(body);
    (mock.submit_status, Json(mock.submit_body.clone()))
}

async fn serve(mock: MockService) -> (String, Arc<MockService>) {
    let mock = Arc::new(mock);
    let app = Router::new()
        .route("/api/config", get(config))
        .route("/api/assess", post(assess))
        .route("/api/submit", post(submit))
        .with_state(mock.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), mock)
}

fn schema() -> Value {
    json!({
        "metadata_fields": [
            {"id": "inspector_name", "label": "Inspector Name", "type": "text", "required": true},
            {"id": "reviewed_on", "label": "Date Reviewed", "type": "date", "required": true},
            {"id": "building", "label": "Building", "type": "select", "required": true,
             "options": ["Library", "Union"]},
            {"id": "screen_location", "label": "Screen Location", "type": "dependent_select",
             "depends_on": "building", "options_map": {"Library": ["Lobby"], "Union": ["Food Court"]}},
            {"id": "floor_owner", "label": "Floor Owner", "type": "auto",
             "lookup_from": "floor_owners", "lookup_key": "screen_location"}
        ],
        "ai_inferred_fields": [
            {"id": "sign_type", "label": "Sign Type", "options": ["Wall", "Freestanding"]}
        ],
        "categories": [
            {"id": "lighting", "name": "Lighting", "guidance": "Is the sign lit evenly?\nLook for glare."}
        ],
        "overall_rating": {"label": "Accessibility Rating", "options": ["Good", "Fair", "Poor"]},
        "final_comments": {"label": "Additional Comments"},
        "floor_owners": {"Lobby": "Facilities"}
    })
}

fn assessment() -> Value {
    json!({
        "assessments": {"lighting": "Adequate"},
        "inferred_metadata": {"sign_type": "Wall", "additional_context": "Faces <east>"},
        "accessibility_rating": "Good",
        "final_comments": "",
        "overall_notes": "Mounted near the elevators"
    })
}

fn photo(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, image::Rgb([240, 240, 240]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
}

async fn controller(base_url: &str, drafts: DraftStore) -> WizardController {
    let api = ApiClient::new(base_url, 10).unwrap();
    WizardController::start(api, drafts, ImageProcessor::default())
        .await
        .unwrap()
}

fn fresh_drafts() -> DraftStore {
    DraftStore::new(Arc::new(MemorySessionStore::new()))
}

fn fill_step_one(controller: &mut WizardController) {
    let form = controller.form_mut().unwrap();
    form.set_value("inspector_name", "Sam Rivera").unwrap();
    form.set_value("building", "Library").unwrap();
    form.set_value("screen_location", "Lobby").unwrap();
}

async fn reach_review(controller: &mut WizardController) {
    fill_step_one(controller);
    controller.next().unwrap();
    controller.select_photo(photo(2400, 1600)).await.unwrap();
    let change = controller.analyze().await.unwrap();
    assert_eq!(change.to, View::Step3);
}

#[tokio::test]
async fn full_run_renders_review_and_submits() {
    let (url, mock) = serve(MockService::new(schema(), assessment())).await;
    let mut wizard = controller(&url, fresh_drafts()).await;

    reach_review(&mut wizard).await;

    let sent = mock.assessed.lock()[0].clone();
    assert_eq!(sent["media_type"], "image/jpeg");
    assert!(!sent["image"].as_str().unwrap().is_empty());
    assert_eq!(sent["metadata"]["floor_owner"], "Facilities");
    assert_eq!(sent["metadata"]["inspector_name"], "Sam Rivera");

    let review = wizard.review().unwrap();
    assert_eq!(review.category_text("lighting"), Some("Adequate"));
    assert_eq!(review.categories[0].hint, "Is the sign lit evenly?");
    assert_eq!(review.rating.value(), "Good");
    assert_eq!(review.inferred[0].control.value(), "Wall");
    assert_eq!(review.extra_lines[0].label, "Additional Context");
    assert_eq!(review.extra_lines[0].value_html, "Faces &lt;east&gt;");

    let change = wizard.submit().await.unwrap();
    assert_eq!(change.to, View::Success);
    assert_eq!(change.indicator.steps, [StepStatus::Completed; 3]);

    let submitted = mock.submitted.lock()[0].clone();
    assert_eq!(submitted["assessments"]["lighting"], "Adequate");
    assert_eq!(submitted["accessibility_rating"], "Good");
    assert_eq!(submitted["overall_notes"], "Mounted near the elevators");
    assert_eq!(submitted["image"], sent["image"]);
    assert_eq!(submitted["metadata"]["screen_location"], "Lobby");
}

#[tokio::test]
async fn reviewer_dropdown_change_reaches_submission() {
    let (url, mock) = serve(MockService::new(schema(), assessment())).await;
    let mut wizard = controller(&url, fresh_drafts()).await;
    reach_review(&mut wizard).await;

    let review = wizard.review_mut().unwrap();
    review.set_inferred("sign_type", "Freestanding").unwrap();
    review.set_assessor_comments("Verified on site.");
    wizard.submit().await.unwrap();

    let submitted = mock.submitted.lock()[0].clone();
    assert_eq!(submitted["inferred_metadata"]["sign_type"], "Freestanding");
    assert_eq!(submitted["inferred_metadata"]["additional_context"], "Faces <east>");
    assert_eq!(submitted["assessor_comments"], "Verified on site.");
}

#[tokio::test]
async fn blank_required_field_blocks_photo_step() {
    let (url, mock) = serve(MockService::new(schema(), assessment())).await;
    let mut wizard = controller(&url, fresh_drafts()).await;

    let form = wizard.form_mut().unwrap();
    form.set_value("inspector_name", "  ").unwrap();
    form.set_value("building", "Union").unwrap();

    let err = wizard.next().unwrap_err();
    assert!(matches!(err, WizardError::Validation { ref fields } if fields == &["inspector_name"]));
    assert!(!err.shows_banner());
    assert_eq!(wizard.view(), View::Step1);
    assert_eq!(wizard.state().indicator().status(2), Some(StepStatus::Pending));
    assert!(wizard.form().field("inspector_name").unwrap().invalid);
    assert!(wizard.state().banner().is_none());
    assert!(mock.assessed.lock().is_empty());
}

#[tokio::test]
async fn draft_survives_back_navigation_and_reset() {
    let (url, _mock) = serve(MockService::new(schema(), assessment())).await;
    let drafts = fresh_drafts();
    let mut wizard = controller(&url, drafts.clone()).await;

    fill_step_one(&mut wizard);
    wizard.next().unwrap();
    wizard.back().unwrap();
    assert_eq!(wizard.form().value("inspector_name"), Some("Sam Rivera"));
    assert_eq!(wizard.form().value("screen_location"), Some("Lobby"));

    // A new form in the same session restores the saved answers
    let saved = drafts.load();
    assert_eq!(saved["building"], "Library");
    assert_eq!(saved["floor_owner"], "Facilities");
    let rebuilt = controller(&url, drafts.clone()).await;
    assert_eq!(rebuilt.form().value("screen_location"), Some("Lobby"));
    assert_eq!(rebuilt.form().value("floor_owner"), Some("Facilities"));

    // Finish a run, reset, and the answers are still there
    wizard.next().unwrap();
    wizard.select_photo(photo(800, 600)).await.unwrap();
    wizard.analyze().await.unwrap();
    wizard.submit().await.unwrap();
    let change = wizard.reset().unwrap();
    assert_eq!(change.to, View::Step1);
    assert!(wizard.state().image().is_none());
    assert!(wizard.review().is_none());
    assert_eq!(wizard.form().value("inspector_name"), Some("Sam Rivera"));
}

#[tokio::test]
async fn assess_failure_returns_to_photo_step_with_server_message() {
    let mut mock = MockService::new(schema(), json!({"error": "AI analysis failed: overloaded"}));
    mock.assess_status = StatusCode::INTERNAL_SERVER_ERROR;
    let (url, _mock) = serve(mock).await;
    let mut wizard = controller(&url, fresh_drafts()).await;

    fill_step_one(&mut wizard);
    wizard.next().unwrap();
    wizard.select_photo(photo(100, 100)).await.unwrap();

    let err = wizard.analyze().await.unwrap_err();
    assert!(matches!(err, WizardError::Remote { status: 500, .. }));
    assert_eq!(wizard.view(), View::Step2);
    assert_eq!(wizard.state().banner(), Some("AI analysis failed: overloaded"));
    assert!(wizard.state().image().is_some());
}

#[tokio::test]
async fn submit_failure_keeps_review_and_reenables_submit() {
    let mut mock = MockService::new(schema(), assessment());
    mock.submit_status = StatusCode::BAD_GATEWAY;
    mock.submit_body = json!("upstream down");
    let (url, _mock) = serve(mock).await;
    let mut wizard = controller(&url, fresh_drafts()).await;
    reach_review(&mut wizard).await;

    wizard.submit().await.unwrap_err();
    assert_eq!(wizard.view(), View::Step3);
    assert!(wizard.state().submit_enabled());
    assert_eq!(wizard.state().banner(), Some("Server error (502)"));
}

#[tokio::test]
async fn submit_outside_review_sends_nothing_and_leaves_submit_enabled() {
    let (url, mock) = serve(MockService::new(schema(), assessment())).await;
    let mut wizard = controller(&url, fresh_drafts()).await;

    let err = wizard.submit().await.unwrap_err();
    assert!(matches!(err, WizardError::InvalidTransition { .. }));
    assert!(mock.submitted.lock().is_empty());

    reach_review(&mut wizard).await;
    assert!(wizard.state().submit_enabled());
    wizard.submit().await.unwrap();
    assert_eq!(mock.submitted.lock().len(), 1);
}

#[tokio::test]
async fn config_failure_is_fatal() {
    let mut mock = MockService::new(json!({}), assessment());
    mock.config_status = StatusCode::SERVICE_UNAVAILABLE;
    let (url, _mock) = serve(mock).await;

    let api = ApiClient::new(&url, 10).unwrap();
    let err = WizardController::start(api, fresh_drafts(), ImageProcessor::default())
        .await
        .err()
        .unwrap();
    assert!(matches!(err, WizardError::ConfigLoad(_)));
    assert_eq!(err.user_message(), CONFIG_LOAD_MESSAGE);
}

#[tokio::test]
async fn late_assessment_after_back_is_ignored() {
    let (url, _mock) = serve(MockService::new(schema(), assessment())).await;
    let api = ApiClient::new(&url, 10).unwrap();
    let schema = serde_json::from_value(schema()).unwrap();
    let mut wizard = WizardController::with_schema(
        schema,
        api.clone(),
        fresh_drafts(),
        ImageProcessor::default(),
        today(),
    )
    .unwrap();

    fill_step_one(&mut wizard);
    wizard.next().unwrap();
    wizard.select_photo(photo(64, 64)).await.unwrap();

    let (ticket, request) = wizard.begin_analyze().unwrap();
    assert_eq!(wizard.view(), View::Loading);
    wizard.back().unwrap();

    let result = api.assess(&request).await;
    assert!(result.is_ok());
    assert_eq!(wizard.finish_analyze(ticket, result).unwrap(), None);
    assert_eq!(wizard.view(), View::Step2);
    assert!(wizard.review().is_none());
}

#[tokio::test]
async fn unreadable_photo_keeps_previous_one() {
    let (url, _mock) = serve(MockService::new(schema(), assessment())).await;
    let mut wizard = controller(&url, fresh_drafts()).await;
    fill_step_one(&mut wizard);
    wizard.next().unwrap();

    wizard.select_photo(photo(3000, 1000)).await.unwrap();
    let before = wizard.state().image().cloned().unwrap();
    assert_eq!((before.width, before.height), (1920, 640));

    let err = wizard.select_photo(b"definitely not a jpeg".to_vec()).await.unwrap_err();
    assert!(matches!(err, WizardError::Image(_)));
    assert!(wizard.state().banner().unwrap().starts_with("Could not process the photo"));
    assert_eq!(wizard.state().image(), Some(&before));
}
