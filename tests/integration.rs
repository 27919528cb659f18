use anyhow::{Result, anyhow};
use std::sync::{Arc, Mutex};

use shipping_manager::api::ShipmentApi;
use shipping_manager::config::Config;
use shipping_manager::error::{ApiError, SubmitError};
use shipping_manager::form::{CREATE_FAILED_MESSAGE, SUBMITTING_LABEL, VALIDATION_MESSAGE};
use shipping_manager::models::{CreateShipmentRequest, FieldValue, Shipment, ShipmentDraft};
use shipping_manager::notify::{NotificationContent, Severity};
use shipping_manager::page::{LinkOpener, Page};
use shipping_manager::view::{FormView, HtmlPage, SUBMIT_LABEL};
use tokio::sync::{Semaphore, mpsc};

const FIXTURE: &str = r#"[{"recipient":"A","service":"Ground","weight":2,"address":"1 Main St","createdAt":"2024-01-01T00:00:00Z","trackingNumber":"T1","labelPath":"/l/1.pdf"}]"#;

const CREATED: &str = r#"{"recipient":"Ada","service":"Express","weight":3.5,"address":"2 Side St","createdAt":"2024-02-01T10:00:00Z","trackingNumber":"T2"}"#;

/// Canned reply, turned into a fresh `ApiError` on every call.
#[derive(Clone)]
enum Reply {
    Body(&'static str),
    Status(u16),
}

fn list_reply(reply: &Reply) -> Result<Vec<Shipment>, ApiError> {
    match reply {
        Reply::Body(body) => {
            let value: serde_json::Value = serde_json::from_str(body)?;
            if !value.is_array() {
                return Err(ApiError::NotAList);
            }
            Ok(serde_json::from_value(value)?)
        }
        Reply::Status(status) => Err(ApiError::Status {
            status: *status,
            body: String::new(),
        }),
    }
}

fn create_reply(reply: &Reply) -> Result<Shipment, ApiError> {
    match reply {
        Reply::Body(body) => Ok(serde_json::from_str(body)?),
        Reply::Status(status) => Err(ApiError::Status {
            status: *status,
            body: String::new(),
        }),
    }
}

#[derive(Clone)]
struct MockApi {
    list: Arc<Mutex<Reply>>,
    create: Reply,
    list_calls: Arc<Mutex<usize>>,
    create_calls: Arc<Mutex<Vec<CreateShipmentRequest>>>,
}

impl MockApi {
    fn new(list: Reply, create: Reply) -> Self {
        Self {
            list: Arc::new(Mutex::new(list)),
            create,
            list_calls: Arc::new(Mutex::new(0)),
            create_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn set_list(&self, reply: Reply) {
        *self.list.lock().unwrap() = reply;
    }

    fn list_calls(&self) -> usize {
        *self.list_calls.lock().unwrap()
    }

    fn create_calls(&self) -> Vec<CreateShipmentRequest> {
        self.create_calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ShipmentApi for MockApi {
    async fn list_shipments(&self) -> Result<Vec<Shipment>, ApiError> {
        *self.list_calls.lock().unwrap() += 1;
        let reply = self.list.lock().unwrap().clone();
        list_reply(&reply)
    }

    async fn create_shipment(&self, request: &CreateShipmentRequest) -> Result<Shipment, ApiError> {
        self.create_calls.lock().unwrap().push(request.clone());
        tokio::task::yield_now().await;
        create_reply(&self.create)
    }
}

#[derive(Default)]
struct RecordingOpener {
    opened: Mutex<Vec<String>>,
}

impl LinkOpener for RecordingOpener {
    fn open(&self, url: &str) -> Result<()> {
        self.opened
            .lock()
            .map_err(|_| anyhow!("opener lock poisoned"))?
            .push(url.to_string());
        Ok(())
    }
}

fn test_config() -> Config {
    Config {
        api_url: "http://shipping.test".to_string(),
        ..Config::default()
    }
}

fn page_with(api: &MockApi) -> Page {
    Page::new(
        &test_config(),
        Arc::new(api.clone()),
        Arc::new(RecordingOpener::default()),
    )
}

/// Records the submit control as the API sees it during a create call.
struct ObservingApi {
    inner: MockApi,
    form: Arc<HtmlPage>,
    seen: Mutex<Vec<(bool, String)>>,
}

#[async_trait::async_trait]
impl ShipmentApi for ObservingApi {
    async fn list_shipments(&self) -> Result<Vec<Shipment>, ApiError> {
        self.inner.list_shipments().await
    }

    async fn create_shipment(&self, request: &CreateShipmentRequest) -> Result<Shipment, ApiError> {
        self.seen
            .lock()
            .unwrap()
            .push((self.form.is_submit_enabled(), self.form.submit_label()));
        self.inner.create_shipment(request).await
    }
}

/// Holds every create call until the test opens the gate.
struct GatedApi {
    gate: Semaphore,
    create_calls: Mutex<usize>,
}

#[async_trait::async_trait]
impl ShipmentApi for GatedApi {
    async fn list_shipments(&self) -> Result<Vec<Shipment>, ApiError> {
        Ok(Vec::new())
    }

    async fn create_shipment(&self, _request: &CreateShipmentRequest) -> Result<Shipment, ApiError> {
        *self.create_calls.lock().unwrap() += 1;
        let _permit = self.gate.acquire().await.expect("gate is never closed");
        create_reply(&Reply::Body(CREATED))
    }
}

fn assert_control_restored(page: &Page) {
    assert!(page.html().is_submit_enabled());
    assert_eq!(page.html().submit_label(), SUBMIT_LABEL);
}

#[tokio::test]
async fn load_renders_one_card_per_shipment() {
    let api = MockApi::new(Reply::Body(FIXTURE), Reply::Status(500));
    let page = page_with(&api);

    assert_eq!(page.load().await.unwrap(), 1);

    let list = page.html().list_html();
    assert_eq!(list.matches(r#"<div class="card">"#).count(), 1);
    assert!(list.contains("<strong>A</strong>"));
    assert!(list.contains("Ground"));
    assert!(list.contains("2 lb"));
    assert!(list.contains(r#"href="/l/1.pdf""#));
    assert!(list.contains("Tracking: T1"));
}

#[tokio::test]
async fn pending_label_and_missing_tracking() {
    let api = MockApi::new(
        Reply::Body(r#"[{"recipient":"B","service":"Ground","weight":1,"address":"x","createdAt":"2024-01-01T00:00:00Z"}]"#),
        Reply::Status(500),
    );
    let page = page_with(&api);

    page.load().await.unwrap();

    let list = page.html().list_html();
    assert!(list.contains("Label not ready"));
    assert!(list.contains("Tracking: N/A"));
}

#[tokio::test]
async fn odd_record_does_not_hide_the_others() {
    let api = MockApi::new(
        Reply::Body(
            r#"[
                {"recipient":"A","service":"Ground","weight":2,"address":"1 Main St","createdAt":"2024-01-01T00:00:00Z","trackingNumber":"T1","labelPath":"/l/1.pdf"},
                {"recipient":"B","service":"Air","weight":"3","address":"2 Side St","createdAt":1704067200000,"trackingNumber":12345},
                {"recipient":"C","service":"Sea","weight":4,"address":"3 Dock Rd","createdAt":"2024-01-01"}
            ]"#,
        ),
        Reply::Status(500),
    );
    let page = page_with(&api);

    assert_eq!(page.load().await.unwrap(), 3);

    let list = page.html().list_html();
    assert_eq!(list.matches(r#"<div class="card">"#).count(), 3);
    assert!(!list.contains("Error loading shipments"));
    assert!(list.contains("Tracking: T1"));
    assert!(list.contains("<strong>B</strong> — Air — 3 lb"));
    assert!(list.contains("Tracking: 12345"));
    assert!(list.contains("<strong>C</strong> — Sea — 4 lb"));
    assert!(!list.contains("Invalid Date"));
}

#[tokio::test]
async fn non_array_body_renders_inline_error() {
    let api = MockApi::new(Reply::Body(FIXTURE), Reply::Status(500));
    let page = page_with(&api);
    page.load().await.unwrap();

    api.set_list(Reply::Body(r#"{"recipient":"A"}"#));
    let result = page.refresh().await;

    assert!(matches!(result, Err(ApiError::NotAList)));
    let list = page.html().list_html();
    assert_eq!(list.matches(r#"<div class="card">"#).count(), 1);
    assert!(list.contains("Error loading shipments: Expected array of shipments"));
    assert!(!list.contains("Tracking: T1"));
}

#[tokio::test]
async fn failed_status_renders_inline_error() {
    let api = MockApi::new(Reply::Status(503), Reply::Status(500));
    let page = page_with(&api);

    assert!(page.load().await.is_err());
    assert!(page
        .html()
        .list_html()
        .contains("Error loading shipments: HTTP error! status: 503"));
}

#[tokio::test]
async fn missing_field_never_reaches_the_api() {
    for missing in 0..4 {
        let api = MockApi::new(Reply::Body("[]"), Reply::Body(CREATED));
        let page = page_with(&api);

        let mut draft = ShipmentDraft::new("Ada", "2 Side St", "3.5", "Express");
        match missing {
            0 => draft.recipient = None,
            1 => draft.address = Some(String::new()),
            2 => draft.weight = None,
            _ => draft.service = Some(String::new()),
        }
        page.html().fill(draft);

        let result = page.click_submit().await.expect("control is enabled");

        assert!(matches!(result, Err(SubmitError::Validation(_))));
        assert!(api.create_calls().is_empty());
        assert_eq!(api.list_calls(), 0);
        assert_eq!(
            page.html().notification(),
            Some((
                NotificationContent::Message(VALIDATION_MESSAGE.to_string()),
                Severity::Error
            ))
        );
        assert_control_restored(&page);
    }
}

#[tokio::test]
async fn successful_create_clears_form_notifies_and_refreshes() {
    let api = MockApi::new(Reply::Body(FIXTURE), Reply::Body(CREATED));
    let page = page_with(&api);
    page.html()
        .fill(ShipmentDraft::new("Ada", "2 Side St", "3.5", "Express"));

    let submitted = page
        .click_submit()
        .await
        .expect("control is enabled")
        .expect("create succeeds");

    assert_eq!(submitted.shipment.recipient.as_deref(), Some("Ada"));
    assert_eq!(page.html().read_form(), ShipmentDraft::default());
    assert_eq!(
        page.html().notification(),
        Some((
            NotificationContent::ShipmentCreated {
                recipient: Some("Ada".into()),
                service: Some("Express".into()),
                weight: Some(FieldValue::Number(3.5)),
            },
            Severity::Success
        ))
    );
    assert_control_restored(&page);

    let calls = api.create_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].weight, 3.5);

    submitted.refresh.await.unwrap();
    assert_eq!(api.list_calls(), 1);
    assert!(page.html().list_html().contains("Tracking: T1"));
}

#[tokio::test]
async fn failing_refresh_does_not_change_submit_outcome() {
    let api = MockApi::new(Reply::Status(500), Reply::Body(CREATED));
    let page = page_with(&api);
    page.html()
        .fill(ShipmentDraft::new("Ada", "2 Side St", "3.5", "Express"));

    let submitted = page.click_submit().await.unwrap().unwrap();
    submitted.refresh.await.unwrap();

    assert!(matches!(
        page.html().notification(),
        Some((NotificationContent::ShipmentCreated { .. }, Severity::Success))
    ));
    assert!(page.html().list_html().contains("Error loading shipments"));
}

#[tokio::test]
async fn failed_create_reports_error_and_restores_control() {
    let api = MockApi::new(Reply::Body(FIXTURE), Reply::Status(500));
    let page = page_with(&api);
    let draft = ShipmentDraft::new("Ada", "2 Side St", "3.5", "Express");
    page.html().fill(draft.clone());

    let result = page.click_submit().await.unwrap();

    assert!(matches!(
        result,
        Err(SubmitError::Api(ApiError::Status { status: 500, .. }))
    ));
    assert_eq!(
        page.html().notification(),
        Some((
            NotificationContent::Message(CREATE_FAILED_MESSAGE.to_string()),
            Severity::Error
        ))
    );
    assert_control_restored(&page);
    assert_eq!(page.html().read_form(), draft);
    assert_eq!(api.list_calls(), 0);
}

#[tokio::test]
async fn malformed_create_body_is_a_generic_failure() {
    let api = MockApi::new(Reply::Body(FIXTURE), Reply::Body("not json"));
    let page = page_with(&api);
    page.html()
        .fill(ShipmentDraft::new("Ada", "2 Side St", "3.5", "Express"));

    let result = page.click_submit().await.unwrap();

    assert!(matches!(result, Err(SubmitError::Api(ApiError::Decode(_)))));
    assert_eq!(
        page.html().notification_text().as_deref(),
        Some(CREATE_FAILED_MESSAGE)
    );
    assert_control_restored(&page);
}

#[tokio::test]
async fn click_while_in_flight_is_dropped() {
    let api = MockApi::new(Reply::Body(FIXTURE), Reply::Body(CREATED));
    let page = page_with(&api);
    page.html()
        .fill(ShipmentDraft::new("Ada", "2 Side St", "3.5", "Express"));

    let (first, second) = tokio::join!(page.click_submit(), page.click_submit());

    assert!(matches!(first, Some(Ok(_))));
    assert!(second.is_none());
    assert_eq!(api.create_calls().len(), 1);
}

#[tokio::test]
async fn control_is_disabled_while_create_is_in_flight() {
    for create in [Reply::Body(CREATED), Reply::Status(500)] {
        let html = Arc::new(HtmlPage::new());
        let api = Arc::new(ObservingApi {
            inner: MockApi::new(Reply::Body(FIXTURE), create),
            form: html.clone(),
            seen: Mutex::new(Vec::new()),
        });
        let page = Page::with_html(
            &test_config(),
            html,
            api.clone(),
            Arc::new(RecordingOpener::default()),
        );
        page.html()
            .fill(ShipmentDraft::new("Ada", "2 Side St", "3.5", "Express"));

        let result = page.click_submit().await.expect("control is enabled");

        assert_eq!(
            *api.seen.lock().unwrap(),
            vec![(false, SUBMITTING_LABEL.to_string())]
        );
        if let Ok(submitted) = result {
            submitted.refresh.await.unwrap();
        }
        assert_control_restored(&page);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_clicks_create_once() {
    const CLICKS: usize = 8;

    let api = Arc::new(GatedApi {
        gate: Semaphore::new(0),
        create_calls: Mutex::new(0),
    });
    let page = Arc::new(Page::new(
        &test_config(),
        api.clone(),
        Arc::new(RecordingOpener::default()),
    ));
    page.html()
        .fill(ShipmentDraft::new("Ada", "2 Side St", "3.5", "Express"));

    let (tx, mut rx) = mpsc::unbounded_channel();
    for _ in 0..CLICKS {
        let page = page.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let outcome = page.click_submit().await.map(|result| result.is_ok());
            let _ = tx.send(outcome);
        });
    }
    drop(tx);

    // the claiming click is parked on the gate, every other one returns
    for _ in 1..CLICKS {
        assert_eq!(rx.recv().await, Some(None));
    }
    assert_eq!(*api.create_calls.lock().unwrap(), 1);

    api.gate.add_permits(1);
    assert_eq!(rx.recv().await, Some(Some(true)));
    assert_eq!(rx.recv().await, None);
    assert_control_restored(&page);
}

#[tokio::test]
async fn unparseable_weight_is_forwarded() {
    let api = MockApi::new(Reply::Body(FIXTURE), Reply::Body(CREATED));
    let page = page_with(&api);
    page.html()
        .fill(ShipmentDraft::new("Ada", "2 Side St", "heavy", "Express"));

    let result = page.click_submit().await.unwrap();

    assert!(result.is_ok());
    let calls = api.create_calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].weight.is_nan());
}

#[tokio::test]
async fn merge_opens_last_five_download() {
    let api = MockApi::new(Reply::Body("[]"), Reply::Body(CREATED));
    let page = page_with(&api);

    assert_eq!(
        page.click_merge(),
        "http://shipping.test/api/shipments/merge-last-5"
    );
    assert!(page
        .render()
        .contains(r#"href="http://shipping.test/api/shipments/merge-last-5""#));
}
