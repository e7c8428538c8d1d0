//! Tests for engine module

use super::*;
use crate::error::{Error, Result};
use crate::facet::{DateWindow, FacetDimension, FacetSpace, WindowMatch};
use crate::pagination::StopReason;
use crate::request::RequestTarget;
use crate::sink::{RecordSink, SinkTarget};
use crate::state::IncrementalCursor;
use crate::types::{JsonValue, WriteMode};
use async_trait::async_trait;
use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;

// ============================================================================
// Test doubles
// ============================================================================

/// Replays canned bodies and records every request
#[derive(Default)]
struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<RequestTarget>>,
}

impl ScriptedTransport {
    fn with_bodies(bodies: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(bodies.into_iter().map(Ok).collect()),
            requests: Mutex::default(),
        }
    }

    fn push_error(&self, error: Error) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    fn requests(&self) -> Vec<RequestTarget> {
        self.requests.lock().unwrap().clone()
    }

    fn param_values(&self, key: &str) -> Vec<Option<String>> {
        self.requests().iter().map(|r| r.param(key)).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn fetch(&self, target: &RequestTarget) -> Result<String> {
        self.requests.lock().unwrap().push(target.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(page_body(json!([]))))
    }
}

#[derive(Default)]
struct VecSink {
    target: Option<SinkTarget>,
    batches: Vec<Vec<JsonValue>>,
    closed: bool,
}

#[async_trait]
impl RecordSink for VecSink {
    async fn open(&mut self, target: &SinkTarget) -> Result<()> {
        self.target = Some(target.clone());
        Ok(())
    }

    async fn write(&mut self, records: &[JsonValue]) -> Result<()> {
        self.batches.push(records.to_vec());
        Ok(())
    }

    async fn close(&mut self) -> Result<u64> {
        self.closed = true;
        Ok(self.batches.iter().map(Vec::len).sum::<usize>() as u64)
    }
}

fn page_body(records: JsonValue) -> String {
    json!({"lista": {"@antal": "x", "item": records}}).to_string()
}

fn descriptor() -> ResourceDescriptor {
    ResourceDescriptor::new("items", "https://data.riksdagen.se/", "itemlista/", "lista.item")
        .with_param("utformat", "json")
}

fn sessions(values: &[&str]) -> FacetDimension {
    FacetDimension::sessions("rm", values.iter().map(|v| (*v).to_string()).collect()).unwrap()
}

fn districts(values: &[&str]) -> FacetDimension {
    FacetDimension::new("valkrets", values.iter().map(|v| (*v).to_string()).collect()).unwrap()
}

async fn collect_records<T: Transport>(controller: &mut PaginationController<T>) -> Vec<JsonValue> {
    controller
        .records()
        .map(|r| r.unwrap())
        .collect::<Vec<_>>()
        .await
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_missing_selector_fails_before_any_request() {
    let transport = ScriptedTransport::default();
    let descriptor = ResourceDescriptor::new("items", "https://api.example", "items", "");

    let err = PaginationController::new(descriptor, &transport).unwrap_err();
    assert!(err.is_configuration());
    assert!(transport.requests().is_empty());
}

#[test]
fn test_bad_selector_is_configuration_error() {
    let descriptor = ResourceDescriptor::new("items", "https://api.example", "items", "a..b");
    let err = PaginationController::new(descriptor, ScriptedTransport::default()).unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_date_cursor_requires_max_page_size() {
    let descriptor = descriptor().with_pagination(PaginationSpec::DateCursor {
        param: "d".to_string(),
        field: "dok_datum".to_string(),
    });
    let err = PaginationController::new(descriptor, ScriptedTransport::default()).unwrap_err();
    assert!(matches!(err, Error::MissingConfigField { .. }));
}

#[test]
fn test_invalid_base_url_is_configuration_error() {
    let descriptor = ResourceDescriptor::new("items", "not a url", "items", "lista.item");
    let err = PaginationController::new(descriptor, ScriptedTransport::default()).unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_zero_page_size_rejected() {
    let descriptor = descriptor().with_page_size(Some("sz"), 0);
    let err = PaginationController::new(descriptor, ScriptedTransport::default()).unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_latest_facet_from_reference_date() {
    let descriptor = descriptor().with_pagination(PaginationSpec::LatestFacet {
        outer: sessions(&["2024/25", "2023/24"]),
        inner: districts(&["Gotlands län"]),
        reference: chrono::NaiveDate::from_ymd_opt(2024, 12, 31),
        facet_field: None,
    });
    let controller = PaginationController::new(descriptor, ScriptedTransport::default()).unwrap();
    let target = controller
        .request_for(&controller.initial_state())
        .unwrap()
        .unwrap();
    assert_eq!(target.param("rm").as_deref(), Some("2024/25"));
    assert_eq!(target.param("valkrets").as_deref(), Some("Gotlands län"));
}

// ============================================================================
// Facet traversal
// ============================================================================

#[tokio::test]
async fn test_cross_facets_request_every_combination_in_order() {
    let bodies = (0..6).map(|i| page_body(json!([{"n": i}]))).collect();
    let transport = ScriptedTransport::with_bodies(bodies);
    let space = FacetSpace::new(vec![
        sessions(&["2024/25", "2023/24"]),
        districts(&["A", "B", "C"]),
    ])
    .unwrap();
    let mut controller = PaginationController::new(
        descriptor().with_pagination(PaginationSpec::Facets { space }),
        &transport,
    )
    .unwrap();
    assert_eq!(controller.strategy(), "cross_facets");

    let records = collect_records(&mut controller).await;
    assert_eq!(records.len(), 6);

    let pairs: Vec<(String, String)> = transport
        .requests()
        .iter()
        .map(|r| (r.param("rm").unwrap(), r.param("valkrets").unwrap()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("2024/25".to_string(), "A".to_string()),
            ("2024/25".to_string(), "B".to_string()),
            ("2024/25".to_string(), "C".to_string()),
            ("2023/24".to_string(), "A".to_string()),
            ("2023/24".to_string(), "B".to_string()),
            ("2023/24".to_string(), "C".to_string()),
        ]
    );
    assert!(transport
        .param_values("utformat")
        .iter()
        .all(|v| v.as_deref() == Some("json")));
}

#[tokio::test]
async fn test_date_window_narrows_facets() {
    let transport = ScriptedTransport::with_bodies(vec![page_body(json!([{"id": 1}]))]);
    let space = FacetSpace::single(sessions(&["2024/25", "2023/24", "2022/23"]));
    let window = DateWindow::parse(Some("2025-01-01"), Some("2025-03-31")).unwrap();

    let mut controller = PaginationController::new(
        descriptor()
            .with_pagination(PaginationSpec::Facets { space })
            .with_window(window),
        &transport,
    )
    .unwrap();
    assert_eq!(
        controller.window_match(),
        WindowMatch::Narrowed { kept: 1, total: 3 }
    );

    let records = collect_records(&mut controller).await;
    assert_eq!(records, vec![json!({"id": 1})]);
    assert_eq!(transport.param_values("rm"), vec![Some("2024/25".to_string())]);
}

#[tokio::test]
async fn test_window_outside_all_sessions_falls_back() {
    let transport = ScriptedTransport::default();
    let space = FacetSpace::single(sessions(&["2024/25", "2023/24"]));
    let window = DateWindow::parse(Some("1800-01-01"), Some("1800-12-31")).unwrap();

    let mut controller = PaginationController::new(
        descriptor()
            .with_pagination(PaginationSpec::Facets { space })
            .with_window(window),
        &transport,
    )
    .unwrap();
    assert_eq!(controller.window_match(), WindowMatch::FellBack);

    collect_records(&mut controller).await;
    assert_eq!(transport.requests().len(), 2);
}

// ============================================================================
// Termination
// ============================================================================

#[tokio::test]
async fn test_malformed_page_stops_and_keeps_earlier_records() {
    let transport = ScriptedTransport::with_bodies(vec![
        page_body(json!([{"id": 1}, {"id": 2}])),
        json!({"error": "Service Unavailable"}).to_string(),
        page_body(json!([{"id": 3}])),
    ]);
    let space = FacetSpace::single(districts(&["A", "B", "C"]));
    let mut controller = PaginationController::new(
        descriptor().with_pagination(PaginationSpec::Facets { space }),
        &transport,
    )
    .unwrap();

    let outcomes: Vec<PageOutcome> = controller
        .pages()
        .map(|o| o.unwrap())
        .collect()
        .await;

    assert_eq!(outcomes.len(), 2);
    assert_eq!(
        outcomes[0],
        PageOutcome::Continue(vec![json!({"id": 1}), json!({"id": 2})])
    );
    assert!(matches!(
        outcomes[1],
        PageOutcome::Fail(StopReason::Malformed(_))
    ));
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test]
async fn test_transport_error_is_surfaced() {
    let transport = ScriptedTransport::with_bodies(vec![page_body(json!([{"id": 1}]))]);
    transport.push_error(Error::http_status(404, "Not Found"));
    let space = FacetSpace::single(districts(&["A", "B", "C"]));
    let mut controller = PaginationController::new(
        descriptor().with_pagination(PaginationSpec::Facets { space }),
        &transport,
    )
    .unwrap();

    let items: Vec<Result<JsonValue>> = controller.records().collect().await;
    assert_eq!(items.len(), 2);
    assert!(items[0].is_ok());
    assert!(matches!(items[1], Err(Error::HttpStatus { status: 404, .. })));
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test]
async fn test_date_cursor_sets_param_and_stops_on_short_page() {
    let transport = ScriptedTransport::with_bodies(vec![
        page_body(json!([{"dok_datum": "2024-01-01"}, {"dok_datum": "2024-01-03"}])),
        page_body(json!([{"dok_datum": "2024-01-04"}])),
    ]);
    let mut controller = PaginationController::new(
        descriptor()
            .with_page_size(Some("sz"), 2)
            .with_pagination(PaginationSpec::DateCursor {
                param: "d".to_string(),
                field: "dok_datum".to_string(),
            }),
        &transport,
    )
    .unwrap();

    let outcomes: Vec<PageOutcome> = controller.pages().map(|o| o.unwrap()).collect().await;
    assert_eq!(outcomes.len(), 2);
    assert_eq!(
        outcomes[1].stop_reason(),
        Some(&StopReason::ShortPage { size: 1, max: 2 })
    );
    assert_eq!(
        transport.param_values("d"),
        vec![None, Some("2024-01-03".to_string())]
    );
    assert!(transport
        .param_values("sz")
        .iter()
        .all(|v| v.as_deref() == Some("2")));
}

#[tokio::test]
async fn test_next_url_keeps_static_params() {
    let transport = ScriptedTransport::with_bodies(vec![
        json!({"lista": {"@nasta": "https://data.riksdagen.se/itemlista/?p=2&utformat=xml", "item": [{"id": 1}]}}).to_string(),
        json!({"lista": {"item": [{"id": 2}]}}).to_string(),
    ]);
    let mut controller = PaginationController::new(
        descriptor().with_pagination(PaginationSpec::NextUrl {
            path: "lista.@nasta".to_string(),
        }),
        &transport,
    )
    .unwrap();

    let records = collect_records(&mut controller).await;
    assert_eq!(records.len(), 2);

    let requests = transport.requests();
    assert!(matches!(requests[1], RequestTarget::RawUrl(_)));
    assert_eq!(requests[1].param("p").as_deref(), Some("2"));
    assert_eq!(requests[1].param("utformat").as_deref(), Some("json"));
}

#[tokio::test]
async fn test_single_page_resource() {
    let transport = ScriptedTransport::with_bodies(vec![page_body(json!([{"id": 1}, {"id": 2}]))]);
    let mut controller = PaginationController::new(descriptor(), &transport).unwrap();
    assert_eq!(collect_records(&mut controller).await.len(), 2);
    assert_eq!(transport.requests().len(), 1);
}

// ============================================================================
// Record admission
// ============================================================================

#[tokio::test]
async fn test_cursor_filters_seen_records() {
    let transport = ScriptedTransport::with_bodies(vec![page_body(json!([
        {"systemnyckel": "99"},
        {"systemnyckel": "100"},
        {"systemnyckel": 150},
        {"text": "no key"}
    ]))]);
    let mut controller = PaginationController::new(
        descriptor().with_cursor(IncrementalCursor::new("systemnyckel", "100")),
        &transport,
    )
    .unwrap();

    let records = collect_records(&mut controller).await;
    assert_eq!(
        records,
        vec![
            json!({"systemnyckel": "100"}),
            json!({"systemnyckel": 150}),
            json!({"text": "no key"}),
        ]
    );

    let tracker = controller.tracker().unwrap();
    assert_eq!(tracker.seen_count(), 1);
    assert_eq!(tracker.unreadable_count(), 1);
    assert_eq!(tracker.current_value().to_string(), "150");
}

#[tokio::test]
async fn test_resume_from_overrides_seed() {
    let transport = ScriptedTransport::with_bodies(vec![page_body(json!([
        {"systemnyckel": 5},
        {"systemnyckel": 50}
    ]))]);
    let mut controller = PaginationController::new(
        descriptor().with_cursor(IncrementalCursor::new("systemnyckel", "0")),
        &transport,
    )
    .unwrap()
    .resume_from(Some("10"));

    assert_eq!(
        collect_records(&mut controller).await,
        vec![json!({"systemnyckel": 50})]
    );
}

#[tokio::test]
async fn test_timestamp_fields_normalised() {
    let transport = ScriptedTransport::with_bodies(vec![page_body(json!([
        {"id": "a", "publicerad": "2024-03-05T10:00:00"},
        {"id": "b", "publicerad": ""}
    ]))]);
    let mut controller = PaginationController::new(
        descriptor().with_timestamp_field("publicerad"),
        &transport,
    )
    .unwrap();

    assert_eq!(
        collect_records(&mut controller).await,
        vec![
            json!({"id": "a", "publicerad": "2024-03-05 10:00:00"}),
            json!({"id": "b", "publicerad": null}),
        ]
    );
}

// ============================================================================
// Harvester
// ============================================================================

#[tokio::test]
async fn test_harvester_batches_into_sink() {
    let bodies = (0..3)
        .map(|i| page_body(json!([{"n": i * 2}, {"n": i * 2 + 1}])))
        .collect();
    let transport = ScriptedTransport::with_bodies(bodies);
    let space = FacetSpace::single(districts(&["A", "B", "C"]));
    let controller = PaginationController::new(
        descriptor()
            .with_pagination(PaginationSpec::Facets { space })
            .with_write_mode(WriteMode::Merge, vec!["n".to_string()]),
        &transport,
    )
    .unwrap();

    let mut sink = VecSink::default();
    let stats = Harvester::new(controller)
        .with_config(HarvestConfig::new().with_batch_size(4))
        .run(&mut sink)
        .await
        .unwrap();

    assert_eq!(stats.records, 6);
    assert_eq!(stats.pages, 3);
    assert_eq!(stats.stop_reason, Some(StopReason::FacetsExhausted));
    assert!(!stats.truncated());
    assert!(sink.closed);
    assert_eq!(
        sink.target,
        Some(SinkTarget::new("items", WriteMode::Merge).with_primary_key(vec!["n".to_string()]))
    );
    assert_eq!(sink.batches.concat().len(), 6);
}

#[tokio::test]
async fn test_harvester_max_records() {
    let bodies = (0..3).map(|_| page_body(json!([{}, {}, {}]))).collect();
    let transport = ScriptedTransport::with_bodies(bodies);
    let space = FacetSpace::single(districts(&["A", "B", "C"]));
    let controller = PaginationController::new(
        descriptor().with_pagination(PaginationSpec::Facets { space }),
        &transport,
    )
    .unwrap();

    let mut sink = VecSink::default();
    let stats = Harvester::new(controller)
        .with_config(HarvestConfig::new().with_max_records(4))
        .run(&mut sink)
        .await
        .unwrap();

    assert_eq!(stats.records, 4);
    assert_eq!(stats.stop_reason, Some(StopReason::RecordLimit));
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test]
async fn test_harvester_reports_malformed_stop() {
    let transport = ScriptedTransport::with_bodies(vec![
        page_body(json!([{"id": 1}])),
        "<html>502</html>".to_string(),
    ]);
    let space = FacetSpace::single(districts(&["A", "B", "C"]));
    let controller = PaginationController::new(
        descriptor().with_pagination(PaginationSpec::Facets { space }),
        &transport,
    )
    .unwrap();

    let mut sink = VecSink::default();
    let stats = Harvester::new(controller).run(&mut sink).await.unwrap();

    assert_eq!(stats.records, 1);
    assert!(stats.truncated());
    assert!(matches!(stats.stop_reason, Some(StopReason::Malformed(_))));
}

#[test]
fn test_harvester_final_cursor_blocking() {
    let transport = ScriptedTransport::with_bodies(vec![page_body(json!([
        {"systemdatum": "2024-05-01 10:00:00"},
        {"systemdatum": "2024-05-02 09:00:00"}
    ]))]);
    let controller = PaginationController::new(
        descriptor().with_cursor(IncrementalCursor::new("systemdatum", "2024-01-01 00:00:00")),
        &transport,
    )
    .unwrap();

    let mut sink = VecSink::default();
    let stats = tokio_test::block_on(Harvester::new(controller).run(&mut sink)).unwrap();
    assert_eq!(stats.final_cursor.as_deref(), Some("2024-05-02 09:00:00"));
    assert_eq!(stats.filtered, 0);
}

// ============================================================================
// Config / stats
// ============================================================================

#[test]
fn test_harvest_config_default() {
    let config = HarvestConfig::default();
    assert_eq!(config.batch_size, 1000);
    assert_eq!(config.max_records, None);
}

#[test]
fn test_page_outcome_accessors() {
    let outcome = PageOutcome::Terminate(vec![json!(1)], StopReason::EmptyPage);
    assert!(!outcome.is_continue());
    assert_eq!(outcome.records(), &[json!(1)]);
    assert_eq!(outcome.stop_reason(), Some(&StopReason::EmptyPage));
    assert!(PageOutcome::Fail(StopReason::Finished).records().is_empty());
}

#[test]
fn test_pagination_spec_kind() {
    assert_eq!(PaginationSpec::None.kind(), "none");
    assert_eq!(
        PaginationSpec::NextUrl {
            path: "x".to_string()
        }
        .kind(),
        "next_url"
    );
}
