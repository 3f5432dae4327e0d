// Integration tests for the GAME matcher
//
// These tests drive the public API end to end with deterministic stub judges.

mod common;

use actix_web::{test, web, App};
use common::{keyed, matcher_with, vocabulary, StubJudge};
use game_matcher::core::{chunk_count, ChunkSize, TemplateRegistry, TournamentEngine};
use game_matcher::models::{Category, MatchRequest, MatchResponse, MATCHER_VERSION};
use game_matcher::routes::{self, socket, AppState};
use game_matcher::services::{JudgeCall, JudgeError};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};

fn cell_lines(n: usize) -> Vec<String> {
    let mut list = vocabulary("CL", n - 1);
    list.insert(n / 2, "K562".to_string());
    list
}

/// Integer ceil(log_c(l)), with a single candidate still needing one round
fn expected_rounds(len: usize, chunk_size: usize) -> usize {
    let mut rounds = 1;
    let mut pool = len;
    while pool > chunk_size {
        pool = pool.div_ceil(chunk_size);
        rounds += 1;
    }
    rounds
}

#[tokio::test]
async fn test_cell_line_found_in_large_vocabulary() {
    let judge = StubJudge::knowledge(&[("Leukemia cell line", "K562")]);
    let matcher = matcher_with(judge.clone(), 20);

    let request = MatchRequest::single(Category::CellType, "Leukemia cell line", cell_lines(300));
    let response = matcher.match_request(&request).await.unwrap();

    assert_eq!(response.cell_type_actual, Some(Some("K562".to_string())));
    assert_eq!(response.matcher_version, MATCHER_VERSION);

    let body = serde_json::to_value(&response).unwrap();
    let keys: Vec<&str> = body.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys.len(), 2, "Only the requested category should be reported: {:?}", keys);
    assert!(body.get("species_actual").is_none());
    assert!(body.get("binding_molecule_actual").is_none());

    // 300 -> 15 chunks, then the lone survivor stops the tournament
    assert_eq!(judge.call_count(), 15);
}

#[tokio::test]
async fn test_cell_line_found_in_short_vocabulary() {
    let judge = StubJudge::knowledge(&[("Leukemia cell line", "K562")]);
    let matcher = matcher_with(judge, 20);

    let request = MatchRequest::single(
        Category::CellType,
        "Leukemia cell line",
        vec!["K562".to_string(), "A549".to_string(), "HepG2".to_string()],
    );
    let response = matcher.match_request(&request).await.unwrap();

    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({ "cell_type_actual": "K562", "matcher_version": MATCHER_VERSION })
    );
}

#[tokio::test]
async fn test_forty_five_candidates_take_two_rounds() {
    let judge = StubJudge::first_pick();
    let engine = TournamentEngine::new(judge.clone(), common::test_policy(20));
    let registry = TemplateRegistry::standard();
    let candidates = vocabulary("C", 45);

    let outcome = engine
        .resolve("anything", &candidates, registry.template_for(Category::CellType))
        .await
        .unwrap();

    assert_eq!(outcome.round_count(), 2);
    assert_eq!(outcome.rounds[0].chunk_sizes, vec![20, 20, 5]);
    assert_eq!(outcome.rounds[0].survivors, 3);
    assert_eq!(outcome.rounds[1].chunk_sizes, vec![3]);
    assert_eq!(outcome.winner.as_deref(), Some("C-0000"));
    assert_eq!(judge.call_count(), 4);
}

#[tokio::test]
async fn test_chunks_within_round_are_judged_concurrently() {
    let judge = StubJudge::with_delay(
        |call: &JudgeCall<'_>| Ok(keyed(call.category, &call.chunk[0])),
        Duration::from_millis(50),
    );
    let engine = TournamentEngine::new(judge.clone(), common::test_policy(20));
    let registry = TemplateRegistry::standard();
    let candidates = vocabulary("C", 45);

    let outcome = engine
        .resolve("anything", &candidates, registry.template_for(Category::CellType))
        .await
        .unwrap();

    assert_eq!(outcome.round_count(), 2);
    assert_eq!(judge.max_in_flight(), 3, "All three round-one chunks should be judged side by side");
}

#[tokio::test]
async fn test_species_without_acceptable_match_reports_null() {
    let judge = StubJudge::new(|call: &JudgeCall<'_>| Ok(keyed(call.category, "NULL")));
    let matcher = matcher_with(judge, 20);

    let request = MatchRequest::single(
        Category::Species,
        "Martian",
        vec!["Homo sapiens".to_string(), "Mus musculus".to_string()],
    );
    let response = matcher.match_request(&request).await.unwrap();
    let body = serde_json::to_value(&response).unwrap();

    assert_eq!(body, json!({ "species_actual": null, "matcher_version": MATCHER_VERSION }));
}

#[tokio::test]
async fn test_all_categories_resolve_concurrently() {
    let judge = StubJudge::with_delay(
        |call: &JudgeCall<'_>| Ok(keyed(call.category, &call.chunk[0])),
        Duration::from_millis(50),
    );
    let matcher = matcher_with(judge.clone(), 20);

    let request = MatchRequest::default()
        .with_pair(Category::CellType, "HeLa", vec!["HeLa".to_string()])
        .with_pair(Category::Species, "human", vec!["Homo sapiens".to_string()])
        .with_pair(Category::BindingMolecule, "anti-CD3", vec!["CD3".to_string()]);
    let response = matcher.match_request(&request).await.unwrap();

    assert_eq!(response.actual(Category::CellType), Some(Some("HeLa")));
    assert_eq!(response.actual(Category::Species), Some(Some("Homo sapiens")));
    assert_eq!(response.actual(Category::BindingMolecule), Some(Some("CD3")));

    // A single-candidate pool is still judged, and each category is judged independently
    let calls = judge.calls();
    assert_eq!(calls.len(), 3);
    for category in Category::ALL {
        assert_eq!(calls.iter().filter(|c| c.category == category).count(), 1);
    }
    assert_eq!(judge.max_in_flight(), 3, "Categories should be judged side by side");
}

#[tokio::test]
async fn test_hallucinated_answer_then_null_yields_null() {
    let judge = StubJudge::new(|call: &JudgeCall<'_>| {
        if call.attempt == 1 {
            Ok(keyed(call.category, "Zebra"))
        } else {
            Ok(keyed(call.category, "NULL"))
        }
    });
    let matcher = matcher_with(judge.clone(), 20);

    let request = MatchRequest::single(
        Category::Species,
        "mouse",
        vec!["Homo sapiens".to_string(), "Mus musculus".to_string()],
    );
    let response = matcher.match_request(&request).await.unwrap();

    assert_eq!(response.species_actual, Some(None));

    let calls = judge.calls();
    assert_eq!(calls.len(), 2, "A malformed answer is re-asked exactly once");
    assert_ne!(calls[0].instruction, calls[1].instruction, "The re-ask uses the stricter prompt");
}

#[tokio::test]
async fn test_round_count_follows_logarithm() {
    for (len, chunk_size) in [(1, 20), (20, 20), (21, 20), (400, 20), (401, 20), (45, 4), (100, 2)] {
        let judge = StubJudge::first_pick();
        let engine = TournamentEngine::new(judge.clone(), common::test_policy(chunk_size));
        let registry = TemplateRegistry::standard();
        let candidates = vocabulary("V", len);

        let outcome = engine
            .resolve("term", &candidates, registry.template_for(Category::Species))
            .await
            .unwrap();

        assert_eq!(
            outcome.round_count(),
            expected_rounds(len, chunk_size),
            "len={} chunk_size={}",
            len,
            chunk_size
        );
        assert_eq!(
            outcome.rounds[0].chunk_sizes.len(),
            chunk_count(len, ChunkSize::new(chunk_size).unwrap())
        );
        assert!(outcome.rounds.iter().flat_map(|r| &r.chunk_sizes).all(|&n| n <= chunk_size));
    }
}

#[tokio::test]
async fn test_winner_is_always_from_vocabulary() {
    // Judge that always proposes something outside the chunk
    let judge = StubJudge::new(|call: &JudgeCall<'_>| Ok(keyed(call.category, "Not a candidate")));
    let matcher = matcher_with(judge, 5);
    let request = MatchRequest::single(Category::BindingMolecule, "IgG", vocabulary("M", 23));

    let response = matcher.match_request(&request).await.unwrap();
    assert_eq!(response.binding_molecule_actual, Some(None));
}

#[tokio::test]
async fn test_judge_outage_is_reported_for_category() {
    let judge = StubJudge::new(|_: &JudgeCall<'_>| Err(JudgeError::Unavailable("connection refused".into())));
    let matcher = matcher_with(judge.clone(), 20);
    let request = MatchRequest::single(Category::Species, "human", vec!["Homo sapiens".to_string()]);

    let err = matcher.match_request(&request).await.unwrap_err();
    assert_eq!(err.category(), Some(Category::Species));
    // Retried up to the attempt limit, and no strict re-ask after a transport failure
    assert_eq!(judge.call_count(), 3);
}

#[actix_web::test]
async fn test_http_match_endpoint() {
    let judge = StubJudge::knowledge(&[("Leukemia cell line", "K562")]);
    let state = AppState { matcher: matcher_with(judge, 20) };
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/match")
        .set_json(json!({
            "cell_type_requested": "  Leukemia cell line  ",
            "cell_type_list": cell_lines(60),
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body, json!({ "cell_type_actual": "K562", "matcher_version": MATCHER_VERSION }));
}

#[actix_web::test]
async fn test_http_rejects_blank_candidate() {
    let state = AppState { matcher: matcher_with(StubJudge::first_pick(), 20) };
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/match")
        .set_json(json!({
            "binding_molecule_requested": "CD3",
            "binding_molecule_list": ["CD3", "  "],
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["category"], "binding_molecule");
}

#[tokio::test]
async fn test_socket_transport_serves_multiple_frames() {
    let judge = StubJudge::knowledge(&[("human", "Homo sapiens")]);
    let matcher = Arc::new(matcher_with(judge, 20));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(socket::serve(listener, matcher, 1024 * 1024));

    let mut stream = TcpStream::connect(addr).await.unwrap();

    let request = json!({
        "species_requested": "human",
        "species_list": ["Mus musculus", "Homo sapiens"],
    });
    socket::write_frame(&mut stream, request.to_string().as_bytes()).await.unwrap();
    let frame = socket::read_frame(&mut stream, 1024 * 1024).await.unwrap().unwrap();
    let response: MatchResponse = serde_json::from_slice(&frame).unwrap();
    assert_eq!(response.species_actual, Some(Some("Homo sapiens".to_string())));

    // Undecodable frames get an error frame and the connection stays open
    socket::write_frame(&mut stream, b"not json").await.unwrap();
    let frame = socket::read_frame(&mut stream, 1024 * 1024).await.unwrap().unwrap();
    let error: Value = serde_json::from_slice(&frame).unwrap();
    assert_eq!(error["error"], "invalid_json");

    socket::write_frame(&mut stream, request.to_string().as_bytes()).await.unwrap();
    assert!(socket::read_frame(&mut stream, 1024 * 1024).await.unwrap().is_some());
}

#[tokio::test]
async fn test_socket_disconnect_abandons_match() {
    let judge = StubJudge::with_delay(
        |call: &JudgeCall<'_>| Ok(keyed(call.category, &call.chunk[0])),
        Duration::from_millis(300),
    );
    let matcher = Arc::new(matcher_with(judge.clone(), 2));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(socket::serve(listener, matcher, 1024 * 1024));

    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = json!({
        "species_requested": "mouse",
        "species_list": vocabulary("S", 8),
    });
    socket::write_frame(&mut stream, request.to_string().as_bytes()).await.unwrap();

    // Round 1 (four chunks of two) is in flight when the client goes away
    tokio::time::sleep(Duration::from_millis(100)).await;
    drop(stream);
    tokio::time::sleep(Duration::from_millis(1200)).await;

    assert_eq!(judge.call_count(), 4, "No round should start after the client disconnected");
}

