//! HTTP transport tests.
//!
//! Runs a small axum stand-in for the fleet-management service on a local
//! port and drives `FleetGroupClient` over `HttpFleetApi` against it.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};

use fleetscale_group::*;

type Seen = Arc<Mutex<Vec<Value>>>;

const USER: &str =
    "a user request explicitly set group desired capacity changing the desired capacity";

async fn describe_groups(Json(body): Json<Value>) -> Json<Value> {
    let name = body["AutoScalingGroupNames"][0].as_str().unwrap_or_default();
    if name != "web" {
        return Json(json!({ "AutoScalingGroups": [] }));
    }
    Json(json!({
        "AutoScalingGroups": [{
            "AutoScalingGroupName": "web",
            "DesiredCapacity": 4,
            "MinSize": 1,
            "MaxSize": 10,
            "Instances": [
                { "InstanceId": "i-1", "LifecycleState": "Pending" },
                { "InstanceId": "i-2", "LifecycleState": "InService" },
                { "InstanceId": "i-3", "LifecycleState": "Pending:Wait" },
                { "InstanceId": "i-4", "LifecycleState": "Terminating" }
            ]
        }]
    }))
}

async fn set_desired(State(seen): State<Seen>, Json(body): Json<Value>) -> Response {
    seen.lock().unwrap().push(body.clone());
    let desired = body["DesiredCapacity"].as_u64().unwrap_or_default();
    if desired > 10 {
        return (
            StatusCode::BAD_REQUEST,
            format!("ValidationError: New SetDesiredCapacity value {desired} is above max value 10"),
        )
            .into_response();
    }
    Json(json!({})).into_response()
}

async fn describe_activities(State(seen): State<Seen>, Json(body): Json<Value>) -> Json<Value> {
    seen.lock().unwrap().push(body.clone());
    match body.get("NextToken").and_then(Value::as_str) {
        None => Json(json!({
            "Activities": [
                {
                    "ActivityId": "A",
                    "StatusCode": "Successful",
                    "Cause": format!("At 2024-05-01T10:05:00Z {USER} from 4 to 3. shrinking the capacity from 4 to 3.")
                },
                { "ActivityId": "B", "StatusCode": "Failed", "Cause": "anything" }
            ],
            "NextToken": "page-2"
        })),
        Some(_) => Json(json!({
            "Activities": [{
                "ActivityId": "C",
                "StatusCode": "Successful",
                "Cause": format!("At 2024-05-01T10:00:00Z {USER} from 3 to 4. increasing the capacity from 3 to 4.")
            }]
        })),
    }
}

async fn garbage() -> &'static str {
    "this is not json"
}

async fn spawn_service(seen: Seen) -> SocketAddr {
    let app = Router::new()
        .route("/DescribeAutoScalingGroups", post(describe_groups))
        .route("/SetDesiredCapacity", post(set_desired))
        .route("/DescribeScalingActivities", post(describe_activities))
        .with_state(seen);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn spawn_garbage_service() -> SocketAddr {
    let app = Router::new().route("/DescribeScalingActivities", post(garbage));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client_for(addr: SocketAddr, group: &str) -> FleetGroupClient {
    FleetGroupClient::new(group, Arc::new(HttpFleetApi::new(addr.to_string())))
}

#[tokio::test]
async fn describe_over_http() {
    let addr = spawn_service(Seen::default()).await;
    let snap = client_for(addr, "web").describe().await.unwrap();
    assert_eq!(
        snap,
        GroupStateSnapshot {
            pending: 2,
            desired_count: 4,
            min_size: 1,
            max_size: 10,
        }
    );
}

#[tokio::test]
async fn describe_unknown_group_over_http() {
    let addr = spawn_service(Seen::default()).await;
    let err = client_for(addr, "batch").describe().await.unwrap_err();
    assert_eq!(err, UpstreamError::GroupNotFound("batch".to_string()));
}

#[tokio::test]
async fn set_desired_sends_cooldown_override() {
    let seen = Seen::default();
    let addr = spawn_service(seen.clone()).await;

    client_for(addr, "web").set_desired_capacity(7).await.unwrap();

    let bodies = seen.lock().unwrap().clone();
    assert_eq!(
        bodies,
        vec![json!({
            "AutoScalingGroupName": "web",
            "DesiredCapacity": 7,
            "HonorCooldown": false
        })]
    );
}

#[tokio::test]
async fn service_rejection_maps_to_service_error() {
    let addr = spawn_service(Seen::default()).await;
    let err = client_for(addr, "web")
        .set_desired_capacity(25)
        .await
        .unwrap_err();
    match err {
        UpstreamError::Service { status, message } => {
            assert_eq!(status, 400);
            assert!(message.contains("above max value 10"));
        }
        other => panic!("expected service error, got {other:?}"),
    }
}

#[tokio::test]
async fn reconcile_over_http_follows_tokens() {
    let seen = Seen::default();
    let addr = spawn_service(seen.clone()).await;

    let result = client_for(addr, "web")
        .last_scaling_activities()
        .await
        .unwrap();

    assert_eq!(result.last_scale_in.unwrap().activity_id, "A");
    assert_eq!(result.last_scale_out.unwrap().activity_id, "C");
    assert_eq!(result.scan.pages_fetched, 2);
    assert_eq!(result.scan.activities_examined, 3);

    let bodies = seen.lock().unwrap().clone();
    assert_eq!(bodies[0], json!({ "AutoScalingGroupName": "web" }));
    assert_eq!(bodies[1]["NextToken"], "page-2");
}

#[tokio::test]
async fn non_json_body_is_malformed_response() {
    let addr = spawn_garbage_service().await;
    let err = client_for(addr, "web")
        .activities_page(None)
        .await
        .unwrap_err();
    assert!(matches!(err, UpstreamError::MalformedResponse(_)));
}
