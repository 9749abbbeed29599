//! JSON-over-HTTP transport to the fleet-management service.
//!
//! Each operation is a `POST /{Action}` against the configured endpoint
//! with a JSON body using the service's PascalCase field names:
//!
//! | Action | Request | Response |
//! |---|---|---|
//! | `DescribeAutoScalingGroups` | `{"AutoScalingGroupNames": [name]}` | `{"AutoScalingGroups": [group]}` |
//! | `SetDesiredCapacity` | `SetDesiredCapacityRequest` | ignored |
//! | `DescribeScalingActivities` | `{"AutoScalingGroupName", "NextToken"?}` | `ActivityPage` |
//!
//! One HTTP/1.1 connection per request. No timeout and no retry; callers
//! bound latency themselves.

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{CONTENT_TYPE, HOST, USER_AGENT};
use http::{Method, Request};
use http_body_util::{BodyExt, Full};
use hyper_util::rt::TokioIo;
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tracing::debug;

use crate::api::FleetApi;
use crate::error::{FleetResult, UpstreamError};
use crate::types::{ActivityPage, GroupDescription, SetDesiredCapacityRequest};

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeGroupsRequest<'a> {
    auto_scaling_group_names: [&'a str; 1],
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeGroupsResponse {
    #[serde(default)]
    auto_scaling_groups: Vec<GroupDescription>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeActivitiesRequest<'a> {
    auto_scaling_group_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_token: Option<&'a str>,
}

/// Fleet-management client speaking JSON over HTTP/1.1.
#[derive(Debug, Clone)]
pub struct HttpFleetApi {
    /// `host:port` of the service.
    endpoint: String,
}

impl HttpFleetApi {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST `payload` to `/{action}` and return the body of a 2xx response.
    async fn post(&self, action: &str, payload: Vec<u8>) -> FleetResult<Bytes> {
        let transport = |stage: &str, e: &dyn std::fmt::Display| {
            UpstreamError::Transport(format!("{action} {stage} {}: {e}", self.endpoint))
        };

        let stream = TcpStream::connect(&self.endpoint)
            .await
            .map_err(|e| transport("connect to", &e))?;
        let io = TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| transport("handshake with", &e))?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!(error = %e, "fleet connection closed with error");
            }
        });

        let req = Request::builder()
            .method(Method::POST)
            .uri(format!("/{action}"))
            .header(HOST, self.endpoint.as_str())
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, "fleetscale/0.1")
            .body(Full::new(Bytes::from(payload)))
            .map_err(|e| transport("build request for", &e))?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| transport("request to", &e))?;
        let status = resp.status();
        let body = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| transport("read response from", &e))?
            .to_bytes();

        debug!(action, status = status.as_u16(), bytes = body.len(), "fleet call completed");

        if !status.is_success() {
            return Err(UpstreamError::Service {
                status: status.as_u16(),
                message: String::from_utf8_lossy(&body).trim().to_string(),
            });
        }
        Ok(body)
    }
}

fn encode(action: &str, value: &impl Serialize) -> FleetResult<Vec<u8>> {
    serde_json::to_vec(value)
        .map_err(|e| UpstreamError::Transport(format!("encode {action} request: {e}")))
}

fn decode<T: serde::de::DeserializeOwned>(action: &str, body: &[u8]) -> FleetResult<T> {
    serde_json::from_slice(body)
        .map_err(|e| UpstreamError::MalformedResponse(format!("{action}: {e}")))
}

#[async_trait]
impl FleetApi for HttpFleetApi {
    async fn describe_group(&self, group: &str) -> FleetResult<Option<GroupDescription>> {
        const ACTION: &str = "DescribeAutoScalingGroups";
        let payload = encode(
            ACTION,
            &DescribeGroupsRequest {
                auto_scaling_group_names: [group],
            },
        )?;
        let body = self.post(ACTION, payload).await?;
        let resp: DescribeGroupsResponse = decode(ACTION, &body)?;
        Ok(resp.auto_scaling_groups.into_iter().next())
    }

    async fn set_desired_capacity(&self, request: &SetDesiredCapacityRequest) -> FleetResult<()> {
        const ACTION: &str = "SetDesiredCapacity";
        let payload = encode(ACTION, request)?;
        self.post(ACTION, payload).await?;
        Ok(())
    }

    async fn describe_activities(
        &self,
        group: &str,
        next_token: Option<&str>,
    ) -> FleetResult<ActivityPage> {
        const ACTION: &str = "DescribeScalingActivities";
        let payload = encode(
            ACTION,
            &DescribeActivitiesRequest {
                auto_scaling_group_name: group,
                next_token,
            },
        )?;
        let body = self.post(ACTION, payload).await?;
        decode(ACTION, &body)
    }
}
