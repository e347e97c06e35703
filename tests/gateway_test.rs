mod common;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use url::Url;

use mission_portal::gateway::{CancellationHandle, FetchOptions, GatewayError, MappingError, MissionGateway};
use mission_portal::identity::{AccessToken, StaticIdentity};

fn gateway(endpoint: Url) -> MissionGateway {
    let identity = Arc::new(StaticIdentity::new(AccessToken::new(common::ACCESS_TOKEN)));
    MissionGateway::new(&common::upstream_config(endpoint), identity).expect("gateway")
}

fn token() -> AccessToken {
    AccessToken::new(common::ACCESS_TOKEN)
}

#[tokio::test]
async fn list_keeps_upstream_order_and_maps_fields() -> Result<()> {
    let upstream = common::MockUpstream::spawn().await?;
    let missions = gateway(upstream.endpoint("")).list_missions(&token()).await?;

    let ids: Vec<u64> = missions.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![8, 11, 13]);

    let apollo_11 = &missions[1];
    assert_eq!(apollo_11.title, "Apollo 11");
    assert_eq!(apollo_11.commander, "Neil Armstrong");
    assert_eq!(apollo_11.senior_pilot_or_command_module_pilot, "Michael Collins");
    assert_eq!(apollo_11.pilot_or_lunar_module_pilot, "Buzz Aldrin");
    assert_eq!(apollo_11.launch_date, "1969-07-16T13:32:00Z");

    assert_eq!(
        upstream.requests(),
        vec!["/items?$select=Id,Title,Rocket,Commander,SrPilotCmPilot,PilotLmPilot,LaunchDate&$orderby=LaunchDate"]
    );
    Ok(())
}

#[tokio::test]
async fn empty_list_is_not_an_error() -> Result<()> {
    let upstream = common::MockUpstream::spawn().await?;
    let missions = gateway(upstream.endpoint("/empty")).list_missions(&token()).await?;
    assert!(missions.is_empty());
    Ok(())
}

#[tokio::test]
async fn single_mission_is_addressed_by_id() -> Result<()> {
    let upstream = common::MockUpstream::spawn().await?;
    let mission = gateway(upstream.endpoint("")).get_mission(&token(), 13).await?;

    assert_eq!(mission.id, 13);
    assert_eq!(mission.commander, "Jim Lovell");
    assert!(upstream.requests()[0].starts_with("/items(13)?$select="));
    assert!(!upstream.requests()[0].contains("$orderby"));
    Ok(())
}

#[tokio::test]
async fn missing_mission_reports_status_and_reason() -> Result<()> {
    let upstream = common::MockUpstream::spawn().await?;
    let err = gateway(upstream.endpoint("")).get_mission(&token(), 99).await.unwrap_err();

    assert!(matches!(err, GatewayError::UpstreamStatus { status: 404, .. }));
    assert_eq!(err.to_string(), "[404]Not Found");
    Ok(())
}

#[tokio::test]
async fn rejected_token_surfaces_upstream_status() -> Result<()> {
    let upstream = common::MockUpstream::spawn().await?;
    let err = gateway(upstream.endpoint("/forbidden"))
        .list_missions(&token())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "[403]Forbidden");

    let err = gateway(upstream.endpoint(""))
        .list_missions(&AccessToken::new("stale"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "[401]Unauthorized");
    Ok(())
}

#[tokio::test]
async fn malformed_body_is_a_mapping_error() -> Result<()> {
    let upstream = common::MockUpstream::spawn().await?;
    let err = gateway(upstream.endpoint("/broken"))
        .list_missions(&token())
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Mapping(MappingError::Payload(_))));
    Ok(())
}

#[tokio::test]
async fn unreachable_upstream_is_a_transport_error() -> Result<()> {
    let base = common::closed_port_url().await?;
    let endpoint = Url::parse(&format!("{}/items", base))?;
    let err = gateway(endpoint).list_missions(&token()).await.unwrap_err();
    assert!(matches!(err, GatewayError::Transport(_)));
    Ok(())
}

#[tokio::test]
async fn slow_upstream_times_out() -> Result<()> {
    let upstream = common::MockUpstream::spawn().await?;
    let options = FetchOptions {
        timeout: Some(Duration::from_millis(200)),
        cancellation: None,
    };

    let started = std::time::Instant::now();
    let err = gateway(upstream.endpoint("/slow"))
        .list_missions_with(&token(), &options)
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::Timeout(d) if d == Duration::from_millis(200)));
    assert!(started.elapsed() < Duration::from_secs(2));
    Ok(())
}

#[tokio::test]
async fn in_flight_request_can_be_cancelled() -> Result<()> {
    let upstream = common::MockUpstream::spawn().await?;
    let handle = CancellationHandle::new();
    let options = FetchOptions {
        timeout: None,
        cancellation: Some(handle.clone()),
    };

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.cancel();
    });

    let err = gateway(upstream.endpoint("/slow"))
        .get_mission_with(&token(), 11, &options)
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Cancelled));
    Ok(())
}

#[tokio::test]
async fn upstream_requires_json_accept_header() -> Result<()> {
    let upstream = common::MockUpstream::spawn().await?;

    // Same request without the Accept header is refused by the list
    let bare = reqwest::Client::new()
        .get(upstream.endpoint(""))
        .bearer_auth(common::ACCESS_TOKEN)
        .send()
        .await?;
    assert_eq!(bare.status(), reqwest::StatusCode::NOT_ACCEPTABLE);

    // The gateway's list and detail queries both get through
    let gateway = gateway(upstream.endpoint(""));
    assert_eq!(gateway.list_missions(&token()).await?.len(), 3);
    assert_eq!(gateway.get_mission(&token(), 8).await?.id, 8);
    Ok(())
}
