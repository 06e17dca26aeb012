//! `/info/...` and `/ping` endpoints exercised through the full router.

mod common;

use axum::http::StatusCode;
use common::*;
use rest_gateway::adapters::InMemoryIndex;
use serde_json::json;

#[tokio::test]
async fn test_coin_supply() {
    let app = app(None, ScriptedNode::default());

    let response = get(&app, "/info/coinsupply").await;
    assert_status(&response, StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({
            "circulatingSupply": "2456700000000000000",
            "totalSupply": "2456700000000000000",
            "maxSupply": "2900000000000000000",
        })
    );
}

#[tokio::test]
async fn test_circulating_and_total_are_plain_text() {
    let app = app(None, ScriptedNode::default());

    let response = get(&app, "/info/coinsupply/circulating").await;
    assert_status(&response, StatusCode::OK);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    assert_eq!(body_text(response).await, "24567000000.0");

    let response = get(&app, "/info/coinsupply/circulating?in_billion=true").await;
    assert_eq!(body_text(response).await, "24.57");

    let response = get(&app, "/info/coinsupply/total").await;
    assert_eq!(body_text(response).await, "24567000000.0");

    let response = get(&app, "/info/coinsupply/circulating?in_millions=true").await;
    assert_status(&response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_market_cap_number_and_label() {
    let app = app(None, ScriptedNode::default());

    let response = get(&app, "/info/marketcap").await;
    assert_eq!(body_json(response).await, json!({ "marketcap": 3_070_875_000u64 }));

    let response = get(&app, "/info/marketcap?stringOnly=true").await;
    assert_eq!(body_json(response).await, json!("3.1B"));
}

#[tokio::test]
async fn test_fee_estimate() {
    let app = app(None, ScriptedNode::default());
    let response = get(&app, "/info/fee-estimate").await;
    assert_status(&response, StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["priorityBucket"]["feerate"], 3.0);
    assert_eq!(body["normalBuckets"].as_array().unwrap().len(), 1);

    let node = ScriptedNode {
        fee_estimate: None,
        ..Default::default()
    };
    let app = common::app(None, node);
    let response = get(&app, "/info/fee-estimate").await;
    assert_status(&response, StatusCode::NOT_IMPLEMENTED);
}

#[tokio::test]
async fn test_blockdag_and_network_match() {
    let app = app(None, ScriptedNode::default());

    let blockdag = body_json(get(&app, "/info/blockdag").await).await;
    let network = body_json(get(&app, "/info/network").await).await;
    assert_eq!(blockdag, network);
    assert_eq!(blockdag["networkName"], "kaspa-mainnet");
    assert_eq!(blockdag["virtualDaaScore"], "19989984");
}

#[tokio::test]
async fn test_kaspad_info_hides_p2p_id() {
    let app = app(None, ScriptedNode::default());

    let body = body_json(get(&app, "/info/kaspad").await).await;
    assert_eq!(
        body["p2pIdHashed"],
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
    assert!(body.get("p2pId").is_none());
    assert_eq!(body["serverVersion"], "0.12.2");
}

#[tokio::test]
async fn test_virtual_chain_blue_score() {
    let app = app(None, ScriptedNode::default());
    let body = body_json(get(&app, "/info/virtual-chain-blue-score").await).await;
    assert_eq!(body, json!({ "blueScore": 260_890 }));
}

#[tokio::test]
async fn test_node_offline_is_internal_error() {
    let node = ScriptedNode {
        online: false,
        ..Default::default()
    };
    let app = app(None, node);

    let response = get(&app, "/info/blockdag").await;
    assert_status(&response, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({ "message": "Internal server error" })
    );
}

#[tokio::test]
async fn test_ping_healthy() {
    let app = app(Some(InMemoryIndex::new()), ScriptedNode::default());

    let response = get(&app, "/ping").await;
    assert_status(&response, StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({
            "kaspad": {
                "is_online": true,
                "server_version": "0.12.2",
                "is_utxo_indexed": true,
                "is_synced": true,
            },
            "database": { "is_online": true },
        })
    );
}

#[tokio::test]
async fn test_ping_without_database_skips_probe() {
    let app = app(None, ScriptedNode::default());

    let response = get(&app, "/ping").await;
    assert_status(&response, StatusCode::OK);
    assert_eq!(body_json(response).await["database"]["is_online"], false);
}

#[tokio::test]
async fn test_ping_fails_when_unsynced_or_offline() {
    let node = ScriptedNode {
        synced: false,
        ..Default::default()
    };
    let response = get(&app(None, node), "/ping").await;
    assert_status(&response, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["kaspad"]["is_synced"], false);

    let index = InMemoryIndex::new();
    index.set_offline(true);
    let response = get(&app(Some(index), ScriptedNode::default()), "/ping").await;
    assert_status(&response, StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["kaspad"]["is_online"], true);
    assert_eq!(body["database"]["is_online"], false);

    let node = ScriptedNode {
        online: false,
        ..Default::default()
    };
    let response = get(&app(None, node), "/ping").await;
    assert_status(&response, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["kaspad"]["is_online"], false);
}

#[tokio::test]
async fn test_cors_headers_exposed() {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    let app = app(None, ScriptedNode::default());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/info/blockdag")
                .header("origin", "https://explorer.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let headers = response.headers();
    assert_eq!(
        headers["access-control-allow-origin"],
        "https://explorer.example"
    );
    let exposed = headers["access-control-expose-headers"]
        .to_str()
        .unwrap()
        .to_ascii_lowercase();
    assert!(exposed.contains("x-current-page"));
    assert!(exposed.contains("x-oldest-epoch-millis"));
}
