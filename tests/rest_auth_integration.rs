use std::sync::Arc;

use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use edgex_api_client::EdgexError;
use edgex_api_client::auth::stark::{StarkSignature, message_hash, public_key, verify};
use edgex_api_client::auth::{
    ACCOUNT_ID_HEADER, FixedClock, SIGNATURE_HEADER, StaticCredentials, TIMESTAMP_HEADER,
    signing_string,
};
use edgex_api_client::rest::EdgexRestClient;

const PRIVATE_KEY: &str = "0x2f8c9e4b1a7d3c5e6f0a1b2c3d4e5f60718293a4b5c6d7e8f90a1b2c3d4e5f6";
const TIMESTAMP: u64 = 1_700_000_000_000;

fn build_client(server: &MockServer, with_credentials: bool) -> EdgexRestClient {
    let mut builder = EdgexRestClient::builder()
        .base_url(server.uri())
        .timestamp_provider(Arc::new(FixedClock(TIMESTAMP)));
    if with_credentials {
        builder = builder.credentials(Arc::new(StaticCredentials::new(42, PRIVATE_KEY)));
    }
    builder.build()
}

fn success(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "code": "SUCCESS",
        "data": data,
        "msg": null,
        "errorParam": null
    }))
}

#[tokio::test]
async fn test_public_request_has_only_timestamp() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/public/time"))
        .and(header(TIMESTAMP_HEADER, "1700000000000"))
        .respond_with(success(serde_json::json!({"timeMillis": "1700000000123"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = build_client(&server, true);
    let time = client.get_server_time().await.unwrap();
    assert_eq!(time["timeMillis"], "1700000000123");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get(SIGNATURE_HEADER).is_none());
    assert!(requests[0].headers.get(ACCOUNT_ID_HEADER).is_none());
}

#[tokio::test]
async fn test_private_request_is_signed() {
    let server = MockServer::start().await;
    let positions_path = "/api/v1/private/accounts/42/positions";
    Mock::given(method("GET"))
        .and(path(positions_path))
        .and(header(TIMESTAMP_HEADER, "1700000000000"))
        .and(header(ACCOUNT_ID_HEADER, "42"))
        .and(header_exists(SIGNATURE_HEADER))
        .respond_with(success(serde_json::json!([{"contractId": "10000001"}])))
        .expect(1)
        .mount(&server)
        .await;

    let client = build_client(&server, true);
    let positions = client.get_positions().await.unwrap();
    assert_eq!(positions[0]["contractId"], "10000001");

    let requests = server.received_requests().await.unwrap();
    let signature = requests[0]
        .headers
        .get(SIGNATURE_HEADER)
        .unwrap()
        .to_str()
        .unwrap();
    let signature = StarkSignature::from_header_value(signature).unwrap();
    let hash = message_hash(&signing_string(TIMESTAMP, "GET", positions_path));
    assert!(verify(&public_key(PRIVATE_KEY).unwrap(), &hash, &signature).unwrap());
}

#[tokio::test]
async fn test_signature_excludes_query_string() {
    let server = MockServer::start().await;
    let fills_path = "/api/v1/private/orders/fills/42";
    Mock::given(method("GET"))
        .and(path(fills_path))
        .respond_with(success(serde_json::json!({"dataList": []})))
        .mount(&server)
        .await;

    let client = build_client(&server, true);
    let request = edgex_api_client::rest::private::ContractHistoryRequest::for_contract("10000001")
        .size(10);
    client.get_order_fill_transactions(&request).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].url.query().unwrap().contains("contractId=10000001"));
    let signature = StarkSignature::from_header_value(
        requests[0].headers.get(SIGNATURE_HEADER).unwrap().to_str().unwrap(),
    )
    .unwrap();
    let hash = message_hash(&signing_string(TIMESTAMP, "GET", fills_path));
    assert!(verify(&public_key(PRIVATE_KEY).unwrap(), &hash, &signature).unwrap());
}

#[tokio::test]
async fn test_private_call_without_credentials() {
    let server = MockServer::start().await;
    let client = build_client(&server, false);

    let err = client.get_account_asset().await.unwrap_err();
    assert!(matches!(err, EdgexError::AuthConfiguration(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_api_error_carries_code_and_operation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/private/accounts/42/positions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": "INVALID_SIGNATURE",
            "msg": "signature mismatch",
            "errorParam": {"field": "signature"},
            "data": null
        })))
        .mount(&server)
        .await;

    let client = build_client(&server, true);
    let err = client.get_positions().await.unwrap_err();
    let api = err.api_error().unwrap();
    assert_eq!(api.code, "INVALID_SIGNATURE");
    assert_eq!(api.operation, "get positions");
    assert_eq!(
        err.to_string(),
        "edgeX API error: failed to get positions: INVALID_SIGNATURE: signature mismatch"
    );
}

#[tokio::test]
async fn test_http_error_without_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/public/metadata"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let client = build_client(&server, false);
    let err = client.get_metadata().await.unwrap_err();
    assert!(matches!(err, EdgexError::InvalidResponse(msg) if msg.contains("502")));
}
