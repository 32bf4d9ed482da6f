use signalr_classic::{
    ClientConfig, Endpoint, Scheme, SignalRClient, SignalRError,
    negotiate::{negotiate, start_transport},
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

const CHAT: &str = "[%7B%22Name%22:%22chat%22%7D]";

fn host_of(server: &MockServer) -> String {
    server.uri().trim_start_matches("http://").to_string()
}

async fn mount_negotiate(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/signalr/negotiate"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_negotiate_decodes_parameters() {
    let server = MockServer::start().await;
    mount_negotiate(
        &server,
        r#"{"Url":"/signalr","ConnectionToken":"abc123","ConnectionId":"6f1e","KeepAliveTimeout":20.0,"TryWebSockets":true,"ProtocolVersion":"1.5"}"#,
    )
    .await;

    let endpoint = Endpoint::new(Scheme::Http, &host_of(&server)).unwrap();
    let params = negotiate(&reqwest::Client::new(), &endpoint).await.unwrap();

    assert_eq!(params.base_url, "/signalr");
    assert_eq!(params.connection_token, "abc123");
    assert_eq!(params.connection_id, "6f1e");
    assert_eq!(params.protocol_version, "1.5");
    assert_eq!(params.supports_websockets, Some(true));
}

#[tokio::test]
async fn test_negotiate_malformed_body_is_not_fatal() {
    let server = MockServer::start().await;
    mount_negotiate(&server, "not json").await;

    let endpoint = Endpoint::new(Scheme::Http, &host_of(&server)).unwrap();
    let params = negotiate(&reqwest::Client::new(), &endpoint).await.unwrap();

    assert_eq!(params, Default::default());
    assert!(matches!(
        params.validate(),
        Err(SignalRError::MissingConnectionToken)
    ));
}

#[tokio::test]
async fn test_negotiate_network_failure_is_fatal() {
    // Порт закрыт сразу после старта сервера
    let server = MockServer::start().await;
    let host = host_of(&server);
    drop(server);

    let endpoint = Endpoint::new(Scheme::Http, &host).unwrap();
    let result = negotiate(&reqwest::Client::new(), &endpoint).await;
    assert!(matches!(result, Err(SignalRError::Reqwest(_))));
}

#[tokio::test]
async fn test_start_sends_handshake_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/signalr/start"))
        .and(query_param("clientProtocol", "1.5"))
        .and(query_param("transport", "webSockets"))
        .and(query_param("connectionToken", "abc123"))
        .and(query_param("connectionData", r#"[{"Name":"chat"}]"#))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"Response":"started"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let endpoint = Endpoint::new(Scheme::Http, &host_of(&server)).unwrap();
    let params = signalr_classic::negotiate::decode_negotiation(
        br#"{"Url":"/signalr","ConnectionToken":"abc123","ProtocolVersion":"1.5"}"#,
    );
    let body = start_transport(&reqwest::Client::new(), &endpoint, &params, CHAT)
        .await
        .unwrap();

    assert_eq!(body, r#"{"Response":"started"}"#);
}

#[tokio::test]
async fn test_client_handshake() {
    let server = MockServer::start().await;
    mount_negotiate(
        &server,
        r#"{"Url":"/signalr","ConnectionToken":"abc123","TryWebSockets":true,"ProtocolVersion":"1.5"}"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/signalr/start"))
        .and(query_param("connectionToken", "abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"Response":"started"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let host = host_of(&server);
    let client = SignalRClient::new(ClientConfig::new(Scheme::Http, host.as_str(), "chat"));
    let handshake = client.handshake().await.unwrap();

    assert_eq!(handshake.connection_data, CHAT);
    assert_eq!(handshake.start_response, r#"{"Response":"started"}"#);
    assert_eq!(
        handshake.connect_url().as_str(),
        format!(
            "wss://{host}/signalr/connect?clientProtocol=1.5&connectionToken=abc123&transport=webSockets&connectionData={CHAT}"
        )
    );
}

#[tokio::test]
async fn test_client_handshake_rejects_missing_websockets() {
    let server = MockServer::start().await;
    mount_negotiate(
        &server,
        r#"{"ConnectionToken":"abc123","TryWebSockets":false,"ProtocolVersion":"1.5"}"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/signalr/start"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = SignalRClient::new(ClientConfig::new(Scheme::Http, host_of(&server), "chat"));
    let result = client.handshake().await;

    assert!(matches!(result, Err(SignalRError::WebSocketsUnsupported)));
}

#[tokio::test]
async fn test_client_handshake_without_try_websockets() {
    let server = MockServer::start().await;
    mount_negotiate(
        &server,
        r#"{"Url":"/signalr","ConnectionToken":"abc123","ProtocolVersion":"1.5"}"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/signalr/start"))
        .and(query_param("clientProtocol", "1.5"))
        .and(query_param("transport", "webSockets"))
        .and(query_param("connectionToken", "abc123"))
        .and(query_param("connectionData", r#"[{"Name":"chat"}]"#))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"Response":"started"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let client = SignalRClient::new(ClientConfig::new(Scheme::Http, host_of(&server), "chat"));
    let handshake = client.handshake().await.unwrap();

    assert_eq!(handshake.parameters.supports_websockets, None);
    assert_eq!(handshake.start_response, r#"{"Response":"started"}"#);
}

#[tokio::test]
async fn test_start_unreadable_body_is_not_fatal() {
    // Сервер обещает 64 байта тела и обрывает соединение
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let host = listener.local_addr().unwrap().to_string();
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 1024];
        let _ = socket.read(&mut request).await;
        socket
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 64\r\n\r\n{\"Resp")
            .await
            .unwrap();
        let _ = socket.shutdown().await;
    });

    let endpoint = Endpoint::new(Scheme::Http, &host).unwrap();
    let params = signalr_classic::negotiate::decode_negotiation(
        br#"{"ConnectionToken":"abc123","ProtocolVersion":"1.5"}"#,
    );
    let body = start_transport(&reqwest::Client::new(), &endpoint, &params, CHAT)
        .await
        .unwrap();

    assert_eq!(body, "");
    server.await.unwrap();
}
