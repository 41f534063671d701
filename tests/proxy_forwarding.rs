//! End-to-end proxy toggling through the console.

use std::sync::{Arc, Mutex};

use apimock::config::MockConfig;

mod common;

#[tokio::test]
async fn test_console_toggles_forwarding() {
    let seen = Arc::new(Mutex::new(Vec::<String>::new()));
    let recorder = seen.clone();
    let backend = common::start_programmable_backend(move |target| {
        let recorder = recorder.clone();
        async move {
            recorder.lock().unwrap().push(target);
            (200, "from backend".to_string())
        }
    })
    .await;

    let dir = tempfile::tempdir().unwrap();
    common::write_file(
        dir.path(),
        "routes/foo/bar.toml",
        "[get]\nstatus = 200\ntext = \"from mock\"\n",
    );
    let config = MockConfig {
        base_path: dir.path().to_path_buf(),
        proxy_url: Some(format!("http://{}", backend)),
        ..MockConfig::default()
    };
    let (addr, server, shutdown) = common::start_mock_server(config).await;
    let console = server.console();
    let client = common::client();
    let url = format!("http://{}/foo/bar?x=1", addr);

    let local = client.get(&url).send().await.unwrap();
    assert_eq!(local.text().await.unwrap(), "from mock");

    let output = console.execute("proxy on /foo/bar");
    assert_eq!(
        output.lines,
        vec![format!(
            "Requests to /foo/bar will be proxied to http://{}/foo/bar",
            backend
        )]
    );

    let proxied = client.get(&url).send().await.unwrap();
    assert_eq!(proxied.status(), 200);
    assert_eq!(proxied.text().await.unwrap(), "from backend");
    assert_eq!(seen.lock().unwrap().as_slice(), ["/foo/bar?x=1".to_string()]);

    console.execute("proxy off /foo/bar");
    let local = client.get(&url).send().await.unwrap();
    assert_eq!(local.text().await.unwrap(), "from mock");
    assert_eq!(seen.lock().unwrap().len(), 1);

    let status = console.execute("proxy status").lines;
    assert_eq!(status.last().map(String::as_str), Some("[-] /foo/bar/"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_backend_is_bad_gateway() {
    // Bind and drop to get a port nothing listens on.
    let closed = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let mut config = MockConfig {
        base_path: dir.path().to_path_buf(),
        proxy_url: Some(format!("http://{}", closed)),
        ..MockConfig::default()
    };
    config.proxy_paths.insert(String::new(), true);
    let (addr, _server, shutdown) = common::start_mock_server(config).await;

    let response = common::client()
        .get(format!("http://{}/anything", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 502);
    assert_eq!(response.text().await.unwrap(), "Bad Gateway");

    shutdown.trigger();
}
