#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::Arc;

use salessync_client::config::{parse_config, ConfigV1};
use salessync_client::navigation::RecordingNavigator;
use salessync_client::startup::build;
use salessync_client::state::AppState;

/// Millisecond backoff so retry tests stay fast; remote tenant lookup off.
pub fn test_config(base_url: &str) -> ConfigV1 {
    let yaml = format!(
        r#"
version: "1.0.0"
api:
  base_url: "{}"
  timeout_in_ms: 2000
retry:
  base_delay_ms: 1
  max_jitter_ms: 0
  max_delay_ms: 20
tenant:
  remote_enabled: false
storage:
  enabled: false
logging:
  level: "debug"
  format: "json"
"#,
        base_url
    );
    parse_config(&yaml).expect("test config should parse")
}

pub fn build_client(config: ConfigV1, page: &str) -> (AppState, Arc<RecordingNavigator>) {
    let navigator = Arc::new(RecordingNavigator::new(page));
    let app = build(Arc::new(config), navigator.clone()).expect("client should build");
    (app, navigator)
}

/// A port nothing listens on.
pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}
