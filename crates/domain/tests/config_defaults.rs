use mon_domain::config::{BrowserKind, Config};

#[test]
fn empty_toml_document_yields_all_defaults() {
    let cfg: Config = toml::from_str("").expect("empty document should deserialize via defaults");
    assert_eq!(cfg.server.port, 8080);
    assert_eq!(cfg.server.host, "127.0.0.1");
    assert_eq!(cfg.scheduler.grace_period_seconds, 300);
    assert_eq!(cfg.probe.timeout_seconds, 30);
    assert_eq!(cfg.breaker.failure_threshold, 5);
    assert_eq!(cfg.debug.flush_interval_ms, 1000);
    assert_eq!(cfg.sla.cache_ttl_seconds, 300);
    assert_eq!(cfg.browser.kind, BrowserKind::Chromium);
    assert!(cfg.validate().is_empty());
}

#[test]
fn partial_toml_overrides_only_named_fields() {
    let toml_src = r#"
        [server]
        port = 9000

        [probe]
        timeout_seconds = 5
    "#;
    let cfg: Config = toml::from_str(toml_src).expect("partial document should deserialize");
    assert_eq!(cfg.server.port, 9000);
    assert_eq!(cfg.server.host, "127.0.0.1");
    assert_eq!(cfg.probe.timeout_seconds, 5);
    assert_eq!(cfg.probe.retries, 2);
}

#[test]
fn round_trips_through_serialize_and_deserialize() {
    let mut cfg = Config::default();
    cfg.server.port = 1234;
    cfg.breaker.failure_threshold = 10;

    let serialized = toml::to_string(&cfg).expect("config should serialize");
    let reparsed: Config = toml::from_str(&serialized).expect("serialized config should reparse");

    assert_eq!(reparsed.server.port, 1234);
    assert_eq!(reparsed.breaker.failure_threshold, 10);
}
