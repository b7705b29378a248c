use infradesk::config::Config;

#[test]
fn test_config_validation_rejects_non_http_urls() {
    let config = Config {
        api_url: "ftp://agents.example.com".to_string(),
        ..Config::default()
    };

    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_allows_local_default() {
    let config = Config::default();

    assert!(config.is_local_endpoint());
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_validation_allows_remote_https_with_thread() {
    let config = Config {
        api_url: "https://agents.example.com".to_string(),
        thread_id: Some("2b1c9a7e-thread".to_string()),
        connect_timeout_secs: 5,
    };

    assert!(!config.is_local_endpoint());
    assert!(config.validate().is_ok());
}
