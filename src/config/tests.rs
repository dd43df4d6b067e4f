use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn defaults_describe_a_local_deployment() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.to_string(), "127.0.0.1:3000");
    assert!(settings.database.url.is_none());
    assert_eq!(settings.catalog.list_ttl, Duration::from_secs(7200));
    assert_eq!(settings.catalog.detail_ttl, Duration::from_secs(3600));
    assert_eq!(settings.catalog.default_language.as_str(), "ja");
    assert_eq!(settings.catalog.default_page_size.get(), 50);
    assert_eq!(settings.upstream.timeout, Duration::from_millis(15_000));
    assert!(settings.revalidation.enabled);
    assert_eq!(settings.revalidation.ttl_seconds.get(), 60);
    assert_eq!(settings.rate_limit.max_requests.get(), 100);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn blank_database_url_selects_memory_store() {
    let mut raw = RawSettings::default();
    raw.database.url = Some("   ".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.database.url.is_none());
}

#[test]
fn default_language_must_be_supported() {
    let mut raw = RawSettings::default();
    raw.catalog.default_language = Some("de".to_string());
    raw.catalog.supported_languages = Some(vec!["ja".to_string(), "en".to_string()]);

    let err = Settings::from_raw(raw).expect_err("unsupported default");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "catalog.default_language",
            ..
        }
    ));
}

#[test]
fn zero_ttls_are_rejected() {
    let mut raw = RawSettings::default();
    raw.catalog.list_ttl_seconds = Some(0);
    assert!(Settings::from_raw(raw).is_err());

    let mut raw = RawSettings::default();
    raw.revalidation.ttl_seconds = Some(0);
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn upstream_endpoint_must_be_http() {
    let mut raw = RawSettings::default();
    raw.upstream.endpoint = Some("ftp://api.tarkov.dev/graphql".to_string());

    let err = Settings::from_raw(raw).expect_err("bad scheme");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "upstream.endpoint",
            ..
        }
    ));
}

#[test]
fn database_override_only_touches_the_url() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(8080);

    raw.apply_database_override(&DatabaseOverride {
        database_url: Some("postgres://cache".to_string()),
    });
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.database.url.as_deref(), Some("postgres://cache"));
    assert_eq!(settings.server.addr.port(), 8080);
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["tarkov-wiki"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_warm_arguments() {
    let args = CliArgs::parse_from([
        "tarkov-wiki",
        "warm",
        "--database-url",
        "postgres://example",
        "--lang",
        "ja",
        "--lang",
        "en",
    ]);

    match args.command.expect("warm command") {
        Command::Warm(warm) => {
            assert_eq!(
                warm.database.database_url.as_deref(),
                Some("postgres://example")
            );
            assert_eq!(warm.languages, vec!["ja".to_string(), "en".to_string()]);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn parse_purge_arguments() {
    let args = CliArgs::parse_from(["tarkov-wiki", "purge", "--prefix", "cache:items:list:ja:"]);

    match args.command.expect("purge command") {
        Command::Purge(purge) => {
            assert_eq!(purge.prefix, "cache:items:list:ja:");
            assert!(purge.database.database_url.is_none());
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn catalog_settings_build_a_language_policy() {
    let mut raw = RawSettings::default();
    raw.catalog.default_language = Some("en".to_string());
    raw.catalog.supported_languages = Some(vec!["en".to_string(), "ru".to_string()]);

    let settings = Settings::from_raw(raw).expect("valid settings");
    let policy = settings.catalog.language_policy();

    assert_eq!(policy.resolve(Some("ru")).as_str(), "ru");
    assert_eq!(policy.resolve(Some("ja")).as_str(), "en");
}
