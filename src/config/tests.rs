use std::io::Write;

use super::*;

fn config_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("richdoc-config")
        .suffix(".toml")
        .tempfile()
        .expect("temp config file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
fn defaults_match_documented_values() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert_eq!(settings.logging.format, LogFormat::Compact);
    assert_eq!(settings.reading, ReadTimeConfig::default());
    assert_eq!(settings.reading.words_per_minute.get(), 200);
    assert_eq!(settings.render.theme, DEFAULT_THEME);
    assert!(!settings.render.sanitize_inline_html);
    assert_eq!(settings.render.anchors, AnchorPolicy::Verbatim);
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("info".to_string());
    raw.reading.words_per_minute = Some(180);

    let overrides = Overrides {
        log_level: Some("debug".to_string()),
        words_per_minute: Some(250),
        anchors: Some("disambiguate".to_string()),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(settings.reading.words_per_minute.get(), 250);
    assert_eq!(settings.render.anchors, AnchorPolicy::Disambiguate);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    raw.apply_overrides(&Overrides {
        log_json: Some(true),
        ..Default::default()
    });
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn zero_reading_speed_is_rejected() {
    let mut raw = RawSettings::default();
    raw.reading.words_per_minute = Some(0);

    match Settings::from_raw(raw) {
        Err(LoadError::Invalid { key, .. }) => assert_eq!(key, "reading.words_per_minute"),
        other => panic!("expected invalid reading speed, got {other:?}"),
    }
}

#[test]
fn unknown_theme_is_rejected() {
    let mut raw = RawSettings::default();
    raw.render.theme = Some("no-such-theme".to_string());

    match Settings::from_raw(raw) {
        Err(LoadError::Invalid { key, reason }) => {
            assert_eq!(key, "render.theme");
            assert!(reason.contains("no-such-theme"));
        }
        other => panic!("expected invalid theme, got {other:?}"),
    }
}

#[test]
fn unknown_anchor_policy_is_rejected() {
    let mut raw = RawSettings::default();
    raw.render.anchors = Some("random".to_string());

    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "render.anchors",
            ..
        })
    ));
}

#[test]
fn invalid_log_level_names_the_key() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("loud".to_string());

    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "logging.level",
            ..
        })
    ));
}

#[test]
fn config_file_values_apply_under_cli_flags() {
    let file = config_file(
        r#"
[reading]
words_per_minute = 150
seconds_per_image = 12

[render]
sanitize_inline_html = true
anchors = "disambiguate"
"#,
    );
    let path = file.path().to_str().expect("utf-8 path");

    let args = CliArgs::parse_from([
        "richdoc",
        "--config-file",
        path,
        "--words-per-minute",
        "300",
        "read-time",
    ]);
    let settings = load(&args).expect("settings load");

    assert_eq!(settings.reading.words_per_minute.get(), 300);
    assert_eq!(settings.reading.seconds_per_image, 12);
    assert_eq!(settings.reading.seconds_per_code_block, 30);
    assert!(settings.render.sanitize_inline_html);
    assert_eq!(settings.render.anchors, AnchorPolicy::Disambiguate);
}

#[test]
fn missing_explicit_config_file_fails() {
    let args = CliArgs::parse_from([
        "richdoc",
        "--config-file",
        "/definitely/not/here/richdoc.toml",
        "classify",
    ]);
    assert!(matches!(load(&args), Err(LoadError::Build(_))));
}

#[test]
fn parse_render_arguments() {
    let args = CliArgs::parse_from(["richdoc", "render", "--format", "json", "doc.json"]);

    match args.command {
        Command::Render(render) => {
            assert_eq!(render.format, RenderFormat::Json);
            assert_eq!(
                render.input.path().map(|path| path.as_path()),
                Some(std::path::Path::new("doc.json"))
            );
        }
        other => panic!("wrong command parsed: {other:?}"),
    }
}

#[test]
fn dash_and_missing_file_read_stdin() {
    let dash = CliArgs::parse_from(["richdoc", "classify", "-"]);
    assert!(dash.command.input().path().is_none());

    let missing = CliArgs::parse_from(["richdoc", "toc", "--tree"]);
    match &missing.command {
        Command::Toc(toc) => assert!(toc.tree),
        other => panic!("wrong command parsed: {other:?}"),
    }
    assert!(missing.command.input().path().is_none());
}

#[test]
fn global_flags_follow_the_subcommand() {
    let args = CliArgs::parse_from([
        "richdoc",
        "render",
        "--theme",
        "base16-ocean.dark",
        "--sanitize-inline-html",
        "true",
    ]);
    assert_eq!(args.overrides.theme.as_deref(), Some("base16-ocean.dark"));
    assert_eq!(args.overrides.sanitize_inline_html, Some(true));
}
