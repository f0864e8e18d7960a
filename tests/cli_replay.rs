use std::path::PathBuf;

use clap::Parser;
use paintkit::EngineError;
use paintkit::cli::{self, CliArgs};

fn temp(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("paintkit-cli-{}-{}", std::process::id(), name))
}

fn args(extra: &[&str]) -> CliArgs {
    let mut argv = vec!["paintkit".to_string()];
    argv.extend(extra.iter().map(|s| s.to_string()));
    CliArgs::try_parse_from(argv).unwrap()
}

#[test]
fn replay_writes_the_drawing() {
    let script = temp("script.json");
    let params = temp("params.json");
    let output = temp("out.png");
    std::fs::write(&params, r##"{ "primary_color": "#ff0000ff" }"##).unwrap();
    std::fs::write(
        &script,
        r#"[
            { "op": "select_tool", "tool": "paint_bucket" },
            { "op": "pointer_down", "pos": { "x": 3, "y": 3 } },
            { "op": "pointer_up", "pos": { "x": 3, "y": 3 } }
        ]"#,
    )
    .unwrap();

    let project = cli::replay(&args(&[
        "-W", "16", "-H", "12",
        "--params", &params.display().to_string(),
        "--replay", &script.display().to_string(),
        "--output", &output.display().to_string(),
    ]))
    .unwrap();
    assert_eq!(project.history.undo_count(), 2);

    let img = image::open(&output).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (16, 12));
    assert!(img.pixels().all(|p| *p == image::Rgba([255, 0, 0, 255])));

    for path in [script, params, output] {
        let _ = std::fs::remove_file(path);
    }
}

#[test]
fn a_missing_script_fails() {
    let missing = temp("no-such-script.json");
    assert!(matches!(
        cli::replay(&args(&["--replay", &missing.display().to_string()])),
        Err(EngineError::Io(_))
    ));
}

#[test]
fn a_malformed_script_fails() {
    let script = temp("bad.json");
    std::fs::write(&script, r#"[{ "op": "pointer_down" }]"#).unwrap();
    assert!(matches!(
        cli::replay(&args(&["--replay", &script.display().to_string()])),
        Err(EngineError::Script(_))
    ));
    let _ = std::fs::remove_file(script);
}
