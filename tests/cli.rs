use std::process::{Command, Output};

fn templex(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_templex"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("runs the binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim_end().to_owned()
}

#[test]
fn modify_takes_a_chain_or_its_steps() {
    let piped = templex(&["modify", "x", "post(!)|pre(<)"]);
    assert!(piped.status.success());
    assert_eq!(stdout(&piped), "<x!");
    let listed = templex(&["modify", "x", "post(!)", "pre(<)"]);
    assert!(listed.status.success());
    assert_eq!(stdout(&listed), "<x!");
    let arithmetic = templex(&["modify", "41", "+1"]);
    assert!(arithmetic.status.success());
    assert_eq!(stdout(&arithmetic), "42");
}

#[test]
fn calc_and_format() {
    let calc = templex(&["calc", "2 * (3 + 4)"]);
    assert!(calc.status.success());
    assert_eq!(stdout(&calc), "14");
    let format = templex(&["format", r"\{{yyyy}\}"]);
    assert!(format.status.success());
    let year = stdout(&format);
    assert!(year.starts_with('{') && year.ends_with('}') && year.len() == 6, "{}", year);
}

#[test]
fn parse_prints_json() {
    let parse = templex(&["parse", "I am 30 years old", "I am {age} years"]);
    assert!(parse.status.success());
    let json: serde_json::Value = serde_json::from_str(&stdout(&parse)).expect("json");
    assert_eq!(json, serde_json::json!({ "age": "30" }));
}

#[test]
fn failures_exit_non_zero() {
    assert!(!templex(&["format", "{unknown}"]).status.success());
    assert!(!templex(&["--config", "no/such/templex-settings.toml", "format", "x"]).status.success());
    assert!(!templex(&["modify", "x", "--config"]).status.success());
    assert!(!templex(&["parse", "only text"]).status.success());
    assert!(!templex(&[]).status.success());
    assert!(templex(&["--help"]).status.success());
}
