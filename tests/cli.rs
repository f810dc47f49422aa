use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const TEST_KEY: &str = "sk-test-0123456789abcdef";

/// quizgen running in an empty directory, so no stray .env or quizgen.yaml is picked up
fn quizgen(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("quizgen").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("DEEPSEEK_API_KEY")
        .env("RUST_LOG", "off");
    cmd
}

#[test]
fn help_lists_commands() {
    let dir = TempDir::new().unwrap();
    quizgen(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn generate_rejects_non_youtube_url() {
    let dir = TempDir::new().unwrap();
    quizgen(&dir)
        .args(["generate", "--quiet", "--url", "https://vimeo.com/12345"])
        .env("DEEPSEEK_API_KEY", TEST_KEY)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid YouTube URL. Please check the format."));
}

#[test]
fn generate_rejects_unsupported_declared_type() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("table.csv");
    std::fs::write(&file, "a,b,c\n1,2,3\n").unwrap();

    quizgen(&dir)
        .args(["generate", "--quiet", "--file"])
        .arg(&file)
        .args(["--content-type", "text/csv"])
        .env("DEEPSEEK_API_KEY", TEST_KEY)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported file type: text/csv"));
}

#[test]
fn content_type_with_url_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    quizgen(&dir)
        .args(["generate", "--url", "https://youtu.be/dQw4w9WgXcQ", "--content-type", "text/plain"])
        .env("DEEPSEEK_API_KEY", TEST_KEY)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("--content-type"));
}

#[test]
fn generate_names_the_type_derived_from_extension() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("slides.pptx");
    std::fs::write(&file, "not really slides").unwrap();

    quizgen(&dir)
        .args(["generate", "--quiet", "--file"])
        .arg(&file)
        .env("DEEPSEEK_API_KEY", TEST_KEY)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported file type: application/octet-stream"));
}

#[test]
fn generate_without_api_key_fails_with_tip() {
    let dir = TempDir::new().unwrap();
    quizgen(&dir)
        .args(["generate", "--quiet", "--url", "https://youtu.be/dQw4w9WgXcQ"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("API key not found"))
        .stderr(predicate::str::contains("Tip:"));
}

#[test]
fn generate_rejects_placeholder_key() {
    let dir = TempDir::new().unwrap();
    quizgen(&dir)
        .args(["generate", "--quiet", "--url", "https://youtu.be/dQw4w9WgXcQ"])
        .env("DEEPSEEK_API_KEY", "your_deepseek_api_key_here")
        .assert()
        .failure()
        .stderr(predicate::str::contains("placeholder"));
}

#[test]
fn offline_check_reports_summary() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("quizgen.yaml"),
        "source:\n  yt_dlp_path: quizgen-missing-yt-dlp\n",
    )
    .unwrap();

    quizgen(&dir)
        .args(["check", "--offline"])
        .env("DEEPSEEK_API_KEY", TEST_KEY)
        .assert()
        .failure()
        .stdout(predicate::str::contains("API Key Configuration"))
        .stdout(predicate::str::contains("Overall: 1/2 checks passed"));
}

#[test]
fn config_show_never_prints_the_key() {
    let dir = TempDir::new().unwrap();
    quizgen(&dir)
        .args(["config", "--show"])
        .env("DEEPSEEK_API_KEY", TEST_KEY)
        .assert()
        .success()
        .stdout(predicate::str::contains("API Key: configured (24 characters)"))
        .stdout(predicate::str::contains(TEST_KEY).not());
}
