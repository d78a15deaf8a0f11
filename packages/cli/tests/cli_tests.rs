//! End-to-end tests of the `readcoach` binary against a temporary data directory.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn readcoach(data_dir: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_readcoach"));
    cmd.arg("--data-dir")
        .arg(data_dir.path())
        .env_remove("READCOACH_HOME")
        .env_remove("LLM_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_users_empty() {
    let dir = TempDir::new().expect("tempdir");
    readcoach(&dir)
        .arg("users")
        .assert()
        .success()
        .stdout(predicate::str::contains("No users yet"));
}

#[test]
fn test_create_and_list_users() {
    let dir = TempDir::new().expect("tempdir");
    for name in ["zoe", "adam"] {
        readcoach(&dir)
            .args(["create-user", name])
            .assert()
            .success()
            .stdout(predicate::str::contains("Created user"));
    }

    readcoach(&dir)
        .args(["create-user", "zoe"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));

    readcoach(&dir)
        .arg("users")
        .assert()
        .success()
        .stdout("adam\nzoe\n");
}

#[test]
fn test_invalid_user_name_rejected() {
    let dir = TempDir::new().expect("tempdir");
    readcoach(&dir)
        .args(["create-user", "../outside"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid user name"));
}

#[test]
fn test_words_add_dedupe_list() {
    let dir = TempDir::new().expect("tempdir");
    readcoach(&dir).args(["create-user", "alice"]).assert().success();

    readcoach(&dir)
        .args(["words", "add", "alice", "Cat", "dog", "cat"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added 2 word(s), 2 in total"));

    fs::write(
        dir.path().join("alice").join("word_bank.txt"),
        "Cat\ncat\ndog\n",
    )
    .expect("write word bank");

    readcoach(&dir)
        .args(["words", "dedupe", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1 duplicate(s), 2 word(s) left"));

    readcoach(&dir)
        .args(["words", "list", "alice"])
        .assert()
        .success()
        .stdout("Cat\ndog\n");
}

#[test]
fn test_words_import() {
    let dir = TempDir::new().expect("tempdir");
    readcoach(&dir).args(["create-user", "alice"]).assert().success();
    let file = dir.path().join("list.txt");
    fs::write(&file, "apple, banana\ncherry\n").expect("write list");

    readcoach(&dir)
        .args(["words", "import", "alice"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 3 new word(s)"));
}

#[test]
fn test_profile_set_and_show() {
    let dir = TempDir::new().expect("tempdir");
    readcoach(&dir).args(["create-user", "alice"]).assert().success();

    readcoach(&dir)
        .args(["profile", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Age: 12").and(predicate::str::contains("Lexile level: 600")));

    readcoach(&dir)
        .args(["profile", "alice", "--age", "9", "--lexile", "450"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Profile saved"));

    let info = fs::read_to_string(dir.path().join("alice").join("user_info.txt")).expect("read");
    assert_eq!(info, "age: 9\nlexile_level: 450\n");
}

#[test]
fn test_unknown_user() {
    let dir = TempDir::new().expect("tempdir");
    readcoach(&dir)
        .args(["words", "list", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("User 'ghost' does not exist"));
}

#[test]
fn test_api_set_and_show_hides_key() {
    let dir = TempDir::new().expect("tempdir");
    readcoach(&dir).args(["create-user", "alice"]).assert().success();

    readcoach(&dir)
        .args([
            "api", "set", "alice", "OpenAI", "--key", "sk-secret", "--model", "gpt-4o-mini",
        ])
        .assert()
        .success();

    readcoach(&dir)
        .args(["api", "show", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("openai: gpt-4o-mini"))
        .stdout(predicate::str::contains("sk-secret").not());

    let saved = fs::read_to_string(dir.path().join("alice").join("api_key.txt")).expect("read");
    let json: serde_json::Value = serde_json::from_str(&saved).expect("json");
    assert_eq!(json["openai"]["api_key"], "sk-secret");
}

#[test]
fn test_api_set_unknown_provider() {
    let dir = TempDir::new().expect("tempdir");
    readcoach(&dir).args(["create-user", "alice"]).assert().success();

    readcoach(&dir)
        .args(["api", "set", "alice", "bard", "--key", "k"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported provider"));
}

#[test]
fn test_practice_without_api_config() {
    let dir = TempDir::new().expect("tempdir");
    readcoach(&dir).args(["create-user", "alice"]).assert().success();

    readcoach(&dir)
        .args(["practice", "alice"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No API configured for user 'alice'"));
}

#[test]
fn test_history_empty_and_missing_entry() {
    let dir = TempDir::new().expect("tempdir");
    readcoach(&dir).args(["create-user", "alice"]).assert().success();

    readcoach(&dir)
        .args(["history", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No tests taken yet"));

    readcoach(&dir)
        .args(["history", "alice", "--show", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Test #1 not found"));
}

#[test]
fn test_history_lists_saved_log() {
    let dir = TempDir::new().expect("tempdir");
    readcoach(&dir).args(["create-user", "alice"]).assert().success();

    let date_dir = dir.path().join("alice").join("log").join("2025-03-01");
    fs::create_dir_all(&date_dir).expect("mkdir");
    fs::write(
        date_dir.join("test_09-15-30.json"),
        r#"{
  "timestamp": "2025-03-01 09:15:30",
  "article": "Tom has a small cat.",
  "questions": [
    {"type": "fill_blank", "question": "Tom has a ___ cat.", "correct_answer": "small"}
  ],
  "user_answers": ["small"],
  "score": 100.0,
  "item_analysis": [{"question_num": 1, "correct": true, "feedback": "Right."}],
  "overall_feedback": "Perfect.",
  "suggestions": "Keep going."
}"#,
    )
    .expect("write log");

    readcoach(&dir)
        .args(["history", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1. 2025-03-01 09:15:30  100/100"));

    readcoach(&dir)
        .args(["history", "alice", "--show", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# Test Log - 2025-03-01 09:15:30"))
        .stdout(predicate::str::contains("**Result:** ✓ Correct"));
}
