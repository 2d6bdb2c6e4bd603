use crate::common::command::{Sandbox, diverged};
use crate::common::file::{FileSpec, write_file, write_script};
use predicates::prelude::predicate;
use pretty_assertions::assert_eq;
use rstest::rstest;

mod common;

fn stage_feature(sandbox: &Sandbox) {
    sandbox.write("feature.go", "y\n");
    sandbox.git(&["add", "feature.go"]);
}

#[rstest]
fn commit_msg_hook_can_rewrite_the_message(diverged: Sandbox) {
    stage_feature(&diverged);
    write_script(
        &diverged.git_path("hooks/commit-msg"),
        "printf 'rewritten by hook\\n\\nSigned-off-by: fake_user\\n' > \"$1\"",
    );

    diverged
        .commit_to(&["-m", "original", "main"])
        .assert()
        .success()
        .stdout(predicate::str::contains("] rewritten by hook"));

    assert_eq!(
        diverged.git(&["log", "-1", "--format=%B", "main"]),
        "rewritten by hook\n\nSigned-off-by: fake_user"
    );
}

#[rstest]
fn failing_commit_msg_hook_aborts(diverged: Sandbox) {
    let main_before = diverged.rev_parse("main");
    stage_feature(&diverged);
    write_script(
        &diverged.git_path("hooks/commit-msg"),
        "echo 'message rejected' >&2\nexit 3",
    );

    diverged
        .commit_to(&["-m", "original", "main"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("message rejected"))
        .stderr(predicate::str::contains("commit-msg hook failed: exited with status 3"));

    assert_eq!(diverged.rev_parse("main"), main_before);
}

#[rstest]
fn no_verify_skips_the_commit_msg_hook(diverged: Sandbox) {
    stage_feature(&diverged);
    write_script(&diverged.git_path("hooks/commit-msg"), "exit 1");

    diverged
        .commit_to(&["--no-verify", "-m", "unchecked", "main"])
        .assert()
        .success();

    assert_eq!(diverged.git(&["log", "-1", "--format=%s", "main"]), "unchecked");
}

#[rstest]
fn hook_emptying_the_message_aborts(diverged: Sandbox) {
    let main_before = diverged.rev_parse("main");
    stage_feature(&diverged);
    write_script(&diverged.git_path("hooks/commit-msg"), ": > \"$1\"");

    diverged
        .commit_to(&["-m", "original", "main"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("aborting commit due to empty commit message"));

    assert_eq!(diverged.rev_parse("main"), main_before);
}

#[rstest]
fn post_commit_hook_sees_the_new_commit(diverged: Sandbox) {
    stage_feature(&diverged);
    let seen = diverged.home().join("post-commit.txt");
    write_script(
        &diverged.git_path("hooks/post-commit"),
        &format!("git rev-parse main > '{}'", seen.display()),
    );

    diverged
        .commit_to(&["-m", "add feature", "main"])
        .assert()
        .success();

    assert_eq!(
        std::fs::read_to_string(&seen).unwrap().trim_end(),
        diverged.rev_parse("main")
    );
}

#[rstest]
fn post_commit_failure_does_not_undo_the_commit(diverged: Sandbox) {
    let main_before = diverged.rev_parse("main");
    stage_feature(&diverged);
    write_script(&diverged.git_path("hooks/post-commit"), "exit 1");

    diverged
        .commit_to(&["-m", "add feature", "main"])
        .assert()
        .success()
        .stderr(predicate::str::contains("ignoring post-commit hook failure"));

    assert_eq!(diverged.rev_parse("main^"), main_before);
}

#[rstest]
fn hooks_that_are_not_executable_are_skipped(diverged: Sandbox) {
    stage_feature(&diverged);
    write_file(&FileSpec::new(
        diverged.git_path("hooks/commit-msg"),
        "#!/bin/sh\nexit 1\n".to_string(),
    ));

    diverged
        .commit_to(&["-m", "add feature", "main"])
        .assert()
        .success()
        .stderr(predicate::str::contains("not set as executable"));
}

#[rstest]
fn honours_core_hooks_path(diverged: Sandbox) {
    stage_feature(&diverged);
    let hooks = diverged.home().join("shared-hooks");
    write_script(
        &hooks.join("commit-msg"),
        "printf 'from shared hooks\\n' > \"$1\"",
    );
    // the default location must no longer be consulted
    write_script(&diverged.git_path("hooks/commit-msg"), "exit 1");
    diverged.git(&["config", "core.hooksPath", &hooks.display().to_string()]);

    diverged
        .commit_to(&["-m", "original", "main"])
        .assert()
        .success();

    assert_eq!(diverged.git(&["log", "-1", "--format=%s", "main"]), "from shared hooks");
}

#[rstest]
fn hook_timeout_aborts(diverged: Sandbox) {
    let main_before = diverged.rev_parse("main");
    stage_feature(&diverged);
    write_script(&diverged.git_path("hooks/commit-msg"), "exec sleep 10");

    diverged
        .commit_to(&["--timeout", "1", "-m", "original", "main"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("did not finish within 1s"));

    assert_eq!(diverged.rev_parse("main"), main_before);
}
