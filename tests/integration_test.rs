use promptty::{Error, Invocation, Operation, Outcome, RunOptions, Stall, run};
use std::process::Command;
use std::time::{Duration, Instant};

fn have(program: &str) -> bool {
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
        .unwrap_or(false)
}

macro_rules! require {
    ($program:expr) => {
        if !have($program) {
            eprintln!("skipping: {} not found in PATH", $program);
            return;
        }
    };
}

async fn completed(invocation: Invocation) -> promptty::RunResult {
    match run(&invocation, &RunOptions::default()).await.unwrap() {
        Outcome::Completed(result) => result,
        other => panic!("expected completion, got {other:?}"),
    }
}

/// Python's newer REPL redraws the line with escape codes; keep it plain.
fn plain_python() -> Vec<&'static str> {
    vec!["env", "PYTHON_BASIC_REPL=1", "TERM=dumb", "python3", "-q"]
}

#[tokio::test]
async fn test_echo_pipes() {
    let result = completed(Invocation::new(["echo", "blah"])).await;
    assert_eq!(result.text(), "blah\n");
    assert_eq!(result.display_text(), "blah");
    assert_eq!(result.exit_code(), 0);
}

#[tokio::test]
async fn test_cat_pipes_has_no_echo() {
    let result = completed(Invocation::new(["cat"]).transcript("a\nb")).await;
    assert_eq!(result.text(), "a\nb\n");
}

#[tokio::test]
async fn test_cat_indented_transcript() {
    let transcript = "
            a thing
            ";
    let result = completed(Invocation::new(["cat"]).transcript(transcript)).await;
    assert_eq!(result.text(), "a thing\n");
}

#[tokio::test]
async fn test_stderr_captured_in_pipe_mode() {
    let result = completed(Invocation::new(["sh", "-c", "echo err >&2"])).await;
    assert_eq!(result.text(), "err\n");
}

#[tokio::test]
async fn test_non_zero_exit_is_completed() {
    let result = completed(Invocation::new(["sh", "-c", "echo out; exit 3"])).await;
    assert_eq!(result.text(), "out\n");
    assert_eq!(result.exit_code(), 3);

    let result = completed(Invocation::new(["sh", "-c", "exit 4"]).interactive(true)).await;
    assert_eq!(result.exit_code(), 4);
}

#[tokio::test]
async fn test_large_output_drained() {
    let result = completed(Invocation::new(["sh", "-c", "yes x | head -n 20000"])).await;
    assert_eq!(result.text().len(), 40_000);
}

#[tokio::test]
async fn test_child_ignoring_input() {
    let big = "line\n".repeat(100_000);
    let result = completed(Invocation::new(["true"]).transcript(big)).await;
    assert_eq!(result.text(), "");
    assert_eq!(result.exit_code(), 0);
}

#[tokio::test]
async fn test_cat_interactive_echoes_input_first() {
    let result = completed(Invocation::new(["cat"]).interactive(true).transcript("a thing")).await;
    let text = result.display_text();
    assert!(text.starts_with("a thing"), "got: {text:?}");
    assert_eq!(text.matches("a thing").count(), 2, "got: {text:?}");
}

#[tokio::test]
async fn test_bc_pipes() {
    require!("bc");
    let result = completed(Invocation::new(["bc", "-q"]).transcript("1+1")).await;
    assert_eq!(result.display_text(), "2");
}

#[tokio::test]
async fn test_bc_interactive() {
    require!("bc");
    let result =
        completed(Invocation::new(["bc", "-q"]).interactive(true).transcript("1+1")).await;
    let text = result.display_text();
    assert!(text.contains("1+1"), "got: {text:?}");
    assert!(text.contains('2'), "got: {text:?}");
    assert!(text.find("1+1") < text.rfind('2'));
}

#[tokio::test]
async fn test_python_prompt() {
    require!("python3");
    let invocation = Invocation::new(plain_python())
        .interactive(true)
        .delimiters("[]".parse().unwrap())
        .transcript("\n    [>>> ]print(5743+7473)\n    ");
    let text = completed(invocation).await.display_text();
    assert!(text.contains(">>> print(5743+7473)"), "got: {text:?}");
    assert!(text.contains("13216"), "got: {text:?}");
}

#[tokio::test]
async fn test_python_repeated_prompt() {
    require!("python3");
    let invocation = Invocation::new(plain_python())
        .interactive(true)
        .delimiters("{ }".parse().unwrap())
        .transcript("{>>> }a = 5743\n{>>> }b = 7473\n{>>> }a + b");
    let text = completed(invocation).await.display_text();
    assert!(text.contains("13216"), "got: {text:?}");
}

#[tokio::test]
async fn test_regex_prompts() {
    require!("python3");
    let invocation = Invocation::new(plain_python())
        .interactive(true)
        .delimiters("[[ ]]".parse().unwrap())
        .transcript("[[>{3} ]]x = 2\n[[>{3} ]]x * 21");
    let opts = RunOptions::default().with_prompt_mode(promptty::PromptMode::Regex);
    match run(&invocation, &opts).await.unwrap() {
        Outcome::Completed(result) => {
            assert!(result.text().contains("42"), "got: {:?}", result.text())
        }
        other => panic!("expected completion, got {other:?}"),
    }
}

#[tokio::test]
async fn test_script_file_with_args() {
    require!("python3");
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("a.py");
    std::fs::write(&script, "import sys\nprint(sys.argv)\n").unwrap();

    let outcome = Operation::RunScriptFile {
        interpreter: "python3".into(),
        script: script.clone(),
        args: vec!["fgf".into()],
        interactive: false,
        delimiters: None,
        transcript: String::new(),
    }
    .run(&RunOptions::default())
    .await
    .unwrap();

    assert_eq!(
        outcome.result().display_text(),
        format!("['{}', 'fgf']", script.display())
    );
}

#[tokio::test]
async fn test_script_file_prompt() {
    require!("python3");
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("a.py");
    std::fs::write(
        &script,
        "name = input(\"Enter name: \")\nprint(f\"Hello {name}\")\n",
    )
    .unwrap();

    let outcome = Operation::RunScriptFile {
        interpreter: "python3".into(),
        script,
        args: Vec::new(),
        interactive: true,
        delimiters: None,
        transcript: "<Enter name: >Matt".into(),
    }
    .run(&RunOptions::default())
    .await
    .unwrap();

    assert!(outcome.is_completed(), "{outcome:?}");
    assert_eq!(outcome.result().display_text(), "Enter name: Matt\nHello Matt");
}

#[tokio::test]
async fn test_missing_program_is_spawn_error() {
    for interactive in [false, true] {
        let invocation = Invocation::new(["no-such-program-promptty"]).interactive(interactive);
        match run(&invocation, &RunOptions::default()).await {
            Err(Error::Spawn { program, .. }) => assert_eq!(program, "no-such-program-promptty"),
            other => panic!("expected spawn error, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_prompt_timeout_keeps_partial_output() {
    let invocation = Invocation::new(["sh", "-c", "echo started; exec sleep 10"])
        .interactive(true)
        .transcript("<never shown>x");
    let opts = RunOptions::default().with_prompt_timeout(Duration::from_millis(500));
    let begin = Instant::now();

    match run(&invocation, &opts).await.unwrap() {
        Outcome::TimedOut {
            result,
            step,
            stall,
        } => {
            assert_eq!(step, 0);
            assert_eq!(
                stall,
                Stall::PromptNeverAppeared {
                    prompt: "never shown".into()
                }
            );
            assert!(result.text().contains("started"), "got: {:?}", result.text());
            assert!(result.duration() >= Duration::from_millis(500));
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    assert!(begin.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_exit_while_waiting_for_prompt() {
    let invocation = Invocation::new(["sh", "-c", "echo bye; exit 2"])
        .interactive(true)
        .transcript("<never shown>x");

    match run(&invocation, &RunOptions::default()).await.unwrap() {
        Outcome::TimedOut { result, stall, .. } => {
            assert_eq!(stall, Stall::ProcessExited);
            assert!(result.text().contains("bye"));
            assert_eq!(result.exit_code(), 2);
        }
        other => panic!("expected stall, got {other:?}"),
    }
}

#[tokio::test]
async fn test_child_not_reading_input_is_bounded() {
    // Far more than a terminal's input queue holds.
    let transcript = format!("{}\n", "x".repeat(200)).repeat(2000);
    let invocation = Invocation::new(["sleep", "30"])
        .interactive(true)
        .transcript(transcript);
    let opts = RunOptions::default()
        .with_prompt_timeout(Duration::from_millis(500))
        .with_drain_timeout(Duration::from_millis(500));
    let begin = Instant::now();

    let outcome = tokio::time::timeout(Duration::from_secs(8), run(&invocation, &opts))
        .await
        .expect("run did not honour its own bounds")
        .unwrap();

    match outcome {
        Outcome::TimedOut { stall, .. } => assert_eq!(stall, Stall::InputBlocked),
        other => panic!("expected timeout, got {other:?}"),
    }
    assert!(begin.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_drain_timeout_kills_child() {
    let invocation = Invocation::new(["sh", "-c", "echo up; exec sleep 10"]);
    let opts = RunOptions::default().with_drain_timeout(Duration::from_millis(300));

    match run(&invocation, &opts).await.unwrap() {
        Outcome::TimedOut { result, stall, .. } => {
            assert_eq!(stall, Stall::DrainExceeded);
            assert_eq!(result.text(), "up\n");
        }
        other => panic!("expected drain timeout, got {other:?}"),
    }
}

fn promptty() -> Command {
    Command::new(env!("CARGO_BIN_EXE_promptty"))
}

#[test]
fn test_cli_run_pipes() {
    let output = promptty()
        .args(["run", "--input", "a thing", "--", "cat"])
        .output()
        .expect("Failed to execute promptty");

    assert!(
        output.status.success(),
        "promptty failed with stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(String::from_utf8_lossy(&output.stdout), "a thing\n");
}

#[test]
fn test_cli_exit_code_passed_through() {
    let output = promptty()
        .args(["run", "--", "sh", "-c", "exit 7"])
        .output()
        .expect("Failed to execute promptty");
    assert_eq!(output.status.code(), Some(7));
}

#[test]
fn test_cli_rejects_prompt_without_terminal() {
    let output = promptty()
        .args(["run", "--input", "<$ >ls", "--", "cat"])
        .output()
        .expect("Failed to execute promptty");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("interactive mode"), "got: {stderr}");
}

#[test]
fn test_cli_pipe_mode_delimiter_override() {
    let output = promptty()
        .args(["run", "-d", "[]", "--input", "<b>bold", "--", "cat"])
        .output()
        .expect("Failed to execute promptty");

    assert!(
        output.status.success(),
        "promptty failed with stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(String::from_utf8_lossy(&output.stdout), "<b>bold\n");
}

#[test]
fn test_cli_timeout_exit_status() {
    let output = promptty()
        .args([
            "run",
            "-i",
            "--timeout",
            "300ms",
            "--input",
            "<never>x",
            "--",
            "sh",
            "-c",
            "exec sleep 5",
        ])
        .output()
        .expect("Failed to execute promptty");

    assert_eq!(output.status.code(), Some(124));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("timed out waiting for prompt"), "got: {stderr}");
}

#[test]
fn test_cli_parse() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("transcript.txt");
    std::fs::write(&path, "[>>> ]print(1)\nplain\n").unwrap();

    let output = promptty()
        .args(["parse", "-d", "[]"])
        .arg(&path)
        .output()
        .expect("Failed to execute promptty");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("WaitThenSend"), "got: {stdout}");
    assert!(stdout.contains("Literal"), "got: {stdout}");
}
