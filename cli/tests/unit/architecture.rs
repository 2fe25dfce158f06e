//! Structural tests for architectural boundary enforcement.
//!
//! These tests scan source files to verify that the layer boundaries hold:
//! domain is pure, application talks to the outside only through ports, infra
//! never reaches into presentation, and command handlers stay thin.

use std::path::{Path, PathBuf};

/// Collect all `.rs` files under a directory recursively.
fn collect_rs_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(collect_rs_files(&path));
            } else if path.extension().and_then(|e| e.to_str()) == Some("rs") {
                files.push(path);
            }
        }
    }
    files
}

/// Read a file and strip comment lines to avoid false positives.
fn read_non_comment_lines(path: &Path) -> Vec<String> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    content
        .lines()
        .filter(|l| {
            let trimmed = l.trim();
            !trimmed.starts_with("//") && !trimmed.starts_with("/*") && !trimmed.starts_with('*')
        })
        .map(String::from)
        .collect()
}

fn src_dir(layer: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("src").join(layer)
}

fn relative(file: &Path) -> String {
    file.strip_prefix(env!("CARGO_MANIFEST_DIR"))
        .unwrap_or(file)
        .display()
        .to_string()
}

/// Track brace depth and return whether a line is inside a `#[cfg(test)]` block.
struct CfgTestTracker {
    in_test_block: bool,
    brace_depth: i32,
    test_block_start_depth: i32,
}

impl CfgTestTracker {
    fn new() -> Self {
        Self {
            in_test_block: false,
            brace_depth: 0,
            test_block_start_depth: 0,
        }
    }

    /// Process a line and return `true` if it's inside a `#[cfg(test)]` block.
    fn process_line(&mut self, line: &str) -> bool {
        let trimmed = line.trim();
        if trimmed.contains("#[cfg(test)]") || trimmed.contains("#[cfg(all(test") {
            self.in_test_block = true;
            self.test_block_start_depth = self.brace_depth;
        }
        for ch in line.chars() {
            match ch {
                '{' => self.brace_depth += 1,
                '}' => {
                    self.brace_depth -= 1;
                    if self.in_test_block && self.brace_depth <= self.test_block_start_depth {
                        self.in_test_block = false;
                    }
                }
                _ => {}
            }
        }
        self.in_test_block
    }
}

/// Count non-test, non-comment, non-empty lines in a file.
fn count_non_test_lines(content: &str) -> usize {
    let mut tracker = CfgTestTracker::new();
    content
        .lines()
        .filter(|line| {
            let in_test = tracker.process_line(line);
            let trimmed = line.trim();
            !in_test && !trimmed.is_empty() && !trimmed.starts_with("//")
        })
        .count()
}

/// Lines of `layer` (outside comments) containing any of `needles`.
fn forbidden_lines(layer: &str, needles: &[&str]) -> Vec<String> {
    let mut violations = Vec::new();
    for file in collect_rs_files(&src_dir(layer)) {
        let rel = relative(&file);
        for (i, line) in read_non_comment_lines(&file).iter().enumerate() {
            if let Some(needle) = needles.iter().find(|n| line.contains(**n)) {
                violations.push(format!("{rel}:{}: `{needle}` in {layer}/: {line}", i + 1));
            }
        }
    }
    violations
}

// ── Domain purity ────────────────────────────────────────────────────────────

#[test]
fn domain_has_no_outer_layer_or_io_imports() {
    let violations = forbidden_lines(
        "domain",
        &[
            "crate::application",
            "crate::infra",
            "crate::commands",
            "crate::output",
            "tokio::",
            "std::fs",
            "std::process",
            "std::net",
        ],
    );
    assert!(
        violations.is_empty(),
        "domain/ must stay pure:\n{}",
        violations.join("\n")
    );
}

// ── Application layer boundary ───────────────────────────────────────────────

/// application/ must not import from infra/, commands/ or output/ layers.
#[test]
fn application_has_no_infra_or_output_imports() {
    let violations = forbidden_lines(
        "application",
        &["crate::infra::", "crate::output::", "crate::commands::"],
    );
    assert!(
        violations.is_empty(),
        "application/ must not import from infra/, commands/ or output/:\n{}",
        violations.join("\n")
    );
}

/// Services take ports as `&impl Trait`, never the concrete adapters.
#[test]
fn no_concrete_adapters_in_service_signatures() {
    let violations = forbidden_lines(
        "application",
        &["AwsCli", "TokioCommandRunner", "EmbeddedTemplates", "TerminalPrompt"],
    );
    assert!(
        violations.is_empty(),
        "application/ must depend on port traits only:\n{}",
        violations.join("\n")
    );
}

#[test]
fn application_does_not_print() {
    let violations = forbidden_lines("application", &["println!", "eprintln!"]);
    assert!(
        violations.is_empty(),
        "application/ must report through ProgressReporter:\n{}",
        violations.join("\n")
    );
}

// ── Infra layer boundary ─────────────────────────────────────────────────────

#[test]
fn infra_has_no_imports_from_commands_or_output() {
    let violations = forbidden_lines("infra", &["crate::commands", "crate::output"]);
    assert!(
        violations.is_empty(),
        "infra/ must not import from commands/ or output/:\n{}",
        violations.join("\n")
    );
}

#[test]
fn infra_has_no_print_macros_outside_tests() {
    let mut violations: Vec<String> = Vec::new();

    for file in collect_rs_files(&src_dir("infra")) {
        let rel = relative(&file);
        let Ok(content) = std::fs::read_to_string(&file) else {
            continue;
        };

        let mut tracker = CfgTestTracker::new();
        for (i, line) in content.lines().enumerate() {
            let in_test = tracker.process_line(line);
            let trimmed = line.trim();
            if in_test || trimmed.starts_with("//") {
                continue;
            }
            if line.contains("println!") || line.contains("eprintln!") {
                violations.push(format!(
                    "{rel}:{}: print macro in infra/ outside #[cfg(test)]: {line}",
                    i + 1
                ));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "infra/ must not use println!/eprintln! outside #[cfg(test)]:\n{}",
        violations.join("\n")
    );
}

/// Adapters are wired once, in `app.rs`.
#[test]
fn adapters_are_constructed_only_in_app_context() {
    let mut violations: Vec<String> = Vec::new();

    for file in collect_rs_files(&Path::new(env!("CARGO_MANIFEST_DIR")).join("src")) {
        let rel = relative(&file).replace('\\', "/");
        if rel.contains("/infra/") || rel.ends_with("app.rs") {
            continue;
        }
        for (i, line) in read_non_comment_lines(&file).iter().enumerate() {
            if line.contains("TokioCommandRunner::") || line.contains("AwsCli::new") {
                violations.push(format!("{rel}:{}: adapter built outside app.rs: {line}", i + 1));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "Control-plane adapters must be built by AppContext:\n{}",
        violations.join("\n")
    );
}

// ── Command handlers ─────────────────────────────────────────────────────────

#[test]
fn no_inline_json_branching_in_commands() {
    let mut violations: Vec<String> = Vec::new();

    for file in collect_rs_files(&src_dir("commands")) {
        let rel = relative(&file);
        for (i, line) in read_non_comment_lines(&file).iter().enumerate() {
            let lineno = i + 1;
            if line.contains("json: bool") {
                violations.push(format!(
                    "{rel}:{lineno}: found `json: bool` parameter: {line}"
                ));
            }
            let trimmed = line.trim();
            if trimmed.starts_with("if json")
                || trimmed.starts_with("if !json")
                || trimmed.contains("if app.is_json()")
                || trimmed.contains("serde_json::")
            {
                violations.push(format!("{rel}:{lineno}: found inline JSON branch: {line}"));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "Found inline JSON branching in commands/; use app.renderer() instead:\n{}",
        violations.join("\n")
    );
}

#[test]
fn command_handlers_accept_app_context() {
    let mut violations: Vec<String> = Vec::new();

    for file in collect_rs_files(&src_dir("commands")) {
        let Ok(content) = std::fs::read_to_string(&file) else {
            continue;
        };
        if content.contains("pub async fn run(") && !content.contains("app: &AppContext") {
            violations.push(format!(
                "{}: pub async fn run() does not accept &AppContext",
                relative(&file)
            ));
        }
    }

    assert!(
        violations.is_empty(),
        "Command handlers must accept &AppContext:\n{}",
        violations.join("\n")
    );
}

/// Each handler file must be ≤60 lines of non-test code.
#[test]
fn command_handlers_are_reasonably_sized() {
    let mut violations: Vec<String> = Vec::new();

    for file in collect_rs_files(&src_dir("commands")) {
        let Ok(content) = std::fs::read_to_string(&file) else {
            continue;
        };
        if !content.contains("pub async fn run(") {
            continue;
        }

        let line_count = count_non_test_lines(&content);
        if line_count > 60 {
            violations.push(format!(
                "{}: {line_count} non-test lines (limit: 60)",
                relative(&file)
            ));
        }
    }

    assert!(
        violations.is_empty(),
        "Command handler files exceed 60-line limit; extract logic to application services:\n{}",
        violations.join("\n")
    );
}

/// Prompts go through the `Prompt` port, never `dialoguer` directly.
#[test]
fn commands_and_services_do_not_prompt_directly() {
    let mut violations = forbidden_lines("commands", &["dialoguer::"]);
    violations.extend(forbidden_lines("application", &["dialoguer::"]));
    assert!(
        violations.is_empty(),
        "Confirmation must go through the Prompt port:\n{}",
        violations.join("\n")
    );
}
