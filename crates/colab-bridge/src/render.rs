//! Human-readable rendering of remote results for tool output.

use crate::contracts::{ExecResult, SystemInfo};

pub const NO_OUTPUT_MESSAGE: &str = "Code executed successfully (no output).";

#[must_use]
pub fn shell_output(result: &ExecResult) -> String {
    let mut out = format!("Exit Code: {}\n", result.return_code);
    push_streams(&mut out, result);
    if let Some(error) = &result.error {
        out.push_str("\n--- ERROR ---\n");
        out.push_str(error);
    }
    out
}

/// Python results show the streams only; an empty result gets [`NO_OUTPUT_MESSAGE`].
#[must_use]
pub fn python_output(result: &ExecResult) -> String {
    let mut out = String::new();
    push_streams(&mut out, result);
    if out.is_empty() {
        out.push_str(NO_OUTPUT_MESSAGE);
    }
    out
}

#[must_use]
pub fn system_info(info: &SystemInfo) -> String {
    serde_json::to_string_pretty(&info.0).unwrap_or_else(|_| format!("{:?}", info.0))
}

fn push_streams(out: &mut String, result: &ExecResult) {
    if !result.stdout.is_empty() {
        out.push_str("--- STDOUT ---\n");
        out.push_str(&result.stdout);
        out.push('\n');
    }
    if !result.stderr.is_empty() {
        out.push_str("--- STDERR ---\n");
        out.push_str(&result.stderr);
    }
}

#[cfg(test)]
mod tests {
    use super::{NO_OUTPUT_MESSAGE, python_output, shell_output, system_info};
    use crate::contracts::{ExecResult, SystemInfo};
    use serde_json::json;

    fn exec(return_code: i64, stdout: &str, stderr: &str, error: Option<&str>) -> ExecResult {
        ExecResult {
            return_code,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn shell_with_stdout_only() {
        assert_eq!(
            shell_output(&exec(0, "a.txt\n", "", None)),
            "Exit Code: 0\n--- STDOUT ---\na.txt\n\n"
        );
    }

    #[test]
    fn shell_with_every_section() {
        assert_eq!(
            shell_output(&exec(1, "out", "boom", Some("Timeout"))),
            "Exit Code: 1\n--- STDOUT ---\nout\n--- STDERR ---\nboom\n--- ERROR ---\nTimeout"
        );
    }

    #[test]
    fn shell_with_no_streams_still_reports_exit_code() {
        assert_eq!(shell_output(&exec(127, "", "", None)), "Exit Code: 127\n");
    }

    #[test]
    fn python_without_output_uses_fixed_message() {
        assert_eq!(python_output(&exec(0, "", "", None)), NO_OUTPUT_MESSAGE);
    }

    #[test]
    fn python_shows_streams_without_exit_code() {
        let text = python_output(&exec(0, "42", "warning", None));
        assert_eq!(text, "--- STDOUT ---\n42\n--- STDERR ---\nwarning");
        assert!(!text.contains("Exit Code"));
    }

    #[test]
    fn system_info_is_pretty_printed() {
        let info: SystemInfo =
            serde_json::from_value(json!({ "gpu": "Tesla T4" })).expect("object");
        assert_eq!(system_info(&info), "{\n  \"gpu\": \"Tesla T4\"\n}");
    }

    #[test]
    fn system_info_keeps_remote_key_order() {
        let info: SystemInfo = serde_json::from_str(
            r#"{"python_version":"3.10","gpu":"T4","cpu_count":2}"#,
        )
        .expect("object");
        assert_eq!(
            system_info(&info),
            "{\n  \"python_version\": \"3.10\",\n  \"gpu\": \"T4\",\n  \"cpu_count\": 2\n}"
        );
    }
}
