// Shared helpers for strategy implementations

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;
use tracing::warn;

use super::config::AcquireConfig;
use super::errors::AcquireError;

pub(crate) const CONSENT_COOKIE: &str = "CONSENT=YES+cb.20210328-17-p0.en+FX+111";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

/// Headers that make caption endpoints answer like they would for a
/// regular browser session.
pub(crate) fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9,zh-CN;q=0.8,zh;q=0.7"),
    );
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers
}

/// Build the shared HTTP client: bounded per-call timeout, optional
/// proxy. An unparseable proxy URL falls back to a direct connection.
pub(crate) fn build_client(config: &AcquireConfig) -> Result<reqwest::Client, AcquireError> {
    let mut builder =
        reqwest::Client::builder().timeout(Duration::from_secs(config.request_timeout_secs));
    if let Some(proxy_url) = config.proxy.as_deref() {
        match reqwest::Proxy::all(proxy_url) {
            Ok(proxy) => builder = builder.proxy(proxy),
            Err(e) => warn!(proxy_url, error = %e, "invalid proxy url, connecting directly"),
        }
    }
    Ok(builder.build()?)
}

/// Scan `text` for the first balanced JSON object following `marker`.
/// String literals and escapes are honored, so braces inside values do
/// not confuse the depth count.
pub(crate) fn extract_json_object(text: &str, marker: &str) -> Option<String> {
    let marker_idx = text.find(marker)?;
    let start = marker_idx + text[marker_idx..].find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_str = false;
    let mut escape = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if in_str {
            if escape {
                escape = false;
            } else if byte == b'\\' {
                escape = true;
            } else if byte == b'"' {
                in_str = false;
            }
            continue;
        }
        match byte {
            b'"' => in_str = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[start..=start + offset].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

/// Run an external command with piped output and a hard timeout. The
/// child is killed when the timeout elapses.
pub(crate) async fn run_with_timeout(
    program: &str,
    args: &[String],
    timeout_secs: u64,
) -> Result<std::process::Output, AcquireError> {
    let mut child = TokioCommand::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AcquireError::ToolNotFound(program.to_string())
            } else {
                AcquireError::Execution(format!("failed to start {program}: {e}"))
            }
        })?;

    let mut stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| AcquireError::Execution(format!("failed to capture stdout from {program}")))?;
    let mut stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| AcquireError::Execution(format!("failed to capture stderr from {program}")))?;

    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stdout_pipe
            .read_to_end(&mut buf)
            .await
            .map_err(|e| AcquireError::Execution(format!("failed to read stdout: {e}")))?;
        Ok::<Vec<u8>, AcquireError>(buf)
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stderr_pipe
            .read_to_end(&mut buf)
            .await
            .map_err(|e| AcquireError::Execution(format!("failed to read stderr: {e}")))?;
        Ok::<Vec<u8>, AcquireError>(buf)
    });

    match timeout(Duration::from_secs(timeout_secs), child.wait()).await {
        Ok(status_res) => {
            let status = status_res
                .map_err(|e| AcquireError::Execution(format!("failed to wait for {program}: {e}")))?;
            let stdout = stdout_task
                .await
                .map_err(|e| AcquireError::Execution(format!("stdout task failed: {e}")))??;
            let stderr = stderr_task
                .await
                .map_err(|e| AcquireError::Execution(format!("stderr task failed: {e}")))??;
            Ok(std::process::Output {
                status,
                stdout,
                stderr,
            })
        }
        Err(_) => {
            let _ = child.kill().await;
            stdout_task.abort();
            stderr_task.abort();
            Err(AcquireError::Timeout(timeout_secs))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_object_basic() {
        let text = "junk var ytInitialPlayerResponse = {\"a\": {\"b\": 1}}; more";
        assert_eq!(
            extract_json_object(text, "ytInitialPlayerResponse"),
            Some("{\"a\": {\"b\": 1}}".to_string())
        );
    }

    #[test]
    fn test_extract_json_object_ignores_braces_in_strings() {
        let text = "marker = {\"a\": \"}}\", \"b\": \"\\\"{\"}";
        let extracted = extract_json_object(text, "marker").unwrap();
        assert_eq!(extracted, "{\"a\": \"}}\", \"b\": \"\\\"{\"}");
        assert!(serde_json::from_str::<serde_json::Value>(&extracted).is_ok());
    }

    #[test]
    fn test_extract_json_object_missing_marker_or_unbalanced() {
        assert_eq!(extract_json_object("no marker here", "marker"), None);
        assert_eq!(extract_json_object("marker = {\"a\": 1", "marker"), None);
        assert_eq!(extract_json_object("marker but no object", "marker"), None);
    }

    #[tokio::test]
    async fn test_run_with_timeout_captures_output() {
        let output = run_with_timeout("echo", &["hello".to_string()], 5)
            .await
            .unwrap();
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
    }

    #[tokio::test]
    async fn test_run_with_timeout_kills_slow_child() {
        let result = run_with_timeout("sleep", &["5".to_string()], 1).await;
        assert!(matches!(result, Err(AcquireError::Timeout(1))));
    }

    #[tokio::test]
    async fn test_run_with_timeout_missing_tool() {
        let result = run_with_timeout("definitely-not-a-real-binary", &[], 1).await;
        assert!(matches!(result, Err(AcquireError::ToolNotFound(_))));
    }
}
