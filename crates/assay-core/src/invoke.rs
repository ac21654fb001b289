//! Command/API invoker
//!
//! Two modes:
//! - shell: run a command extracted from the question and return its stdout
//! - URL: perform a GET or POST and return the response body
//!
//! Both modes are bounded by the timeouts in [`InvokerConfig`]. Shell mode is
//! refused unless explicitly enabled; when it runs, the child gets an empty
//! environment (only `PATH` survives), the request scratch directory as its
//! working directory, and is killed if the timeout fires.

use std::path::Path;
use std::process::Stdio;

use reqwest::{Client, Url};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::InvokerConfig;
use crate::error::{Error, Result};
use crate::models::{Answer, HttpMethod};

/// Fallback search path when the server itself runs without `PATH`
const DEFAULT_PATH: &str = "/usr/local/bin:/usr/bin:/bin";

/// Run `command` through `sh -c` and return its trimmed stdout
pub async fn run_shell(command: &str, config: &InvokerConfig, cwd: &Path) -> Result<String> {
    if !config.allow_shell {
        warn!(command, "Refusing shell command (ASSAY_ALLOW_SHELL is not set)");
        return Err(Error::Disabled(
            "Shell command execution is disabled on this server".into(),
        ));
    }

    let path = std::env::var("PATH").unwrap_or_else(|_| DEFAULT_PATH.to_string());
    let child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .env_clear()
        .env("PATH", path)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    debug!(command, timeout_secs = config.shell_timeout.as_secs_f64(), "Spawned shell command");

    // Dropping the wait future on timeout drops the child, which kills it
    let output = match tokio::time::timeout(config.shell_timeout, child.wait_with_output()).await {
        Ok(result) => result?,
        Err(_) => {
            warn!(command, "Shell command timed out");
            return Err(Error::Timeout(format!(
                "Command did not finish within {}s",
                config.shell_timeout.as_secs_f64()
            )));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Upstream(format!(
            "Command exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    info!(command, bytes = stdout.len(), "Shell command completed");
    Ok(stdout)
}

/// Perform an HTTP request and return the body
///
/// JSON bodies come back as [`Answer::Json`], anything else as trimmed text.
pub async fn call_api(url: &str, method: HttpMethod, config: &InvokerConfig) -> Result<Answer> {
    let parsed = Url::parse(url).map_err(|e| Error::Parse(format!("Invalid URL '{}': {}", url, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::Parse(format!(
            "Unsupported URL scheme '{}' in {}",
            parsed.scheme(),
            url
        )));
    }

    let client = Client::builder().timeout(config.http_timeout).build()?;
    let request = match method {
        HttpMethod::Get => client.get(parsed),
        HttpMethod::Post => client.post(parsed),
    };

    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            Error::Timeout(format!("{} {} did not respond in time", method, url))
        } else {
            Error::Http(e)
        }
    })?;

    let status = response.status();
    let body = response.text().await.map_err(|e| {
        if e.is_timeout() {
            Error::Timeout(format!("{} {} did not finish in time", method, url))
        } else {
            Error::Http(e)
        }
    })?;

    if !status.is_success() {
        return Err(Error::Upstream(format!(
            "{} {} returned {}: {}",
            method,
            url,
            status,
            body.trim()
        )));
    }

    info!(%method, url, status = status.as_u16(), bytes = body.len(), "API request completed");

    match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(value) => Ok(Answer::Json(value)),
        Err(_) => Ok(Answer::Text(body.trim().to_string())),
    }
}
