//! `shelfcount status`: ask a running server for its health report.

use anyhow::Result;
use std::time::Duration;

use crate::config::Settings;
use crate::terminal_output::{note_success, note_warn};

pub async fn run(settings: &Settings) -> Result<()> {
    // A server bound to every interface is still reached over loopback.
    let host = match settings.bind_address.as_str() {
        "0.0.0.0" | "::" => "127.0.0.1",
        other => other,
    };
    let url = format!("http://{host}:{}/api/health", settings.port);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;
    match client.get(&url).send().await {
        Ok(resp) if resp.status().is_success() => {
            let body: serde_json::Value = resp.json().await?;
            note_success(&format!("shelfcount is running at {url}"));
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Ok(resp) => note_warn(&format!("{url} answered {}", resp.status())),
        Err(_) => note_warn(&format!("shelfcount is not running on port {}", settings.port)),
    }
    Ok(())
}
