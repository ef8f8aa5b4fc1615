//! Common test utilities
//!
//! Shared across the tdlcore integration tests: stand-in `tdl` scripts and
//! config builders.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tdlcore::config::TdlSettings;
use tdlcore::DownloadRequest;
use tokio_util::sync::CancellationToken;

/// Writes an executable `/bin/sh` script named `tdl` into `dir`.
#[cfg(unix)]
pub fn fake_tdl(dir: &Path, body: &str) -> PathBuf {
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("tdl");
    {
        let mut file = std::fs::File::create(&path).expect("create fake tdl");
        writeln!(file, "#!/bin/sh").expect("write shebang");
        file.write_all(body.as_bytes()).expect("write body");
        file.sync_all().expect("sync fake tdl");
    }
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).expect("chmod fake tdl");
    path
}

/// Settings that report every progress line and never time out
pub fn tdl_settings(bin: &Path) -> TdlSettings {
    TdlSettings {
        bin: bin.display().to_string(),
        extra_args: vec![],
        progress_interval: 1,
        max_concurrent: 1,
        timeout_secs: 0,
    }
}

pub fn request(destination: PathBuf) -> DownloadRequest {
    DownloadRequest {
        url: "https://t.me/example/1".to_string(),
        proxy_url: None,
        destination,
        cancel: CancellationToken::new(),
    }
}

/// Minimal bot config pointing at `download_path` and a given tdl binary
pub fn config_toml(download_path: &Path, tdl_bin: &Path, tags: &[&str], rows: usize, cols: usize) -> String {
    let tags = tags
        .iter()
        .map(|tag| format!("{:?}", tag))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r#"
bot_token = "42:token"
download_path = {download:?}
tags = [{tags}]

[keyboard]
rows_per_page = {rows}
cols_per_row = {cols}

[tdl]
bin = {bin:?}
extra_args = []
progress_interval = 1
"#,
        download = download_path.display().to_string(),
        bin = tdl_bin.display().to_string(),
    )
}
