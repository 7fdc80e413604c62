// Drives the real server over TCP with the real process invoker, via `sh`.
#![cfg(unix)]

use payslip_redactor::load_config::load_config;
use payslip_redactor::server::{router, serve_on, AppState};
use reqwest::multipart::{Form, Part};
use serial_test::serial;
use std::fs::write;
use std::io::Cursor;
use std::sync::Arc;
use tempfile::tempdir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

const FAKE_REDACTOR: &str = r#"#!/bin/sh
[ "$1" = "--input" ] || exit 64
for f in *.pdf; do
  cp "$f" "${f%.pdf}_redacted.pdf"
done
cp "$2" Payslips_redacted.xlsx
exit 7
"#;

#[tokio::test]
#[serial]
async fn upload_round_trip_through_external_program() {
    std::env::remove_var("PORT");
    let dir = tempdir().unwrap();
    write(dir.path().join("fake.sh"), FAKE_REDACTOR).unwrap();
    let config_path = dir.path().join("config.yaml");
    write(
        &config_path,
        "runs_dir: ./runs\nserver:\n  host: 127.0.0.1\n  port: 0\nredactor:\n  program: sh\n  script: fake.sh\n",
    )
    .unwrap();
    let config = load_config(&config_path).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(
        Arc::new(AppState::from_config(&config)),
        config.server.max_upload_bytes,
    );
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(serve_on(listener, app, async {
        let _ = stop_rx.await;
    }));

    let form = Form::new()
        .part("excel", Part::bytes(b"name,file\n".to_vec()).file_name("Payslips.xlsx"))
        .part("pdfs", Part::bytes(b"%PDF-1".to_vec()).file_name("jan.pdf"))
        .part("pdfs", Part::bytes(b"%PDF-2".to_vec()).file_name("feb.pdf"));
    let response = reqwest::Client::new()
        .post(format!("http://{addr}/process"))
        .multipart(form)
        .send()
        .await
        .expect("request should reach the server");

    assert_eq!(response.status(), 200);
    let disposition = response.headers()["content-disposition"]
        .to_str()
        .unwrap()
        .to_string();
    let run_id = disposition
        .trim_start_matches("attachment; filename=\"redaction_results_")
        .trim_end_matches(".zip\"")
        .to_string();
    assert_eq!(run_id.len(), 10, "unexpected disposition: {disposition}");

    let bytes = response.bytes().await.unwrap();
    let zip = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
    let mut names: Vec<&str> = zip.file_names().collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "Payslips.xlsx",
            "Payslips_redacted.xlsx",
            "README.txt",
            "feb.pdf",
            "feb_redacted.pdf",
            "jan.pdf",
            "jan_redacted.pdf",
        ]
    );

    // Run folders stay on disk for inspection.
    let runs_dir = dir.path().join("runs");
    assert!(runs_dir.join(&run_id).join("_bundle").join("README.txt").is_file());
    assert!(runs_dir.join(format!("{run_id}.zip")).is_file());
    let readme = std::fs::read_to_string(runs_dir.join(&run_id).join("_bundle").join("README.txt")).unwrap();
    assert!(readme.contains("Exit code: 7"));

    stop_tx.send(()).unwrap();
    server.await.unwrap().unwrap();
}
