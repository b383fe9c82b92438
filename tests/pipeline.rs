use std::collections::HashMap;
use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use flate2::write::GzEncoder;
use flate2::Compression;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use pagecounts::acquire::filter::SnapshotDay;
use pagecounts::acquire::loader::{Ingest, LocalTable};
use pagecounts::acquire::{self, AcquireConfig, SnapshotRequest};
use pagecounts::partition::PartitionResolver;
use pagecounts::record::{AggregationResult, PartitionKey};
use pagecounts::standalone::{self, Job};
use pagecounts::PipelineError;

const MONTH: &str = "/raw/2013/2013-11/";

fn gz(content: &str) -> Vec<u8> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(content.as_bytes()).unwrap();
    enc.finish().unwrap()
}

/// Serves `routes` over plain HTTP/1.1, one request per connection.
async fn serve(routes: HashMap<String, Vec<u8>>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let routes = Arc::new(routes);
    tokio::spawn(async move {
        loop {
            let Ok((mut sock, _)) = listener.accept().await else {
                return;
            };
            let routes = routes.clone();
            tokio::spawn(async move {
                let mut req = Vec::new();
                let mut buf = [0u8; 1024];
                while !req.windows(4).any(|w| w == b"\r\n\r\n") {
                    match sock.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => req.extend_from_slice(&buf[..n]),
                    }
                }
                let head = String::from_utf8_lossy(&req);
                let path = head.split_whitespace().nth(1).unwrap_or("/").to_string();
                let (status, body) = match routes.get(&path) {
                    Some(body) => ("200 OK", body.clone()),
                    None => ("404 Not Found", b"missing".to_vec()),
                };
                let header = format!(
                    "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = sock.write_all(header.as_bytes()).await;
                let _ = sock.write_all(&body).await;
                let _ = sock.shutdown().await;
            });
        }
    });
    addr
}

fn index_html(links: &[&str]) -> Vec<u8> {
    let mut doc = String::from("<html><head><title>Index</title></head><body><ul>");
    for link in links {
        doc.push_str(&format!("<li><a href=\"{link}\">{link}</a></li>"));
    }
    doc.push_str("<li><a>no target</a></body>");
    doc.into_bytes()
}

fn config(addr: SocketAddr, work_dir: &Path, excluded_hours: &[&str]) -> AcquireConfig {
    AcquireConfig {
        base_url: format!("http://{addr}/raw"),
        work_dir: work_dir.to_path_buf(),
        excluded_hours: excluded_hours.iter().map(|h| h.to_string()).collect(),
        report_progress: true,
        ..AcquireConfig::default()
    }
}

const DAY: SnapshotDay = SnapshotDay {
    year: 2013,
    month: 11,
    day: 5,
};

#[tokio::test]
async fn day_is_acquired_and_most_visited_context_found() {
    let hour0 = "en Main_Page 10 100\nen Foo 20 100\ngarbage\n";
    let hour1 = "en Main_Page 15 100\nde Bar 3 10\n";
    let hour2 = "en Foo 1000 100\n";
    let mut routes = HashMap::new();
    routes.insert(
        format!("{MONTH}index.html"),
        index_html(&[
            "../",
            "pagecounts-20131104-230000.gz",
            "pagecounts-20131105-000000.gz",
            "pagecounts-20131105-010000.gz",
            "pagecounts-20131105-020000.gz",
            "projectcounts-20131105-000000",
        ]),
    );
    routes.insert(format!("{MONTH}pagecounts-20131105-000000.gz"), gz(hour0));
    routes.insert(format!("{MONTH}pagecounts-20131105-010000.gz"), gz(hour1));
    routes.insert(format!("{MONTH}pagecounts-20131105-020000.gz"), gz(hour2));
    let addr = serve(routes).await;

    let dir = tempfile::tempdir().unwrap();
    let work = dir.path().join("work");
    let table = dir.path().join("warehouse").join("db").join("table");

    let request = SnapshotRequest { day: DAY, at: None };
    let loaded = acquire::run(&config(addr, &work, &["02"]), request, LocalTable::new(&table))
        .await
        .unwrap();
    assert_eq!(loaded, 2);
    // nothing but the (empty) staging directory is left behind
    assert_eq!(std::fs::read_dir(&work).unwrap().count(), 0);

    let inputs = PartitionResolver::new(&table).resolve(&DAY.ymd()).unwrap();
    assert_eq!(
        inputs,
        vec![
            table.join("ds=20131105-0000").join("pagecounts-20131105-000000"),
            table.join("ds=20131105-0100").join("pagecounts-20131105-010000"),
        ]
    );

    let job = Job {
        inputs,
        workload: "most-visited".to_string(),
        output: dir.path().join("out"),
        args: Vec::new(),
        n_reduce: 1,
    };
    let results = standalone::run(&job)
        .unwrap()
        .into_iter()
        .map(AggregationResult::try_from)
        .collect::<anyhow::Result<Vec<_>>>()
        .unwrap();
    // Bar 3, Foo 20 and Main_Page 10 + 15 arrive in key order
    assert_eq!(results, vec![AggregationResult::new("Main_Page", 25)]);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("out").join("mr-out-0")).unwrap(),
        "Main_Page\t25\n"
    );
}

#[tokio::test]
async fn pinned_time_fetches_a_single_snapshot() {
    let mut routes = HashMap::new();
    routes.insert(
        format!("{MONTH}index.html"),
        index_html(&["pagecounts-20131105-000000.gz", "pagecounts-20131105-013000.gz"]),
    );
    routes.insert(
        format!("{MONTH}pagecounts-20131105-013000.gz"),
        gz("en Main_Page 1 1\n"),
    );
    let addr = serve(routes).await;
    let dir = tempfile::tempdir().unwrap();
    let table = dir.path().join("table");

    let request = SnapshotRequest {
        day: DAY,
        at: Some((1, 30)),
    };
    let loaded = acquire::run(&config(addr, dir.path(), &[]), request, LocalTable::new(&table))
        .await
        .unwrap();
    assert_eq!(loaded, 1);
    assert!(table.join("ds=20131105-0130").is_dir());
    assert!(!table.join("ds=20131105-0000").exists());
}

#[tokio::test]
async fn no_matching_snapshot_is_not_an_error() {
    let mut routes = HashMap::new();
    routes.insert(
        format!("{MONTH}index.html"),
        index_html(&["pagecounts-20131106-000000.gz"]),
    );
    let addr = serve(routes).await;
    let dir = tempfile::tempdir().unwrap();

    let request = SnapshotRequest { day: DAY, at: None };
    let loaded = acquire::run(&config(addr, dir.path(), &[]), request, LocalTable::new(dir.path().join("t")))
        .await
        .unwrap();
    assert_eq!(loaded, 0);
}

#[tokio::test]
async fn missing_index_is_a_transfer_error() {
    let addr = serve(HashMap::new()).await;
    let dir = tempfile::tempdir().unwrap();
    let request = SnapshotRequest { day: DAY, at: None };
    let err = acquire::run(&config(addr, dir.path(), &[]), request, LocalTable::new(dir.path().join("t")))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Transfer { .. }));
}

/// Accepts the first snapshot, rejects every later one.
struct FailAfterFirst {
    calls: Mutex<Vec<(PathBuf, String)>>,
}

impl Ingest for FailAfterFirst {
    async fn load(&self, path: &Path, partition: &PartitionKey) -> Result<i32, PipelineError> {
        let mut calls = self.calls.lock().unwrap();
        calls.push((path.to_path_buf(), partition.to_string()));
        Ok(if calls.len() == 1 { 0 } else { 1 })
    }
}

#[tokio::test]
async fn failed_ingestion_aborts_the_run_and_keeps_the_file() {
    let mut routes = HashMap::new();
    routes.insert(
        format!("{MONTH}index.html"),
        index_html(&[
            "pagecounts-20131105-000000.gz",
            "pagecounts-20131105-010000.gz",
            "pagecounts-20131105-020000.gz",
        ]),
    );
    for h in ["00", "01", "02"] {
        routes.insert(
            format!("{MONTH}pagecounts-20131105-{h}0000.gz"),
            gz("en Main_Page 1 1\n"),
        );
    }
    let addr = serve(routes).await;
    let dir = tempfile::tempdir().unwrap();

    let ingest = FailAfterFirst {
        calls: Mutex::new(Vec::new()),
    };
    let request = SnapshotRequest { day: DAY, at: None };
    let err = acquire::run(&config(addr, dir.path(), &[]), request, ingest)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Ingestion { ref partition, status: 1, .. } if partition == "20131105-0100"
    ));
    assert!(!dir.path().join("pagecounts-20131105-000000").exists());
    assert!(dir.path().join("pagecounts-20131105-010000").exists());
    assert!(!dir.path().join("pagecounts-20131105-020000.gz").exists());
}
