//! JSON-lines request server.
//!
//! The async front end reads requests from the input line by line and hands
//! each one to a fixed pool of worker threads over a crossbeam job queue.
//! Every job carries a oneshot sender for its outcome; the front end awaits
//! it under the configured deadline and forwards the response to a single
//! writer task, so output lines never interleave.
//!
//! Shutdown: end of input drains in-flight requests before returning; a
//! SIGTERM/SIGINT (polled on a 50ms heartbeat) stops reading immediately and
//! abandons whatever is still running.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use filecmp_core::{CompareService, Config};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::flag::register;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;

use crate::protocol::{self, ErrorBody, Greeting, Outcome, Payload, Request, Response};

const HEARTBEAT: Duration = Duration::from_millis(50);

/// Returns a flag that flips to `true` on SIGTERM or SIGINT.
pub fn register_shutdown_signals() -> io::Result<Arc<AtomicBool>> {
    let term = Arc::new(AtomicBool::new(false));
    // Safety: the handler only stores into the AtomicBool, which is
    // async-signal-safe.
    register(SIGTERM, Arc::clone(&term))?;
    register(SIGINT, Arc::clone(&term))?;
    Ok(term)
}

/// Runs one request against the service.
pub fn handle(service: &CompareService, request: Request) -> Outcome {
    match request {
        Request::Hello => Outcome::Result(Payload::Hello(Greeting::default())),
        Request::ListFiles { directory } => match service.list_tree(&directory) {
            Ok(tree) => Outcome::Result(Payload::Tree(tree)),
            Err(e) => Outcome::Error(ErrorBody::from(&e)),
        },
        Request::FileContent { file_path } => match service.file_content(&file_path) {
            Ok(content) => Outcome::Result(Payload::Content(content)),
            Err(e) => Outcome::Error(ErrorBody::from(&e)),
        },
        Request::Compare(request) => match service.compare(&request) {
            Ok(response) => Outcome::Result(Payload::Compare(response)),
            Err(e) => Outcome::Error(ErrorBody::from(&e)),
        },
    }
}

/// A request queued for a worker, with the channel its outcome goes back on.
struct Job {
    request: Request,
    reply: oneshot::Sender<Outcome>,
}

/// Worker thread body: serves jobs until the queue is closed.
fn worker_loop(service: Arc<CompareService>, rx: Receiver<Job>) {
    for job in rx {
        let outcome = handle(&service, job.request);
        // The front end may have given up on this job after its deadline.
        let _ = job.reply.send(outcome);
    }
}

/// Fixed pool of worker threads sharing one job queue.
pub struct WorkerPool {
    jobs: Option<Sender<Job>>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn spawn(service: Arc<CompareService>, workers: usize) -> io::Result<Self> {
        let (tx, rx) = crossbeam_channel::unbounded::<Job>();
        let mut handles = Vec::with_capacity(workers);
        for index in 0..workers {
            let service = Arc::clone(&service);
            let rx = rx.clone();
            let handle = std::thread::Builder::new()
                .name(format!("filecmp-worker-{index}"))
                .spawn(move || worker_loop(service, rx))?;
            handles.push(handle);
        }
        tracing::debug!(workers, "worker pool started");
        Ok(Self { jobs: Some(tx), handles })
    }

    /// Queues `request`. If no worker is left to take it, the returned
    /// receiver resolves to an error.
    fn submit(&self, request: Request) -> oneshot::Receiver<Outcome> {
        let (reply, rx) = oneshot::channel();
        if let Some(jobs) = &self.jobs {
            let _ = jobs.send(Job { request, reply });
        }
        rx
    }

    /// Closes the queue and waits for every worker to finish its current job.
    pub fn shutdown(mut self) {
        self.jobs.take();
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                tracing::error!("worker thread panicked");
            }
        }
    }
}

/// Counters reported when the server stops.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ServeStats {
    pub requests: u64,
    pub errors: u64,
}

/// Serializes responses onto `output`, one per line, in arrival order.
async fn write_responses<W>(mut output: W, mut rx: mpsc::UnboundedReceiver<Response>) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let mut line = serde_json::to_vec(&response)?;
        line.push(b'\n');
        output.write_all(&line).await?;
        output.flush().await?;
    }
    Ok(())
}

/// Awaits a worker's outcome under `deadline`.
async fn await_outcome(reply: oneshot::Receiver<Outcome>, deadline: Duration) -> Outcome {
    match tokio::time::timeout(deadline, reply).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(_)) => Outcome::Error(ErrorBody::internal("worker dropped the request")),
        Err(_) => Outcome::Error(ErrorBody::timeout(deadline)),
    }
}

/// Serves requests from `input` until end of input or until `term_flag` is set.
pub async fn serve<R, W>(
    service: Arc<CompareService>,
    config: &Config,
    input: R,
    output: W,
    term_flag: Arc<AtomicBool>,
) -> io::Result<ServeStats>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let pool = WorkerPool::spawn(service, config.server.workers)?;
    let deadline = config.limits.request_timeout();
    let (out_tx, out_rx) = mpsc::unbounded_channel::<Response>();
    let writer = tokio::spawn(write_responses(output, out_rx));

    let mut in_flight: JoinSet<bool> = JoinSet::new();
    let mut lines = input.lines();
    let mut stats = ServeStats::default();
    let mut terminated = false;

    tracing::info!(workers = config.server.workers, timeout_secs = deadline.as_secs(), "serving");

    'read_loop: loop {
        tokio::select! {
            // Heartbeat: SIGTERM is noticed even while the input is idle.
            _ = tokio::time::sleep(HEARTBEAT) => {
                if term_flag.load(Ordering::Relaxed) {
                    terminated = true;
                    break 'read_loop;
                }
            }
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if matches!(joined, Ok(true)) {
                    stats.errors += 1;
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break 'read_loop;
                };
                if line.trim().is_empty() {
                    continue;
                }
                stats.requests += 1;

                let incoming = protocol::decode(&line);
                let id = incoming.id;
                match incoming.request {
                    Err(detail) => {
                        tracing::debug!(%id, %detail, "rejected request");
                        stats.errors += 1;
                        let outcome = Outcome::Error(ErrorBody::invalid_request(detail));
                        let _ = out_tx.send(Response { id, outcome });
                    }
                    Ok(request) => {
                        tracing::debug!(%id, method = request.method(), "request");
                        let reply = pool.submit(request);
                        let out_tx = out_tx.clone();
                        in_flight.spawn(async move {
                            let outcome = await_outcome(reply, deadline).await;
                            let failed = outcome.is_error();
                            let _ = out_tx.send(Response { id, outcome });
                            failed
                        });
                    }
                }
            }
        }
    }

    if terminated {
        tracing::info!(pending = in_flight.len(), "shutdown signal received");
        in_flight.shutdown().await;
    } else {
        while let Some(joined) = in_flight.join_next().await {
            if matches!(joined, Ok(true)) {
                stats.errors += 1;
            }
        }
    }

    drop(out_tx);
    match writer.await {
        Ok(result) => result?,
        Err(e) => return Err(io::Error::other(e)),
    }

    // Workers may still be busy with requests that missed their deadline;
    // joining is only worth it when nothing was abandoned.
    if terminated {
        drop(pool);
    } else {
        let _ = tokio::task::spawn_blocking(move || pool.shutdown()).await;
    }

    tracing::info!(requests = stats.requests, errors = stats.errors, "server stopped");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::Value;
    use tokio::io::{AsyncReadExt, BufReader};

    use super::*;

    fn service() -> Arc<CompareService> {
        Arc::new(CompareService::new(&Config::default()))
    }

    /// Runs the server over `input` and returns the parsed output lines.
    async fn run(input: &str, config: &Config) -> (ServeStats, Vec<Value>) {
        let (mut client, server_side) = tokio::io::duplex(1 << 20);
        let flag = Arc::new(AtomicBool::new(false));
        let stats = serve(
            service(),
            config,
            BufReader::new(input.as_bytes()),
            server_side,
            flag,
        )
        .await
        .unwrap();

        let mut raw = String::new();
        client.read_to_string(&mut raw).await.unwrap();
        let responses = raw
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        (stats, responses)
    }

    fn by_id<'a>(responses: &'a [Value], id: &str) -> &'a Value {
        responses
            .iter()
            .find(|r| r["id"] == id)
            .unwrap_or_else(|| panic!("no response for {id}"))
    }

    #[test]
    fn handle_hello() {
        let outcome = handle(&service(), Request::Hello);
        assert_eq!(outcome, Outcome::Result(Payload::Hello(Greeting::default())));
    }

    #[test]
    fn handle_maps_errors() {
        let outcome = handle(
            &service(),
            Request::FileContent { file_path: "/definitely/not/here".to_owned() },
        );
        match outcome {
            Outcome::Error(body) => {
                assert_eq!(body.kind, "not_found");
                assert_eq!(body.side, None);
            }
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn serve_answers_every_request() {
        let dir = tempfile::TempDir::new().unwrap();
        let left = dir.path().join("left.txt");
        let right = dir.path().join("right.txt");
        fs::write(&left, "a\nb\nc\n").unwrap();
        fs::write(&right, "a\nx\nc\n").unwrap();

        let input = format!(
            "{}\n{}\n\n{}\n{}\n",
            r#"{"id":"h","method":"hello"}"#,
            serde_json::json!({
                "id": "c",
                "method": "compare",
                "file1_path": left,
                "file2_path": right,
            }),
            serde_json::json!({"id": "t", "method": "list_files", "directory": dir.path()}),
            r#"{"id":"bad","method":"compare","file1_path":"/only-one"}"#,
        );

        let (stats, responses) = run(&input, &Config::default()).await;
        assert_eq!(stats, ServeStats { requests: 4, errors: 1 });
        assert_eq!(responses.len(), 4);

        assert_eq!(by_id(&responses, "h")["result"]["message"], "File Compare API");

        let compare = &by_id(&responses, "c")["result"];
        assert_eq!(compare["stats"]["replace"], 1);
        assert_eq!(compare["diff"][1]["type"], "replace");
        assert_eq!(compare["diff"][1]["content_left"], "b\n");

        let tree = &by_id(&responses, "t")["result"];
        assert_eq!(tree["is_directory"], true);
        assert_eq!(tree["children"][0]["name"], "left.txt");
        assert!(tree["children"][0]["children"].is_null());

        let bad = &by_id(&responses, "bad")["error"];
        assert_eq!(bad["kind"], "invalid_request");
        assert_eq!(bad["status"], 400);
    }

    #[tokio::test]
    async fn serve_reports_compare_side() {
        let dir = tempfile::TempDir::new().unwrap();
        let left = dir.path().join("left.txt");
        fs::write(&left, "a\n").unwrap();
        let right = dir.path().join("missing.txt");

        let input = serde_json::json!({
            "id": 9,
            "method": "compare",
            "path_left": left,
            "path_right": right,
        })
        .to_string();

        let (stats, responses) = run(&input, &Config::default()).await;
        assert_eq!(stats.errors, 1);
        let error = &responses[0]["error"];
        assert_eq!(responses[0]["id"], 9);
        assert_eq!(error["kind"], "not_found");
        assert_eq!(error["status"], 404);
        assert_eq!(error["side"], "right");
    }

    #[tokio::test]
    async fn serve_generates_missing_ids() {
        let (_, responses) = run("{\"method\":\"hello\"}\n", &Config::default()).await;
        let id = responses[0]["id"].as_str().unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
    }

    #[tokio::test]
    async fn await_outcome_times_out() {
        let (_keep, rx) = oneshot::channel::<Outcome>();
        let outcome = await_outcome(rx, Duration::from_millis(10)).await;
        match outcome {
            Outcome::Error(body) => assert_eq!(body.status, 504),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn await_outcome_dropped_worker_is_internal() {
        let (tx, rx) = oneshot::channel::<Outcome>();
        drop(tx);
        match await_outcome(rx, Duration::from_secs(1)).await {
            Outcome::Error(body) => assert_eq!(body.kind, "internal"),
            other => panic!("expected internal error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn serve_stops_on_term_flag() {
        // The input never ends, so only the flag can stop the server.
        let (_client_in, server_in) = tokio::io::duplex(64);
        let (_client_out, server_out) = tokio::io::duplex(1 << 16);
        let flag = Arc::new(AtomicBool::new(true));

        let stats = tokio::time::timeout(
            Duration::from_secs(5),
            serve(service(), &Config::default(), BufReader::new(server_in), server_out, flag),
        )
        .await
        .expect("server did not stop")
        .unwrap();
        assert_eq!(stats.requests, 0);
    }
}
