use http_body_util::Full;
use hyper::body::Bytes;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use hyper_util::server::conn::auto::Builder;
use owo_colors::OwoColorize;
use prometheus::{Encoder, HistogramVec, IntCounterVec, Opts, TextEncoder};
use tokio::net::TcpListener;

/// Per-controller counters and histograms, grouped behind the `metrics`
/// feature so a build can drop the `prometheus` dependency entirely. Each
/// controller registers its own metric family (prefixed by `controller`)
/// into the process-wide default registry, so a single `/metrics` endpoint
/// in `main.rs` can serve every controller with one `prometheus::gather()`.
#[derive(Clone)]
pub struct ControllerMetrics {
    pub reconcile_counter: IntCounterVec,
    pub action_counter: IntCounterVec,
    pub read_histogram: HistogramVec,
    pub write_histogram: HistogramVec,
}

impl ControllerMetrics {
    pub fn new(controller: &str) -> Self {
        let reconcile_counter = IntCounterVec::new(
            Opts::new(
                format!("{controller}_reconcile_total"),
                "Total number of reconciles for this controller",
            ),
            &["name", "namespace"],
        )
        .unwrap();

        let action_counter = IntCounterVec::new(
            Opts::new(
                format!("{controller}_action_total"),
                "Total number of actions performed, by kind",
            ),
            &["name", "namespace", "action"],
        )
        .unwrap();

        let read_histogram = HistogramVec::new(
            prometheus::HistogramOpts::new(
                format!("{controller}_read_seconds"),
                "Time spent determining the next action",
            ),
            &["name", "namespace", "action"],
        )
        .unwrap();

        let write_histogram = HistogramVec::new(
            prometheus::HistogramOpts::new(
                format!("{controller}_write_seconds"),
                "Time spent applying an action",
            ),
            &["name", "namespace", "action"],
        )
        .unwrap();

        prometheus::register(Box::new(reconcile_counter.clone())).unwrap();
        prometheus::register(Box::new(action_counter.clone())).unwrap();
        prometheus::register(Box::new(read_histogram.clone())).unwrap();
        prometheus::register(Box::new(write_histogram.clone())).unwrap();

        Self {
            reconcile_counter,
            action_counter,
            read_histogram,
            write_histogram,
        }
    }
}

/// Encodes every metric registered by any controller into Prometheus text
/// exposition format, for the `/metrics` HTTP handler in `main.rs`.
pub fn encode_all() -> Vec<u8> {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    let families = prometheus::gather();
    encoder.encode(&families, &mut buffer).unwrap();
    buffer
}

async fn handle(req: Request<hyper::body::Incoming>) -> Result<Response<Full<Bytes>>, std::convert::Infallible> {
    let body = match req.uri().path() {
        "/metrics" => encode_all(),
        _ => b"ok".to_vec(),
    };
    Ok(Response::new(Full::new(Bytes::from(body))))
}

/// Serves `/metrics` (and a catch-all liveness response on any other path)
/// on the given port until the process exits. Spawned once from `main.rs`
/// when the `metrics` feature is enabled.
pub async fn serve(port: u16) {
    let addr = format!("0.0.0.0:{port}");
    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("{}", format!("🛑 failed to bind metrics server to {addr}: {e}").red());
            return;
        }
    };
    println!("{}", format!("📈 serving /metrics on {addr}").green());

    loop {
        let (stream, _) = match listener.accept().await {
            Ok(s) => s,
            Err(e) => {
                eprintln!("metrics server accept error: {e}");
                continue;
            }
        };
        let io = TokioIo::new(stream);
        tokio::spawn(async move {
            if let Err(e) = Builder::new(hyper_util::rt::TokioExecutor::new())
                .serve_connection(io, service_fn(handle))
                .await
            {
                eprintln!("metrics server connection error: {e}");
            }
        });
    }
}
