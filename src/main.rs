//! `snapwire` binary: run a receiver or send text and images to one.

mod cli;

use std::{error::Error, num::NonZeroUsize, time::Duration};

use clap::Parser;
use cli::{Cli, Command, LinkArgs, ServeArgs};
use snapwire::{
    capture::FileSource,
    fragment::{ChunkSender, FragmentationConfig, RateLimit, SendError, SenderConfig},
    reassembly::ReassemblyConfig,
    server::SnapServer,
    sink::DirectorySink,
    transport::UdpTarget,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

type BoxError = Box<dyn Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Applications embedding the library should install their own subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    match Cli::parse().command {
        Command::Serve(args) => serve(args).await,
        Command::SendText { to, text, link } => {
            let sender = connect(to, &link).await?;
            sender.send_text(&text).await?;
            info!(%to, "message sent");
            Ok(())
        }
        Command::SendFile { to, path, link } => {
            let sender = connect(to, &link).await?;
            let report = sender.send_capture(&FileSource::new(path)).await?;
            info!(
                %to,
                total_chunks = report.total_chunks,
                len = report.payload_len,
                "file sent"
            );
            Ok(())
        }
        Command::Console { to, capture, link } => {
            let sender = connect(to, &link).await?;
            console(&sender, &FileSource::new(capture)).await
        }
    }
}

async fn serve(args: ServeArgs) -> Result<(), BoxError> {
    #[cfg(feature = "metrics")]
    if let Some(addr) = args.metrics_addr {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()?;
        info!(%addr, "metrics exporter listening");
    }
    #[cfg(not(feature = "metrics"))]
    if args.metrics_addr.is_some() {
        warn!("built without the metrics feature; --metrics-addr ignored");
    }

    let fragmentation = fragmentation(args.max_datagram, args.max_payload)?;
    let mut reassembly = ReassemblyConfig::from_fragmentation(&fragmentation)
        .with_timeout(Duration::from_secs(args.timeout_secs))
        .with_max_in_flight(args.max_in_flight);
    if let Some(max_chunks) = args.max_chunks {
        reassembly = reassembly.with_max_chunks(max_chunks);
    }

    let mut server = SnapServer::new(DirectorySink::new(&args.out_dir))
        .max_datagram_size(args.max_datagram)
        .queue_capacity(args.queue_capacity)
        .reassembly(reassembly);
    if let Some(workers) = args.workers {
        server = server.workers(workers);
    }
    let server = server.bind(args.bind)?;
    info!(
        addr = ?server.local_addr(),
        out_dir = %args.out_dir.display(),
        "receiving transfers"
    );
    server.run().await?;
    Ok(())
}

async fn connect(to: std::net::SocketAddr, link: &LinkArgs) -> Result<ChunkSender<UdpTarget>, BoxError> {
    let config = SenderConfig {
        fragmentation: fragmentation(link.max_datagram, link.max_payload)?,
        rate_limit: link.rate.map(|datagrams_per_second| RateLimit {
            datagrams_per_second,
        }),
    };
    let target = UdpTarget::connect(to).await?;
    Ok(ChunkSender::new(target, config))
}

fn fragmentation(
    max_datagram: usize,
    max_payload: NonZeroUsize,
) -> Result<FragmentationConfig, BoxError> {
    FragmentationConfig::for_datagram_budget(max_datagram, max_payload)
        .ok_or_else(|| format!("--max-datagram {max_datagram} cannot hold the chunk header").into())
}

async fn console(sender: &ChunkSender<UdpTarget>, capture: &FileSource) -> Result<(), BoxError> {
    info!(
        peer = %sender.transport().peer(),
        "type a message and press enter; 'screenshot' sends {}",
        capture.path().display()
    );
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let outcome = if line.trim().eq_ignore_ascii_case("screenshot") {
            sender.send_capture(capture).await.map(|report| {
                info!(
                    total_chunks = report.total_chunks,
                    len = report.payload_len,
                    "screenshot sent"
                );
            })
        } else {
            sender.send_text(&line).await.map(|()| info!(text = %line, "message sent"))
        };
        if let Err(err) = outcome {
            report_send_failure(&err);
        }
    }
    Ok(())
}

fn report_send_failure(err: &SendError) {
    match err {
        SendError::Transport(_) => warn!(error = %err, "send failed"),
        SendError::Fragmentation(_) | SendError::Capture(_) => {
            warn!(error = %err, "nothing sent");
        }
    }
}
