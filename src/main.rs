use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use emblemgen::{
    AssetOrigin, AssetPath, DirOrigin, EmblemRequest, EmblemResponse, EmblemService, HttpOrigin, MemoryCache,
    NoCache, ServiceConfig,
};
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "emblemgen", version, about = "Render emblem PNGs on demand")]
struct Cli {
    /// JSON config file; flags override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve emblems over HTTP
    Serve {
        #[arg(long, default_value = "127.0.0.1:8787")]
        bind: String,
        /// Sprite origin: an http(s) base URL or a local directory
        #[arg(long)]
        origin: Option<String>,
        /// Worker threads (defaults to the number of CPUs)
        #[arg(long)]
        threads: Option<usize>,
    },
    /// Render emblems to `{key}.png` files, e.g. to seed the fallback store
    Render {
        #[arg(long)]
        origin: Option<String>,
        #[arg(long, default_value = ".")]
        out: PathBuf,
        /// Keys such as P10-S0-EP0-ES1-EF37-EB5-ET0
        #[arg(required = true)]
        keys: Vec<String>,
    },
}

/// Either origin kind, picked from the configured origin string
enum Origin {
    Http(HttpOrigin),
    Dir(DirOrigin),
}

impl Origin {
    fn from_config(config: &ServiceConfig) -> Result<Self> {
        let origin = config.asset_origin.as_str();
        if origin.starts_with("http://") || origin.starts_with("https://") {
            Ok(Origin::Http(HttpOrigin::new(config)?))
        } else {
            Ok(Origin::Dir(DirOrigin::new(origin)))
        }
    }
}

impl AssetOrigin for Origin {
    async fn fetch(&self, path: &AssetPath) -> emblemgen::Result<Vec<u8>> {
        match self {
            Origin::Http(o) => o.fetch(path).await,
            Origin::Dir(o) => o.fetch(path).await,
        }
    }
}

fn load_config(cli: &Cli) -> Result<ServiceConfig> {
    let mut config = match &cli.config {
        Some(path) => ServiceConfig::from_json_file(path)?,
        None => ServiceConfig::default(),
    };
    let origin = match &cli.command {
        Command::Serve { origin, .. } | Command::Render { origin, .. } => origin,
    };
    if let Some(origin) = origin {
        config.asset_origin = origin.clone();
    }
    Ok(config)
}

fn serve(config: ServiceConfig, bind: &str, threads: Option<usize>) -> Result<()> {
    let origin = Origin::from_config(&config)?;
    let cache = MemoryCache::new(config.cache_capacity);
    log::info!("sprite origin {}", config.asset_origin);
    let service = Arc::new(EmblemService::new(origin, cache, config));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let server = Arc::new(tiny_http::Server::http(bind).map_err(|e| anyhow!("failed to bind {}: {}", bind, e))?);
    let workers = threads.unwrap_or_else(num_cpus::get).max(1);
    log::info!("listening on {} with {} workers", bind, workers);

    let mut handles = Vec::with_capacity(workers);
    for _ in 0..workers {
        let server = Arc::clone(&server);
        let service = Arc::clone(&service);
        let rt = runtime.handle().clone();
        handles.push(std::thread::spawn(move || {
            for request in server.incoming_requests() {
                respond(&rt, &service, request);
            }
        }));
    }
    for h in handles {
        let _ = h.join();
    }
    Ok(())
}

fn respond(rt: &tokio::runtime::Handle, service: &EmblemService<Origin, MemoryCache>, request: tiny_http::Request) {
    use tiny_http::Method;

    let reply = match request.method() {
        Method::Get | Method::Head => {
            match Url::parse("http://localhost/").and_then(|base| base.join(request.url())) {
                Ok(url) => rt.block_on(service.handle(&url)),
                Err(e) => plain(400, format!("bad request target: {}", e)),
            }
        }
        Method::Options => plain(204, String::new()),
        _ => plain(405, "only GET is supported".to_string()),
    };
    log::debug!("{} {} -> {}", request.method(), request.url(), reply.status);

    let head = *request.method() == Method::Head;
    if let Err(e) = request.respond(to_http(reply, head)) {
        log::warn!("failed to send response: {}", e);
    }
}

/// HEAD keeps the headers and `Content-Length` of the GET answer, without the body.
fn to_http(reply: EmblemResponse, head: bool) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let headers = reply
        .headers
        .iter()
        .filter_map(|(name, value)| tiny_http::Header::from_bytes(name.as_bytes(), value.as_bytes()).ok())
        .collect();
    let length = reply.body.len();
    let body = if head { Vec::new() } else { reply.body };
    tiny_http::Response::new(
        tiny_http::StatusCode(reply.status),
        headers,
        std::io::Cursor::new(body),
        Some(length),
        None,
    )
}

fn plain(status: u16, body: String) -> EmblemResponse {
    EmblemResponse {
        status,
        headers: vec![
            ("Content-Type".into(), "text/plain; charset=utf-8".into()),
            ("Access-Control-Allow-Origin".into(), "*".into()),
        ],
        body: body.into_bytes(),
    }
}

fn render(config: ServiceConfig, out: PathBuf, keys: Vec<String>) -> Result<()> {
    std::fs::create_dir_all(&out).with_context(|| format!("failed to create {}", out.display()))?;
    let service = EmblemService::new(Origin::from_config(&config)?, NoCache, config);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    rt.block_on(async {
        for key in keys {
            let req = key
                .trim_end_matches(".png")
                .parse::<EmblemRequest>()
                .with_context(|| format!("{:?} is not an emblem key", key))?
                .validated()?;
            let body = service.render(&req).await.with_context(|| format!("rendering {}", req))?;
            let path = out.join(format!("{}.png", req.cache_key()));
            tokio::fs::write(&path, &body)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            log::info!("wrote {}", path.display());
        }
        Ok::<(), anyhow::Error>(())
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_level.as_str())).init();

    let config = load_config(&cli)?;
    match cli.command {
        Command::Serve { bind, threads, .. } => serve(config, &bind, threads),
        Command::Render { out, keys, .. } => render(config, out, keys),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpStream;

    fn exchange(request: &str) -> String {
        let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build().unwrap();
        let service = EmblemService::new(
            Origin::Dir(DirOrigin::new(std::env::temp_dir().join("emblemgen-no-sprites"))),
            MemoryCache::new(4),
            ServiceConfig::default(),
        );
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        let rt = runtime.handle().clone();
        let worker = std::thread::spawn(move || {
            let request = server.recv().unwrap();
            respond(&rt, &service, request);
        });

        let mut stream = TcpStream::connect(addr).unwrap();
        stream.set_read_timeout(Some(std::time::Duration::from_secs(5))).unwrap();
        stream.write_all(request.as_bytes()).unwrap();
        let mut raw = String::new();
        let _ = stream.read_to_string(&mut raw);
        worker.join().unwrap();
        raw
    }

    #[test]
    fn head_sends_headers_without_body() {
        let get = exchange("GET /?EF=64 HTTP/1.1\r\nHost: x\r\nConnection: close\r\n\r\n");
        let (get_head, get_body) = get.split_once("\r\n\r\n").unwrap();
        assert!(get_head.starts_with("HTTP/1.1 400"), "{}", get_head);
        assert!(get_body.contains("EF=64"), "{}", get_body);

        let head = exchange("HEAD /?EF=64 HTTP/1.1\r\nHost: x\r\nConnection: close\r\n\r\n");
        let (head_head, head_body) = head.split_once("\r\n\r\n").unwrap();
        assert!(head_head.starts_with("HTTP/1.1 400"), "{}", head_head);
        assert!(head_head.contains("Access-Control-Allow-Origin: *"), "{}", head_head);
        assert!(head_body.is_empty(), "{:?}", head_body);
    }

    #[test]
    fn head_response_reports_full_length() {
        let reply = plain(200, "twelve bytes".to_string());
        assert_eq!(to_http(reply.clone(), true).data_length(), Some(12));
        assert_eq!(to_http(reply, false).data_length(), Some(12));
    }
}
