//! Server exposing the allocation engine over HTTP

#![warn(missing_docs)]

mod http;
mod logger;
mod settings;

use std::path::PathBuf;
use std::thread;

use eyre::{bail, eyre, Result, WrapErr};
use room_alloc_core::{AllocationPolicy, Config, DowngradePath, JsonFileSource};
use room_alloc_engine::Engine;
use settings::Settings;
use tracing::info;

/// Command line options
#[derive(Debug)]
struct Opts {
    /// Configuration of the allocation engine
    config: Config,

    /// JSON file holding the request batch
    requests: PathBuf,

    /// Port for the HTTP server to listen on
    port: u16,
    /// Host for the HTTP server to listen on
    host: String,
    /// Number of HTTP worker threads
    threads: u32,
}

impl Opts {
    fn from_args(settings: Settings) -> Result<Self> {
        let mut opts = Opts {
            config: Config {
                rooms: settings.rooms,
                policy: AllocationPolicy {
                    downgrade: if settings.single_tier {
                        DowngradePath::DirectToWaitlist
                    } else {
                        DowngradePath::ViaSecondary
                    },
                    primary_share: settings.primary_share,
                },
            },
            requests: settings.requests,
            port: 8585,
            host: String::from("127.0.0.1"),
            threads: 8,
        };

        let mut option: Option<String> = None;
        for arg in std::env::args().skip(1) {
            if let Some(opt) = option {
                match opt.as_str() {
                    "-port" => opts.port = arg.parse().wrap_err("-port takes a decimal u16")?,
                    "-host" => opts.host = arg,
                    "-rooms" => {
                        opts.config.rooms = arg.parse().wrap_err("-rooms takes a decimal u32")?
                    }
                    "-requests" => opts.requests = arg.into(),
                    "-threads" => {
                        opts.threads = arg.parse().wrap_err("-threads takes a decimal u32")?
                    }
                    "-primary-share" => {
                        opts.config.policy.primary_share = arg
                            .parse()
                            .wrap_err("-primary-share takes a percentage")?
                    }
                    _ => bail!("unknown option {opt}"),
                }
                option = None;
            } else {
                match arg.as_str() {
                    "-single-tier" => opts.config.policy.downgrade = DowngradePath::DirectToWaitlist,
                    _ => option = Some(arg),
                }
            }
        }
        if let Some(opt) = option {
            bail!("leftover option {opt}");
        }
        if opts.config.policy.primary_share > 100 {
            bail!("primary share must be at most 100");
        }
        if opts.threads == 0 {
            bail!("at least one HTTP worker thread is needed");
        }

        Ok(opts)
    }
}

fn http_loop(server: &tiny_http::Server, engine: &Engine) {
    loop {
        match server.recv() {
            Ok(rq) => http::handle(engine, rq),
            Err(err) => {
                tracing::error!(%err, "HTTP receive failed");
                return;
            }
        }
    }
}

fn main() -> Result<()> {
    logger::init();
    let opts = Opts::from_args(Settings::load()?)?;
    info!(?opts, "starting");

    let source = JsonFileSource::new(&opts.requests);
    let (engine, _store) = room_alloc_engine::launch(&opts.config, source)
        .wrap_err("initial allocation failed")?;

    let server = tiny_http::Server::http((opts.host.as_str(), opts.port)).map_err(|err| eyre!(err))?;
    info!(host = %opts.host, port = opts.port, "listening");

    thread::scope(|s| -> Result<()> {
        for i in 0..opts.threads {
            thread::Builder::new()
                .name(format!("http_{i}"))
                .spawn_scoped(s, || http_loop(&server, &engine))?;
        }
        Ok(())
    })
}
