use log::{error, info, warn};
use sctpx_core::options::SctpOption;
use sctpx_core::{
    init_socket_extension, Capability, Domain, LoaderConfig, SCTPError, SctpSocket,
    SocketExtension, Style, Symbol,
};
use std::net::IpAddr;
use structopt::StructOpt;

#[derive(StructOpt)]
pub struct Options {
    /// "probe" reports what resolved, "bind" also binds a socket
    #[structopt(short = "m", long = "mode", default_value = "probe")]
    pub mode: String,
    /// Extension library to load instead of the defaults
    #[structopt(short = "l", long = "library")]
    pub libraries: Vec<String>,
    #[structopt(short = "b", long = "bind")]
    pub bind: Vec<IpAddr>,
    #[structopt(short = "p", long = "port", default_value = "0")]
    pub port: u16,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if std::env::var("SCTPX_LOG").is_err() {
        std::env::set_var("SCTPX_LOG", "info");
    }
    env_logger::init_from_env("SCTPX_LOG");

    let options = Options::from_args();
    let config = loader_config(&options);

    match tokio::task::spawn_blocking(move || run(&options, &config)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            error!("{}", e);
            std::process::exit(1);
        }
        Err(e) => {
            error!("probe task failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn loader_config(options: &Options) -> LoaderConfig {
    let config = LoaderConfig::from_env();
    if options.libraries.is_empty() {
        return config;
    }
    options.libraries.iter().fold(
        LoaderConfig::empty().search_process(config.searches_process()),
        |config, lib| config.library(lib),
    )
}

fn run(options: &Options, config: &LoaderConfig) -> Result<(), SCTPError> {
    let extension = init_socket_extension(config);
    report(extension);

    match options.mode.as_str() {
        "probe" => Ok(()),
        "bind" => bind(options),
        other => {
            warn!("unknown mode {}, nothing to do", other);
            Ok(())
        }
    }
}

fn report(extension: &SocketExtension) {
    if extension.sources().is_empty() {
        info!("no SCTP socket extension library loaded");
    }
    for symbol in Symbol::ALL.iter() {
        let state = if extension.has(*symbol) { "resolved" } else { "missing" };
        info!("{:<16} {}", symbol.name(), state);
    }
    for capability in Capability::ALL.iter() {
        info!("{:?}: {}", capability, extension.supports(*capability));
    }
    for option in SctpOption::ALL.iter() {
        let origin = if option.is_native() { "native" } else { "fallback" };
        match option.checked() {
            Some(code) => info!("{:<26} {:#06x} ({})", option.name(), code, origin),
            None => info!("{:<26} unsupported", option.name()),
        }
    }
}

fn bind(options: &Options) -> Result<(), SCTPError> {
    let domain = if options.bind.iter().any(|ip| ip.is_ipv6()) {
        Domain::Ipv6
    } else {
        Domain::Ipv4
    };
    let socket = SctpSocket::open(domain, Style::OneToMany)?;
    socket.bind_all(&options.bind, options.port)?;

    for addr in socket.local_addrs(0)? {
        info!("bound {}", addr);
    }
    Ok(())
}
