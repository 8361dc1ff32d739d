// Example usage of puck-link

// Receives images from a puck whose serial port is exposed over TCP (for example with
// ser2net or a bluetooth-to-TCP bridge) and writes every image as a PGM file.
// A single blocking thread is enough at the puck's data rate.

use std::fs;
use std::io::{ErrorKind, Read, Write};
use std::net::TcpStream;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use log::{error, info};
use puck_link::{Frame, LinkConfig, PuckLink};

#[derive(Parser, Debug)]
#[command(name = "tcp_receiver", long_about = None)]
struct Args {
    /// Address of the TCP-to-serial bridge
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: String,

    /// Directory the images are written to
    #[arg(short, long, default_value = "frames")]
    out: PathBuf,

    /// JSON file with a link configuration, defaults are used without one
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stop after this many images
    #[arg(long)]
    count: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<LinkConfig> {
    let Some(path) = path else {
        return Ok(LinkConfig::default());
    };
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    let config = load_config(args.config.as_ref())?;
    fs::create_dir_all(&args.out)?;

    let mut stream = TcpStream::connect(&args.addr).with_context(|| format!("Failed to connect to {}", args.addr))?;
    info!("Connected to {}", args.addr);
    // Wake up regularly so a stalled payload is noticed even when the puck goes quiet
    stream.set_read_timeout(Some(Duration::from_millis(100)))?;

    let mut link = PuckLink::new(config);
    let mut buf = [0u8; 1024];
    let mut saved = 0;

    loop {
        match stream.read(&mut buf) {
            Ok(0) => {
                info!("Connection closed");
                break;
            }
            Ok(num_read) => link.handle_receive(&buf[..num_read]),
            Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(err) => return Err(err.into()),
        }
        if link.handle_timeout(Instant::now()) {
            info!("Puck went quiet mid image, waiting for a new header");
        }

        loop {
            match link.poll_receive() {
                Ok(Some(Frame::Config(geometry))) => {
                    info!("Streaming {}x{} images", geometry.cols, geometry.rows);
                }
                Ok(Some(Frame::Image(image))) => {
                    let path = args.out.join(format!("frame_{saved:05}.pgm"));
                    fs::write(&path, image.to_pgm())?;
                    info!("Saved {}", path.display());
                    saved += 1;
                }
                Ok(None) => break,
                // The link has already dropped the bad bytes, keep listening
                Err(err) => error!("Protocol error: {err}"),
            }
        }

        // Retrieve and transmit all acknowledgements queued to be sent
        while let Some(transmit) = link.poll_transmit() {
            stream.write_all(&transmit.payload)?;
        }

        if args.count.is_some_and(|count| saved >= count) {
            break;
        }
    }

    Ok(())
}
