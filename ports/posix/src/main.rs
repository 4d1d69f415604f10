use std::io::{self, BufRead};
use std::process;

use anyhow::Context;
use canfd_node::{escalate, NodeConfig, NodeId};
use canfd_posix::{logger, ExitHalt, SimConsole, SimError, SimNode, VirtualBus};
use clap::Parser;
use log::LevelFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Two CAN FD button/indicator nodes on a virtual bus")]
struct Opts {
    /// Message identifier of the local node
    #[arg(long = "node-id", default_value_t = 1, value_name = "ID")]
    node_id: u16,

    /// Message identifier of the peer node
    #[arg(long = "peer", default_value_t = 2, value_name = "ID")]
    peer: u16,

    /// Start the local controller in bus-off state
    #[arg(long = "bus-off")]
    bus_off: bool,

    #[arg(long = "log-level", default_value = "info", value_name = "LEVEL")]
    log_level: LevelFilter,
}

fn start(bus: &VirtualBus, id: u16, label: &str) -> anyhow::Result<SimNode> {
    let config = NodeConfig::builder().node_id(NodeId(id)).build();
    match SimNode::start(bus, config, SimConsole::stdout(label)) {
        Ok(node) => Ok(node),
        Err(SimError::Setup(err)) => Ok(escalate(Err(err), &ExitHalt)),
        Err(err) => Err(err).with_context(|| format!("starting {label}")),
    }
}

fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    logger::init(opts.log_level)?;

    let bus = VirtualBus::new();
    let local = start(&bus, opts.node_id, &format!("node-{}", opts.node_id))?;
    let peer = start(&bus, opts.peer, &format!("node-{}", opts.peer))?;

    if opts.bus_off {
        local.faults().set_bus_off(true);
    }

    let local_button = local.button();
    let peer_button = peer.button();
    local.spawn()?;
    peer.spawn()?;

    ctrlc::set_handler(|| process::exit(0)).context("installing Ctrl-C handler")?;

    println!("p/1: press node-{} button, 2: press node-{} button, q: quit", opts.node_id, opts.peer);
    for line in io::stdin().lock().lines() {
        match line?.trim() {
            "p" | "1" => local_button.press(),
            "2" => peer_button.press(),
            "q" => break,
            "" => {}
            other => eprintln!("unknown command `{other}`"),
        }
    }

    Ok(())
}
