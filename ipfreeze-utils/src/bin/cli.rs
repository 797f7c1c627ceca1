use std::{convert::TryFrom, fs, io, path::PathBuf};
use structopt::StructOpt;
use tracing::{info, Level};

use ipfreeze::{freeze_tree, DagCborValues, IpVersion, RecordSize, TreeConfig};
use ipfreeze_utils::{
    dump::{dump_tree, thaw_file},
    info::FrozenInfo,
    load::load_tree,
    params::FrozenParams,
};

pub type Result<T> = anyhow::Result<T>;

#[derive(StructOpt)]
#[structopt(about = "CLI to freeze and inspect ip radix trees")]
struct Opts {
    #[structopt(short, parse(from_occurrences = set_log_level), global = true)]
    #[allow(dead_code)] // log level will bet set in [`set_log_level`]
    /// Increase verbosity
    verbosity: u64,
    #[structopt(subcommand)]
    cmd: Command,
}

fn set_log_level(verbosity: u64) -> u64 {
    let level = match verbosity {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).init();
    verbosity
}

#[derive(StructOpt)]
enum Command {
    /// Build a tree from a listing of `<network> <json value>` lines and freeze it
    Freeze {
        #[structopt(long)]
        /// The listing to read
        input: PathBuf,
        #[structopt(long)]
        /// The frozen file to write. Will be replaced if it exists
        output: PathBuf,
        #[structopt(long)]
        /// Build an IPv4 tree instead of an IPv6 tree
        ipv4: bool,
        #[structopt(long, default_value = "28")]
        /// Record size of the tree, 24, 28 or 32
        record_size: u8,
        #[structopt(long)]
        /// Merge the values of overlapping networks instead of replacing them
        merge: bool,
    },
    /// Thaw a frozen file and print its networks with their values
    Dump {
        #[structopt(long)]
        /// The frozen file
        input: PathBuf,
    },
    /// Print the layout of a frozen file
    Info {
        #[structopt(long)]
        /// The frozen file
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let opts = Opts::from_args();
    match opts.cmd {
        Command::Freeze {
            input,
            output,
            ipv4,
            record_size,
            merge,
        } => {
            let config = TreeConfig {
                ip_version: if ipv4 { IpVersion::V4 } else { IpVersion::V6 },
                record_size: RecordSize::try_from(record_size)?,
                merge_record_collisions: merge,
            };
            let text = fs::read_to_string(&input)?;
            let mut tree = load_tree(&text, config)?;
            let params = FrozenParams::from(config).to_bytes()?;
            let stats = freeze_tree(&mut tree, &output, &params, &DagCborValues)?;
            info!("{:?}", stats);
            println!(
                "{} records, {} values, {} bytes",
                stats.records, stats.values, stats.file_size
            );
        }
        Command::Dump { input } => {
            let tree = thaw_file(&input)?;
            let stdout = io::stdout();
            dump_tree(&tree, stdout.lock())?;
        }
        Command::Info { input } => {
            print!("{}", FrozenInfo::read(&input)?);
        }
    }
    Ok(())
}
