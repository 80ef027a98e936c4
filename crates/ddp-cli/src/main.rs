use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::net::{SocketAddr, UdpSocket};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glob::glob;

use ddp_core::{DDP_PORT, Packet, PcapNgWriter};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit ",
    env!("DDP_BUILD_COMMIT"),
    ", built ",
    env!("DDP_BUILD_DATE"),
    ")"
);

const RECV_BUFFER_SIZE: usize = 65_535;

#[derive(Parser, Debug)]
#[command(name = "ddp")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Encode, decode and inspect Distributed Display Protocol (DDP) packets.",
    long_about = None,
    after_help = "Examples:\n  ddp decode 400f920145678910 1011\n  ddp encode packet.json -o packet.bin\n  ddp pcap analyse capture.pcapng -o report.json\n  ddp listen --bind 0.0.0.0:4048 --count 10"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode one packet and print it as JSON.
    Decode {
        /// Packet bytes as hex (whitespace and a leading 0x are ignored)
        #[arg(required_unless_present = "file", num_args = 1..)]
        hex: Vec<String>,

        /// Read raw packet bytes from a file instead
        #[arg(long, conflicts_with = "hex")]
        file: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Encode a JSON packet into wire bytes.
    Encode {
        /// JSON packet file, or `-` for stdin
        input: PathBuf,

        /// Write raw bytes to this file instead of printing hex
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
    /// Operations on PCAP/PCAPNG inputs (offline-first).
    Pcap {
        #[command(subcommand)]
        command: PcapCommands,
    },
    /// Receive DDP datagrams and print RGB pixel values.
    Listen {
        /// Local address to bind
        #[arg(long, default_value_t = SocketAddr::from(([0, 0, 0, 0], DDP_PORT)))]
        bind: SocketAddr,

        /// Stop after this many datagrams
        #[arg(long)]
        count: Option<u64>,

        /// Also record received datagrams into a PCAPNG file
        #[arg(long)]
        record: Option<PathBuf>,

        /// Suppress per-pixel output
        #[arg(long)]
        quiet: bool,
    },
}

#[derive(Subcommand, Debug)]
enum PcapCommands {
    /// Analyse a capture file and generate a versioned JSON report of its DDP traffic.
    #[command(alias = "analyze")]
    #[command(
        after_help = "Examples:\n  ddp pcap analyse capture.pcapng -o report.json\n  ddp pcap analyze capture.pcap --stdout --pretty"
    )]
    Analyse {
        /// Path to a .pcap or .pcapng file
        input: PathBuf,

        /// Output report path (JSON)
        #[arg(short = 'o', long, required_unless_present = "stdout")]
        report: Option<PathBuf>,

        /// Write JSON report to stdout
        #[arg(long, conflicts_with = "report")]
        stdout: bool,

        /// Pretty-print JSON output
        #[arg(long, conflicts_with = "compact")]
        pretty: bool,

        /// Compact JSON output (default)
        #[arg(long)]
        compact: bool,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,

        /// Exit with a non-zero code if malformed DDP datagrams are present
        #[arg(long)]
        strict: bool,

        /// List decode errors after analysis
        #[arg(long)]
        list_errors: bool,

        /// UDP port carrying DDP traffic
        #[arg(long, default_value_t = DDP_PORT)]
        port: u16,
    },
}

struct AnalyseOptions {
    input: PathBuf,
    report: Option<PathBuf>,
    stdout: bool,
    pretty: bool,
    compact: bool,
    quiet: bool,
    strict: bool,
    list_errors: bool,
    port: u16,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Decode { hex, file, pretty } => cmd_decode(hex, file, pretty),
        Commands::Encode { input, output } => cmd_encode(&input, output),
        Commands::Pcap { command } => match command {
            PcapCommands::Analyse {
                input,
                report,
                stdout,
                pretty,
                compact,
                quiet,
                strict,
                list_errors,
                port,
            } => cmd_pcap_analyse(AnalyseOptions {
                input,
                report,
                stdout,
                pretty,
                compact,
                quiet,
                strict,
                list_errors,
                port,
            }),
        },
        Commands::Listen {
            bind,
            count,
            record,
            quiet,
        } => cmd_listen(bind, count, record, quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{:#}", err), None)
    }
}

fn cmd_decode(hex: Vec<String>, file: Option<PathBuf>, pretty: bool) -> Result<(), CliError> {
    let bytes = match file {
        Some(path) => fs::read(&path)
            .with_context(|| format!("Failed to read packet file: {}", path.display()))?,
        None => ddp_core::parse_hex(&hex.join("")).map_err(|err| {
            CliError::new(
                format!("invalid hex input: {}", err),
                Some("pass bytes as hex, e.g. 400f920145678910 1011".to_string()),
            )
        })?,
    };

    let packet = ddp_core::decode(&bytes).map_err(|err| {
        CliError::new(
            format!("decode failed: {}", err),
            Some(format!("error id {}", err.id())),
        )
    })?;
    println!("{}", to_json(&packet, pretty)?);
    Ok(())
}

fn cmd_encode(input: &Path, output: Option<PathBuf>) -> Result<(), CliError> {
    let json = if input.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read packet JSON from stdin")?;
        buf
    } else {
        fs::read_to_string(input)
            .with_context(|| format!("Failed to read packet JSON: {}", input.display()))?
    };

    let packet: Packet = serde_json::from_str(&json).map_err(|err| {
        CliError::new(
            format!("invalid packet JSON: {}", err),
            Some("see `ddp decode --pretty` output for the expected shape".to_string()),
        )
    })?;
    let bytes = ddp_core::encode(&packet).map_err(|err| {
        CliError::new(
            format!("encode failed: {}", err),
            Some(format!("error id {}", err.id())),
        )
    })?;

    match output {
        Some(path) => {
            create_parent_dir(&path)?;
            fs::write(&path, &bytes)
                .with_context(|| format!("Failed to write packet: {}", path.display()))?;
        }
        None => println!("{}", ddp_core::to_hex(&bytes)),
    }
    Ok(())
}

fn cmd_pcap_analyse(opts: AnalyseOptions) -> Result<(), CliError> {
    if opts.pretty && opts.compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }

    let resolved_input = resolve_input_path(&opts.input)?;
    validate_input_file(&resolved_input)?;
    let input_abs = fs::canonicalize(&resolved_input)
        .with_context(|| format!("Failed to resolve input path: {}", resolved_input.display()))?;

    let report_path = if opts.stdout {
        None
    } else {
        let path = opts.report.ok_or_else(|| {
            CliError::new(
                "missing output path",
                Some("use -o/--report or --stdout".to_string()),
            )
        })?;
        ensure_distinct_output(&path, &input_abs)?;
        Some(path)
    };

    let rep = ddp_core::analyze_pcap_file(&resolved_input, opts.port)
        .context("PCAP/PCAPNG analysis failed")?;
    let json = to_json(&rep, opts.pretty)?;

    match report_path {
        None => print!("{}", json),
        Some(path) => {
            create_parent_dir(&path)?;
            fs::write(&path, json)
                .with_context(|| format!("Failed to write report: {}", path.display()))?;
            if !opts.quiet {
                eprintln!("OK: report written -> {}", path.display());
            }
        }
    }

    if opts.list_errors && !opts.quiet {
        print_errors(&rep);
    }
    if opts.strict && !rep.errors.is_empty() {
        return Err(CliError::new(
            "malformed DDP datagrams detected",
            Some("use --list-errors to inspect".to_string()),
        ));
    }
    Ok(())
}

fn cmd_listen(
    bind: SocketAddr,
    count: Option<u64>,
    record: Option<PathBuf>,
    quiet: bool,
) -> Result<(), CliError> {
    let socket = UdpSocket::bind(bind).map_err(|err| {
        CliError::new(
            format!("failed to bind {}: {}", bind, err),
            Some("pick a free address with --bind".to_string()),
        )
    })?;
    let local = socket
        .local_addr()
        .context("Failed to read local socket address")?;
    if !quiet {
        eprintln!("listening on {}", local);
    }

    let mut recorder = match record {
        Some(path) => {
            create_parent_dir(&path)?;
            let file = File::create(&path)
                .with_context(|| format!("Failed to create capture: {}", path.display()))?;
            let writer = PcapNgWriter::new(BufWriter::new(file))
                .with_context(|| format!("Failed to start capture: {}", path.display()))?;
            Some(writer)
        }
        None => None,
    };

    receive_loop(
        |buffer: &mut [u8]| socket.recv_from(buffer),
        local,
        count,
        recorder.as_mut(),
        quiet,
    )?;

    if let Some(mut writer) = recorder {
        writer.flush().context("Failed to flush capture")?;
    }
    Ok(())
}

/// Receive until `count` datagrams were handled (forever when `None`).
///
/// Receive and decode failures are reported on stderr and skipped.
fn receive_loop<R, W>(
    mut recv: R,
    local: SocketAddr,
    count: Option<u64>,
    mut recorder: Option<&mut PcapNgWriter<W>>,
    quiet: bool,
) -> Result<u64, CliError>
where
    R: FnMut(&mut [u8]) -> io::Result<(usize, SocketAddr)>,
    W: Write,
{
    let mut buffer = vec![0u8; RECV_BUFFER_SIZE];
    let mut received = 0u64;
    while count.is_none_or(|limit| received < limit) {
        let (len, peer) = match recv(&mut buffer) {
            Ok(result) => result,
            Err(err) => {
                eprintln!("error: receive failed: {}", err);
                continue;
            }
        };
        received += 1;
        let datagram = &buffer[..len];

        if let Some(writer) = recorder.as_deref_mut() {
            let frame = ddp_core::raw_udp_frame(peer, local, datagram)
                .context("Failed to build capture frame")?;
            writer
                .write_frame(now_seconds(), &frame)
                .context("Failed to record datagram")?;
        }

        match ddp_core::decode(datagram) {
            Ok(packet) => {
                if !quiet {
                    print_pixels(&packet);
                }
            }
            Err(err) => eprintln!("error: decode failed from {}: {}", peer, err),
        }
    }
    Ok(received)
}

fn print_pixels(packet: &Packet) {
    // Indices are absolute within the frame, assuming 3-byte pixels.
    let first = packet.header.data_offset as usize / 3;
    for (idx, pixel) in packet.rgb_pixels().enumerate() {
        println!(
            "led {}:\tr={}\tg={}\tb={}",
            first + idx,
            pixel.r,
            pixel.g,
            pixel.b
        );
    }
}

fn now_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String, CliError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    json.context("JSON serialization failed").map_err(Into::into)
}

fn print_errors(rep: &ddp_core::Report) {
    eprintln!("Decode errors:");
    for entry in &rep.errors {
        eprintln!("  {} ({}): {}", entry.id, entry.count, entry.message);
    }
}

fn create_parent_dir(path: &Path) -> Result<(), CliError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }
    Ok(())
}

fn ensure_distinct_output(report: &Path, input_abs: &Path) -> Result<(), CliError> {
    let parent = match report.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    // A parent that does not exist yet cannot contain the input.
    let Ok(report_dir) = fs::canonicalize(parent) else {
        return Ok(());
    };
    let file_name = report
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Invalid report path: {}", report.display()))?;
    if report_dir.join(file_name) == input_abs {
        return Err(CliError::new(
            format!("report path must differ from input: {}", report.display()),
            Some("choose a different output path".to_string()),
        ));
    }
    Ok(())
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("use a .pcap or .pcapng file".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("use a .pcap or .pcapng file".to_string()),
        ));
    }
    let ext = input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if ext != "pcap" && ext != "pcapng" {
        return Err(CliError::new(
            format!("unsupported input format '{}'", input.display()),
            Some("expected a .pcap or .pcapng file".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    let mut matches = Vec::new();
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    match matches.len() {
        0 => Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern; expected .pcap or .pcapng".to_string()),
        )),
        1 => Ok(matches.remove(0)),
        n => {
            let mut listed = matches
                .iter()
                .take(3)
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            if n > 3 {
                listed.push_str(", ...");
            }
            Err(CliError::new(
                format!(
                    "multiple files match pattern '{}' ({} matches); matches: {}",
                    pattern, n, listed
                ),
                Some("pass a single capture file, or run once per file".to_string()),
            ))
        }
    }
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
