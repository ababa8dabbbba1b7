use clap::{Parser, Subcommand, ValueEnum};
use spcio::batch::decode_dir;
use spcio::export::{to_json, write_csv};
use spcio::{decode_path, DecodeLimits, DecodeOptions};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "spcio", about = "Galactic SPC spectral file decoder")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Maximum points per spectrum
    #[arg(long, global = true, default_value_t = DecodeLimits::default().max_points)]
    max_points: u32,
    /// Maximum spectra per file
    #[arg(long, global = true, default_value_t = DecodeLimits::default().max_subfiles)]
    max_subfiles: u32,
    /// Skip the trailing log block
    #[arg(long, global = true)]
    no_log: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a file and write its spectra
    Decode {
        input: PathBuf,
        #[arg(short, long, value_enum, default_value = "csv")]
        format: Format,
        /// Output path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show header metadata
    Info {
        input: PathBuf,
    },
    /// Decode every .spc file in a directory, continuing past failures
    Batch {
        dir: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let options = DecodeOptions {
        limits: DecodeLimits {
            max_points:   cli.max_points,
            max_subfiles: cli.max_subfiles,
            ..DecodeLimits::default()
        },
        read_log: !cli.no_log,
    };

    match cli.command {

        // ── Decode ───────────────────────────────────────────────────────────
        Commands::Decode { input, format, output } => {
            let file = decode_path(&input, &options)?;
            let mut out: Box<dyn Write> = match &output {
                Some(p) => Box::new(BufWriter::new(File::create(p)?)),
                None    => Box::new(BufWriter::new(io::stdout().lock())),
            };
            match format {
                Format::Csv  => write_csv(&file, &mut out)?,
                Format::Json => writeln!(out, "{}", to_json(&file, true)?)?,
            }
            out.flush()?;
            if let Some(p) = output {
                eprintln!("Wrote {} spectra to {}", file.spectra.len(), p.display());
            }
        }

        // ── Info ─────────────────────────────────────────────────────────────
        Commands::Info { input } => {
            let file = decode_path(&input, &options)?;
            let h = &file.header;
            println!("── SPC file ─────────────────────────────────────────────");
            println!("  Path           {}", input.display());
            println!("  Variant        {:?}", h.variant);
            println!("  Flags          0x{:02X}", h.flags.0);
            let z_order = match (h.flags.random_z(), h.flags.ordered_z()) {
                (true, _)     => "random",
                (false, true) => "ordered, uneven",
                _             => "even",
            };
            println!("  Z spacing      {z_order}");
            println!("  Axis labels    {}", if h.flags.axis_text() { "text" } else { "typed" });
            println!("  Layout         {:?} / {:?}", file.layout, file.cardinality);
            println!("  Y precision    {} bit", if file.y_in_16bit() { 16 } else { 32 });
            println!("  Exponent       {}", h.exponent);
            println!("  Points         {}", file.num_points());
            println!("  Subfiles       {}", file.num_subfiles());
            println!("  X range        {} .. {}", file.first_x(), file.last_x());
            println!("  Axis types     x={} y={} z={}", h.x_type, h.y_type, h.z_type);
            if !h.memo.is_empty() {
                println!("  Memo           {}", h.memo);
            }
            println!("  Log            {} bytes", file.log_text.len());
            for (i, s) in file.spectra.iter().enumerate() {
                println!("    [{i:>4}] {:>8} points  z={}..{}", s.len(), s.z_start, s.z_end);
            }
        }

        // ── Batch ────────────────────────────────────────────────────────────
        Commands::Batch { dir, json } => {
            let report = decode_dir(&dir, &options)?;
            if json {
                let rows: Vec<_> = report.entries.iter().map(|e| match &e.result {
                    Ok(f)  => serde_json::json!({ "file": e.file_name, "spectra": f.spectra.len() }),
                    Err(err) => serde_json::json!({ "file": e.file_name, "error": err.to_string() }),
                }).collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
                return Ok(());
            }
            for entry in &report.entries {
                match &entry.result {
                    Ok(f)  => println!("  ok    {:<32} {} spectra", entry.file_name, f.spectra.len()),
                    Err(e) => println!("  FAIL  {:<32} {}", entry.file_name, e),
                }
            }
            println!("{}", report.summary());
        }
    }

    Ok(())
}
