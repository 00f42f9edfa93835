//! jpipt1 CLI - inspect JPEG 2000 Tier-1 decoding of single code-blocks.
//!
//! Code-block segments are usually extracted from JPIP data-bin messages or
//! codestream packets by other tools; this utility decodes them and prints
//! the reconstructed coefficients.

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use jpip_tier1::jpeg2000::context_tables::{Direction, NEIGHBOR_UPDATES, SIGN_CONTEXTS};
use jpip_tier1::{CodeBlockBitPlaneDecoder, CodeBlockDescriptor, CodeBlockStyle, SubbandOrientation};

/// JPEG 2000 Tier-1 code-block decoder
#[derive(Parser)]
#[command(name = "jpipt1")]
#[command(version)]
#[command(about = "Decode JPEG 2000 code-block segments into wavelet coefficients", long_about = None)]
#[command(after_help = "EXAMPLES:
    jpipt1 decode -w 32 -H 32 -s hl --msb 4 --passes 3 --segment p0.bin --segment p1.bin --segment p2.bin
    jpipt1 decode -w 4 -H 4 -s ll --msb 2 --passes 4 --segment p0.bin --segment - --segment p2.bin -f raw -o out.f32
    jpipt1 tables")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode the coding passes of one code-block
    #[command(visible_alias = "d")]
    Decode {
        /// Code-block width
        #[arg(short, long)]
        width: u32,

        /// Code-block height
        #[arg(short = 'H', long)]
        height: u32,

        /// Orientation of the subband holding the code-block
        #[arg(short, long, default_value = "ll", value_enum)]
        subband: Subband,

        /// Most significant bit-plane of the code-block
        #[arg(long)]
        msb: i32,

        /// Number of coding passes announced for the code-block
        #[arg(short, long)]
        passes: u32,

        /// Segment file of each coding pass in order; "-" marks a withheld pass
        #[arg(long = "segment")]
        segments: Vec<String>,

        /// Selective arithmetic coding bypass
        #[arg(long)]
        bypass: bool,

        /// Reset context probabilities after each pass
        #[arg(long)]
        reset: bool,

        /// Passes without a segment continue the previous pass's stream
        #[arg(long)]
        no_termination: bool,

        /// Expect segmentation symbols after each cleanup pass
        #[arg(long)]
        segmentation_symbols: bool,

        /// Output format
        #[arg(short, long, default_value = "text", value_enum)]
        format: OutputFormat,

        /// Output file (standard output when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the sign and neighbour context tables
    #[command(visible_alias = "t")]
    Tables,
}

#[derive(Clone, Copy, ValueEnum)]
enum Subband {
    Ll,
    Hl,
    Lh,
    Hh,
}

impl From<Subband> for SubbandOrientation {
    fn from(subband: Subband) -> Self {
        match subband {
            Subband::Ll => SubbandOrientation::LL,
            Subband::Hl => SubbandOrientation::HL,
            Subband::Lh => SubbandOrientation::LH,
            Subband::Hh => SubbandOrientation::HH,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// One text row per coefficient row
    Text,
    /// Little-endian f32 samples, row by row
    Raw,
}

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn main() {
    let cli = Cli::parse();

    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        });
    }

    let result = match cli.command {
        Commands::Decode {
            width,
            height,
            subband,
            msb,
            passes,
            segments,
            bypass,
            reset,
            no_termination,
            segmentation_symbols,
            format,
            output,
        } => {
            let style = CodeBlockStyle {
                bypass,
                reset_probabilities: reset,
                terminate_each_pass: !no_termination,
                segmentation_symbols,
            };
            build_descriptor(width, height, subband, msb, passes, &segments, style)
                .and_then(|descriptor| decode_code_block(&descriptor, format, output.as_ref()))
        }
        Commands::Tables => print_tables(),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn build_descriptor(
    width: u32,
    height: u32,
    subband: Subband,
    msb: i32,
    passes: u32,
    segments: &[String],
    style: CodeBlockStyle,
) -> Result<CodeBlockDescriptor, Box<dyn std::error::Error>> {
    let mut descriptor =
        CodeBlockDescriptor::new(width, height, subband.into(), msb, passes).with_style(style);
    for (pass, path) in segments.iter().enumerate() {
        if path != "-" {
            descriptor.set_segment(pass, fs::read(path)?);
        }
    }
    descriptor.validate()?;
    Ok(descriptor)
}

fn decode_code_block(
    descriptor: &CodeBlockDescriptor,
    format: OutputFormat,
    output: Option<&PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut decoder = CodeBlockBitPlaneDecoder::new();
    let coefficients = decoder.decode(descriptor)?;

    let bytes = match format {
        OutputFormat::Text => {
            let mut text = String::new();
            for y in 0..coefficients.height() {
                let row: Vec<String> = coefficients.row(y).iter().map(|v| v.to_string()).collect();
                text.push_str(&row.join(" "));
                text.push('\n');
            }
            text.into_bytes()
        }
        OutputFormat::Raw => coefficients
            .as_slice()
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect(),
    };

    match output {
        Some(path) => {
            fs::write(path, &bytes)?;
            eprintln!(
                "✓ Decoded {}x{} code-block to {:?}",
                descriptor.width, descriptor.height, path
            );
        }
        None => std::io::stdout().write_all(&bytes)?,
    }
    Ok(())
}

fn print_tables() -> Result<(), Box<dyn std::error::Error>> {
    println!("Sign contexts [h+1][v+1]:");
    for row in SIGN_CONTEXTS.iter() {
        println!("  {:?}", row);
    }

    for (group, name) in ["LL/LH", "HL", "HH"].iter().enumerate() {
        println!();
        println!("Neighbour updates for {}:", name);
        for direction in Direction::ALL {
            println!(
                "  {:<10} {:?}",
                format!("{:?}", direction),
                NEIGHBOR_UPDATES[group][direction as usize]
            );
        }
    }
    Ok(())
}
