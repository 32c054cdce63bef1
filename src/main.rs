use clap::Parser;
use hintpress::config::Policy;
use hintpress::imaging::{
    self, CodecRegistry, DEFAULT_DOWNLINK, DEFAULT_DPR, OptimizeError, ParameterBundle,
};
use hintpress::output;
use std::io::{BufWriter, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "hintpress")]
#[command(version)]
#[command(about = "Re-encode an image for a client's size, pixel density and network")]
#[command(long_about = "\
Re-encode an image for a client's size, pixel density and network

Reads an image from INPUT (or stdin when piped) and writes the re-encoded
image to OUTPUT (or stdout). An INPUT path is read even when stdin is also
piped. OUTPUT is only touched once encoding has succeeded.

Output format (first available wins):
  --format MIME → OUTPUT extension → source format

Output size:
  --width/--height are CSS pixels, multiplied by --dpr. Giving one keeps the
  aspect ratio. Output never exceeds the source size. With --savedata and no
  size, the native size is reduced.

Output quality (JPEG and WebP only):
  --quality wins. Otherwise derived from --downlink (Mbps), and capped low
  with --savedata.

Supported: JPEG, PNG, GIF, BMP, TIFF, WebP.")]
struct Cli {
    /// Input image; omit or use `-` for stdin
    input: Option<PathBuf>,

    /// Output file; omit or use `-` for stdout
    output: Option<PathBuf>,

    /// The MIME type to output (default: output file format, then source format)
    #[arg(long, value_name = "MIME", default_value = "")]
    format: String,

    /// Quality for lossy formats, 1-100 (0 = infer from network hints)
    #[arg(long, default_value_t = 0)]
    quality: u32,

    /// Target width in CSS pixels (0 = keep)
    #[arg(long, default_value_t = 0)]
    width: u32,

    /// Target height in CSS pixels (0 = keep)
    #[arg(long, default_value_t = 0)]
    height: u32,

    /// Device pixel ratio to optimize for
    #[arg(long, default_value_t = DEFAULT_DPR)]
    dpr: f64,

    /// Downlink speed in Mbps to optimize for
    #[arg(long, default_value_t = DEFAULT_DOWNLINK)]
    downlink: f64,

    /// Optimize to save data
    #[arg(long)]
    savedata: bool,

    /// Print the resolved plan instead of encoding
    #[arg(long)]
    dry_run: bool,

    /// Print the dry-run plan as JSON
    #[arg(long, requires = "dry_run")]
    json: bool,
}

impl Cli {
    /// Build the engine input. Zero and empty flags mean "not requested".
    fn bundle(&self) -> ParameterBundle {
        let non_zero = |v: u32| (v != 0).then_some(v);
        ParameterBundle {
            mime_type: Some(self.format.trim().to_string()).filter(|m| !m.is_empty()),
            quality: non_zero(self.quality),
            width: non_zero(self.width),
            height: non_zero(self.height),
            dpr: self.dpr,
            downlink: self.downlink,
            save_data: self.savedata,
        }
    }

    fn output_path(&self) -> Option<&Path> {
        self.output.as_deref().filter(|p| *p != Path::new("-"))
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let registry = CodecRegistry::standard();
    let policy = Policy::default();

    let input = read_input(cli.input.as_deref())?;
    let source = imaging::decode(&input)?;
    let plan = imaging::plan(
        &cli.bundle(),
        source.dimensions(),
        &source.format_name,
        cli.output_path(),
        &registry,
        &policy,
    )?;

    if cli.dry_run {
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&plan)?);
        } else {
            output::print_plan(source.dimensions(), &source.format_name, &plan);
        }
        return Ok(());
    }

    let bytes = imaging::render(&source.image, &plan, &registry, &policy)?;

    match cli.output_path() {
        Some(path) => write_file(path, &bytes)?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes).map_err(OptimizeError::Write)?;
            stdout.flush().map_err(OptimizeError::Write)?;
        }
    }

    Ok(())
}

/// Read the whole input from a file, or from stdin when no file is given
/// (or `-`). An interactive stdin counts as no input.
fn read_input(path: Option<&Path>) -> Result<Vec<u8>, OptimizeError> {
    match path.filter(|p| *p != Path::new("-")) {
        Some(path) => std::fs::read(path).map_err(|e| {
            OptimizeError::InvalidInput(format!("Error reading file {}: {e}", path.display()))
        }),
        None => {
            let stdin = std::io::stdin();
            if stdin.is_terminal() {
                return Err(OptimizeError::InvalidInput(
                    "You must supply a file via stdin or the first argument".into(),
                ));
            }
            let mut buf = Vec::new();
            stdin
                .lock()
                .read_to_end(&mut buf)
                .map_err(|e| OptimizeError::InvalidInput(format!("Error reading stdin: {e}")))?;
            Ok(buf)
        }
    }
}

/// Write a fully encoded image to `path`. A partially written file is
/// removed.
fn write_file(path: &Path, bytes: &[u8]) -> Result<(), OptimizeError> {
    let result = std::fs::File::create(path).and_then(|file| {
        let mut writer = BufWriter::new(file);
        writer.write_all(bytes)?;
        writer.flush()
    });
    if let Err(e) = result {
        let _ = std::fs::remove_file(path);
        return Err(write_error(path, e));
    }
    Ok(())
}

fn write_error(path: &Path, err: std::io::Error) -> OptimizeError {
    OptimizeError::Write(std::io::Error::new(
        err.kind(),
        format!("{}: {err}", path.display()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn zero_flags_mean_unset() {
        let cli = Cli::parse_from(["hintpress", "in.png"]);
        let bundle = cli.bundle();
        assert_eq!(bundle, ParameterBundle::default());
        assert_eq!(cli.output_path(), None);
    }

    #[test]
    fn flags_map_onto_bundle() {
        let cli = Cli::parse_from([
            "hintpress",
            "in.png",
            "out.webp",
            "--format",
            "image/jpeg",
            "--quality",
            "77",
            "--width",
            "320",
            "--dpr",
            "2",
            "--downlink",
            "10",
            "--savedata",
        ]);
        let bundle = cli.bundle();
        assert_eq!(bundle.mime_type.as_deref(), Some("image/jpeg"));
        assert_eq!(bundle.quality, Some(77));
        assert_eq!(bundle.width, Some(320));
        assert_eq!(bundle.height, None);
        assert_eq!(bundle.dpr, 2.0);
        assert_eq!(bundle.downlink, 10.0);
        assert!(bundle.save_data);
        assert_eq!(cli.output_path(), Some(Path::new("out.webp")));
    }

    #[test]
    fn dash_output_means_stdout() {
        let cli = Cli::parse_from(["hintpress", "-", "-"]);
        assert_eq!(cli.output_path(), None);
    }

    #[test]
    fn json_requires_dry_run() {
        assert!(Cli::try_parse_from(["hintpress", "in.png", "--json"]).is_err());
    }

    #[test]
    fn help_documents_input_precedence() {
        let help = Cli::command().render_long_help().to_string();
        assert!(help.contains("An INPUT path is read even when stdin is also"));
    }

    #[test]
    fn missing_input_file_is_invalid_input() {
        let err = read_input(Some(Path::new("/nonexistent/in.png"))).unwrap_err();
        assert!(matches!(err, OptimizeError::InvalidInput(_)));
    }
}
