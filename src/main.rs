use std::path::{Path, PathBuf};
use std::process::ExitCode;

use winit::dpi::LogicalSize;

use tilefont::config::DEFAULT_CONFIG_FILE;
use tilefont::{DirSource, FontRenderer, RendererConfig, TextSurface};

struct CliArgs {
    config: Option<PathBuf>,
    base_path: Option<PathBuf>,
    out: PathBuf,
    text: Option<String>,
}

fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut cli = CliArgs {
        config: None,
        base_path: None,
        out: PathBuf::from("label.png"),
        text: None,
    };
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        let mut value = || {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("{arg} requires a value"))
        };
        match arg.as_str() {
            "--config" | "-c" => cli.config = Some(PathBuf::from(value()?)),
            "--base-path" => cli.base_path = Some(PathBuf::from(value()?)),
            "--out" | "-o" => cli.out = PathBuf::from(value()?),
            flag if flag.starts_with('-') => return Err(format!("unknown option {flag}")),
            text => {
                if cli.text.is_some() {
                    return Err(format!("unexpected argument {text:?}"));
                }
                cli.text = Some(text.to_owned());
            }
        }
    }
    Ok(cli)
}

fn print_help() {
    println!("tilefont {}", env!("CARGO_PKG_VERSION"));
    println!("Render a line of text with bitmap tile-atlas fonts\n");
    println!("USAGE:");
    println!("    tilefont [OPTIONS] <TEXT>\n");
    println!("OPTIONS:");
    println!("    --config, -c <FILE>   Load renderer config from a TOML file (default: ./tilefont.toml if present)");
    println!("    --base-path <DIR>     Directory holding default8.png and glyph_<HH>.png");
    println!("    --out, -o <FILE>      Output PNG path (default: label.png)");
    println!("    --print-config        Print the default configuration to stdout");
    println!("    --version, -V         Print version information");
    println!("    --help, -h            Print this help message");
}

fn run(cli: CliArgs) -> Result<(), String> {
    let Some(text) = cli.text else {
        return Err("missing <TEXT>; see --help".to_owned());
    };

    let mut config = match &cli.config {
        Some(path) => RendererConfig::try_load(path)?,
        None => RendererConfig::load(Path::new(DEFAULT_CONFIG_FILE)),
    };
    if let Some(base_path) = cli.base_path {
        config.base_path = base_path;
    }

    let surface = TextSurface::new(
        LogicalSize::new(config.display_width, config.display_height),
        config.device_pixel_ratio,
    );
    let mut renderer = FontRenderer::new(surface, DirSource::new(&config.base_path));
    renderer.init().map_err(|e| e.to_string())?;
    renderer.draw(&text, &config.draw);

    let image = renderer.read_pixels().map_err(|e| e.to_string())?;
    image
        .save(&cli.out)
        .map_err(|e| format!("failed to write {}: {e}", cli.out.display()))?;
    log::info!(
        "wrote {}x{} label to {}",
        image.width(),
        image.height(),
        cli.out.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--print-config") {
        match RendererConfig::default().to_toml() {
            Ok(s) => print!("{s}"),
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("tilefont {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return ExitCode::SUCCESS;
    }

    match parse_args(&args).and_then(run) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
