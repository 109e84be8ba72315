use clap::{Parser, Subcommand};
use microblog::pipeline::{self, BuildOptions};
use microblog::{config, output};
use std::path::PathBuf;
use std::process::ExitCode;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "microblog")]
#[command(about = "Static site generator for a dated Markdown microblog")]
#[command(long_about = "\
Static site generator for a dated Markdown microblog

Posts are Markdown files with TOML front matter. The build renders a
paginated feed, one page per post, responsive image variants, a sitemap,
robots.txt and (with site_url set) Atom and RSS feeds.

Site structure:

  site/
  ├── config.toml                  # Site config (optional)
  ├── theme.css                    # Replaces the built-in stylesheet (optional)
  ├── favicon.png                  # Copied and linked (optional)
  ├── robots.txt                   # Base for the generated robots.txt (optional)
  ├── posts/
  │   └── 2024/10/
  │       └── 2024-10-12-harbour.md
  └── static/                      # Copied to the output as-is
      └── harbour.jpg

Post front matter (between +++ lines):

  +++
  title = \"Harbour at dawn\"
  date = 2024-10-12                # else taken from the filename
  images = [\"static/harbour.jpg\", { src = \"static/boat.jpg\", alt = \"A boat\" }]
  excerpt = \"Early light.\"         # optional
  layout = \"photo\"                 # optional: default | photo
  +++
  Markdown body…

Run 'microblog gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Site root directory
    #[arg(long, default_value = ".", global = true)]
    source: PathBuf,

    /// Output directory (replaced on every successful build)
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Config file (default: <source>/config.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Build the site (the default)
    Build,
    /// Parse every post and identify every image without writing anything
    Check,
    /// Print the parsed posts as JSON
    Scan,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let options = BuildOptions {
        source: cli.source,
        output: cli.output,
        config: cli.config,
    };

    match cli.command.unwrap_or(Command::Build) {
        Command::Build => {
            let backend = microblog::imaging::RustBackend::new();

            println!("==> Scanning {}", options.source.display());
            let site = pipeline::load_site(&options.source, options.config.as_deref())?;
            output::print_scan_output(&site.posts, &site.root);

            println!("==> Processing images");
            let staging = pipeline::stage_output(&site, &options.output)?;
            let images = pipeline::process_images(&backend, &site, Some(staging.path()))?;
            output::print_process_output(&images);

            println!("==> Writing → {}", options.output.display());
            let summary = pipeline::write_site(&site, &images, staging)?;
            output::print_build_summary(&summary);
        }
        Command::Check => {
            println!("==> Checking {}", options.source.display());
            let summary = pipeline::check(&options)?;
            output::print_scan_output(&summary.site.posts, &summary.site.root);
            output::print_process_output(&summary.images);
            println!("==> Site is valid");
        }
        Command::Scan => {
            let site = pipeline::load_site(&options.source, options.config.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&site.posts)?);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
