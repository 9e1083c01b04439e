use clap::{Parser, Subcommand};
use iiif_builder::flavor::FlavorKind;
use iiif_builder::{config, output, scan};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "iiif-builder")]
#[command(about = "Build IIIF Presentation 2 manifests from directory trees")]
#[command(long_about = "\
Build IIIF Presentation 2 manifests from directory trees

The filesystem is the data source. Directories become ranges, images become
canvases in one reading-order sequence, and TOML sidecars add metadata.

Collection structure:

  collection/
  ├── config.toml                  # Build config (optional)
  ├── metadata.toml                # Collection title, attribution, ...
  ├── finding-aid.toml             # Archival components (ead flavor)
  ├── box_1/                       # Range \"Box 1\"
  │   ├── metadata.toml            # Directory metadata
  │   ├── b1_f3/                   # Range \"Box 1 Folder 3\"
  │   │   ├── img001.jpg           # Canvas
  │   │   └── img001.toml          # Page metadata
  │   └── folder_4-6/
  │       └── img001.jpg
  └── .cache/                      # Hidden = skipped

Metadata resolution (first available wins):
  Page:       img001.toml → directory metadata.toml
  Manifest:   metadata.toml → [manifest] in config.toml

Run 'iiif-builder gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Directory tree to scan
    #[arg(long, default_value = ".", global = true)]
    source: PathBuf,

    /// Manifest file to write (default: `output` from config.toml, inside the source)
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Collection flavor (overrides config.toml)
    #[arg(long, value_enum, global = true)]
    flavor: Option<FlavorKind>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the tree and write the manifest
    Build,
    /// Scan the tree and show the range hierarchy without writing anything
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Build => {
            let mut collection = config::load_config(&cli.source)?;
            if let Some(flavor) = cli.flavor {
                collection.flavor = flavor;
            }
            let target = cli
                .output
                .clone()
                .unwrap_or_else(|| cli.source.join(&collection.output));

            println!(
                "==> Building {} manifest from {}",
                collection.flavor.name(),
                cli.source.display()
            );
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    output::print_build_event(&event);
                }
            });
            let result = scan::build_manifest(&cli.source, &collection, Some(&target), Some(tx));
            printer.join().unwrap();
            let report = result?;
            output::print_manifest_tree(&report);
            println!("==> Wrote {}", target.display());
        }
        Command::Check => {
            let mut collection = config::load_config(&cli.source)?;
            if let Some(flavor) = cli.flavor {
                collection.flavor = flavor;
            }
            println!("==> Checking {}", cli.source.display());
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    output::print_build_event(&event);
                }
            });
            let result = scan::build_manifest(&cli.source, &collection, None, Some(tx));
            printer.join().unwrap();
            let report = result?;
            output::print_manifest_tree(&report);
            println!("==> Collection is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
