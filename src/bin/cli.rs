use anyhow::{anyhow, bail, Context};
use bracketfuse::config::BracketFuseConfig;
use bracketfuse::dataset;
use bracketfuse::exposure::{extract_histogram, BracketSelector, ExposureClassifier};
use bracketfuse::Raster;
use std::env;
use std::path::PathBuf;

const USAGE: &str = "Usage: bracketfuse-cli [--config <file>] [--json] <command> [args]
       bracketfuse-cli --version [--json]

Commands:
  histograms [--dataset <dir>]                 histogram every scene image
  label [--dataset <dir>]                      select low/mid/high brackets
  fuse <scene> [--dataset <dir>] [--out <file>] fuse a labelled scene
  classify <image>                             classify one image
  schedule                                     print the default exposure sweep
  config [--write <file>]                      print or write the configuration";

/// Options shared by every command
struct Options {
    config: BracketFuseConfig,
    json: bool,
    dataset: Option<PathBuf>,
    out: Option<PathBuf>,
    write: Option<PathBuf>,
    positional: Vec<String>,
}

impl Options {
    fn dataset_path(&self) -> PathBuf {
        self.dataset
            .clone()
            .unwrap_or_else(|| PathBuf::from(&self.config.storage.dataset_path))
    }

    fn selector(&self) -> BracketSelector {
        BracketSelector::new(ExposureClassifier::new(self.config.exposure.clone()))
    }
}

fn main() -> anyhow::Result<()> {
    bracketfuse::init_logging();

    let args: Vec<String> = env::args().skip(1).collect();
    let (command, options) = parse_args(&args)?;

    match command.as_str() {
        "histograms" => cmd_histograms(&options),
        "label" => cmd_label(&options),
        "fuse" => cmd_fuse(&options),
        "classify" => cmd_classify(&options),
        "schedule" => cmd_schedule(&options),
        "config" => cmd_config(&options),
        _ => {
            eprintln!("Unknown command: {}\n\n{}", command, USAGE);
            std::process::exit(1);
        }
    }
}

fn print_version(json: bool) -> anyhow::Result<()> {
    let info = bracketfuse::get_info();
    if json {
        println!("{}", serde_json::to_string(&info)?);
    } else {
        println!("{} {}\n{}", info.name, info.version, info.description);
    }
    Ok(())
}

fn parse_args(args: &[String]) -> anyhow::Result<(String, Options)> {
    let mut config_path = None;
    let mut json = false;
    let mut dataset = None;
    let mut out = None;
    let mut write = None;
    let mut version = false;
    let mut positional = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .map(PathBuf::from)
                .ok_or_else(|| anyhow!("{} requires a value", flag))
        };
        match arg.as_str() {
            "--config" => config_path = Some(value("--config")?),
            "--dataset" => dataset = Some(value("--dataset")?),
            "--out" => out = Some(value("--out")?),
            "--write" => write = Some(value("--write")?),
            "--json" => json = true,
            "-V" | "--version" => version = true,
            "-h" | "--help" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            _ => positional.push(arg.clone()),
        }
    }

    if version {
        print_version(json)?;
        std::process::exit(0);
    }

    if positional.is_empty() {
        eprintln!("{}", USAGE);
        std::process::exit(1);
    }
    let command = positional.remove(0);

    let config = match config_path {
        Some(path) => BracketFuseConfig::load_from_file(&path)
            .with_context(|| format!("loading config {:?}", path))?,
        None => BracketFuseConfig::load_or_default(),
    };

    Ok((
        command,
        Options {
            config,
            json,
            dataset,
            out,
            write,
            positional,
        },
    ))
}

fn cmd_histograms(options: &Options) -> anyhow::Result<()> {
    let root = options.dataset_path();
    let storage = &options.config.storage;

    let records = dataset::compute_histograms(&root, storage)
        .with_context(|| format!("scanning dataset {:?}", root))?;
    let path = root.join(&storage.histograms_file);
    dataset::save_histograms(&path, &records)?;

    if options.json {
        println!("{}", serde_json::json!({ "histograms": records.len(), "path": path }));
    } else {
        println!("Histograms saved to {}", path.display());
    }
    Ok(())
}

fn cmd_label(options: &Options) -> anyhow::Result<()> {
    let root = options.dataset_path();
    let storage = &options.config.storage;

    let histograms_path = root.join(&storage.histograms_file);
    let records = dataset::load_histograms(&histograms_path)
        .with_context(|| format!("reading {:?}", histograms_path))?;

    let scenes = dataset::scene_names(&root)?;
    let labels = dataset::label_scenes(
        &scenes,
        &records,
        &storage.image_extension,
        &options.selector(),
    );
    let labels_path = root.join(&storage.labels_file);
    dataset::save_labels(&labels_path, &labels)?;

    if options.json {
        println!("{}", serde_json::to_string(&labels)?);
    } else {
        for label in &labels {
            let slots: Vec<String> = label
                .best_exposure_times
                .to_triple()
                .iter()
                .map(|slot| slot.map_or_else(|| "-".to_string(), |t| t.to_string()))
                .collect();
            println!("{}: {}", label.scene, slots.join(" / "));
        }
        println!("Labels saved to {}", labels_path.display());
    }
    Ok(())
}

fn cmd_fuse(options: &Options) -> anyhow::Result<()> {
    let scene = options
        .positional
        .first()
        .ok_or_else(|| anyhow!("Usage: bracketfuse-cli fuse <scene>"))?;
    let root = options.dataset_path();
    let storage = &options.config.storage;

    let labels_path = root.join(&storage.labels_file);
    let labels = dataset::load_labels(&labels_path)
        .with_context(|| format!("reading {:?}", labels_path))?;
    let label = labels
        .iter()
        .find(|label| &label.scene == scene)
        .ok_or_else(|| anyhow!("Scene '{}' not found in {:?}", scene, labels_path))?;

    let scene_dir = root.join(scene);
    let fused = dataset::fuse_scene(
        &scene_dir,
        label,
        &storage.image_extension,
        &options.config.fusion,
    )
    .with_context(|| format!("fusing scene {}", scene))?;

    let out = options
        .out
        .clone()
        .unwrap_or_else(|| scene_dir.join(&storage.fused_file_name));
    fused.image.save(&out)?;

    if options.json {
        println!(
            "{}",
            serde_json::json!({
                "scene": scene,
                "exposure_times": fused.exposure_times,
                "report": fused.report,
                "processing_time_ms": fused.processing_time_ms,
                "output": out,
            })
        );
    } else {
        println!(
            "Fused {:?} into {} ({} levels, {}ms)",
            fused.exposure_times,
            out.display(),
            fused.report.levels,
            fused.processing_time_ms
        );
    }
    Ok(())
}

fn cmd_classify(options: &Options) -> anyhow::Result<()> {
    let Some(path) = options.positional.first() else {
        bail!("Usage: bracketfuse-cli classify <image>");
    };

    let image = Raster::open_gray(path).with_context(|| format!("loading {}", path))?;
    let histogram = extract_histogram(&image)?;
    let classifier = ExposureClassifier::new(options.config.exposure.clone());
    let result = classifier.classify(&histogram)?;

    if options.json {
        println!("{}", serde_json::to_string(&result)?);
    } else {
        println!(
            "{}: {} (mean {:.1}, dark {:.3}, bright {:.3})",
            path,
            if result.is_valid { "valid" } else { "rejected" },
            result.brightness_mean,
            result.dark_fraction,
            result.bright_fraction
        );
    }
    Ok(())
}

fn cmd_schedule(options: &Options) -> anyhow::Result<()> {
    let times = &options.config.capture.exposure_times;
    if options.json {
        println!("{}", serde_json::to_string(times)?);
    } else {
        for time in times {
            println!("{}", time);
        }
    }
    Ok(())
}

fn cmd_config(options: &Options) -> anyhow::Result<()> {
    if let Some(path) = &options.write {
        options.config.save_to_file(path)?;
        println!("Configuration written to {}", path.display());
        return Ok(());
    }

    if options.json {
        println!("{}", serde_json::to_string(&options.config)?);
    } else {
        println!("{}", toml::to_string_pretty(&options.config)?);
    }
    Ok(())
}
