use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "choreopack", version)]
struct Cli {
    /// Log debug detail to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract one animation from a disk image into a packed `_anim.bin` file.
    Extract(ExtractArgs),
    /// Split packed animations into size-limited pages and update the split map.
    Split(SplitArgs),
    /// Compile a choreography script and bundle it with its assets.
    Build(BuildArgs),
    /// Print the blob table and scene index of a container.
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
struct ExtractArgs {
    /// Disk image holding the animation.
    #[arg(long)]
    image: PathBuf,

    /// Position of the frame table in the image (decimal or `0x` hex).
    #[arg(long, value_parser = parse_offset)]
    offset: usize,

    /// Animation name; the output is `<out-dir>/<name>_anim.bin`.
    #[arg(long)]
    name: String,

    /// Output directory.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Keep the frames decoded before a malformed one instead of failing.
    #[arg(long)]
    allow_truncated: bool,
}

#[derive(Parser, Debug)]
struct SplitArgs {
    /// Packed animations (`<name>_anim.bin`).
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Directory receiving the pages and `split_map.json`.
    #[arg(long)]
    out_dir: PathBuf,

    /// Maximum page size in bytes.
    #[arg(long, default_value_t = choreopack::DEFAULT_PAGE_LIMIT)]
    limit: usize,

    /// Byte order of page headers.
    #[arg(long, value_enum, default_value_t = OrderChoice::Little)]
    byte_order: OrderChoice,

    /// Worker threads (defaults to one per core).
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Parser, Debug)]
struct BuildArgs {
    /// Choreography script JSON.
    #[arg(long)]
    script: PathBuf,

    /// Root directory that asset names are resolved against (defaults to the script's directory).
    #[arg(long)]
    root: Option<PathBuf>,

    /// Split map JSON (defaults to `<root>/<anim_dir>/split_map.json` when present).
    #[arg(long)]
    split_map: Option<PathBuf>,

    /// Output container path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Container to inspect.
    file: PathBuf,

    /// Byte order the container was written with.
    #[arg(long, value_enum, default_value_t = OrderChoice::Little)]
    byte_order: OrderChoice,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OrderChoice {
    Little,
    Big,
}

impl From<OrderChoice> for choreopack::ByteOrder {
    fn from(c: OrderChoice) -> Self {
        match c {
            OrderChoice::Little => Self::Little,
            OrderChoice::Big => Self::Big,
        }
    }
}

fn parse_offset(s: &str) -> Result<usize, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid offset '{s}': {e}"))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Extract(args) => cmd_extract(args),
        Command::Split(args) => cmd_split(args),
        Command::Build(args) => cmd_build(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn create_dir(dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create output dir '{}'", dir.display()))
}

fn cmd_extract(args: ExtractArgs) -> anyhow::Result<()> {
    let image = std::fs::read(&args.image)
        .with_context(|| format!("read disk image '{}'", args.image.display()))?;

    let arena = if args.allow_truncated {
        let (arena, failure) = choreopack::Arena::extract_partial(&image, args.offset)?;
        if let Some(err) = failure {
            eprintln!(
                "warning: kept {} frames before: {err}",
                arena.frame_count()
            );
        }
        arena
    } else {
        choreopack::Arena::extract(&image, args.offset)?
    };

    create_dir(&args.out_dir)?;
    let out = args
        .out_dir
        .join(format!("{}{}", args.name, choreopack::PACKED_SUFFIX));
    arena.write_packed(&out)?;

    eprintln!(
        "wrote {} ({} frames, {} groups, {} bytes)",
        out.display(),
        arena.frame_count(),
        arena.groups().len(),
        arena.data().len()
    );
    Ok(())
}

fn anim_name(path: &Path) -> anyhow::Result<String> {
    let file = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("input '{}' has no usable file name", path.display()))?;
    Ok(file
        .strip_suffix(choreopack::PACKED_SUFFIX)
        .unwrap_or(file)
        .to_string())
}

fn cmd_split(args: SplitArgs) -> anyhow::Result<()> {
    let config = choreopack::PackConfig {
        page_limit: args.limit,
        byte_order: args.byte_order.into(),
        threads: args.threads,
    };

    let mut inputs = Vec::with_capacity(args.inputs.len());
    for path in &args.inputs {
        inputs.push((anim_name(path)?, choreopack::Arena::read_packed(path)?));
    }
    let results = choreopack::split_many(&inputs, &config)?;

    create_dir(&args.out_dir)?;
    let map_path = args.out_dir.join(choreopack::SPLIT_MAP_FILE);
    let mut map = if map_path.exists() {
        choreopack::SplitMap::load(&map_path)?
    } else {
        choreopack::SplitMap::new()
    };

    for (name, pages) in &results {
        for page in pages {
            let out = args
                .out_dir
                .join(choreopack::page_file_name(name, page.index));
            std::fs::write(&out, &page.bytes)
                .with_context(|| format!("write page '{}'", out.display()))?;
        }
        map.record_pages(name.as_str(), pages);
        eprintln!("{name}: {} pages", pages.len());
    }
    map.save(&map_path)?;

    eprintln!("wrote {}", map_path.display());
    Ok(())
}

fn cmd_build(args: BuildArgs) -> anyhow::Result<()> {
    let script = choreopack::Script::load(&args.script)?;
    let root = match args.root {
        Some(root) => root,
        None => args
            .script
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf(),
    };

    let default_map = root
        .join(&script.settings.anim_dir)
        .join(choreopack::SPLIT_MAP_FILE);
    let split_map = match args.split_map {
        Some(path) => choreopack::SplitMap::load(&path)?,
        None if default_map.exists() => choreopack::SplitMap::load(&default_map)?,
        None => choreopack::SplitMap::new(),
    };

    let mut container = choreopack::Container::new(&root, script.settings.byte_order);
    let compiled = choreopack::compile(
        &script.directives,
        &script.settings,
        &split_map,
        &mut container,
    )?;
    container.add_choreography(compiled.to_bytes());
    container.write(&args.out)?;

    eprintln!(
        "wrote {} ({} events, {} scenes, {} ms, {} blobs)",
        args.out.display(),
        compiled.events.len(),
        compiled.scene_index.scenes().len(),
        compiled.duration_ms(),
        container.len()
    );
    Ok(())
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("read container '{}'", args.file.display()))?;
    let order = args.byte_order.into();
    let view = choreopack::ContainerView::parse(&bytes, order)?;

    println!("blobs: {}", view.blobs.len());
    for (i, blob) in view.blobs.iter().enumerate() {
        let marker = if view.choreography == Some(i as u32) {
            " (choreography)"
        } else {
            ""
        };
        println!("  #{i}: {} bytes{marker}", blob.len());
    }

    if let Some(stream) = view.choreography_bytes() {
        let index = choreopack::SceneIndex::parse(stream, order)?;
        println!("scenes: {}", index.scenes().len());
        for e in index.scenes() {
            println!("  {:>8} ms  @{:<8} {}", e.ms, e.offset, e.name);
        }
    }
    Ok(())
}
