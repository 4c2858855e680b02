use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use wavegrid::{Catalog, Grid, RandomAdvisor, RandomJudge, Rect, Wfc};

/// Map generation configuration.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Config {
    /// Path of the JSON pattern catalog.
    #[arg(short, long, default_value = "demos/forest.json")]
    catalog: PathBuf,

    #[arg(long, default_value_t = 12)]
    width: usize,

    #[arg(long, default_value_t = 12)]
    height: usize,

    #[arg(short, long, default_value_t = 0)]
    seed: u64,

    /// Probability of a judge-ordered rollback per step.
    #[arg(long, default_value_t = 0.02)]
    rollback_chance: f64,

    /// Directory to save the generated grid into, as `.dat`.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[clap(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = Config::parse();

    let catalog = Arc::new(Catalog::load(&config.catalog)?);
    if config.verbose {
        println!("Catalog            : {}", config.catalog.display());
        println!("Number of patterns : {}", catalog.len());
        println!("{}", catalog.validation());
    }

    let grid = Grid::new(catalog, Rect::new(config.width, config.height));
    let judge = RandomJudge::new(config.seed, config.rollback_chance).with_rollback_penalty(1);
    let advisor = RandomAdvisor::new(config.seed);
    let mut wfc = Wfc::new(grid, Box::new(judge), Box::new(advisor));

    let succeeded = wfc.generate();
    if config.verbose {
        println!("Collapsed          : {succeeded}");
        println!("Rollbacks used     : {}", wfc.rollback_count());
        println!("Steps recorded     : {}", wfc.history().steps());
    }
    print!("{}", wfc.grid());

    if !succeeded {
        anyhow::bail!("generation failed: {:?}", wfc.last_step().and_then(|s| s.outcome));
    }

    if let Some(dir) = config.output {
        let path = wfc.grid().serialize(&dir, None)?;
        println!("Saved {}", path.display());
    }
    Ok(())
}
