use clap::Parser;
use mosaichmm::cli;

#[derive(Parser, Debug)]
struct Opts {
    /// random seed for priors and mock data
    #[clap(long, default_value = "0")]
    seed: u64,
    /// candidate markov orders (repeatable)
    #[clap(short = 'o', long = "order")]
    orders: Vec<usize>,
    /// candidate state counts (repeatable)
    #[clap(short = 'k', long = "states")]
    state_counts: Vec<usize>,
    #[clap(long, default_value = "2")]
    survey_replicates: usize,
    #[clap(long, default_value = "4")]
    global_replicates: usize,
    /// stricter convergence bar for the global-search phase
    #[clap(long, default_value = "0.01")]
    convergence_threshold: f64,
    /// iterations until the mock EM worker reports convergence
    #[clap(long, default_value = "5")]
    em_iterations: usize,
    /// registry JSON used to resume across runs
    #[clap(long)]
    registry: Option<std::path::PathBuf>,
}

fn main() {
    env_logger::init();
    let opts: Opts = Opts::parse();
    let orders = if opts.orders.is_empty() {
        vec![0, 1]
    } else {
        opts.orders
    };
    let state_counts = if opts.state_counts.is_empty() {
        vec![2, 3]
    } else {
        opts.state_counts
    };
    cli::run_pipeline(
        opts.seed,
        &orders,
        &state_counts,
        opts.survey_replicates,
        opts.global_replicates,
        opts.convergence_threshold,
        opts.em_iterations,
        opts.registry.as_deref(),
    );
}
