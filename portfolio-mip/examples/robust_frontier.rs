//! Sweep the cardinality cap on the classic 20-asset universe.
//!
//! Run with: cargo run --release -p portfolio-mip --example robust_frontier

use portfolio_mip::{solve_robust, Instance, SolveSettings};

fn main() {
    env_logger::init();

    let n = 20;
    let gamma = 10.0_f64.sqrt();

    println!("Robust portfolio frontier: n = {}, gamma = {:.4}", n, gamma);
    println!("{:>4} {:>12} {:>8} {:>8} {:>10}", "cap", "worst-case", "nodes", "cuts", "time (ms)");

    let base = Instance::synthetic(n, gamma).expect("valid universe");

    for cap in 1..=n / 4 {
        let instance =
            Instance::with_max_assets(base.means().to_vec(), base.stddevs().to_vec(), gamma, cap)
                .expect("valid universe");

        let settings = SolveSettings::default()
            .with_cut_tol(1e-4)
            .with_time_limit(60.0);

        match solve_robust(&instance, &settings) {
            Ok(solution) => {
                println!(
                    "{:>4} {:>12.6} {:>8} {:>8} {:>10}",
                    cap,
                    solution.obj_val,
                    solution.nodes_explored,
                    solution.cuts_added,
                    solution.solve_time_ms
                );
                let holdings: Vec<String> = solution
                    .selected
                    .iter()
                    .map(|&i| format!("{}:{:.3}", i, solution.weights[i]))
                    .collect();
                println!("     holdings: {}", holdings.join("  "));
            }
            Err(e) => {
                eprintln!("cap {}: solve failed: {}", cap, e);
                std::process::exit(1);
            }
        }
    }
}
