use anyhow::Context;
use tracing_subscriber::EnvFilter;

use otter_gnc::config::{GuidanceConfig, SimConfig};
use otter_gnc::dynamics::VehicleDynamicsModel;
use otter_gnc::gnc::{ThrottleInterpolator, ThrottleTable};
use otter_gnc::guidance::{Pilot, Target};
use otter_gnc::io::throttle_map;
use otter_gnc::sim::SimulationRunner;
use otter_gnc::vessel::OtterParams;

const THROTTLE_MAP: &str = include_str!("../data/throttle_map.csv");
const LOG_PATH: &str = "mission_log.csv";

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // -----------------------------------------------------------------------
    // Vessel, calibration and mission
    // -----------------------------------------------------------------------
    let params = OtterParams::new().context("building vessel parameters")?;

    let table = ThrottleTable::new(
        throttle_map::parse_grid(THROTTLE_MAP).context("parsing throttle calibration grid")?,
    );
    let guidance = GuidanceConfig::default();
    let interpolator = ThrottleInterpolator::new(table, guidance.neighbors)
        .context("building throttle interpolator")?;

    let waypoints = vec![(50.0, 0.0), (100.0, 50.0), (100.0, 100.0)];
    let target = Target::waypoints(waypoints.clone());

    let sim = SimConfig {
        cycles: 100_000,
        dt: 0.02,
        stop_at_final_waypoint: true,
        ..SimConfig::default()
    };

    // -----------------------------------------------------------------------
    // Run the mission
    // -----------------------------------------------------------------------
    let pilot = Pilot::new(&params, target, interpolator, guidance.clone())
        .context("building guidance pipeline")?;
    let model = VehicleDynamicsModel::new(params.clone(), sim.current_speed, sim.current_direction);
    let report = SimulationRunner::new(model, pilot, sim.clone())
        .run()
        .context("running the mission")?;

    report
        .log
        .write_file(LOG_PATH)
        .with_context(|| format!("writing {LOG_PATH}"))?;

    // -----------------------------------------------------------------------
    // Report
    // -----------------------------------------------------------------------
    let last = &waypoints[waypoints.len() - 1];
    let fs = &report.final_state;
    let miss = ((fs.eta[0] - last.0).powi(2) + (fs.eta[1] - last.1).powi(2)).sqrt();

    println!();
    println!("====================================================================");
    println!("  OTTER USV WAYPOINT MISSION");
    println!("====================================================================");
    println!();
    println!("  Vessel");
    println!("  ------------------------------------------------------------------");
    println!(
        "  Total mass:    {:>8.1} kg    Lever arms:   {:>+.3} / {:>+.3} m",
        params.m_total, params.l1, params.l2
    );
    println!(
        "  Prop speed:    {:>8.1} .. {:.1} rad/s   Time constant: {:.1} s",
        params.n_min, params.n_max, params.t_n
    );
    println!(
        "  Force budget:  {:>8.0} N     Yaw torque:   {:>8.0} N m",
        guidance.max_surge_force, guidance.max_yaw_torque
    );
    println!();
    println!("  Mission");
    println!("  ------------------------------------------------------------------");
    for (i, (n, e)) in waypoints.iter().enumerate() {
        println!("  WP{:<2}  north {:>7.1} m   east {:>7.1} m", i, n, e);
    }
    println!();
    println!("  Outcome");
    println!("  ------------------------------------------------------------------");
    println!(
        "  Final waypoint captured:  {}",
        if report.captured_final { "yes" } else { "NO" }
    );
    println!(
        "  Cycles run:    {:>8}      Mission time: {:>8.1} s",
        report.cycles_run,
        report.cycles_run as f64 * sim.dt
    );
    println!(
        "  Final position: ({:>7.1}, {:>7.1}) m   Miss distance: {:>6.2} m",
        fs.eta[0], fs.eta[1], miss
    );
    println!("  Cycle log written to {LOG_PATH} ({} rows)", report.log.len());
    println!();

    Ok(())
}
