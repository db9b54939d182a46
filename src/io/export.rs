//! CSV export for simulation step results.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::types::StepResult;

/// Column header for CSV step export.
const HEADER: &str = "timestep,energy_demand,solar_irradiance,wind_speed,price,\
                       status_solar,status_wind,status_generator,\
                       gen_solar,gen_wind,gen_generator,\
                       load_solar,load_wind,load_generator,\
                       charged,discharged,sold,purchased_load,purchased_battery,\
                       delivered,soc,purchase_cost,operational_cost,blackout_cost,\
                       feasibility_cost,sell_back,total_cost,blackout,infeasible";

/// Exports simulation results to a CSV file at the given path.
///
/// Writes a header row followed by one data row per step. Produces
/// deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(results: &[StepResult], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(results, buf)
}

/// Writes simulation results as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(results: &[StepResult], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for r in results {
        let s = &r.sample;
        let c = &r.cost;
        wtr.write_record(&[
            r.timestep.to_string(),
            format!("{:.4}", s.energy_demand),
            format!("{:.4}", s.solar_irradiance),
            format!("{:.4}", s.wind_speed),
            format!("{:.4}", s.price),
            format!("{:.4}", r.status.solar),
            format!("{:.4}", r.status.wind),
            format!("{:.4}", r.status.generator),
            format!("{:.4}", r.generated.solar),
            format!("{:.4}", r.generated.wind),
            format!("{:.4}", r.generated.generator),
            format!("{:.4}", r.dispatch.solar.load),
            format!("{:.4}", r.dispatch.wind.load),
            format!("{:.4}", r.dispatch.generator.load),
            format!("{:.4}", r.charged()),
            format!("{:.4}", r.discharged),
            format!("{:.4}", r.sold()),
            format!("{:.4}", r.purchased_load),
            format!("{:.4}", r.purchased_battery),
            format!("{:.4}", r.delivered),
            format!("{:.4}", r.soc),
            format!("{:.4}", c.purchase),
            format!("{:.4}", c.operational),
            format!("{:.4}", c.blackout),
            format!("{:.4}", c.feasibility),
            format!("{:.4}", c.sell_back),
            format!("{:.4}", c.total()),
            r.blackout.to_string(),
            r.infeasible.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
