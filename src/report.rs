use std::io::{self, Write};

use emu::cache::CacheStats;
use emu::cpu::state::InstructionCounters;
use serde::Serialize;

use crate::cases::Program;

/// Outcome of one comparison between the emulator and the native function.
#[derive(Debug, Clone, Serialize)]
pub struct CaseReport {
    pub program: Program,
    pub input: String,
    pub expected: i32,
    pub emulated: Option<i32>,
    pub error: Option<String>,
    pub counters: Option<InstructionCounters>,
    pub cache: Option<CacheStats>,
}

impl CaseReport {
    pub fn passed(&self) -> bool {
        self.emulated == Some(self.expected)
    }
}

fn percent(ratio: Option<f64>) -> String {
    ratio.map_or_else(|| "n/a".to_string(), |r| format!("{:.0}%", r * 100.0))
}

#[allow(clippy::cast_precision_loss)]
fn share(part: u64, whole: u64) -> Option<f64> {
    (whole != 0).then(|| part as f64 / whole as f64)
}

pub fn write_counters(out: &mut impl Write, c: &InstructionCounters) -> io::Result<()> {
    let total = c.total();
    writeln!(out, "Total Instructions Executed: {total}")?;
    writeln!(out, "Total Computational Instructions Executed: {}", c.computation)?;
    writeln!(
        out,
        "\t{} of total instructions",
        percent(share(c.computation, total))
    )?;
    writeln!(out, "Total Memory Instructions Executed: {}", c.memory)?;
    writeln!(out, "\t{} of total instructions", percent(share(c.memory, total)))?;
    writeln!(out, "Total Branch Instructions Executed: {}", c.branches())?;
    writeln!(out, "Total Branch Instructions Taken: {}", c.branch_taken)?;
    writeln!(
        out,
        "\t{} of branch instructions",
        percent(c.branch_taken_ratio())
    )?;
    writeln!(
        out,
        "\t{} of total instructions",
        percent(share(c.branch_taken, total))
    )?;
    writeln!(out, "Total Branch Instructions Not Taken: {}", c.branch_not_taken)?;
    writeln!(
        out,
        "\t{} of branch instructions",
        percent(c.branch_not_taken_ratio())
    )?;
    writeln!(
        out,
        "\t{} of total instructions",
        percent(share(c.branch_not_taken, total))
    )
}

pub fn write_cache(out: &mut impl Write, s: &CacheStats) -> io::Result<()> {
    writeln!(out, "Cache size: {}", s.size)?;
    writeln!(out, "Total Cache Requests: {}", s.requests)?;
    writeln!(out, "Total Cache Hits: {}", s.hits)?;
    writeln!(out, "\t{} of cache requests", percent(s.hit_ratio()))?;
    writeln!(out, "Total Cache Misses: {}", s.misses)?;
    writeln!(out, "\t{} of cache requests", percent(s.miss_ratio()))
}

pub fn write_case(out: &mut impl Write, case: &CaseReport) -> io::Result<()> {
    let name = case.program.name();
    writeln!(out)?;
    writeln!(out, "{name}_native({}) = {}", case.input, case.expected)?;
    match (&case.emulated, &case.error) {
        (Some(value), _) => writeln!(out, "armemu({name}({})) = {value}", case.input)?,
        (None, Some(err)) => writeln!(out, "armemu({name}({})) failed: {err}", case.input)?,
        (None, None) => {}
    }
    if !case.passed() {
        writeln!(out, "MISMATCH")?;
    }

    if let Some(counters) = &case.counters {
        writeln!(out)?;
        write_counters(out, counters)?;
    }
    if let Some(cache) = &case.cache {
        writeln!(out)?;
        write_cache(out, cache)?;
    }
    Ok(())
}

pub fn write_json(out: &mut impl Write, cases: &[CaseReport]) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, cases)?;
    writeln!(out)
}
