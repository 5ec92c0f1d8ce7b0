use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use loot_engine::ItemCategory;
use loot_engine::numbers::usize_to_f64;

use super::{SeedResult, SimulationSummary};

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    usize_to_f64(part) / usize_to_f64(whole) * 100.0
}

fn per_battle(count: usize, battles: u32) -> f64 {
    if battles == 0 {
        return 0.0;
    }
    usize_to_f64(count) / f64::from(battles)
}

fn category_count(summary: &SimulationSummary, category: ItemCategory) -> usize {
    summary
        .drops_by_category
        .get(&category)
        .copied()
        .unwrap_or(0)
}

pub fn generate_console_report<W: Write + ?Sized>(
    writer: &mut W,
    results: &[SeedResult],
    total_duration: Duration,
) -> Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", "📊 Loot Simulation Summary".bright_cyan().bold())?;
    writeln!(writer, "{}", "==========================".cyan())?;

    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.len() - passed;
    writeln!(writer, "Seeds simulated: {}", results.len())?;
    writeln!(writer, "Deterministic: {}", passed.to_string().green())?;
    writeln!(writer, "Failed: {}", failed.to_string().red())?;
    writeln!(writer, "Total time: {total_duration:?}")?;
    writeln!(writer)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(writer, "{} seed {}", status, result.seed.display_name().bold())?;
        if let Some(summary) = &result.summary {
            writeln!(
                writer,
                "   Battles: {} over {} day(s), {} enemies",
                summary.battles, summary.days, summary.enemies_defeated
            )?;
            writeln!(
                writer,
                "   Drops: {} ({:.2} per battle)",
                summary.drops,
                per_battle(summary.drops, summary.battles)
            )?;
            for category in ItemCategory::ALL {
                let count = category_count(summary, category);
                writeln!(
                    writer,
                    "     {:<7} {:>6} ({:.1}%)",
                    category.as_str(),
                    count,
                    percent(count, summary.drops)
                )?;
            }
            writeln!(
                writer,
                "   Titled: {} ({:.1}%)",
                summary.titled_drops,
                percent(summary.titled_drops, summary.drops)
            )?;
            writeln!(
                writer,
                "   Super-rare: {} ({} stripped, {} day(s) triggered)",
                summary.super_rare_drops.to_string().bright_magenta(),
                summary.stripped_titles,
                summary.super_rare_days
            )?;
            writeln!(writer, "   Fingerprint: {:016x}", summary.fingerprint)?;
        }
        for failure in &result.failures {
            writeln!(writer, "   • {}", failure.red())?;
        }
        writeln!(writer, "   Time: {:?}", result.duration)?;
        writeln!(writer)?;
    }
    Ok(())
}

pub fn generate_json_report<W: Write + ?Sized>(writer: &mut W, results: &[SeedResult]) -> Result<()> {
    let json_output = serde_json::to_string_pretty(results)?;
    writeln!(writer, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report<W: Write + ?Sized>(
    writer: &mut W,
    results: &[SeedResult],
) -> Result<()> {
    writeln!(writer, "# Loot Simulation Results\n")?;

    let passed = results.iter().filter(|r| r.passed).count();
    writeln!(writer, "## Summary\n")?;
    writeln!(writer, "- **Seeds**: {}", results.len())?;
    writeln!(writer, "- **Deterministic**: {passed}")?;
    writeln!(writer, "- **Failed**: {}\n", results.len() - passed)?;

    writeln!(writer, "## Drop Rates\n")?;
    writeln!(
        writer,
        "| Seed | Battles | Drops | Normal | Good | Rare | Gem | Titled | Super-rare | Fingerprint |"
    )?;
    writeln!(
        writer,
        "|------|---------|-------|--------|------|------|-----|--------|------------|-------------|"
    )?;
    for result in results {
        let Some(summary) = &result.summary else {
            writeln!(
                writer,
                "| {} | - | - | - | - | - | - | - | - | - |",
                result.seed.display_name()
            )?;
            continue;
        };
        writeln!(
            writer,
            "| {} | {} | {} | {} | {} | {} | {} | {} | {} | `{:016x}` |",
            result.seed.display_name(),
            summary.battles,
            summary.drops,
            category_count(summary, ItemCategory::Normal),
            category_count(summary, ItemCategory::Good),
            category_count(summary, ItemCategory::Rare),
            category_count(summary, ItemCategory::Gem),
            summary.titled_drops,
            summary.super_rare_drops,
            summary.fingerprint
        )?;
    }

    let failing: Vec<&SeedResult> = results.iter().filter(|r| !r.passed).collect();
    if !failing.is_empty() {
        writeln!(writer, "\n## Failures\n")?;
        for result in failing {
            for failure in &result.failures {
                writeln!(writer, "- seed {}: {failure}", result.seed.display_name())?;
            }
        }
    }
    Ok(())
}
