mod common;
mod logic;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use common::{FileLoader, split_csv};
use logic::{LootTester, SeedResult, SimulationPlan, resolve_seed_inputs};
use loot_engine::{LootTables, PartyMember, SkillRef};

#[derive(Debug, Parser)]
#[command(name = "loot-tester", version = "0.1.0")]
#[command(about = "Deterministic battle-drop simulator for the loot engine")]
struct Args {
    /// Seeds to run (comma-separated integers, 0x hex, or words)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Battles to simulate per seed
    #[arg(long, default_value_t = 500)]
    battles: u32,

    /// Battles fought per in-game day; the super-rare state rolls over between days
    #[arg(long, default_value_t = 50)]
    battles_per_day: u32,

    /// Battles sharing one dropped-item set (one dungeon floor)
    #[arg(long, default_value_t = 10)]
    battles_per_floor: u32,

    /// Largest enemy group per battle
    #[arg(long, default_value_t = 3)]
    group_size: u32,

    /// First simulated day (YYYY-MM-DD); defaults to today (UTC)
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// Simulate with a drop ticket active
    #[arg(long)]
    ticket: bool,

    /// Simulate with a title treasure active
    #[arg(long)]
    title_treasure: bool,

    /// Title id carried by every enemy group
    #[arg(long)]
    enemy_title: Option<u32>,

    /// Title id carried by groups that include a boss when --enemy-title is unset
    #[arg(long, default_value_t = loot_engine::constants::BOSS_TIER_TITLE_ID)]
    boss_title: u32,

    /// Party size
    #[arg(long, default_value_t = 4)]
    party_size: usize,

    /// Luck of each party member
    #[arg(long, default_value_t = 20)]
    luck: u32,

    /// Spirit of each party member
    #[arg(long, default_value_t = 10)]
    spirit: u32,

    /// Skill ids learned by every party member (comma-separated)
    #[arg(long, default_value = "")]
    skills: String,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Master data JSON to load instead of the bundled sample set
    #[arg(long)]
    master: Option<PathBuf>,

    /// Loot config JSON to load instead of the bundled tuning
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.report == "console" {
        announce_banner();
    }

    let start_time = Instant::now();
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let loader = FileLoader::new(args.master.clone(), args.config.clone());
    let tables = LootTables::load(&loader).context("failed to load loot tables")?;
    tables
        .config()
        .validate()
        .context("loot config failed validation")?;
    let plan = build_plan(&args)?;
    log::info!(
        "simulating {} seed(s), {} battles each, starting {}",
        seeds.len(),
        plan.battles,
        plan.start_date
    );

    let tester = LootTester::new(&tables, args.verbose);
    let results = tester.run_seeds(&plan, &seeds);

    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn announce_banner() {
    println!("{}", "🎲 Loot Engine Tester".bright_cyan().bold());
    println!("{}", "=====================".cyan());
}

fn parse_skills(raw: &str) -> Result<Vec<SkillRef>> {
    split_csv(raw)
        .iter()
        .map(|token| {
            token
                .parse::<u32>()
                .map(|id| SkillRef { id })
                .with_context(|| format!("invalid skill id: {token}"))
        })
        .collect()
}

fn build_plan(args: &Args) -> Result<SimulationPlan> {
    let skills = parse_skills(&args.skills)?;
    let member = PartyMember {
        luck: args.luck,
        spirit: args.spirit,
        skills,
    };
    let start_date = args
        .start_date
        .unwrap_or_else(|| Utc::now().date_naive());
    let mut plan = SimulationPlan::new(start_date, vec![member; args.party_size])
        .with_battles(args.battles);
    plan.battles_per_day = args.battles_per_day;
    plan.battles_per_floor = args.battles_per_floor;
    plan.max_group_size = args.group_size;
    plan.ticket_active = args.ticket;
    plan.title_treasure_active = args.title_treasure;
    plan.enemy_title_id = args.enemy_title;
    plan.boss_title_id = args.boss_title;
    Ok(plan)
}

fn write_reports(args: &Args, results: &[SeedResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => {
            logic::reports::generate_json_report(&mut output_target, results)?;
        }
        "markdown" => {
            logic::reports::generate_markdown_report(&mut output_target, results)?;
        }
        _ => {
            logic::reports::generate_console_report(
                &mut output_target,
                results,
                start_time.elapsed(),
            )?;
            writeln!(&mut output_target, "🏁 Total time: {:?}", start_time.elapsed())?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
