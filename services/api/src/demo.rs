use crate::infra::{InMemoryAssignmentStore, InMemoryScheduleStore};
use chrono::{Datelike, Local, NaiveDate, Weekday};
use clap::Args;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::sync::Arc;
use study_planner::error::AppError;
use study_planner::planning::autofill::week_monday;
use study_planner::planning::import::{assignments_from_path, schedule_from_path};
use study_planner::planning::{
    Assignment, AssignmentStore, AutoFillReport, BlockDay, BlockFill, BlockType, CompletionStatus,
    DayPlan, PlacementEngine, PlannerCatalog, PlannerService, PlannerServiceError, ScheduleBlock,
    ScheduleStore,
};

const DEMO_STUDENTS: [&str; 2] = ["Abigail", "Khalil"];

#[derive(Args, Debug)]
pub(crate) struct PlanArgs {
    /// Student whose day to populate
    #[arg(long)]
    pub(crate) student: String,
    /// Day to populate (YYYY-MM-DD)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) date: NaiveDate,
    /// CSV export of assignment records
    #[arg(long)]
    pub(crate) assignments: PathBuf,
    /// CSV export of the weekly schedule template
    #[arg(long)]
    pub(crate) schedule: PathBuf,
    /// JSON catalog replacing the built-in rotation and filler tables
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
    /// Seed for filler selection, for repeatable output
    #[arg(long)]
    pub(crate) seed: Option<u64>,
}

#[derive(Args, Debug)]
pub(crate) struct AutoFillArgs {
    /// Student to fill the week for
    #[arg(long, default_value = "Abigail")]
    pub(crate) student: String,
    /// Any date in the target week (YYYY-MM-DD). Defaults to the current week.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) week_start: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Any date in the demo week (YYYY-MM-DD). Defaults to the current week.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) week_start: Option<NaiveDate>,
    /// Seed for filler selection, for repeatable output
    #[arg(long)]
    pub(crate) seed: Option<u64>,
}

pub(crate) fn run_plan(args: PlanArgs) -> Result<(), AppError> {
    let PlanArgs {
        student,
        date,
        assignments,
        schedule,
        catalog,
        seed,
    } = args;

    let catalog = match catalog {
        Some(path) => PlannerCatalog::from_path(path)?,
        None => PlannerCatalog::standard(),
    };
    let records = assignments_from_path(&assignments)?;
    let weekday = date.weekday();
    let blocks: Vec<ScheduleBlock> = schedule_from_path(&schedule)?
        .into_iter()
        .filter(|block| block.student_name.trim().eq_ignore_ascii_case(student.trim()))
        .filter(|block| block.weekday.applies_to(weekday))
        .collect();

    let engine = PlacementEngine::new(Arc::new(catalog));
    let plan = place(&engine, &records, &blocks, &student, date, seed);

    println!(
        "Loaded {} assignments from {} and {} blocks from {}",
        records.len(),
        assignments.display(),
        blocks.len(),
        schedule.display()
    );
    render_day_plan(&plan);
    Ok(())
}

pub(crate) fn run_autofill(args: AutoFillArgs) -> Result<(), AppError> {
    let week_start = week_monday(args.week_start.unwrap_or_else(today));
    let service = demo_service();

    let report = service.auto_fill_week(&args.student, week_start)?;
    render_report(&report);
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let monday = week_monday(args.week_start.unwrap_or_else(today));
    let assignments = Arc::new(InMemoryAssignmentStore::with_records(seed_assignments()));
    let schedule = Arc::new(InMemoryScheduleStore::from_blocks(seed_templates()));
    let service = PlannerService::new(
        assignments.clone(),
        schedule.clone(),
        PlannerCatalog::standard(),
    );

    println!("Study planner demo for the week of {monday}");

    for student in DEMO_STUDENTS {
        println!("\n== {student}: display-time placement ==");
        let records = assignments
            .assignments_for_student(student)
            .map_err(PlannerServiceError::from)?;
        let blocks = schedule
            .blocks_for(student, Weekday::Mon)
            .map_err(PlannerServiceError::from)?;
        let preview = place(service.engine(), &records, &blocks, student, monday, args.seed);
        render_day_plan(&preview);

        println!("\n== {student}: weekly auto-fill ==");
        let report = service.auto_fill_week(student, monday)?;
        render_report(&report);

        println!("\n== {student}: Monday after auto-fill ==");
        let records = assignments
            .assignments_for_student(student)
            .map_err(PlannerServiceError::from)?;
        let after = place(service.engine(), &records, &blocks, student, monday, args.seed);
        render_day_plan(&after);
    }

    Ok(())
}

fn place(
    engine: &PlacementEngine,
    assignments: &[Assignment],
    blocks: &[ScheduleBlock],
    student: &str,
    date: NaiveDate,
    seed: Option<u64>,
) -> DayPlan {
    match seed {
        Some(seed) => engine.place_with_rng(
            assignments,
            blocks,
            student,
            date,
            &mut SmallRng::seed_from_u64(seed),
        ),
        None => engine.place(assignments, blocks, student, date),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn demo_service() -> PlannerService<InMemoryAssignmentStore, InMemoryScheduleStore> {
    PlannerService::new(
        Arc::new(InMemoryAssignmentStore::with_records(seed_assignments())),
        Arc::new(InMemoryScheduleStore::from_blocks(seed_templates())),
        PlannerCatalog::standard(),
    )
}

fn render_day_plan(plan: &DayPlan) {
    println!("{} | {} {}", plan.student, plan.weekday_label(), plan.date);

    for populated in &plan.blocks {
        let block = &populated.block;
        let family = populated.family.map(|family| family.label()).unwrap_or("-");
        let detail = match &populated.fill {
            BlockFill::Assignment { assignment, rule } => {
                format!("{} [{}]", assignment.title, rule.label())
            }
            BlockFill::Fallback { fallback } => {
                format!("filler: {} ({} min)", fallback.title, fallback.minutes)
            }
            BlockFill::Empty if populated.family.is_some() => "awaiting work".to_string(),
            BlockFill::Empty => String::new(),
        };
        println!(
            "  {:>5}-{:<5} {:<12} {:<12} {}",
            block.start_time,
            block.end_time,
            block.display_name(),
            family,
            detail
        );
    }

    let summary = plan.summary();
    println!(
        "  {} assigned, {} filler, {} awaiting work, {} fixed; {} unplaced remaining",
        summary.with_assignment,
        summary.with_fallback,
        summary.awaiting_work,
        summary.pass_through,
        summary.unscheduled_count
    );
}

fn render_report(report: &AutoFillReport) {
    println!(
        "Auto-fill for {} starting {}: {} placements",
        report.student,
        report.week_start,
        report.placements.len()
    );

    for placement in &report.placements {
        println!(
            "  {} block {}: {} ({}, {})",
            placement.date,
            placement.block_number,
            placement.title,
            placement.family,
            placement.rule.label()
        );
    }
    for failure in &report.failures {
        println!(
            "  write failed for {} on {} block {}: {}",
            failure.assignment_id, failure.date, failure.block_number, failure.reason
        );
    }
    for skipped in &report.skipped_days {
        println!("  skipped {}: {}", skipped.date, skipped.reason);
    }
    println!("  {} candidates left unplaced", report.remaining_unplaced);
}

/// Unplaced work for the two demo students.
pub(crate) fn seed_assignments() -> Vec<Assignment> {
    vec![
        record("ab-alg14", "Abigail", "Algebra lesson 14", "Math", "Algebra I", Some(7), Some(35)),
        record("ab-alg15", "Abigail", "Algebra lesson 15", "Math", "Algebra I", Some(9), Some(35)),
        record("ab-read6", "Abigail", "Read chapter 6", "History", "American History", Some(8), Some(30)),
        record("ab-mod4", "Abigail", "Module 4", "History", "American History", Some(10), Some(150)),
        record("ab-essay", "Abigail", "Essay draft on Reconstruction", "English", "Writing Skills", Some(9), Some(45)),
        record("ab-vocab", "Abigail", "Vocab quiz review", "Spanish", "Spanish I", Some(8), Some(15)),
        record("ab-poster", "Abigail", "Create a timeline poster", "History", "American History", Some(10), Some(40)),
        record("ab-cells", "Abigail", "Biology lab: cell observation", "Science", "Biology", Some(9), Some(40)),
        completed(record("ab-gram3", "Abigail", "Grammar worksheet 3", "English", "Writing Skills", Some(3), Some(20))),
        record("kh-geo", "Khalil", "Solve polygon set", "Math", "Geometry", Some(8), Some(30)),
        record("kh-read2", "Khalil", "Read chapter 2", "Literature", "Literature", None, Some(25)),
        record("kh-spell", "Khalil", "Spelling practice", "English", "Grammar", Some(7), Some(10)),
        record("kh-mod3", "Khalil", "Module 3", "History", "World History", Some(10), Some(100)),
        record("kh-paint", "Khalil", "Paint a landscape study", "Art", "Art", None, Some(45)),
        record("kh-letter", "Khalil", "Write a letter to a pen pal", "English", "Writing", Some(9), Some(30)),
    ]
}

fn record(
    id: &str,
    owner: &str,
    title: &str,
    subject: &str,
    course: &str,
    due_day: Option<u32>,
    minutes: Option<u32>,
) -> Assignment {
    let mut assignment = Assignment::new(id, owner, title, subject);
    assignment.course_name = Some(course.to_string());
    assignment.due_date = due_day.and_then(|day| NaiveDate::from_ymd_opt(2025, 1, day));
    assignment.actual_estimated_minutes = minutes;
    assignment
}

fn completed(mut assignment: Assignment) -> Assignment {
    assignment.completion_status = CompletionStatus::Completed;
    assignment
}

/// Weekly templates: Abigail runs five blocks with study hall fourth, Khalil
/// four with study hall third.
pub(crate) fn seed_templates() -> Vec<ScheduleBlock> {
    let mut blocks = Vec::new();

    for student in DEMO_STUDENTS {
        let key = student.to_ascii_lowercase();
        blocks.push(fixed(&format!("{key}-bible"), student, BlockDay::EveryDay, "08:00", "08:30", BlockType::Bible));
        blocks.push(fixed(&format!("{key}-lunch"), student, BlockDay::EveryDay, "11:30", "12:15", BlockType::Lunch));
    }

    for weekday in [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri] {
        let day = BlockDay::On(weekday);
        let tag = weekday.to_string().to_ascii_lowercase();

        for (number, start, end) in [
            (1, "08:30", "09:15"),
            (2, "09:15", "10:00"),
            (3, "10:15", "11:00"),
            (4, "11:00", "11:30"),
            (5, "12:15", "13:00"),
        ] {
            blocks.push(numbered("Abigail", &tag, day, number, start, end, number == 4));
        }
        for (number, start, end) in [
            (1, "08:30", "09:15"),
            (2, "09:30", "10:15"),
            (3, "10:30", "11:00"),
            (4, "12:30", "13:15"),
        ] {
            blocks.push(numbered("Khalil", &tag, day, number, start, end, number == 3));
        }
        blocks.push(fixed(
            &format!("khalil-{tag}-movement"),
            "Khalil",
            day,
            "10:15",
            "10:30",
            BlockType::Movement,
        ));
    }

    blocks.push(fixed(
        "abigail-fri-coop",
        "Abigail",
        BlockDay::On(Weekday::Fri),
        "13:30",
        "15:30",
        BlockType::CoOp,
    ));
    blocks
}

fn numbered(
    student: &str,
    tag: &str,
    weekday: BlockDay,
    number: u8,
    start: &str,
    end: &str,
    study_hall: bool,
) -> ScheduleBlock {
    ScheduleBlock {
        id: format!("{}-{tag}-{number}", student.to_ascii_lowercase()),
        student_name: student.to_string(),
        weekday,
        block_number: Some(number),
        start_time: start.to_string(),
        end_time: end.to_string(),
        subject: if study_hall { "Study Hall".to_string() } else { String::new() },
        block_name: None,
        block_type: BlockType::Assignment,
    }
}

fn fixed(
    id: &str,
    student: &str,
    weekday: BlockDay,
    start: &str,
    end: &str,
    block_type: BlockType,
) -> ScheduleBlock {
    ScheduleBlock {
        id: id.to_string(),
        student_name: student.to_string(),
        weekday,
        block_number: None,
        start_time: start.to_string(),
        end_time: end.to_string(),
        subject: block_type.label().to_string(),
        block_name: None,
        block_type,
    }
}
