mod cli;
mod error;

use std::collections::BTreeSet;

use career_core::db::open_db;
use career_core::{
    concise_report, export_file_name, format_date_range, format_duration, format_span,
    init_logging, search_all, tag_counts, timeline, AssignmentPatch, CareerService, Committed,
    CoreConfig, DeleteSummary, EmploymentPatch, NewAssignment, NewEmployment, NewTag,
    SqliteKvRepository, TagPatch, YearMonth,
};
use clap::Parser;
use log::info;
use time::OffsetDateTime;

use crate::cli::{AssignmentSubcommands, Cli, Commands, EmploymentSubcommands, TagSubcommands};
use crate::error::CliError;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    let config = CoreConfig::from_env();
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir)?;
    }

    let db_path = cli.db.clone().unwrap_or(config.db_path);
    let conn = open_db(&db_path)?;
    let repo = SqliteKvRepository::try_new(&conn)?;
    let mut service = CareerService::load(repo);
    let today = cli.today.unwrap_or_else(YearMonth::current);
    info!(
        "event=cli_command module=cli status=start command={}",
        command_name(&cli.command)
    );

    match cli.command {
        Commands::Employment(args) => match args.command {
            EmploymentSubcommands::Add(args) => {
                let employment = saved(service.add_employment(NewEmployment {
                    title: args.title,
                    company: args.company,
                    start_date: args.start,
                    end_date: args.end,
                })?)?;
                if cli.json {
                    print_json(&employment)?;
                } else {
                    println!("created employment {}", employment.id);
                }
            }
            EmploymentSubcommands::Edit(args) => {
                let patch = EmploymentPatch {
                    title: args.title,
                    company: args.company,
                    start_date: args.start,
                    end_date: args.end.patch(),
                };
                let employment = service
                    .edit_employment(args.id, patch)?
                    .ok_or(CliError::NotFound("employment", args.id))?;
                let employment = saved(employment)?;
                if cli.json {
                    print_json(&employment)?;
                } else {
                    println!("updated employment {}", employment.id);
                }
            }
            EmploymentSubcommands::Rm(args) => {
                let summary = saved(service.remove_employment(args.id))?;
                print_deleted(&summary, "employment", args.id, cli.json)?;
            }
            EmploymentSubcommands::Ls => {
                let employments = service.store().employments();
                if cli.json {
                    print_json(&employments)?;
                } else {
                    for employment in employments {
                        println!(
                            "{}\t{} @ {}\t{}\t{}",
                            employment.id,
                            employment.title,
                            employment.company,
                            format_date_range(employment.start_date, employment.end_date),
                            format_span(employment.start_date, employment.end_date, today)
                        );
                    }
                }
            }
        },
        Commands::Assignment(args) => match args.command {
            AssignmentSubcommands::Add(args) => {
                let assignment = saved(service.add_assignment(NewAssignment {
                    employment_id: args.employment,
                    title: args.title,
                    description: args.description,
                    start_date: args.start,
                    end_date: args.end,
                })?)?;
                if cli.json {
                    print_json(&assignment)?;
                } else {
                    println!("created assignment {}", assignment.id);
                }
            }
            AssignmentSubcommands::Edit(args) => {
                let patch = AssignmentPatch {
                    employment_id: args.employment,
                    title: args.title,
                    description: args.description,
                    start_date: args.start,
                    end_date: args.end.patch(),
                };
                let assignment = service
                    .edit_assignment(args.id, patch)?
                    .ok_or(CliError::NotFound("assignment", args.id))?;
                let assignment = saved(assignment)?;
                if cli.json {
                    print_json(&assignment)?;
                } else {
                    println!("updated assignment {}", assignment.id);
                }
            }
            AssignmentSubcommands::Rm(args) => {
                let summary = saved(service.remove_assignment(args.id))?;
                print_deleted(&summary, "assignment", args.id, cli.json)?;
            }
            AssignmentSubcommands::Ls(args) => {
                let assignments = service.store().assignments(args.employment);
                if cli.json {
                    print_json(&assignments)?;
                } else {
                    for assignment in assignments {
                        println!(
                            "{}\t{}\temployment={}\t{}\t{}",
                            assignment.id,
                            assignment.title,
                            assignment.employment_id,
                            format_date_range(assignment.start_date, assignment.end_date),
                            format_span(assignment.start_date, assignment.end_date, today)
                        );
                    }
                }
            }
        },
        Commands::Tag(args) => match args.command {
            TagSubcommands::Add(args) => {
                let tag = saved(service.add_tag(NewTag {
                    assignment_id: args.assignment,
                    name: args.name,
                    category: args.category,
                    description: args.description,
                })?)?;
                if cli.json {
                    print_json(&tag)?;
                } else {
                    println!("created tag {}", tag.id);
                }
            }
            TagSubcommands::Edit(args) => {
                let patch = TagPatch {
                    assignment_id: args.assignment,
                    name: args.name,
                    category: args.category,
                    description: args.description,
                };
                let tag = service
                    .edit_tag(args.id, patch)?
                    .ok_or(CliError::NotFound("tag", args.id))?;
                let tag = saved(tag)?;
                if cli.json {
                    print_json(&tag)?;
                } else {
                    println!("updated tag {}", tag.id);
                }
            }
            TagSubcommands::Rm(args) => {
                let summary = saved(service.remove_tag(args.id))?;
                print_deleted(&summary, "tag", args.id, cli.json)?;
            }
            TagSubcommands::Ls(args) => {
                let tags = service
                    .store()
                    .tags(args.assignment, args.category.as_ref());
                if cli.json {
                    print_json(&tags)?;
                } else {
                    for tag in tags {
                        println!(
                            "{}\t{}\t[{}]\tassignment={}",
                            tag.id, tag.name, tag.category, tag.assignment_id
                        );
                    }
                }
            }
        },
        Commands::Timeline => {
            let entries = timeline(service.store().data(), today);
            if cli.json {
                print_json(&entries)?;
            } else {
                for entry in entries {
                    let employment = &entry.employment;
                    println!(
                        "{} @ {} ({}, {}) tags={}",
                        employment.title,
                        employment.company,
                        format_date_range(employment.start_date, employment.end_date),
                        entry.duration_label,
                        entry.tag_total()
                    );
                    for item in &entry.assignments {
                        let names = item
                            .tags
                            .iter()
                            .map(|tag| tag.name.as_str())
                            .collect::<Vec<_>>();
                        println!(
                            "  - {} ({}, {}) {}",
                            item.assignment.title,
                            format_date_range(item.assignment.start_date, item.assignment.end_date),
                            item.duration_label,
                            names.join(", ")
                        );
                    }
                }
            }
        }
        Commands::Tags(args) => {
            let counts = tag_counts(service.store().data(), args.category.as_ref(), today);
            if cli.json {
                print_json(&counts)?;
            } else {
                for count in counts {
                    println!(
                        "{}\t[{}]\tcount={}\t{}",
                        count.name, count.category, count.count, count.duration_label
                    );
                }
            }
        }
        Commands::Report(args) => {
            let selection = args.tags.into_iter().collect::<BTreeSet<_>>();
            let report = concise_report(service.store().data(), &selection, today);
            if cli.json {
                print_json(&report)?;
            } else {
                for item in &report.matches {
                    let names = item
                        .matched_tags
                        .iter()
                        .map(|tag| tag.name.as_str())
                        .collect::<Vec<_>>();
                    println!(
                        "{} @ {}: {} ({}) [{}]",
                        item.employment.title,
                        item.employment.company,
                        item.assignment.title,
                        format_date_range(item.assignment.start_date, item.assignment.end_date),
                        names.join(", ")
                    );
                }
                println!("total: {}", format_duration(report.total_months));
            }
        }
        Commands::Search(args) => {
            let results = search_all(service.store().data(), &args.query);
            if cli.json {
                print_json(&results)?;
            } else {
                for employment in &results.employments {
                    println!(
                        "employment {}\t{} @ {}",
                        employment.id, employment.title, employment.company
                    );
                }
                for assignment in &results.assignments {
                    println!("assignment {}\t{}", assignment.id, assignment.title);
                }
                for tag in &results.tags {
                    println!("tag {}\t{} [{}]", tag.id, tag.name, tag.category);
                }
                println!("{} result(s)", results.total());
            }
        }
        Commands::Export(args) => {
            let document = service.store().export_json()?;
            match args.out {
                Some(path) => {
                    let path = if path.is_dir() {
                        path.join(default_export_name())
                    } else {
                        path
                    };
                    std::fs::write(&path, document)?;
                    println!("exported to {}", path.display());
                }
                None => println!("{document}"),
            }
        }
        Commands::Import(args) => {
            let text = std::fs::read_to_string(&args.file)?;
            let outcome = service.store_mut().import_json(&text);
            if !outcome.success {
                return Err(CliError::InvalidArgument(outcome.message));
            }
            println!("{}", outcome.message);
        }
        Commands::Clear(args) => {
            if !args.yes {
                return Err(CliError::InvalidArgument(
                    "refusing to delete every record without --yes".to_string(),
                ));
            }
            saved(service.store_mut().clear_all())?;
            println!("cleared");
        }
    }

    Ok(())
}

/// Unwraps a committed value, failing when the write-through did not land.
fn saved<T>(committed: Committed<T>) -> Result<T, CliError> {
    committed.persisted?;
    Ok(committed.value)
}

fn print_deleted(
    summary: &DeleteSummary,
    kind: &'static str,
    id: u64,
    json: bool,
) -> Result<(), CliError> {
    if summary.is_empty() {
        return Err(CliError::NotFound(kind, id));
    }
    if json {
        return print_json(&serde_json::json!({
            "employments": summary.employments,
            "assignments": summary.assignments,
            "tags": summary.tags,
        }));
    }
    println!(
        "deleted {} employment(s), {} assignment(s), {} tag(s)",
        summary.employments, summary.assignments, summary.tags
    );
    Ok(())
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Employment(_) => "employment",
        Commands::Assignment(_) => "assignment",
        Commands::Tag(_) => "tag",
        Commands::Timeline => "timeline",
        Commands::Tags(_) => "tags",
        Commands::Report(_) => "report",
        Commands::Search(_) => "search",
        Commands::Export(_) => "export",
        Commands::Import(_) => "import",
        Commands::Clear(_) => "clear",
    }
}

/// Export file name for today, used when `--out` names a directory.
fn default_export_name() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    export_file_name(now.date())
}
