use std::path::PathBuf;

use career_core::{TagCategory, TagKey, YearMonth};
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "career")]
#[command(bin_name = "career")]
#[command(version)]
#[command(about = "Track employments, assignments and experience tags")]
pub struct Cli {
    #[arg(
        short = 'd',
        long,
        env = "CAREER_DB_PATH",
        help = "Path to the SQLite database (defaults to the system temp dir)."
    )]
    pub db: Option<PathBuf>,

    #[arg(long, global = true, help = "Print machine-readable JSON.")]
    pub json: bool,

    #[arg(
        long,
        global = true,
        value_name = "YYYY-MM",
        help = "Month used for ongoing records (defaults to the current month)."
    )]
    pub today: Option<YearMonth>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Manage employments.")]
    Employment(EmploymentArgs),
    #[command(about = "Manage assignments within an employment.")]
    Assignment(AssignmentArgs),
    #[command(about = "Manage tags attached to assignments.")]
    Tag(TagArgs),
    #[command(about = "Show employments with their assignments and tags.")]
    Timeline,
    #[command(about = "Show tag usage counts and total durations.")]
    Tags(TagsArgs),
    #[command(about = "Show assignments matching selected tags with a total duration.")]
    Report(ReportArgs),
    #[command(about = "Search titles, companies, descriptions and tag names.")]
    Search(SearchArgs),
    #[command(about = "Write an export document.")]
    Export(ExportArgs),
    #[command(about = "Replace all data with an export document.")]
    Import(ImportArgs),
    #[command(about = "Delete every record.")]
    Clear(ClearArgs),
}

#[derive(Debug, Args)]
pub struct EmploymentArgs {
    #[command(subcommand)]
    pub command: EmploymentSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum EmploymentSubcommands {
    #[command(about = "Create an employment.")]
    Add(EmploymentAddArgs),
    #[command(about = "Update employment fields.")]
    Edit(EmploymentEditArgs),
    #[command(about = "Delete an employment with its assignments and tags.")]
    Rm(IdArgs),
    #[command(about = "List employments, newest first.")]
    Ls,
}

#[derive(Debug, Args)]
pub struct EmploymentAddArgs {
    #[arg(long, help = "Job title.")]
    pub title: String,
    #[arg(long, help = "Company name.")]
    pub company: String,
    #[arg(long, value_name = "YYYY-MM", help = "First month.")]
    pub start: YearMonth,
    #[arg(long, value_name = "YYYY-MM", help = "Last month; omit when ongoing.")]
    pub end: Option<YearMonth>,
}

#[derive(Debug, Args)]
pub struct EmploymentEditArgs {
    pub id: u64,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub company: Option<String>,
    #[arg(long, value_name = "YYYY-MM")]
    pub start: Option<YearMonth>,
    #[command(flatten)]
    pub end: EndDateArgs,
}

#[derive(Debug, Args)]
pub struct AssignmentArgs {
    #[command(subcommand)]
    pub command: AssignmentSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum AssignmentSubcommands {
    #[command(about = "Create an assignment.")]
    Add(AssignmentAddArgs),
    #[command(about = "Update assignment fields.")]
    Edit(AssignmentEditArgs),
    #[command(about = "Delete an assignment and its tags.")]
    Rm(IdArgs),
    #[command(about = "List assignments, newest first.")]
    Ls(AssignmentListArgs),
}

#[derive(Debug, Args)]
pub struct AssignmentAddArgs {
    #[arg(long, help = "Owning employment id.")]
    pub employment: u64,
    #[arg(long)]
    pub title: String,
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long, value_name = "YYYY-MM")]
    pub start: YearMonth,
    #[arg(long, value_name = "YYYY-MM")]
    pub end: Option<YearMonth>,
}

#[derive(Debug, Args)]
pub struct AssignmentEditArgs {
    pub id: u64,
    #[arg(long, help = "Move to another employment.")]
    pub employment: Option<u64>,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, value_name = "YYYY-MM")]
    pub start: Option<YearMonth>,
    #[command(flatten)]
    pub end: EndDateArgs,
}

#[derive(Debug, Args)]
pub struct AssignmentListArgs {
    #[arg(long, help = "Only assignments of this employment.")]
    pub employment: Option<u64>,
}

#[derive(Debug, Args)]
pub struct TagArgs {
    #[command(subcommand)]
    pub command: TagSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum TagSubcommands {
    #[command(about = "Attach a tag to an assignment.")]
    Add(TagAddArgs),
    #[command(about = "Update tag fields.")]
    Edit(TagEditArgs),
    #[command(about = "Delete a tag.")]
    Rm(IdArgs),
    #[command(about = "List tags by name.")]
    Ls(TagListArgs),
}

#[derive(Debug, Args)]
pub struct TagAddArgs {
    #[arg(long, help = "Owning assignment id.")]
    pub assignment: u64,
    #[arg(long)]
    pub name: String,
    #[arg(
        long,
        value_parser = parse_category,
        help = "skill, test target tech, test tech, or any custom text."
    )]
    pub category: TagCategory,
    #[arg(long, default_value = "")]
    pub description: String,
}

#[derive(Debug, Args)]
pub struct TagEditArgs {
    pub id: u64,
    #[arg(long, help = "Move to another assignment.")]
    pub assignment: Option<u64>,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long, value_parser = parse_category)]
    pub category: Option<TagCategory>,
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Debug, Args)]
pub struct TagListArgs {
    #[arg(long)]
    pub assignment: Option<u64>,
    #[arg(long, value_parser = parse_category)]
    pub category: Option<TagCategory>,
}

#[derive(Debug, Args)]
pub struct IdArgs {
    pub id: u64,
}

#[derive(Debug, Args)]
pub struct EndDateArgs {
    #[arg(long, value_name = "YYYY-MM", conflicts_with = "ongoing")]
    pub end: Option<YearMonth>,
    #[arg(long, help = "Clear the end date.")]
    pub ongoing: bool,
}

impl EndDateArgs {
    /// Patch value: `Some(None)` reopens, `None` leaves the end date alone.
    pub fn patch(&self) -> Option<Option<YearMonth>> {
        if self.ongoing {
            Some(None)
        } else {
            self.end.map(Some)
        }
    }
}

#[derive(Debug, Args)]
pub struct TagsArgs {
    #[arg(long, value_parser = parse_category, help = "Only this category.")]
    pub category: Option<TagCategory>,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    #[arg(
        long = "tag",
        value_name = "NAME:CATEGORY",
        value_parser = parse_tag_key,
        help = "Selected tag; repeat to select several."
    )]
    pub tags: Vec<TagKey>,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    pub query: String,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[arg(long, help = "Write to this file instead of stdout.")]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    pub file: PathBuf,
}

#[derive(Debug, Args)]
pub struct ClearArgs {
    #[arg(long, help = "Confirm deleting every record.")]
    pub yes: bool,
}

fn parse_category(raw: &str) -> Result<TagCategory, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("category must not be empty".to_string());
    }
    Ok(TagCategory::parse(trimmed))
}

fn parse_tag_key(raw: &str) -> Result<TagKey, String> {
    let Some((name, category)) = raw.rsplit_once(':') else {
        return Err(format!("expected NAME:CATEGORY, got `{raw}`"));
    };
    let name = name.trim();
    if name.is_empty() {
        return Err("tag name must not be empty".to_string());
    }
    Ok(TagKey::new(name, parse_category(category)?))
}
