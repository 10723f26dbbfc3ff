use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use admin_core::model::{BatchTarget, GroupId, ScheduleOwner};
use admin_core::query::{FilterValue, PageSize, SortOrder};
use admin_core::settings::{ClientSettings, ClientSettingsDraft};
use api::{ApiClient, HttpTransport, SessionContext};
use services::catalog::RESOURCE_NAMES;
use services::{
    Cabinets, CategoryLevels, Clock, Groups, Instructors, ListMode, Notification, NotificationLevel,
    Notifier, Resource, ResourceBrowser, ResourceConfig, ScheduleViewer, Students, Vehicles,
};

const ENV_USERNAME: &str = "DRIVE_ADMIN_USERNAME";
const ENV_PASSWORD: &str = "DRIVE_ADMIN_PASSWORD";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument(&'static str),
    UnknownArg(String),
    UnknownResource(String),
    UnknownOwner(String),
    UnknownFilter { name: String, known: String },
    InvalidNumber { flag: &'static str, raw: String },
    InvalidPair { flag: &'static str, raw: String },
    InvalidDate { flag: &'static str, raw: String },
    MissingCredentials,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument(name) => write!(f, "missing argument: <{name}>"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownResource(name) => write!(
                f,
                "unknown resource: {name} (expected one of {})",
                RESOURCE_NAMES.join(", ")
            ),
            ArgsError::UnknownOwner(name) => {
                write!(f, "unknown schedule owner: {name} (expected student, instructor or group)")
            }
            ArgsError::UnknownFilter { name, known } => {
                write!(f, "unknown filter: {name} (available: {known})")
            }
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidPair { flag, raw } => {
                write!(f, "{flag} expects key=value, got: {raw}")
            }
            ArgsError::InvalidDate { flag, raw } => {
                write!(f, "{flag} expects YYYY-MM-DD, got: {raw}")
            }
            ArgsError::MissingCredentials => write!(
                f,
                "credentials required: pass --username/--password or set {ENV_USERNAME}/{ENV_PASSWORD}"
            ),
        }
    }
}

impl std::error::Error for ArgsError {}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- list <resource> [--page <n>] [--page-size <10|25|50|100>]");
    eprintln!("         [--search <text>] [--sort-by <key>] [--order <asc|desc>] [--filter <k=v>]...");
    eprintln!("  cargo run -p app -- create <resource> --field <path=value>...");
    eprintln!("  cargo run -p app -- schedule-group <group_id> [--start <date>] [--end <date>]");
    eprintln!("         [--per-day <n>] [--weekends]");
    eprintln!("  cargo run -p app -- schedule <student|instructor|group> <id> [--date <date>]");
    eprintln!();
    eprintln!("Common options:");
    eprintln!("  --base-url <url>  --username <name>  --password <secret>");
    eprintln!();
    eprintln!("Resources: {}", RESOURCE_NAMES.join(", "));
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  DRIVE_ADMIN_BASE_URL, DRIVE_ADMIN_TIMEOUT_SECS, DRIVE_ADMIN_DEBOUNCE_MS,");
    eprintln!("  DRIVE_ADMIN_PAGE_SIZE, {ENV_USERNAME}, {ENV_PASSWORD}, RUST_LOG");
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_number<T: FromStr>(raw: String, flag: &'static str) -> Result<T, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

fn parse_pair(raw: String, flag: &'static str) -> Result<(String, String), ArgsError> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(ArgsError::InvalidPair { flag, raw }),
    }
}

fn parse_filter_value(raw: &str) -> FilterValue {
    match raw.trim() {
        "true" => FilterValue::Flag(true),
        "false" => FilterValue::Flag(false),
        other => other
            .parse()
            .map_or_else(|_| FilterValue::Text(other.to_string()), FilterValue::Id),
    }
}

/// Options shared by every command.
#[derive(Debug, Default)]
struct Connection {
    base_url: Option<String>,
    username: Option<String>,
    password: Option<String>,
}

impl Connection {
    /// Consumes a connection flag; returns false for anything else.
    fn accept(
        &mut self,
        arg: &str,
        args: &mut impl Iterator<Item = String>,
    ) -> Result<bool, ArgsError> {
        match arg {
            "--base-url" => self.base_url = Some(require_value(args, "--base-url")?),
            "--username" => self.username = Some(require_value(args, "--username")?),
            "--password" => self.password = Some(require_value(args, "--password")?),
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn settings(&self) -> Result<ClientSettings, Box<dyn std::error::Error>> {
        let mut draft = ClientSettingsDraft::from_env();
        if let Some(base_url) = &self.base_url {
            draft = draft.with_base_url(base_url.clone());
        }
        Ok(draft.validate()?)
    }

    fn credentials(&self) -> Result<(String, String), ArgsError> {
        let username = self
            .username
            .clone()
            .or_else(|| std::env::var(ENV_USERNAME).ok());
        let password = self
            .password
            .clone()
            .or_else(|| std::env::var(ENV_PASSWORD).ok());
        match (username, password) {
            (Some(username), Some(password)) if !username.trim().is_empty() => {
                Ok((username, password))
            }
            _ => Err(ArgsError::MissingCredentials),
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct ListArgs {
    resource: String,
    page: Option<u32>,
    page_size: Option<u32>,
    search: Option<String>,
    sort_by: Option<String>,
    order: Option<String>,
    filters: Vec<(String, String)>,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct CreateArgs {
    resource: String,
    fields: Vec<(String, String)>,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct ScheduleArgs {
    group_id: u64,
    start: Option<String>,
    end: Option<String>,
    per_day: Option<u32>,
    weekends: bool,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct ViewArgs {
    owner: ScheduleOwner,
    id: u64,
    date: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    List(ListArgs),
    Create(CreateArgs),
    ScheduleGroup(ScheduleArgs),
    Schedule(ViewArgs),
    Help,
}

fn parse_args(
    argv: impl IntoIterator<Item = String>,
) -> Result<(Command, Connection), ArgsError> {
    let mut args = argv.into_iter();
    let mut connection = Connection::default();
    let Some(name) = args.next() else {
        return Ok((Command::Help, connection));
    };

    let command = match name.as_str() {
        "--help" | "-h" | "help" => Command::Help,
        "list" => {
            let mut parsed = ListArgs {
                resource: resource_arg(&mut args)?,
                ..ListArgs::default()
            };
            while let Some(arg) = args.next() {
                if connection.accept(&arg, &mut args)? {
                    continue;
                }
                match arg.as_str() {
                    "--page" => {
                        parsed.page = Some(parse_number(require_value(&mut args, "--page")?, "--page")?);
                    }
                    "--page-size" => {
                        parsed.page_size = Some(parse_number(
                            require_value(&mut args, "--page-size")?,
                            "--page-size",
                        )?);
                    }
                    "--search" => parsed.search = Some(require_value(&mut args, "--search")?),
                    "--sort-by" => parsed.sort_by = Some(require_value(&mut args, "--sort-by")?),
                    "--order" => parsed.order = Some(require_value(&mut args, "--order")?),
                    "--filter" => parsed
                        .filters
                        .push(parse_pair(require_value(&mut args, "--filter")?, "--filter")?),
                    _ => return Err(ArgsError::UnknownArg(arg)),
                }
            }
            Command::List(parsed)
        }
        "create" => {
            let mut parsed = CreateArgs {
                resource: resource_arg(&mut args)?,
                ..CreateArgs::default()
            };
            while let Some(arg) = args.next() {
                if connection.accept(&arg, &mut args)? {
                    continue;
                }
                match arg.as_str() {
                    "--field" => parsed
                        .fields
                        .push(parse_pair(require_value(&mut args, "--field")?, "--field")?),
                    _ => return Err(ArgsError::UnknownArg(arg)),
                }
            }
            Command::Create(parsed)
        }
        "schedule-group" => {
            let raw = args.next().ok_or(ArgsError::MissingArgument("group_id"))?;
            let mut parsed = ScheduleArgs {
                group_id: parse_number(raw, "<group_id>")?,
                ..ScheduleArgs::default()
            };
            while let Some(arg) = args.next() {
                if connection.accept(&arg, &mut args)? {
                    continue;
                }
                match arg.as_str() {
                    "--start" => parsed.start = Some(require_value(&mut args, "--start")?),
                    "--end" => parsed.end = Some(require_value(&mut args, "--end")?),
                    "--per-day" => {
                        parsed.per_day = Some(parse_number(
                            require_value(&mut args, "--per-day")?,
                            "--per-day",
                        )?);
                    }
                    "--weekends" => parsed.weekends = true,
                    _ => return Err(ArgsError::UnknownArg(arg)),
                }
            }
            Command::ScheduleGroup(parsed)
        }
        "schedule" => {
            let raw_owner = args.next().ok_or(ArgsError::MissingArgument("owner"))?;
            let owner = raw_owner
                .parse::<ScheduleOwner>()
                .map_err(|_| ArgsError::UnknownOwner(raw_owner))?;
            let raw_id = args.next().ok_or(ArgsError::MissingArgument("id"))?;
            let mut parsed = ViewArgs {
                owner,
                id: parse_number(raw_id, "<id>")?,
                date: None,
            };
            while let Some(arg) = args.next() {
                if connection.accept(&arg, &mut args)? {
                    continue;
                }
                match arg.as_str() {
                    "--date" => parsed.date = Some(require_value(&mut args, "--date")?),
                    _ => return Err(ArgsError::UnknownArg(arg)),
                }
            }
            Command::Schedule(parsed)
        }
        other => return Err(ArgsError::UnknownArg(other.to_string())),
    };
    Ok((command, connection))
}

fn resource_arg(args: &mut impl Iterator<Item = String>) -> Result<String, ArgsError> {
    let name = args.next().ok_or(ArgsError::MissingArgument("resource"))?;
    if RESOURCE_NAMES.contains(&name.as_str()) {
        Ok(name)
    } else {
        Err(ArgsError::UnknownResource(name))
    }
}

/// Prints notifications the way the web client shows toasts.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => eprintln!("ok: {}", notification.message),
            NotificationLevel::Error => eprintln!("error: {}", notification.message),
        }
    }
}

struct Context {
    api: ApiClient,
    notifier: Arc<dyn Notifier>,
    settings: ClientSettings,
    clock: Clock,
}

impl Context {
    fn browser<R: Resource>(&self) -> Result<ResourceBrowser<R>, Box<dyn std::error::Error>> {
        Ok(ResourceBrowser::new(
            self.api.clone(),
            Arc::clone(&self.notifier),
            &self.settings,
            self.clock,
        )?)
    }
}

async fn list<R: Resource>(
    ctx: &Context,
    args: &ListArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let browser = ctx.browser::<R>()?;
    let config = R::config();

    let mut query = browser.query();
    if let Some(size) = args.page_size {
        query = query.with_page_size(PageSize::try_from(size)?);
    }
    if let Some(key) = &args.sort_by {
        if !config.accepts_sort_key(key) {
            return Err(ArgsError::UnknownArg(format!("--sort-by {key}")).into());
        }
        query = query.with_sort(key.clone());
    }
    if let Some(order) = &args.order {
        query = query.with_sort_order(SortOrder::from_str(order)?);
    }
    if let Some(search) = &args.search {
        query = query.with_search(search.clone());
    }
    for (name, raw) in &args.filters {
        if config.filter(name).is_none() {
            return Err(ArgsError::UnknownFilter {
                name: name.clone(),
                known: known_filters(config),
            }
            .into());
        }
        query = query.with_filter(name.clone(), parse_filter_value(raw));
    }
    if let Some(page) = args.page {
        query = query.with_page(page)?;
    }

    debug!(resource = config.name, params = ?query.to_params(), "listing");
    browser.fetcher().fetch_page(query).await?;
    eprintln!("{}", list_heading(config, &args.filters));
    print_page(&browser)
}

/// Resource title followed by the active filters under their labels.
fn list_heading(config: &ResourceConfig, filters: &[(String, String)]) -> String {
    let active: Vec<String> = filters
        .iter()
        .filter_map(|(name, raw)| {
            config
                .filter(name)
                .map(|spec| format!("{}: {}", spec.label, raw.trim()))
        })
        .collect();
    if active.is_empty() {
        config.title.to_string()
    } else {
        format!("{} [{}]", config.title, active.join(", "))
    }
}

fn known_filters(config: &ResourceConfig) -> String {
    if config.filters.is_empty() {
        return "none".to_string();
    }
    config
        .filters
        .iter()
        .map(|spec| format!("{} ({})", spec.name, spec.label))
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_page<R: Resource>(browser: &ResourceBrowser<R>) -> Result<(), Box<dyn std::error::Error>> {
    let view = browser.view();
    for row in &view.rows {
        println!("{}", serde_json::to_string(row)?);
    }
    if R::config().list == ListMode::Paginated {
        let pagination = view.pagination;
        eprintln!(
            "page {} ({} per page){}{}",
            pagination.page,
            pagination.page_size,
            if pagination.can_prev { ", previous available" } else { "" },
            if pagination.can_next { ", next available" } else { "" },
        );
    }
    Ok(())
}

async fn create<R: Resource>(
    ctx: &Context,
    args: &CreateArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let browser = ctx.browser::<R>()?;
    let form = browser.form();
    form.open_add().await?;
    for (path, raw) in &args.fields {
        form.set_raw(path, raw).await?;
    }
    let created = form.submit().await?;
    println!("{}", serde_json::to_string_pretty(&created)?);
    Ok(())
}

async fn schedule_group(
    ctx: &Context,
    args: &ScheduleArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let browser = ctx.browser::<Groups>()?;
    let batch = browser.batch();
    batch
        .open(BatchTarget::Group(GroupId::new(args.group_id)))
        .await?;

    let start = args
        .start
        .as_deref()
        .map(|raw| parse_date(raw, "--start"))
        .transpose()?;
    let end = args
        .end
        .as_deref()
        .map(|raw| parse_date(raw, "--end"))
        .transpose()?;
    batch.edit(|draft| {
        if let Some(start) = start {
            draft.start_date = start;
        }
        if let Some(end) = end {
            draft.end_date = end;
        }
        if let Some(per_day) = args.per_day {
            draft.schedules_per_day = per_day;
        }
        draft.include_weekends = args.weekends;
    })?;

    let detail = batch.submit().await?;
    println!("{detail}");
    Ok(())
}

async fn view_schedule(ctx: &Context, args: &ViewArgs) -> Result<(), Box<dyn std::error::Error>> {
    let viewer = ScheduleViewer::new(ctx.api.clone(), Arc::clone(&ctx.notifier), ctx.clock);
    viewer.set_owner(args.owner).await;
    if let Some(raw) = &args.date {
        viewer.set_date(parse_date(raw, "--date")?).await?;
    }
    viewer.select(Some(args.id)).await?;

    eprintln!("{}", viewer.heading());
    for entry in viewer.entries() {
        println!(
            "{}\t{}\t{}\t{}",
            entry.start_time.format("%H:%M"),
            entry.end_time.format("%H:%M"),
            entry.kind,
            entry.extra
        );
    }
    Ok(())
}

fn parse_date(raw: &str, flag: &'static str) -> Result<NaiveDate, ArgsError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        ArgsError::InvalidDate {
            flag,
            raw: raw.to_string(),
        }
    })
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (command, connection) = parse_args(std::env::args().skip(1)).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    if command == Command::Help {
        print_usage();
        return Ok(());
    }

    let settings = connection.settings()?;
    let (username, password) = connection.credentials()?;
    let transport = HttpTransport::new(&settings)?;
    let api = ApiClient::new(Arc::new(transport), SessionContext::new());
    let session = api.login(&username, &password).await?;
    info!(base_url = %settings.base_url(), role = ?session.role(), "signed in");

    let ctx = Context {
        api,
        notifier: Arc::new(ConsoleNotifier),
        settings,
        clock: Clock::system(),
    };

    match &command {
        Command::List(args) => match args.resource.as_str() {
            "students" => list::<Students>(&ctx, args).await,
            "instructors" => list::<Instructors>(&ctx, args).await,
            "groups" => list::<Groups>(&ctx, args).await,
            "vehicles" => list::<Vehicles>(&ctx, args).await,
            "cabinets" => list::<Cabinets>(&ctx, args).await,
            "category_levels" => list::<CategoryLevels>(&ctx, args).await,
            other => Err(ArgsError::UnknownResource(other.to_string()).into()),
        },
        Command::Create(args) => match args.resource.as_str() {
            "students" => create::<Students>(&ctx, args).await,
            "instructors" => create::<Instructors>(&ctx, args).await,
            "groups" => create::<Groups>(&ctx, args).await,
            "vehicles" => create::<Vehicles>(&ctx, args).await,
            "cabinets" => create::<Cabinets>(&ctx, args).await,
            "category_levels" => create::<CategoryLevels>(&ctx, args).await,
            other => Err(ArgsError::UnknownResource(other.to_string()).into()),
        },
        Command::ScheduleGroup(args) => schedule_group(&ctx, args).await,
        Command::Schedule(args) => view_schedule(&ctx, args).await,
        Command::Help => Ok(()),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn list_collects_query_flags() {
        let (command, connection) = parse_args(argv(&[
            "list",
            "students",
            "--page-size",
            "25",
            "--filter",
            "category_level_id=2",
            "--order",
            "desc",
            "--base-url",
            "http://school.test",
        ]))
        .unwrap();

        let Command::List(args) = command else {
            panic!("expected list");
        };
        assert_eq!(args.resource, "students");
        assert_eq!(args.page_size, Some(25));
        assert_eq!(args.order.as_deref(), Some("desc"));
        assert_eq!(
            args.filters,
            vec![("category_level_id".to_string(), "2".to_string())]
        );
        assert_eq!(connection.base_url.as_deref(), Some("http://school.test"));
    }

    #[test]
    fn unknown_resource_is_rejected() {
        assert!(matches!(
            parse_args(argv(&["list", "lessons"])),
            Err(ArgsError::UnknownResource(_))
        ));
    }

    #[test]
    fn field_pairs_need_a_key() {
        assert!(matches!(
            parse_args(argv(&["create", "cabinets", "--field", "=101"])),
            Err(ArgsError::InvalidPair { .. })
        ));
    }

    #[test]
    fn schedule_group_reads_flags() {
        let (command, _) = parse_args(argv(&[
            "schedule-group",
            "7",
            "--per-day",
            "2",
            "--weekends",
        ]))
        .unwrap();
        assert_eq!(
            command,
            Command::ScheduleGroup(ScheduleArgs {
                group_id: 7,
                per_day: Some(2),
                weekends: true,
                ..ScheduleArgs::default()
            })
        );
    }

    #[test]
    fn schedule_reads_owner_id_and_date() {
        let (command, _) =
            parse_args(argv(&["schedule", "instructor", "8", "--date", "2023-11-15"])).unwrap();
        assert_eq!(
            command,
            Command::Schedule(ViewArgs {
                owner: ScheduleOwner::Instructor,
                id: 8,
                date: Some("2023-11-15".to_string()),
            })
        );
        assert!(matches!(
            parse_args(argv(&["schedule", "cabinet", "1"])),
            Err(ArgsError::UnknownOwner(_))
        ));
    }

    #[test]
    fn list_heading_names_active_filters_by_label() {
        let config = Students::config();
        assert_eq!(list_heading(config, &[]), "Students");
        assert_eq!(
            list_heading(
                config,
                &[("category_level_id".to_string(), "2".to_string())]
            ),
            "Students [Category level: 2]"
        );
        assert_eq!(known_filters(Cabinets::config()), "none");
    }

    #[test]
    fn filter_values_are_typed() {
        assert_eq!(parse_filter_value("3"), FilterValue::Id(3));
        assert_eq!(parse_filter_value("true"), FilterValue::Flag(true));
        assert_eq!(parse_filter_value("B"), FilterValue::Text("B".into()));
    }

    #[test]
    fn no_arguments_prints_help() {
        let (command, _) = parse_args(Vec::new()).unwrap();
        assert_eq!(command, Command::Help);
    }
}
