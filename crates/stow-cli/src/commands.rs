use std::io::{self, Write};

use anyhow::{anyhow, bail, Context};
use colored::Colorize;
use serde_json::{json, Value};
use stow_provider::{
    Cid, CidScheme, ListOptions, Priority, Provider, ProviderConfig, ProviderError, TaskFilter,
    TaskRecord,
};
use stow_tool::render_error;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let provider = Provider::from_config(&config);
    let stdout = io::stdout();
    execute(&provider, cli.command, cli.format, &mut stdout.lock())
}

/// Config file first, then command-line overrides.
fn load_config(cli: &Cli) -> anyhow::Result<ProviderConfig> {
    let mut config = match &cli.config {
        Some(path) => ProviderConfig::load(path).map_err(fail)?,
        None => ProviderConfig::default(),
    };
    if let Some(root) = &cli.root {
        config.root = root.clone();
    }
    if let Some(scheme) = cli.scheme {
        config.cid_scheme = match scheme {
            SchemeArg::Blake3 => CidScheme::Blake3,
            SchemeArg::Random => CidScheme::Random,
        };
    }
    Ok(config)
}

fn execute(
    provider: &Provider,
    command: Command,
    format: OutputFormat,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    match command {
        Command::Content(args) => cmd_content(provider, args.action, format, out),
        Command::Task(args) => cmd_task(provider, args.action, format, out),
        Command::Stats => cmd_stats(provider, format, out),
        Command::Clear(args) => cmd_clear(provider, args, out),
    }
}

fn fail(err: ProviderError) -> anyhow::Error {
    anyhow!(render_error(&err))
}

fn parse_cid(raw: &str) -> anyhow::Result<Cid> {
    Cid::parse(raw).map_err(|e| anyhow!("Invalid request: {e}"))
}

fn print_json(out: &mut dyn Write, value: &impl serde::Serialize) -> anyhow::Result<()> {
    writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
    Ok(())
}

fn cmd_content(
    provider: &Provider,
    action: ContentAction,
    format: OutputFormat,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    match action {
        ContentAction::Add { text, file } => {
            let data = match (text, file) {
                (Some(text), _) => text.into_bytes(),
                (None, Some(path)) => std::fs::read(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                (None, None) => bail!("nothing to add: pass TEXT or --file"),
            };
            let cid = provider.add(&data).map_err(fail)?;
            match format {
                OutputFormat::Json => print_json(out, &json!({"cid": cid, "size": data.len()}))?,
                OutputFormat::Text => writeln!(out, "{cid}")?,
            }
        }
        ContentAction::Get { cid } => {
            let cid = parse_cid(&cid)?;
            let data = provider.get(&cid).map_err(fail)?;
            match format {
                OutputFormat::Json => print_json(
                    out,
                    &json!({
                        "cid": cid,
                        "size": data.len(),
                        "text": String::from_utf8(data).ok(),
                    }),
                )?,
                OutputFormat::Text => out.write_all(&data)?,
            }
        }
        ContentAction::List { prefix, limit } => {
            let mut options = ListOptions::new();
            if let Some(prefix) = prefix {
                options = options.prefix(prefix);
            }
            if let Some(limit) = limit {
                options = options.limit(limit);
            }
            let cids = provider.list(&options).map_err(fail)?;
            match format {
                OutputFormat::Json => print_json(out, &cids)?,
                OutputFormat::Text if cids.is_empty() => writeln!(out, "No content stored.")?,
                OutputFormat::Text => {
                    for cid in &cids {
                        writeln!(out, "{cid}")?;
                    }
                }
            }
        }
        ContentAction::Delete { cid } => {
            let cid = parse_cid(&cid)?;
            let deleted = provider.delete(&cid).map_err(fail)?;
            match format {
                OutputFormat::Json => print_json(out, &json!({"cid": cid, "deleted": deleted}))?,
                OutputFormat::Text if deleted => {
                    writeln!(out, "{} Deleted {}", "✓".green().bold(), cid.as_str().yellow())?
                }
                OutputFormat::Text => writeln!(out, "{} was not stored", cid.as_str().yellow())?,
            }
        }
        ContentAction::Exists { cid } => {
            let cid = parse_cid(&cid)?;
            let exists = provider.exists(&cid);
            match format {
                OutputFormat::Json => print_json(out, &json!({"cid": cid, "exists": exists}))?,
                OutputFormat::Text => writeln!(out, "{exists}")?,
            }
        }
    }
    Ok(())
}

fn cmd_task(
    provider: &Provider,
    action: TaskAction,
    format: OutputFormat,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    match action {
        TaskAction::Create { id, mut fields } => {
            fields.status.get_or_insert_with(|| "pending".into());
            let record = build_record(&id, fields)?;
            provider.store_task(&record).map_err(fail)?;
            match format {
                OutputFormat::Json => print_json(out, &record)?,
                OutputFormat::Text => {
                    writeln!(out, "{} Created task {}", "✓".green().bold(), id.yellow())?
                }
            }
        }
        TaskAction::Get { id } => {
            let task = provider
                .get_task(&id)
                .map_err(fail)?
                .ok_or_else(|| anyhow!("task not found: {id}"))?;
            match format {
                OutputFormat::Json => print_json(out, &task)?,
                OutputFormat::Text => write_task(out, &task)?,
            }
        }
        TaskAction::Update { id, fields } => {
            let patch = build_record(&id, fields)?;
            if patch == TaskRecord::new(&id) {
                bail!("nothing to update: pass --status, --type, --priority or --set");
            }
            provider.update_task(&patch).map_err(fail)?;
            let task = provider
                .get_task(&id)
                .map_err(fail)?
                .ok_or_else(|| anyhow!("task not found: {id}"))?;
            match format {
                OutputFormat::Json => print_json(out, &task)?,
                OutputFormat::Text => {
                    writeln!(out, "{} Updated task {}", "✓".green().bold(), id.yellow())?
                }
            }
        }
        TaskAction::List {
            status,
            kind,
            priority,
        } => {
            let mut filter = TaskFilter::new();
            if let Some(status) = status {
                filter = filter.status(status);
            }
            if let Some(kind) = kind {
                filter = filter.kind(kind);
            }
            if let Some(priority) = priority {
                filter = filter.priority(Priority::parse(&priority));
            }
            let tasks = provider.list_tasks(&filter).map_err(fail)?;
            match format {
                OutputFormat::Json => print_json(out, &tasks)?,
                OutputFormat::Text if tasks.is_empty() => writeln!(out, "No tasks found.")?,
                OutputFormat::Text => {
                    for task in &tasks {
                        writeln!(out, "{}", task_line(task))?;
                    }
                }
            }
        }
    }
    Ok(())
}

fn cmd_stats(provider: &Provider, format: OutputFormat, out: &mut dyn Write) -> anyhow::Result<()> {
    let stats = provider.stats().map_err(fail)?;
    match format {
        OutputFormat::Json => print_json(out, &stats)?,
        OutputFormat::Text => {
            writeln!(out, "Items: {}", stats.items.to_string().bold())?;
            writeln!(out, "Size:  {} bytes", stats.size.to_string().bold())?;
        }
    }
    Ok(())
}

fn cmd_clear(provider: &Provider, args: ClearArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    if !args.yes {
        bail!("refusing to delete all content and tasks without --yes");
    }
    provider.clear().map_err(fail)?;
    writeln!(out, "{} Store cleared.", "✓".green().bold())?;
    Ok(())
}

/// Record holding `id` plus whichever fields were given on the command line.
fn build_record(id: &str, fields: TaskFields) -> anyhow::Result<TaskRecord> {
    let mut record = TaskRecord::new(id);
    if let Some(status) = fields.status {
        record = record.with_status(status);
    }
    if let Some(kind) = fields.kind {
        record = record.with_kind(kind);
    }
    if let Some(priority) = fields.priority {
        record = record.with_priority(Priority::parse(&priority));
    }
    for assignment in &fields.set {
        let (key, value) = parse_assignment(assignment)?;
        record
            .set_field(key, value)
            .map_err(|e| fail(e.into()))?;
    }
    Ok(record)
}

/// Split `KEY=VALUE`. The value is read as JSON when it parses, otherwise
/// kept as a plain string.
fn parse_assignment(raw: &str) -> anyhow::Result<(&str, Value)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected KEY=VALUE, got {raw:?}"))?;
    let key = key.trim();
    if key.is_empty() {
        bail!("empty key in {raw:?}");
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key, value))
}

fn task_line(task: &TaskRecord) -> String {
    let status = task.status.as_deref().unwrap_or("-");
    let mut line = format!("{}  [{}]", task.id.yellow().bold(), status.cyan());
    if let Some(kind) = &task.kind {
        line.push_str(&format!("  type={kind}"));
    }
    if let Some(priority) = &task.priority {
        line.push_str(&format!("  priority={priority}"));
    }
    line
}

fn write_task(out: &mut dyn Write, task: &TaskRecord) -> io::Result<()> {
    writeln!(out, "{}", task_line(task))?;
    for (key, value) in &task.extra {
        writeln!(out, "  {}: {value}", key.dimmed())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn run(provider: &Provider, args: &[&str]) -> anyhow::Result<String> {
        colored::control::set_override(false);
        let cli = Cli::try_parse_from(std::iter::once("stowage").chain(args.iter().copied()))?;
        let mut out = Vec::new();
        execute(provider, cli.command, cli.format, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn assignment_values_parse_as_json_or_string() {
        assert_eq!(parse_assignment("n=3").unwrap(), ("n", json!(3)));
        assert_eq!(parse_assignment("ok=true").unwrap(), ("ok", json!(true)));
        assert_eq!(
            parse_assignment("list=[1,\"a\"]").unwrap(),
            ("list", json!([1, "a"]))
        );
        assert_eq!(
            parse_assignment("note=hello world").unwrap(),
            ("note", json!("hello world"))
        );
        assert_eq!(parse_assignment("eq=a=b").unwrap(), ("eq", json!("a=b")));
        assert!(parse_assignment("novalue").is_err());
        assert!(parse_assignment("=x").is_err());
    }

    #[test]
    fn build_record_routes_flags() {
        let fields = TaskFields {
            status: Some("pending".into()),
            kind: Some("build".into()),
            priority: Some("2".into()),
            set: vec!["owner=ana".into(), "attempts=1".into()],
        };
        let record = build_record("t1", fields).unwrap();
        assert_eq!(record.priority, Some(Priority::from(2)));
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({
                "id": "t1",
                "status": "pending",
                "type": "build",
                "priority": 2,
                "owner": "ana",
                "attempts": 1,
            })
        );
    }

    #[test]
    fn set_cannot_reassign_id() {
        let fields = TaskFields {
            set: vec!["id=other".into()],
            ..TaskFields::default()
        };
        assert!(build_record("t1", fields).is_err());
    }

    #[test]
    fn content_add_get_exists() {
        let provider = Provider::in_memory();
        let cid = run(&provider, &["content", "add", "hello"]).unwrap();
        let cid = cid.trim();
        assert_eq!(run(&provider, &["content", "get", cid]).unwrap(), "hello");
        assert_eq!(run(&provider, &["content", "exists", cid]).unwrap(), "true\n");
        assert_eq!(
            run(&provider, &["content", "list"]).unwrap(),
            format!("{cid}\n")
        );

        run(&provider, &["content", "delete", cid]).unwrap();
        let err = run(&provider, &["content", "get", cid]).unwrap_err();
        assert!(err.to_string().starts_with("Not found:"));
    }

    #[test]
    fn content_add_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.bin");
        std::fs::write(&path, [0u8, 1, 2]).unwrap();
        let provider = Provider::open(dir.path().join("store"));
        let out = run(
            &provider,
            &["--format", "json", "content", "add", "--file", path.to_str().unwrap()],
        )
        .unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["size"], json!(3));
        let cid = Cid::parse(value["cid"].as_str().unwrap()).unwrap();
        assert_eq!(provider.get(&cid).unwrap(), vec![0u8, 1, 2]);
    }

    #[test]
    fn malformed_cid_is_invalid_request() {
        let provider = Provider::in_memory();
        let err = run(&provider, &["content", "get", "../escape"]).unwrap_err();
        assert!(err.to_string().starts_with("Invalid request:"));
    }

    #[test]
    fn task_lifecycle() {
        let provider = Provider::in_memory();
        run(&provider, &["task", "create", "t1", "--type", "build"]).unwrap();
        run(
            &provider,
            &["task", "update", "t1", "--status", "done", "--set", "result=ok"],
        )
        .unwrap();

        let out = run(&provider, &["--format", "json", "task", "get", "t1"]).unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(
            value,
            json!({"id": "t1", "status": "done", "type": "build", "result": "ok"})
        );

        let listed = run(&provider, &["task", "list", "--status", "done"]).unwrap();
        assert!(listed.contains("t1"));
        assert_eq!(
            run(&provider, &["task", "list", "--status", "pending"]).unwrap(),
            "No tasks found.\n"
        );
    }

    #[test]
    fn task_errors() {
        let provider = Provider::in_memory();
        let err = run(&provider, &["task", "get", "ghost"]).unwrap_err();
        assert_eq!(err.to_string(), "task not found: ghost");

        let err = run(&provider, &["task", "update", "ghost", "--status", "x"]).unwrap_err();
        assert!(err.to_string().starts_with("Not found:"));

        run(&provider, &["task", "create", "t1"]).unwrap();
        assert!(run(&provider, &["task", "update", "t1"]).is_err());
    }

    #[test]
    fn list_filters_by_priority() {
        let provider = Provider::in_memory();
        run(&provider, &["task", "create", "a", "--priority", "1"]).unwrap();
        run(&provider, &["task", "create", "b", "--priority", "high"]).unwrap();
        let out = run(
            &provider,
            &["--format", "json", "task", "list", "--priority", "high"],
        )
        .unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 1);
        assert_eq!(value[0]["id"], json!("b"));
    }

    #[test]
    fn stats_and_clear() {
        let provider = Provider::in_memory();
        run(&provider, &["content", "add", "abcd"]).unwrap();
        run(&provider, &["task", "create", "t1"]).unwrap();

        let out = run(&provider, &["--format", "json", "stats"]).unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value, json!({"size": 4, "items": 1}));

        assert!(run(&provider, &["clear"]).is_err());
        assert_eq!(provider.stats().unwrap().items, 1);
        run(&provider, &["clear", "--yes"]).unwrap();
        assert_eq!(provider.stats().unwrap().items, 0);
        assert_eq!(provider.get_task("t1").unwrap(), None);
    }

    #[test]
    fn config_file_then_flag_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("stowage.toml");
        std::fs::write(&config_path, "backend = \"memory\"\ncid_scheme = \"random\"\n").unwrap();

        let cli = Cli::try_parse_from([
            "stowage",
            "--config",
            config_path.to_str().unwrap(),
            "--root",
            "elsewhere",
            "stats",
        ])
        .unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.root, std::path::PathBuf::from("elsewhere"));
        assert_eq!(config.cid_scheme, CidScheme::Random);
        assert_eq!(config.backend, stow_provider::BackendKind::Memory);
    }
}
