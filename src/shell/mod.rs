//! Interactive query shell.
//!
//! One command runs to completion before the next line is read. Ctrl-C
//! aborts the running command and returns to the prompt. Ctrl-C at the
//! prompt and end of input leave the loop the same way `exit` does.

pub mod command;

use std::future::Future;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::error::{AppError, Result};
use crate::models::{Config, FilterKey};
use crate::services::{FetchProgress, QueryEngine, QueryResult, UNKNOWN_COURSE};
use crate::storage::RecordStorage;
use crate::utils::log;

#[cfg(feature = "map")]
use crate::client::MapClient;
#[cfg(feature = "map")]
use crate::services::{DrawTarget, draw_building};

pub use command::{Command, HELP, ShowArg};

/// Result of dispatching one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Continue,
    Exit,
    Error(String),
}

/// Reports fetch-all progress on the console.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleProgress {
    enabled: bool,
}

impl ConsoleProgress {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl FetchProgress for ConsoleProgress {
    fn page_fetched(&mut self, offset: usize, records: usize, total: usize) {
        if self.enabled {
            log::progress(&format!(
                "offset {offset}: {records} records ({total} so far)"
            ));
        }
    }

    fn finished(&mut self, total: usize) {
        if self.enabled {
            log::success(&format!("Fetched {total} records"));
        }
    }
}

/// The interactive shell: a query engine plus where its output goes.
pub struct Shell {
    engine: QueryEngine,
    storage: Arc<dyn RecordStorage>,
    #[cfg(feature = "map")]
    map: Option<MapClient>,
    persist_on_exit: bool,
    show_progress: bool,
}

impl Shell {
    pub fn new(engine: QueryEngine, storage: Arc<dyn RecordStorage>, config: &Config) -> Self {
        Self {
            engine,
            storage,
            #[cfg(feature = "map")]
            map: None,
            persist_on_exit: config.storage.persist_on_exit,
            show_progress: config.logging.show_progress,
        }
    }

    /// Enable `draw` with a campus map client.
    #[cfg(feature = "map")]
    pub fn with_map_client(mut self, map: MapClient) -> Self {
        self.map = Some(map);
        self
    }

    pub fn engine(&self) -> &QueryEngine {
        &self.engine
    }

    /// Read commands from stdin until `exit`, end of input or Ctrl-C at the
    /// prompt.
    pub async fn run(&mut self) -> Result<()> {
        self.run_with(
            BufReader::new(tokio::io::stdin()),
            true,
            tokio::signal::ctrl_c,
        )
        .await
    }

    /// Read commands from `input` until the session ends, then persist the
    /// cache if configured.
    ///
    /// `interrupt` is awaited alongside the prompt and each command: at the
    /// prompt it ends the session, during a command it aborts that command.
    /// The cache is persisted even when reading input fails.
    pub async fn run_with<R, I, F>(
        &mut self,
        input: R,
        prompt: bool,
        mut interrupt: I,
    ) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        I: FnMut() -> F,
        F: Future<Output = std::io::Result<()>>,
    {
        let session = self.read_loop(input, prompt, &mut interrupt).await;
        let saved = self.shutdown().await;
        session.and(saved)
    }

    async fn read_loop<R, I, F>(&mut self, input: R, prompt: bool, interrupt: &mut I) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        I: FnMut() -> F,
        F: Future<Output = std::io::Result<()>>,
    {
        let mut lines = input.split(b'\n');
        let mut stdout = tokio::io::stdout();

        loop {
            if prompt {
                stdout.write_all(b"> ").await?;
                stdout.flush().await?;
            }

            let bytes = tokio::select! {
                bytes = lines.next_segment() => bytes?,
                _ = interrupt() => {
                    println!();
                    log::info("Interrupted, leaving the shell");
                    return Ok(());
                }
            };
            let Some(bytes) = bytes else {
                log::info("End of input");
                return Ok(());
            };

            let outcome = match String::from_utf8(bytes) {
                Ok(line) => tokio::select! {
                    outcome = self.dispatch(line.trim_end_matches('\r')) => outcome,
                    _ = interrupt() => {
                        log::warn("Interrupted");
                        CommandOutcome::Continue
                    }
                },
                Err(_) => CommandOutcome::Error("input line is not valid UTF-8".to_string()),
            };

            match outcome {
                CommandOutcome::Continue => {}
                CommandOutcome::Exit => return Ok(()),
                CommandOutcome::Error(message) => log::error(&message),
            }
        }
    }

    /// Write the session's cache snapshot if configured and non-empty.
    pub async fn shutdown(&self) -> Result<()> {
        if !self.persist_on_exit || self.engine.cache().is_empty() {
            return Ok(());
        }
        let path = self
            .storage
            .write_cache_snapshot(&self.engine.cache().snapshot())
            .await?;
        log::info(&format!("Cache saved to {}", path.display()));
        Ok(())
    }

    /// Parse and run one line.
    pub async fn dispatch(&mut self, line: &str) -> CommandOutcome {
        let command = match Command::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => return CommandOutcome::Continue,
            Err(e) => return CommandOutcome::Error(e.to_string()),
        };

        match self.execute(command).await {
            Ok(outcome) => outcome,
            Err(e) => CommandOutcome::Error(e.to_string()),
        }
    }

    async fn execute(&mut self, command: Command) -> Result<CommandOutcome> {
        let mut progress = ConsoleProgress::new(self.show_progress);

        match command {
            Command::Query(args) => {
                let result = self.engine.run_query_args(&args, &mut progress).await?;
                log::success(&format!(
                    "{} sections for {}",
                    result.sections.len(),
                    result.filter
                ));
            }
            Command::Course {
                prefix,
                number,
                year,
                semester,
            } => {
                let result = self
                    .engine
                    .sections_of_course(&prefix, &number, &year, &semester, &mut progress)
                    .await?;
                log::success(&format!(
                    "{} sections of {} {} in {}{}",
                    result.sections.len(),
                    prefix,
                    number,
                    year,
                    semester
                ));
            }
            Command::Show(arg) => self.show(arg)?,
            Command::Schedule(days) => self.schedule(days).await?,
            Command::Export => {
                let result = self.current()?;
                let path = self
                    .storage
                    .export_sections(&result.file_stem(), &result.sections)
                    .await?;
                log::success(&format!("Saved to {}", path.display()));
            }
            Command::Draw { building, target } => self.draw(building, target).await?,
            Command::Save => {
                if self.engine.cache().is_empty() {
                    log::info("Cache is empty, nothing to save");
                } else {
                    let path = self
                        .storage
                        .write_cache_snapshot(&self.engine.cache().snapshot())
                        .await?;
                    log::success(&format!("Cache saved to {}", path.display()));
                }
            }
            Command::Help => println!("{HELP}"),
            Command::Exit => return Ok(CommandOutcome::Exit),
        }

        Ok(CommandOutcome::Continue)
    }

    fn current(&self) -> Result<&QueryResult> {
        self.engine
            .current()
            .ok_or_else(|| AppError::validation("no records yet, run 'query' first"))
    }

    fn show(&self, arg: ShowArg) -> Result<()> {
        let result = self.current()?;
        match arg {
            ShowArg::Length => println!("{}", result.sections.len()),
            ShowArg::Records(n) => {
                let n = n.min(result.sections.len());
                for section in &result.sections[..n] {
                    println!("{}", serde_json::to_string_pretty(section)?);
                }
            }
        }
        Ok(())
    }

    async fn schedule(&self, days: Vec<String>) -> Result<()> {
        let result = self.current()?;

        // Without explicit days, follow the query's meetingDays filter.
        let days = if days.is_empty() {
            result
                .filter
                .get(FilterKey::MeetingDays)
                .map(|value| value.values().into_iter().map(str::to_string).collect())
                .unwrap_or_default()
        } else {
            days
        };

        let agenda = self.engine.composer().compose(&result.sections, &days).await;
        log::header(&format!("Schedule for {}", result.filter));
        print!("{agenda}");
        log::summary(
            "Schedule",
            &[
                ("sections", result.sections.len().to_string()),
                ("meetings", agenda.len().to_string()),
                ("failed course lookups", agenda.failed_lookups.to_string()),
            ],
        );
        if agenda.failed_lookups > 0 {
            log::warn(&format!(
                "{} course lookups failed; their sections are labelled {}",
                agenda.failed_lookups, UNKNOWN_COURSE
            ));
        }
        Ok(())
    }

    #[cfg(feature = "map")]
    async fn draw(&self, building: Option<String>, target: Option<String>) -> Result<()> {
        let Some(map) = &self.map else {
            return Err(AppError::map("no map client configured"));
        };

        let filter = self.engine.current().map(|result| &result.filter);
        let from_filter = |key: FilterKey| {
            filter
                .and_then(|f| f.get(key))
                .and_then(|value| value.values().first().map(|v| v.to_string()))
        };

        let building = building
            .or_else(|| from_filter(FilterKey::Building))
            .ok_or_else(|| AppError::malformed("draw needs a building"))?
            .to_uppercase();
        let target = target
            .or_else(|| from_filter(FilterKey::Room))
            .ok_or_else(|| AppError::malformed("draw needs a room or floor"))?;
        let target = DrawTarget::parse(&target);

        let Some(drawing) = draw_building(map, &building, &target).await? else {
            return Err(AppError::map(format!("no interior map for {building}")));
        };

        let stem = format!("{}_{}", building, target.as_str().replace('.', "-"));
        let path = self.storage.write_drawing(&stem, &drawing.kml).await?;
        log::success(&format!(
            "Drew {} rooms to {}",
            drawing.rooms_drawn,
            path.display()
        ));
        Ok(())
    }

    #[cfg(not(feature = "map"))]
    async fn draw(&self, _building: Option<String>, _target: Option<String>) -> Result<()> {
        Err(AppError::map("built without map support"))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::client::testing::FakeCatalog;
    use crate::models::Config;
    use crate::services::ResponseCache;
    use crate::storage::LocalStorage;

    fn no_interrupt() -> std::future::Pending<std::io::Result<()>> {
        std::future::pending()
    }

    fn shell(fake: FakeCatalog, tmp: &TempDir) -> (Arc<FakeCatalog>, Arc<LocalStorage>, Shell) {
        let fake = Arc::new(fake);
        let mut config = Config::default();
        config.logging.show_progress = false;

        let engine = QueryEngine::new(fake.clone(), Arc::new(ResponseCache::new()), &config.api);
        let storage = Arc::new(LocalStorage::with_dirs(tmp.path(), tmp.path().join("cache")));
        let shell = Shell::new(engine, storage.clone(), &config);
        (fake, storage, shell)
    }

    #[tokio::test]
    async fn test_query_then_export() {
        let tmp = TempDir::new().unwrap();
        let (_, storage, mut shell) = shell(FakeCatalog::with_sections(23), &tmp);

        assert_eq!(
            shell.dispatch("query session=23F room=1.102").await,
            CommandOutcome::Continue
        );
        assert_eq!(shell.dispatch("export").await, CommandOutcome::Continue);

        let path = tmp.path().join("23F_1-102.json");
        let exported = storage.load_export(&path).await.unwrap();
        assert_eq!(exported, shell.engine().current().unwrap().sections);
        assert_eq!(exported.len(), 23);
    }

    #[tokio::test]
    async fn test_malformed_query_keeps_state() {
        let tmp = TempDir::new().unwrap();
        let (fake, _, mut shell) = shell(FakeCatalog::with_sections(3), &tmp);
        shell.dispatch("query session=23F").await;
        let calls = fake.call_count();

        let outcome = shell.dispatch("query session=24S oops").await;
        match outcome {
            CommandOutcome::Error(message) => assert!(message.contains("malformed query")),
            other => panic!("expected error, got {other:?}"),
        }
        assert_eq!(fake.call_count(), calls);
        assert_eq!(
            shell.engine().current().unwrap().filter.file_stem(),
            "23F"
        );
    }

    #[tokio::test]
    async fn test_commands_need_records() {
        let tmp = TempDir::new().unwrap();
        let (_, _, mut shell) = shell(FakeCatalog::with_sections(3), &tmp);

        for line in ["show", "schedule", "export"] {
            assert!(matches!(shell.dispatch(line).await, CommandOutcome::Error(_)));
        }
        assert_eq!(shell.dispatch("").await, CommandOutcome::Continue);
        assert_eq!(shell.dispatch("help").await, CommandOutcome::Continue);
        assert_eq!(shell.dispatch("quit").await, CommandOutcome::Exit);
    }

    #[tokio::test]
    async fn test_show_and_schedule_after_query() {
        let tmp = TempDir::new().unwrap();
        let (_, _, mut shell) = shell(FakeCatalog::with_sections(4), &tmp);
        shell.dispatch("query").await;

        assert_eq!(shell.dispatch("show 2").await, CommandOutcome::Continue);
        assert_eq!(shell.dispatch("show length").await, CommandOutcome::Continue);
        assert_eq!(shell.dispatch("schedule mon").await, CommandOutcome::Continue);
    }

    #[tokio::test]
    async fn test_schedule_accepts_any_day_name() {
        let tmp = TempDir::new().unwrap();
        let (_, _, mut shell) = shell(FakeCatalog::with_sections(2), &tmp);
        shell.dispatch("query").await;

        assert_eq!(shell.dispatch("schedule Funday").await, CommandOutcome::Continue);
        assert_eq!(
            shell.dispatch("schedule monday Monday").await,
            CommandOutcome::Continue
        );
    }

    #[tokio::test]
    async fn test_schedule_survives_failed_lookups() {
        let tmp = TempDir::new().unwrap();
        let fake = FakeCatalog {
            fail_course_lookups: true,
            ..FakeCatalog::with_sections(3)
        };
        let (_, _, mut shell) = shell(fake, &tmp);
        shell.dispatch("query").await;

        assert_eq!(shell.dispatch("schedule").await, CommandOutcome::Continue);
    }

    #[tokio::test]
    async fn test_course_command() {
        let tmp = TempDir::new().unwrap();
        let mut fake = FakeCatalog::with_sections(3);
        fake.courses.insert(
            "course0".into(),
            json!({"_id": "course0", "subject_prefix": "CS", "course_number": "1337", "catalog_year": "23"}),
        );
        let (_, _, mut shell) = shell(fake, &tmp);

        assert_eq!(
            shell.dispatch("course cs 1337 23 f").await,
            CommandOutcome::Continue
        );
        let current = shell.engine().current().unwrap();
        assert_eq!(current.sections.len(), 1);
        assert_eq!(current.file_stem(), "CS-1337_23F");
    }

    #[cfg(feature = "map")]
    #[tokio::test]
    async fn test_draw_without_map_client() {
        let tmp = TempDir::new().unwrap();
        let (_, _, mut shell) = shell(FakeCatalog::with_sections(1), &tmp);
        match shell.dispatch("draw JO 1.102").await {
            CommandOutcome::Error(message) => assert!(message.contains("no map client")),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_persists_cache_on_exit() {
        let tmp = TempDir::new().unwrap();
        let (_, storage, mut shell) = shell(FakeCatalog::with_sections(5), &tmp);

        let input: &[u8] = b"query session=23F\nbogus\nexit\nquery room=never-run\n";
        shell.run_with(input, false, no_interrupt).await.unwrap();

        let snapshot = storage
            .load_cache_snapshot(&storage.snapshot_path())
            .await
            .unwrap();
        // offset 0 with data, offset 20 with the end sentinel
        assert_eq!(snapshot.entries.len(), 2);
        assert!(
            snapshot
                .entries
                .iter()
                .all(|entry| !entry.key.to_string().contains("never-run"))
        );
    }

    #[tokio::test]
    async fn test_end_of_input_exits() {
        let tmp = TempDir::new().unwrap();
        let (_, storage, mut shell) = shell(FakeCatalog::with_sections(1), &tmp);

        let input: &[u8] = b"help\n";
        shell.run_with(input, false, no_interrupt).await.unwrap();

        // nothing was fetched, so nothing is written
        assert!(!storage.snapshot_path().exists());
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let (_, storage, mut shell) = shell(FakeCatalog::with_sections(5), &tmp);

        let input: &[u8] = b"query session=23F\nshow \xff\nquery session=24S\r\nexit\n";
        shell.run_with(input, false, no_interrupt).await.unwrap();

        assert_eq!(
            shell.engine().current().unwrap().filter.file_stem(),
            "24S"
        );
        assert!(storage.snapshot_path().exists());
    }

    #[tokio::test]
    async fn test_interrupt_at_prompt_ends_session() {
        let tmp = TempDir::new().unwrap();
        let (_, storage, mut shell) = shell(FakeCatalog::with_sections(5), &tmp);
        shell.dispatch("query session=23F").await;

        // The writer stays open, so the only way out is the interrupt.
        let (reader, _writer) = tokio::io::duplex(64);
        shell
            .run_with(BufReader::new(reader), false, || {
                std::future::ready(Ok::<(), std::io::Error>(()))
            })
            .await
            .unwrap();

        let snapshot = storage
            .load_cache_snapshot(&storage.snapshot_path())
            .await
            .unwrap();
        assert_eq!(snapshot.entries.len(), 2);
    }
}
