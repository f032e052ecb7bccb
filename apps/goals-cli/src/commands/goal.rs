// goal.rs: Goal commands and the session that runs them.
//
// Each REPL line (or script line) is split with shell quoting rules and
// parsed by clap as one of the GoalCommands below. A Session owns the store
// for the lifetime of the process and executes commands against it,
// writing human-readable output to the given writer.

use std::io::Write;

use anyhow::{anyhow, bail};
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use goals_core::{Colour, Goal, GoalProgress, GoalStore, Interval, Progress};
use uuid::Uuid;

/// One line of input to the goals shell.
#[derive(Parser)]
#[command(name = "goals", no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: GoalCommands,
}

/// Commands accepted by the goals shell.
///
/// `<goal>` arguments are a 1-based list position or a unique id prefix.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum GoalCommands {
    /// List all goals in display order.
    #[command(alias = "ls")]
    List,
    /// Show progress of active goals.
    Progress,
    /// Show details for one goal.
    Show {
        /// Goal position or id prefix.
        goal: String,
    },
    /// Add a new goal (inactive unless --active is given).
    Add {
        /// Goal title (defaults to "New Goal").
        title: Option<String>,
        /// Display colour (name or hex).
        #[arg(long)]
        colour: Option<String>,
        /// daily, weekly or monthly.
        #[arg(long)]
        interval: Option<Interval>,
        /// Completions per interval (1-9).
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=9))]
        frequency: Option<u32>,
        /// Start tracking right away.
        #[arg(long)]
        active: bool,
    },
    /// Edit a goal's definition.
    Edit {
        /// Goal position or id prefix.
        goal: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        colour: Option<String>,
        #[arg(long)]
        interval: Option<Interval>,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=9))]
        frequency: Option<u32>,
        /// Keep the current count when interval or frequency change.
        #[arg(long)]
        keep_progress: bool,
    },
    /// Start tracking a goal (count starts at zero).
    Activate {
        /// Goal position or id prefix.
        goal: String,
    },
    /// Stop tracking a goal, discarding its count.
    Deactivate {
        /// Goal position or id prefix.
        goal: String,
        /// Discard recorded progress without asking.
        #[arg(long)]
        force: bool,
    },
    /// Record one completion for an active goal.
    Done {
        /// Goal position or id prefix.
        goal: String,
    },
    /// Remove a goal.
    #[command(alias = "rm")]
    Remove {
        /// Goal position or id prefix.
        goal: String,
    },
    /// Move goals so they land before position --to.
    Move {
        /// Goals to move (positions or id prefixes).
        #[arg(required = true)]
        goals: Vec<String>,
        /// Target position (1-based; one past the last moves to the end).
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        to: u32,
    },
    /// Leave the shell.
    #[command(alias = "exit")]
    Quit,
}

/// Whether the shell should keep reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// A goal store plus the settings that shape how commands behave.
pub struct Session {
    store: GoalStore,
    confirm_discard: bool,
}

impl Session {
    pub fn new(store: GoalStore, confirm_discard: bool) -> Self {
        Self {
            store,
            confirm_discard,
        }
    }

    pub fn store(&self) -> &GoalStore {
        &self.store
    }

    /// Parse and execute one line of input.
    ///
    /// Blank lines and `#` comments do nothing. Help requests are written
    /// to `out`; any other parse failure is returned as an error.
    pub fn execute_line(&mut self, line: &str, out: &mut dyn Write) -> anyhow::Result<Flow> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(Flow::Continue);
        }

        let words = shell_words::split(line)?;
        match ShellLine::try_parse_from(words) {
            Ok(parsed) => self.execute(&parsed.command, out),
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) =>
            {
                write!(out, "{}", e.render())?;
                Ok(Flow::Continue)
            }
            Err(e) => Err(anyhow!("{}", e.render().to_string().trim_end())),
        }
    }

    pub fn execute(&mut self, cmd: &GoalCommands, out: &mut dyn Write) -> anyhow::Result<Flow> {
        match cmd {
            GoalCommands::List => self.list_goals(out)?,
            GoalCommands::Progress => self.show_progress(out)?,
            GoalCommands::Show { goal } => self.show_goal(goal, out)?,
            GoalCommands::Add {
                title,
                colour,
                interval,
                frequency,
                active,
            } => self.add_goal(
                title.as_deref(),
                colour.as_deref(),
                *interval,
                *frequency,
                *active,
                out,
            )?,
            GoalCommands::Edit {
                goal,
                title,
                colour,
                interval,
                frequency,
                keep_progress,
            } => self.edit_goal(
                goal,
                title.as_deref(),
                colour.as_deref(),
                *interval,
                *frequency,
                *keep_progress,
                out,
            )?,
            GoalCommands::Activate { goal } => self.activate_goal(goal, out)?,
            GoalCommands::Deactivate { goal, force } => self.deactivate_goal(goal, *force, out)?,
            GoalCommands::Done { goal } => self.record_done(goal, out)?,
            GoalCommands::Remove { goal } => self.remove_goal(goal, out)?,
            GoalCommands::Move { goals, to } => self.move_goals(goals, *to as usize, out)?,
            GoalCommands::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Resolve a `<goal>` argument to a goal id.
    ///
    /// A number is tried as a list position first. Short ids can be all
    /// digits, so a number with more digits than the longest position is
    /// also matched as an id prefix.
    fn resolve(&self, reference: &str) -> anyhow::Result<Uuid> {
        if let Ok(position) = reference.parse::<usize>() {
            let found = position
                .checked_sub(1)
                .and_then(|i| self.store.get_index(i))
                .map(GoalProgress::id);
            match found {
                Some(goal_id) => return Ok(goal_id),
                None if reference.len() <= self.store.len().to_string().len() => {
                    bail!("no goal at position {}", position)
                }
                None => {}
            }
        }

        let prefix = reference.to_ascii_lowercase();
        let matches: Vec<Uuid> = self
            .store
            .ids()
            .iter()
            .copied()
            .filter(|id| id.to_string().starts_with(&prefix))
            .collect();
        match matches.as_slice() {
            [id] => Ok(*id),
            [] => bail!("no goal matches '{}'", reference),
            _ => bail!("'{}' matches {} goals; use a longer prefix", reference, matches.len()),
        }
    }

    fn record(&self, goal_id: Uuid) -> anyhow::Result<&GoalProgress> {
        self.store
            .get(goal_id)
            .ok_or_else(|| anyhow!("goal {} disappeared", goal_id))
    }

    fn list_goals(&self, out: &mut dyn Write) -> anyhow::Result<()> {
        if self.store.is_empty() {
            writeln!(out, "No goals yet. Use `add <title>` to create one.")?;
            return Ok(());
        }

        writeln!(
            out,
            "{:<4} {:<10} {:<26} {:<20} {:<10}",
            "#", "ID", "TITLE", "TARGET", "STATUS"
        )?;
        writeln!(out, "{}", "-".repeat(72))?;
        for (i, record) in self.store.records().enumerate() {
            writeln!(
                out,
                "{:<4} {:<10} {:<26} {:<20} {:<10}",
                i + 1,
                short_id(record.id()),
                truncate(&record.goal.title, 24),
                record.goal.frequency_per_interval(),
                record.progress.status_label(),
            )?;
        }
        writeln!(out, "\n{} goal(s) total.", self.store.len())?;
        Ok(())
    }

    fn show_progress(&self, out: &mut dyn Write) -> anyhow::Result<()> {
        let mut any = false;
        for record in self.store.active() {
            any = true;
            let count = record.progress.count().unwrap_or(0);
            writeln!(
                out,
                "{:>6}  {} ({} of {}, {})",
                record.percent_label(),
                record.goal.title,
                count,
                record.goal.frequency,
                record.goal.interval,
            )?;
        }
        if !any {
            writeln!(out, "No active goals. Use `activate <goal>` to start tracking one.")?;
        }
        Ok(())
    }

    fn show_goal(&self, reference: &str, out: &mut dyn Write) -> anyhow::Result<()> {
        let goal_id = self.resolve(reference)?;
        let record = self.record(goal_id)?;
        writeln!(out, "Goal:     {}", record.id())?;
        writeln!(out, "Title:    {}", record.goal.title)?;
        writeln!(out, "Colour:   {}", record.goal.colour)?;
        writeln!(out, "Target:   {}", record.goal.frequency_per_interval())?;
        writeln!(out, "Status:   {}", record.progress.status_label())?;
        if let Progress::Active { count } = record.progress {
            writeln!(out, "Progress: {} ({})", count, record.percent_label())?;
        }
        Ok(())
    }

    fn add_goal(
        &mut self,
        title: Option<&str>,
        colour: Option<&str>,
        interval: Option<Interval>,
        frequency: Option<u32>,
        active: bool,
        out: &mut dyn Write,
    ) -> anyhow::Result<()> {
        let mut goal = Goal::default();
        if let Some(title) = title {
            goal.title = title.to_string();
        }
        if let Some(colour) = colour {
            goal.colour = Colour::new(colour);
        }
        if let Some(interval) = interval {
            goal.interval = interval;
        }
        if let Some(frequency) = frequency {
            goal.frequency = frequency;
        }

        let goal_id = goal.id();
        let progress = if active {
            Progress::Active { count: 0 }
        } else {
            Progress::Inactive
        };
        let line = format!(
            "Added goal {}: {} ({}), {}",
            self.store.len() + 1,
            goal.title,
            goal.frequency_per_interval(),
            progress.status_label(),
        );
        self.store.add(GoalProgress::new(goal, progress));
        writeln!(out, "{}", line)?;
        writeln!(out, "  id: {}", goal_id)?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn edit_goal(
        &mut self,
        reference: &str,
        title: Option<&str>,
        colour: Option<&str>,
        interval: Option<Interval>,
        frequency: Option<u32>,
        keep_progress: bool,
        out: &mut dyn Write,
    ) -> anyhow::Result<()> {
        let goal_id = self.resolve(reference)?;
        let before = self.record(goal_id)?.clone();

        let mut edited = before.goal.clone();
        if let Some(title) = title {
            edited.title = title.to_string();
        }
        if let Some(colour) = colour {
            edited.colour = Colour::new(colour);
        }
        if let Some(interval) = interval {
            edited.interval = interval;
        }
        if let Some(frequency) = frequency {
            edited.frequency = frequency;
        }

        if edited == before.goal {
            writeln!(out, "No changes to {}.", before.goal.title)?;
            return Ok(());
        }

        // Renaming or recolouring keeps the count; changing what a count
        // means only keeps it on request.
        let transfer = !before.goal.changes_counting(&edited) || keep_progress;
        self.store.update(edited, transfer);

        let after = self.record(goal_id)?;
        writeln!(
            out,
            "Updated {}: {}",
            after.goal.title,
            after.goal.frequency_per_interval()
        )?;
        if before.progress.is_active() && !after.progress.is_active() {
            writeln!(
                out,
                "  Progress discarded; the goal is now inactive (use --keep-progress to keep it)."
            )?;
        }
        Ok(())
    }

    fn activate_goal(&mut self, reference: &str, out: &mut dyn Write) -> anyhow::Result<()> {
        let goal_id = self.resolve(reference)?;
        self.store.set_activity(goal_id, true);
        let record = self.record(goal_id)?;
        writeln!(
            out,
            "{} is active: 0 of {}",
            record.goal.title,
            record.goal.frequency_per_interval()
        )?;
        Ok(())
    }

    fn deactivate_goal(
        &mut self,
        reference: &str,
        force: bool,
        out: &mut dyn Write,
    ) -> anyhow::Result<()> {
        let goal_id = self.resolve(reference)?;
        if self.confirm_discard && !force && self.store.needs_discard_confirmation(goal_id) {
            let record = self.record(goal_id)?;
            bail!(
                "{} has {} completion(s) recorded; deactivating discards them (use --force)",
                record.goal.title,
                record.progress.count().unwrap_or(0)
            );
        }
        self.store.set_activity(goal_id, false);
        writeln!(out, "{} is inactive.", self.record(goal_id)?.goal.title)?;
        Ok(())
    }

    fn record_done(&mut self, reference: &str, out: &mut dyn Write) -> anyhow::Result<()> {
        let goal_id = self.resolve(reference)?;
        self.store.record_progress(goal_id);
        let record = self.record(goal_id)?;
        match record.progress {
            Progress::Active { count } => writeln!(
                out,
                "{}: {} ({} of {})",
                record.goal.title,
                record.percent_label(),
                count,
                record.goal.frequency
            )?,
            Progress::Inactive => writeln!(
                out,
                "{} is inactive; nothing recorded (use `activate` first).",
                record.goal.title
            )?,
        }
        Ok(())
    }

    fn remove_goal(&mut self, reference: &str, out: &mut dyn Write) -> anyhow::Result<()> {
        let goal_id = self.resolve(reference)?;
        let title = self.record(goal_id)?.goal.title.clone();
        self.store.remove(goal_id);
        writeln!(out, "Removed goal: {} ({})", title, short_id(goal_id))?;
        Ok(())
    }

    fn move_goals(
        &mut self,
        references: &[String],
        to: usize,
        out: &mut dyn Write,
    ) -> anyhow::Result<()> {
        if to > self.store.len() + 1 {
            bail!("target position {} is past the end of the list", to);
        }
        let mut indices = Vec::with_capacity(references.len());
        for reference in references {
            let goal_id = self.resolve(reference)?;
            if let Some(index) = self.store.position(goal_id) {
                indices.push(index);
            }
        }
        self.store.move_goals(&indices, to - 1);
        self.list_goals(out)
    }
}

fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_string()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let kept: String = s.chars().take(max - 3).collect();
        format!("{}...", kept)
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yoga_session() -> (Session, Uuid) {
        let goal = Goal::new("blue", "Yoga", Interval::Monthly, 5);
        let id = goal.id();
        let store = GoalStore::with_records(vec![
            GoalProgress::new(goal, Some(3)),
            GoalProgress::new(Goal::new("orange", "Walks", Interval::Weekly, 3), Some(0)),
            GoalProgress::new(Goal::new("cyan", "Meditation", Interval::Weekly, 2), None),
        ]);
        (Session::new(store, true), id)
    }

    fn run(session: &mut Session, line: &str) -> anyhow::Result<String> {
        let mut out = Vec::new();
        session.execute_line(line, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    fn titles(session: &Session) -> Vec<String> {
        session
            .store()
            .records()
            .map(|r| r.goal.title.clone())
            .collect()
    }

    #[test]
    fn parses_commands() {
        let parsed = ShellLine::try_parse_from(["edit", "1", "--frequency", "4", "--keep-progress"])
            .unwrap();
        assert_eq!(
            parsed.command,
            GoalCommands::Edit {
                goal: "1".to_string(),
                title: None,
                colour: None,
                interval: None,
                frequency: Some(4),
                keep_progress: true,
            }
        );
    }

    #[test]
    fn frequency_outside_picker_range_is_rejected() {
        assert!(ShellLine::try_parse_from(["add", "Run", "--frequency", "0"]).is_err());
        assert!(ShellLine::try_parse_from(["add", "Run", "--frequency", "10"]).is_err());
    }

    #[test]
    fn blank_and_comment_lines_are_ignored() {
        let (mut session, _) = yoga_session();
        assert_eq!(run(&mut session, "   ").unwrap(), "");
        assert_eq!(run(&mut session, "# just a note").unwrap(), "");
    }

    #[test]
    fn quit_stops_the_session() {
        let (mut session, _) = yoga_session();
        let mut out = Vec::new();
        assert_eq!(session.execute_line("quit", &mut out).unwrap(), Flow::Quit);
        assert_eq!(session.execute_line("exit", &mut out).unwrap(), Flow::Quit);
    }

    #[test]
    fn help_is_written_not_raised() {
        let (mut session, _) = yoga_session();
        let output = run(&mut session, "help").unwrap();
        assert!(output.contains("activate"));
    }

    #[test]
    fn unknown_command_is_an_error() {
        let (mut session, _) = yoga_session();
        assert!(run(&mut session, "frobnicate").is_err());
    }

    #[test]
    fn list_shows_status() {
        let (mut session, _) = yoga_session();
        let output = run(&mut session, "list").unwrap();
        assert!(output.contains("Yoga"));
        assert!(output.contains("5 times per month"));
        assert!(output.contains("inactive"));
        assert!(output.contains("3 goal(s) total."));
    }

    #[test]
    fn progress_lists_active_goals_only() {
        let (mut session, _) = yoga_session();
        let output = run(&mut session, "progress").unwrap();
        assert!(output.contains("60%  Yoga (3 of 5, monthly)"));
        assert!(output.contains("Walks"));
        assert!(!output.contains("Meditation"));
    }

    #[test]
    fn add_quoted_title() {
        let (mut session, _) = yoga_session();
        run(
            &mut session,
            "add \"Evening run\" --interval weekly --frequency 2 --colour red --active",
        )
        .unwrap();
        let record = session.store().get_index(3).unwrap();
        assert_eq!(record.goal.title, "Evening run");
        assert_eq!(record.goal.interval, Interval::Weekly);
        assert_eq!(record.goal.frequency, 2);
        assert_eq!(record.goal.colour.as_str(), "red");
        assert_eq!(record.progress, Progress::Active { count: 0 });
    }

    #[test]
    fn add_without_arguments_uses_defaults() {
        let (mut session, _) = yoga_session();
        run(&mut session, "add").unwrap();
        let record = session.store().get_index(3).unwrap();
        assert_eq!(record.goal.title, "New Goal");
        assert_eq!(record.goal.frequency_per_interval(), "once per day");
        assert!(!record.progress.is_active());
    }

    #[test]
    fn done_records_progress() {
        let (mut session, id) = yoga_session();
        let output = run(&mut session, "done 1").unwrap();
        assert!(output.contains("Yoga: 80% (4 of 5)"));
        assert_eq!(session.store().progress_of(id), Some(4));
    }

    #[test]
    fn done_on_inactive_goal_records_nothing() {
        let (mut session, _) = yoga_session();
        let output = run(&mut session, "done 3").unwrap();
        assert!(output.contains("inactive"));
        assert_eq!(session.store().get_index(2).unwrap().progress, Progress::Inactive);
    }

    #[test]
    fn title_edit_keeps_progress() {
        let (mut session, id) = yoga_session();
        run(&mut session, "edit 1 --title \"Morning yoga\"").unwrap();
        assert_eq!(session.store().progress_of(id), Some(3));
        assert_eq!(session.store().get(id).unwrap().goal.title, "Morning yoga");
    }

    #[test]
    fn frequency_edit_discards_progress_unless_kept() {
        let (mut session, id) = yoga_session();
        let output = run(&mut session, "edit 1 --frequency 6").unwrap();
        assert!(output.contains("Progress discarded"));
        assert_eq!(session.store().progress_of(id), None);

        let (mut session, id) = yoga_session();
        run(&mut session, "edit 1 --interval weekly --keep-progress").unwrap();
        assert_eq!(session.store().progress_of(id), Some(3));
    }

    #[test]
    fn identical_edit_changes_nothing() {
        let (mut session, id) = yoga_session();
        let output = run(&mut session, "edit 1 --frequency 5").unwrap();
        assert!(output.contains("No changes"));
        assert_eq!(session.store().progress_of(id), Some(3));
    }

    #[test]
    fn deactivate_with_progress_needs_force() {
        let (mut session, id) = yoga_session();
        let err = run(&mut session, "deactivate 1").unwrap_err();
        assert!(err.to_string().contains("--force"));
        assert_eq!(session.store().progress_of(id), Some(3));

        run(&mut session, "deactivate 1 --force").unwrap();
        assert_eq!(session.store().progress_of(id), None);

        run(&mut session, "activate 1").unwrap();
        assert_eq!(session.store().progress_of(id), Some(0));
    }

    #[test]
    fn deactivate_without_confirmation_setting() {
        let (session, id) = yoga_session();
        let mut session = Session::new(session.store, false);
        run(&mut session, "deactivate 1").unwrap();
        assert_eq!(session.store().progress_of(id), None);
    }

    #[test]
    fn deactivate_zero_count_needs_no_force() {
        let (mut session, _) = yoga_session();
        run(&mut session, "deactivate 2").unwrap();
        assert_eq!(session.store().get_index(1).unwrap().progress, Progress::Inactive);
    }

    #[test]
    fn resolve_by_id_prefix() {
        let (mut session, id) = yoga_session();
        let prefix = &id.to_string()[..8];
        let output = run(&mut session, &format!("show {}", prefix)).unwrap();
        assert!(output.contains("Title:    Yoga"));
        assert!(output.contains("Progress: 3 (60%)"));
    }

    #[test]
    fn resolve_all_digit_id_prefix() {
        let goal: Goal = serde_json::from_value(serde_json::json!({
            "id": "12345678-aaaa-4bbb-8ccc-dddddddddddd",
            "title": "Yoga",
            "colour": "blue",
            "interval": "monthly",
            "frequency": 5,
        }))
        .unwrap();
        let store = GoalStore::with_records(vec![
            GoalProgress::new(goal, Some(3)),
            GoalProgress::inactive(Goal::new("cyan", "Meditation", Interval::Weekly, 2)),
        ]);
        let mut session = Session::new(store, true);

        let listing = run(&mut session, "list").unwrap();
        assert!(listing.contains("12345678"));

        let output = run(&mut session, "show 12345678").unwrap();
        assert!(output.contains("Title:    Yoga"));

        // Short numbers stay positions.
        let output = run(&mut session, "show 2").unwrap();
        assert!(output.contains("Title:    Meditation"));
        let err = run(&mut session, "show 3").unwrap_err();
        assert!(err.to_string().contains("no goal at position 3"));
    }

    #[test]
    fn resolve_errors() {
        let (mut session, _) = yoga_session();
        assert!(run(&mut session, "show 0").is_err());
        assert!(run(&mut session, "show 4").is_err());
        assert!(run(&mut session, "show zzzz").is_err());
    }

    #[test]
    fn remove_and_move() {
        let (mut session, _) = yoga_session();
        run(&mut session, "move 1 --to 4").unwrap();
        assert_eq!(titles(&session), vec!["Walks", "Meditation", "Yoga"]);

        run(&mut session, "move 3 2 --to 1").unwrap();
        assert_eq!(titles(&session), vec!["Meditation", "Yoga", "Walks"]);

        run(&mut session, "remove 2").unwrap();
        assert_eq!(titles(&session), vec!["Meditation", "Walks"]);

        assert!(run(&mut session, "move 1 --to 9").is_err());
    }

    #[test]
    fn truncate_long_titles() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long goal title", 10), "a very ...");
    }
}
