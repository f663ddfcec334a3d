//! The triage loop.
//!
//! [`TriageEngine`] owns the active file list and its cursor.  Each turn of
//! the loop looks at the entry under the cursor, filters it, shows it, waits
//! for one key, and applies the bound [`Action`].  Per-file problems (bad
//! type, decode or display failure, name collision) are settled inside the
//! turn by asking the operator; only startup path errors and terminal
//! failures leave [`TriageEngine::run`] as errors.

use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use super::viewer::{Confirmation, Prompt, Viewer};
use crate::config::{Action, DisplaySize, KeyBindings, Settings};
use crate::core::{
    active_set::ActiveFileSet,
    fs,
    rules::{Category, ClassificationTargets, ExtensionAllowList},
    signature::Signature,
    tree::EntryMeta,
};
use crate::error::{PathError, TriageError};

// ───────────────────────────────────────── options ───────────

/// Everything needed to start a session.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub source: PathBuf,
    pub targets: ClassificationTargets,
    pub allowed: ExtensionAllowList,
    pub bindings: KeyBindings,
    /// Progress notice every this many disposed-of files (0 disables).
    pub milestone_interval: usize,
    pub display_size: DisplaySize,
}

impl EngineOptions {
    /// Options for `source` with both categories pointing at their default
    /// directories under it.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self::from_settings(source, &Settings::default())
    }

    pub fn from_settings(source: impl Into<PathBuf>, settings: &Settings) -> Self {
        let source = source.into();
        let targets = Category::ALL
            .iter()
            .fold(ClassificationTargets::new(), |t, &c| {
                t.with(c, source.join(settings.dir_name(c)))
            });
        Self {
            source,
            targets,
            allowed: settings.allowed_extensions.clone(),
            bindings: KeyBindings::triage_defaults(),
            milestone_interval: settings.milestone_interval,
            display_size: settings.display_size,
        }
    }
}

// ───────────────────────────────────────── report ────────────

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The cursor ran past the last file.
    Completed,
    /// The operator pressed a quit key.
    Quit,
    /// The operator declined to delete a file the session could not show.
    Declined,
}

/// Summary returned by [`TriageEngine::run`].
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub end: SessionEnd,
    /// Distinct files kept and still in the source.
    pub kept: usize,
    pub moved: BTreeMap<Category, usize>,
    /// Files deleted on operator request (including collision deletes).
    pub deleted: usize,
    /// Files rejected by the type filter, decoder or display and deleted.
    pub rejected: usize,
    pub skipped_dirs: usize,
    /// Entries still in the active set when the session ended.
    pub remaining: usize,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
}

impl SessionReport {
    pub fn moved_total(&self) -> usize {
        self.moved.values().sum()
    }
}

#[derive(Debug, Default)]
struct Tally {
    /// Files currently kept.  A file revisited with Back/Restart and kept
    /// again is still one file; one kept and later deleted or moved is
    /// dropped from here.
    kept: HashSet<PathBuf>,
    moved: BTreeMap<Category, usize>,
    deleted: usize,
    rejected: usize,
    skipped_dirs: usize,
    /// Distinct files disposed of so far; drives the milestone notice.
    settled: HashSet<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    Running,
    Exiting(SessionEnd),
}

// ───────────────────────────────────────── engine ────────────

pub struct TriageEngine {
    source: PathBuf,
    /// Leaf name of the source directory, used in window titles.
    source_label: String,
    files: ActiveFileSet,
    targets: ClassificationTargets,
    allowed: ExtensionAllowList,
    bindings: KeyBindings,
    milestone_interval: usize,
    display_size: DisplaySize,
    tally: Tally,
}

impl TriageEngine {
    /// Validate the source, create the destination directories, and list
    /// the source.  Nothing is touched if the source is unusable.
    pub fn new(options: EngineOptions) -> Result<Self, PathError> {
        fs::check_source_dir(&options.source)?;
        for (_, dir) in options.targets.iter() {
            if fs::same_dir(dir, &options.source) {
                return Err(PathError::DestinationIsSource {
                    path: dir.to_path_buf(),
                });
            }
        }
        for (category, dir) in options.targets.iter() {
            fs::ensure_dir(dir)?;
            tracing::debug!("destination for {:?}: {}", category, dir.display());
        }
        let names = fs::list_sorted(&options.source)?;
        tracing::info!(
            "{} entries to triage in {}",
            names.len(),
            options.source.display()
        );

        let source_label = options
            .source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| options.source.display().to_string());

        Ok(Self {
            source: options.source,
            source_label,
            files: ActiveFileSet::new(names),
            targets: options.targets,
            allowed: options.allowed,
            bindings: options.bindings,
            milestone_interval: options.milestone_interval,
            display_size: options.display_size,
            tally: Tally::default(),
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn files(&self) -> &ActiveFileSet {
        &self.files
    }

    pub fn targets(&self) -> &ClassificationTargets {
        &self.targets
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    /// Run the loop until the list is exhausted or the session exits.
    /// All windows are closed on return, error or not.
    pub fn run<S: Viewer + Prompt>(&mut self, io: &mut S) -> Result<SessionReport, TriageError> {
        let started_at = Local::now();
        let result = self.drive(io);
        io.close_all_windows();
        let end = result?;

        let tally = std::mem::take(&mut self.tally);
        tracing::info!(
            "session ended ({:?}): kept={} moved={} deleted={} rejected={} remaining={}",
            end,
            tally.kept.len(),
            tally.moved.values().sum::<usize>(),
            tally.deleted,
            tally.rejected,
            self.files.len()
        );
        Ok(SessionReport {
            end,
            kept: tally.kept.len(),
            moved: tally.moved,
            deleted: tally.deleted,
            rejected: tally.rejected,
            skipped_dirs: tally.skipped_dirs,
            remaining: self.files.len(),
            started_at,
            finished_at: Local::now(),
        })
    }

    fn drive<S: Viewer + Prompt>(&mut self, io: &mut S) -> Result<SessionEnd, TriageError> {
        while !self.files.is_exhausted() {
            let Some(name) = self.files.current().map(Path::to_path_buf) else {
                break;
            };
            if let EngineState::Exiting(end) = self.step(io, &name)? {
                return Ok(end);
            }
        }
        Ok(SessionEnd::Completed)
    }

    /// One turn of the loop for the entry `name` under the cursor.
    fn step<S: Viewer + Prompt>(
        &mut self,
        io: &mut S,
        name: &Path,
    ) -> Result<EngineState, TriageError> {
        let path = self.source.join(name);
        let meta = match EntryMeta::from_path(&path) {
            Ok(m) => m,
            Err(e) => {
                // Gone since the listing (or unreadable): never act on it.
                tracing::warn!("dropping {} from the session: {e}", path.display());
                self.files.remove_current();
                return Ok(EngineState::Running);
            }
        };

        if meta.is_dir {
            io.notify(&format!("{} is a directory.", meta.name));
            self.tally.skipped_dirs += 1;
            self.files.advance();
            return Ok(EngineState::Running);
        }

        // ── type / extension filter ─────────────────────────────
        let signature = io.is_image_file(&path);
        if !signature.is_image() {
            let reason = match signature {
                Signature::Unknown => "could not be identified".to_string(),
                _ => "is not an image".to_string(),
            };
            return Ok(self.reject(io, &meta, &reason));
        }
        if !self.allowed.allows_path(&meta.path) {
            let reason = match meta.extension.as_deref() {
                Some(ext) => format!("is '{ext}', which is not an accepted extension"),
                None => "has no extension".to_string(),
            };
            return Ok(self.reject(io, &meta, &reason));
        }

        // ── decode + display ────────────────────────────────────
        let image = match io.load_image(&path) {
            Ok(img) => img,
            Err(e) => return Ok(self.reject(io, &meta, &format!("could not be loaded ({})", e.reason))),
        };
        let title = format!("{} - {}", self.source_label, meta.name);
        let window = match io.show_image(image, &title, self.display_size) {
            Ok(w) => w,
            Err(e) => return Ok(self.reject(io, &meta, &format!("could not be shown ({})", e.reason))),
        };

        // ── wait for a bound key ────────────────────────────────
        let action = match self.await_action(io) {
            Ok(a) => a,
            Err(e) => {
                io.close_window(window);
                return Err(e.into());
            }
        };
        io.close_window(window);
        tracing::debug!("{}: {:?}", meta.name, action);

        Ok(self.apply(io, action, name, &meta))
    }

    /// Block until a key bound to an offered action arrives.
    fn await_action<S: Viewer>(&self, io: &mut S) -> io::Result<Action> {
        loop {
            let key = io.wait_key()?;
            match self.bindings.match_key(key) {
                Some(Action::MoveTo(category)) if self.targets.get(category).is_none() => {
                    tracing::debug!("no destination configured for {:?}", category);
                }
                Some(action) => return Ok(action),
                None => tracing::trace!("unbound key {:?}", key.code),
            }
        }
    }

    fn apply<P: Prompt>(
        &mut self,
        io: &mut P,
        action: Action,
        name: &Path,
        meta: &EntryMeta,
    ) -> EngineState {
        match action {
            Action::Quit => return EngineState::Exiting(SessionEnd::Quit),
            Action::Keep => {
                self.tally.kept.insert(meta.path.clone());
                self.files.advance();
                self.settle(io, &meta.path);
            }
            Action::Back => self.files.back(),
            Action::Restart => self.files.restart(),
            Action::Delete => {
                if self.delete_current(io, meta) {
                    self.tally.deleted += 1;
                }
            }
            Action::MoveTo(category) => self.move_current(io, category, name, meta),
        }
        EngineState::Running
    }

    fn move_current<P: Prompt>(
        &mut self,
        io: &mut P,
        category: Category,
        name: &Path,
        meta: &EntryMeta,
    ) {
        let Some(dir) = self.targets.get(category).map(Path::to_path_buf) else {
            self.files.advance();
            return;
        };
        let dir_label = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.display().to_string());

        if dir.join(name).symlink_metadata().is_ok() {
            let question = format!(
                "{} already exists in '{dir_label}'.\nDelete the source file instead?",
                meta.name
            );
            match io.confirm(&question) {
                Confirmation::Proceed => {
                    if self.delete_current(io, meta) {
                        self.tally.deleted += 1;
                    }
                }
                Confirmation::Abort => {
                    io.notify(&format!("Left {} in place.", meta.name));
                    self.files.advance();
                }
            }
            return;
        }

        match fs::move_into(&meta.path, &dir) {
            Ok(dest) => {
                tracing::info!("moved {} -> {}", meta.path.display(), dest.display());
                self.files.remove_current();
                *self.tally.moved.entry(category).or_default() += 1;
                io.notify(&format!("File moved to '{dir_label}'."));
                self.tally.kept.remove(&meta.path);
                self.settle(io, &meta.path);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound && !meta.path.exists() => {
                tracing::warn!("{} vanished before it could be moved", meta.path.display());
                self.files.remove_current();
            }
            Err(e) => {
                tracing::warn!("failed to move {}: {e}", meta.path.display());
                io.notify(&format!("Could not move {}: {e}", meta.name));
                self.files.advance();
            }
        }
    }

    /// Settle a file that cannot be shown: delete it with consent, or end
    /// the session.
    fn reject<P: Prompt>(&mut self, io: &mut P, meta: &EntryMeta, reason: &str) -> EngineState {
        tracing::warn!("{} {reason}", meta.path.display());
        let question = format!("{} {reason}.\nDelete file?", meta.name);
        match io.confirm(&question) {
            Confirmation::Proceed => {
                if self.delete_current(io, meta) {
                    self.tally.rejected += 1;
                }
                EngineState::Running
            }
            Confirmation::Abort => {
                io.notify("Exiting...");
                EngineState::Exiting(SessionEnd::Declined)
            }
        }
    }

    /// Delete the file under the cursor and drop it from the set.  On
    /// failure the file stays and the cursor moves past it.
    fn delete_current<P: Prompt>(&mut self, io: &mut P, meta: &EntryMeta) -> bool {
        match std::fs::remove_file(&meta.path) {
            Ok(()) => {
                tracing::info!("deleted {}", meta.path.display());
                self.files.remove_current();
                io.notify("File deleted.");
                self.tally.kept.remove(&meta.path);
                self.settle(io, &meta.path);
                true
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!("{} was already gone", meta.path.display());
                self.files.remove_current();
                false
            }
            Err(e) => {
                tracing::warn!("failed to delete {}: {e}", meta.path.display());
                io.notify(&format!("Could not delete {}: {e}", meta.name));
                self.files.advance();
                false
            }
        }
    }

    /// Record that `path` has been disposed of and emit the milestone
    /// notice when due.  Files already counted are not counted again.
    fn settle<P: Prompt>(&mut self, io: &mut P, path: &Path) {
        if !self.tally.settled.insert(path.to_path_buf()) {
            return;
        }
        let n = self.tally.settled.len();
        if self.milestone_interval > 0 && n % self.milestone_interval == 0 {
            tracing::info!("milestone: {n} files processed");
            io.notify(&format!("Milestone! You are at -> {n} <- images."));
        }
    }
}
