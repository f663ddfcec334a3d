// End-to-end tests for the triage loop.
//
// These run the real engine against real temporary directories and real PNG
// files.  Only the screen and keyboard are replaced, by a scripted console
// that replays key presses and yes/no answers and records what the engine
// showed and asked.

use std::collections::{HashSet, VecDeque};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use image_triage::config::DisplaySize;
use image_triage::core::rules::{Category, ClassificationTargets, ExtensionAllowList};
use image_triage::core::signature::{self, Signature};
use image_triage::{
    Confirmation, DecodeError, DisplayError, EngineOptions, PathError, Prompt, SessionEnd,
    TriageEngine, Viewer,
};

// =============================================================================
// Scripted console
// =============================================================================

#[derive(Default)]
struct Script {
    keys: VecDeque<KeyEvent>,
    answers: VecDeque<Confirmation>,
    decode_fail: HashSet<String>,
    display_fail: HashSet<String>,
    /// When the named file is shown, delete the given path behind the
    /// engine's back.
    vanish_on_show: Vec<(String, PathBuf)>,

    shown: Vec<String>,
    questions: Vec<String>,
    notices: Vec<String>,
    open: HashSet<u64>,
    next_window: u64,
    close_all_calls: usize,
}

impl Script {
    fn keys(mut self, keys: &[KeyEvent]) -> Self {
        self.keys.extend(keys.iter().copied());
        self
    }

    fn answers(mut self, answers: &[Confirmation]) -> Self {
        self.answers.extend(answers.iter().copied());
        self
    }

    fn file_name(path: &Path) -> String {
        path.file_name().unwrap().to_string_lossy().into_owned()
    }
}

impl Viewer for Script {
    type Image = String;
    type Window = u64;

    fn is_image_file(&mut self, path: &Path) -> Signature {
        signature::sniff(path)
    }

    fn load_image(&mut self, path: &Path) -> Result<String, DecodeError> {
        let name = Self::file_name(path);
        if self.decode_fail.contains(&name) {
            return Err(DecodeError {
                path: path.to_path_buf(),
                reason: "truncated data".into(),
            });
        }
        Ok(name)
    }

    fn show_image(
        &mut self,
        image: String,
        title: &str,
        _size: DisplaySize,
    ) -> Result<u64, DisplayError> {
        if self.display_fail.contains(&image) {
            return Err(DisplayError {
                title: title.to_string(),
                reason: "no display".into(),
            });
        }
        for (trigger, victim) in &self.vanish_on_show {
            if *trigger == image {
                let _ = fs::remove_file(victim);
            }
        }
        self.shown.push(title.to_string());
        let id = self.next_window;
        self.next_window += 1;
        self.open.insert(id);
        Ok(id)
    }

    fn wait_key(&mut self) -> io::Result<KeyEvent> {
        self.keys
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "script ran out of keys"))
    }

    fn close_window(&mut self, window: u64) {
        self.open.remove(&window);
    }

    fn close_all_windows(&mut self) {
        self.close_all_calls += 1;
        self.open.clear();
    }
}

impl Prompt for Script {
    fn confirm(&mut self, question: &str) -> Confirmation {
        self.questions.push(question.to_string());
        self.answers.pop_front().unwrap_or(Confirmation::Abort)
    }

    fn notify(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn key(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
}

fn esc() -> KeyEvent {
    KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)
}

/// A workspace with `src/` plus destination dirs `wrong/` and `anno/`
/// (not yet created).
struct Workspace {
    _tmp: tempfile::TempDir,
    src: PathBuf,
    wrong: PathBuf,
    anno: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("cats");
        fs::create_dir(&src).unwrap();
        Self {
            wrong: tmp.path().join("wrong"),
            anno: tmp.path().join("anno"),
            src,
            _tmp: tmp,
        }
    }

    /// Write a real (tiny) PNG under `name`, whatever its extension.
    fn image(&self, name: &str) -> &Self {
        image::RgbImage::new(2, 2)
            .save_with_format(self.src.join(name), image::ImageFormat::Png)
            .unwrap();
        self
    }

    fn text(&self, name: &str) -> &Self {
        fs::write(self.src.join(name), "not an image").unwrap();
        self
    }

    fn options(&self) -> EngineOptions {
        let mut o = EngineOptions::new(&self.src);
        o.targets = ClassificationTargets::new()
            .with(Category::Reclassify, &self.wrong)
            .with(Category::Annotate, &self.anno);
        o
    }

    fn engine(&self) -> TriageEngine {
        TriageEngine::new(self.options()).unwrap()
    }

    fn on_disk(&self, dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

fn names(engine: &TriageEngine) -> Vec<String> {
    engine
        .files()
        .entries()
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect()
}

// =============================================================================
// Initialization
// =============================================================================

#[test]
fn init_lists_sorted_entries_and_creates_empty_destinations() {
    let ws = Workspace::new();
    ws.image("c.png").image("a.png").text("b.txt");

    let engine = ws.engine();

    assert_eq!(names(&engine), vec!["a.png", "b.txt", "c.png"]);
    assert_eq!(engine.files().cursor(), 0);
    assert!(ws.wrong.is_dir() && ws.anno.is_dir());
    assert!(ws.on_disk(&ws.wrong).is_empty());
    assert!(ws.on_disk(&ws.anno).is_empty());
}

#[test]
fn init_is_idempotent_when_destinations_exist() {
    let ws = Workspace::new();
    ws.image("a.png");
    fs::create_dir_all(&ws.wrong).unwrap();
    fs::write(ws.wrong.join("old.png"), b"x").unwrap();

    let engine = ws.engine();
    assert_eq!(names(&engine), vec!["a.png"]);
    assert_eq!(ws.on_disk(&ws.wrong), vec!["old.png"]);
}

#[test]
fn missing_source_fails_before_creating_anything() {
    let ws = Workspace::new();
    let mut options = ws.options();
    options.source = ws.src.join("does-not-exist");

    let err = TriageEngine::new(options).err().expect("expected a path error");
    assert!(matches!(err, PathError::Missing { .. }), "got {err:?}");
    assert!(!ws.wrong.exists());
    assert!(!ws.anno.exists());
}

#[test]
fn destination_equal_to_source_is_refused() {
    let ws = Workspace::new();
    ws.image("a.png");
    let mut options = ws.options();
    options.targets = ClassificationTargets::new()
        .with(Category::Reclassify, ws.src.join("."))
        .with(Category::Annotate, &ws.anno);

    let err = TriageEngine::new(options).err().expect("expected a path error");
    assert!(matches!(err, PathError::DestinationIsSource { .. }), "got {err:?}");
    assert!(!ws.anno.exists());
    assert_eq!(ws.on_disk(&ws.src), vec!["a.png"]);
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn non_image_is_rejected_confirmed_and_deleted() {
    let ws = Workspace::new();
    ws.image("a.jpg").text("b.txt").image("c.png");
    let mut options = ws.options();
    options.allowed = ExtensionAllowList::new([".jpg", ".png"]);
    let mut engine = TriageEngine::new(options).unwrap();

    let mut script = Script::default()
        .keys(&[key('s'), key('s')])
        .answers(&[Confirmation::Proceed]);
    let report = engine.run(&mut script).unwrap();

    assert_eq!(report.end, SessionEnd::Completed);
    assert_eq!(report.rejected, 1);
    assert_eq!(names(&engine), vec!["a.jpg", "c.png"]);
    assert_eq!(ws.on_disk(&ws.src), vec!["a.jpg", "c.png"]);
    assert_eq!(script.questions.len(), 1);
    assert!(script.questions[0].contains("b.txt"), "{:?}", script.questions);
    assert_eq!(script.shown, vec!["cats - a.jpg", "cats - c.png"]);
}

#[test]
fn declining_a_rejection_ends_the_session_untouched() {
    let ws = Workspace::new();
    ws.image("a.png").text("b.png").image("c.png");
    let mut engine = ws.engine();

    let mut script = Script::default()
        .keys(&[key('s')])
        .answers(&[Confirmation::Abort]);
    let report = engine.run(&mut script).unwrap();

    assert_eq!(report.end, SessionEnd::Declined);
    assert_eq!(ws.on_disk(&ws.src), vec!["a.png", "b.png", "c.png"]);
    assert_eq!(script.shown, vec!["cats - a.png"]);
    assert_eq!(engine.files().cursor(), 1);
}

#[test]
fn wrong_extension_is_rejected_even_for_real_images() {
    let ws = Workspace::new();
    ws.image("a.gif");
    let mut engine = ws.engine();

    let mut script = Script::default().answers(&[Confirmation::Proceed]);
    let report = engine.run(&mut script).unwrap();

    assert_eq!(report.rejected, 1);
    assert!(script.questions[0].contains(".gif"));
    assert!(ws.on_disk(&ws.src).is_empty());
}

#[test]
fn extension_check_ignores_case() {
    let ws = Workspace::new();
    ws.image("A.PNG");
    let mut engine = ws.engine();

    let mut script = Script::default().keys(&[key('s')]);
    let report = engine.run(&mut script).unwrap();

    assert_eq!(report.kept, 1);
    assert!(script.questions.is_empty());
}

#[test]
fn keeping_everything_changes_nothing() {
    let ws = Workspace::new();
    ws.image("a.png").image("b.png").image("c.png");
    let mut engine = ws.engine();

    let mut script = Script::default().keys(&[key('s'), key('s'), key('s')]);
    let report = engine.run(&mut script).unwrap();

    assert_eq!(report.end, SessionEnd::Completed);
    assert_eq!(report.kept, 3);
    assert_eq!(names(&engine), vec!["a.png", "b.png", "c.png"]);
    assert_eq!(engine.files().cursor(), engine.files().len());
    assert_eq!(ws.on_disk(&ws.src), vec!["a.png", "b.png", "c.png"]);
    assert!(ws.on_disk(&ws.wrong).is_empty());
    assert!(ws.on_disk(&ws.anno).is_empty());
}

#[test]
fn quitting_on_the_second_file_keeps_earlier_work() {
    let ws = Workspace::new();
    ws.image("a.png").image("b.png").image("c.png");
    let mut engine = ws.engine();

    let mut script = Script::default().keys(&[key('d'), esc()]);
    let report = engine.run(&mut script).unwrap();

    assert_eq!(report.end, SessionEnd::Quit);
    assert_eq!(report.deleted, 1);
    assert_eq!(report.remaining, 2);
    assert_eq!(ws.on_disk(&ws.src), vec!["b.png", "c.png"]);
    assert_eq!(script.shown, vec!["cats - a.png", "cats - b.png"]);
}

#[test]
fn ctrl_c_quits_too() {
    let ws = Workspace::new();
    ws.image("a.png");
    let mut engine = ws.engine();

    let mut script =
        Script::default().keys(&[KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)]);
    assert_eq!(engine.run(&mut script).unwrap().end, SessionEnd::Quit);
}

// =============================================================================
// Moves, deletes, collisions
// =============================================================================

#[test]
fn moved_and_deleted_files_leave_source_and_set() {
    let ws = Workspace::new();
    ws.image("a.png").image("b.png").image("c.png");
    let mut engine = ws.engine();

    let mut script = Script::default().keys(&[key('m'), key('a'), key('x')]);
    let report = engine.run(&mut script).unwrap();

    assert_eq!(report.end, SessionEnd::Completed);
    assert!(engine.files().is_empty());
    assert!(ws.on_disk(&ws.src).is_empty());
    assert_eq!(ws.on_disk(&ws.wrong), vec!["a.png"]);
    assert_eq!(ws.on_disk(&ws.anno), vec!["b.png"]);
    assert_eq!(report.moved.get(&Category::Reclassify), Some(&1));
    assert_eq!(report.moved.get(&Category::Annotate), Some(&1));
    assert_eq!(report.moved_total(), 2);
    assert_eq!(report.deleted, 1);
    assert!(script.notices.iter().any(|n| n == "File moved to 'wrong'."));
}

#[test]
fn collision_declined_leaves_both_files_and_advances() {
    let ws = Workspace::new();
    ws.image("a.png").image("b.png");
    fs::create_dir_all(&ws.wrong).unwrap();
    fs::write(ws.wrong.join("a.png"), b"old").unwrap();
    let mut engine = ws.engine();

    let mut script = Script::default()
        .keys(&[key('m'), key('s')])
        .answers(&[Confirmation::Abort]);
    let report = engine.run(&mut script).unwrap();

    assert_eq!(report.end, SessionEnd::Completed);
    assert_eq!(fs::read(ws.wrong.join("a.png")).unwrap(), b"old");
    assert_eq!(ws.on_disk(&ws.src), vec!["a.png", "b.png"]);
    assert_eq!(names(&engine), vec!["a.png", "b.png"]);
    assert_eq!(script.shown, vec!["cats - a.png", "cats - b.png"]);
    assert!(script.questions[0].contains("already exists in 'wrong'"));
}

#[test]
fn collision_confirmed_deletes_only_the_source() {
    let ws = Workspace::new();
    ws.image("a.png");
    fs::create_dir_all(&ws.anno).unwrap();
    fs::write(ws.anno.join("a.png"), b"old").unwrap();
    let mut engine = ws.engine();

    let mut script = Script::default()
        .keys(&[key('a')])
        .answers(&[Confirmation::Proceed]);
    let report = engine.run(&mut script).unwrap();

    assert_eq!(report.deleted, 1);
    assert_eq!(report.moved_total(), 0);
    assert!(ws.on_disk(&ws.src).is_empty());
    assert_eq!(fs::read(ws.anno.join("a.png")).unwrap(), b"old");
}

#[test]
fn unconfigured_category_key_is_ignored() {
    let ws = Workspace::new();
    ws.image("a.png");
    let mut options = ws.options();
    options.targets = ClassificationTargets::new().with(Category::Reclassify, &ws.wrong);
    let mut engine = TriageEngine::new(options).unwrap();

    let mut script = Script::default().keys(&[key('a'), key('s')]);
    let report = engine.run(&mut script).unwrap();

    assert_eq!(report.kept, 1);
    assert!(!ws.anno.exists());
    assert_eq!(script.shown.len(), 1);
}

#[test]
fn failed_move_leaves_the_file_and_advances() {
    let ws = Workspace::new();
    ws.image("a.png").image("b.png");
    let mut engine = ws.engine();
    fs::remove_dir(&ws.wrong).unwrap();

    let mut script = Script::default().keys(&[key('m'), key('s')]);
    let report = engine.run(&mut script).unwrap();

    assert_eq!(report.end, SessionEnd::Completed);
    assert_eq!(report.moved_total(), 0);
    assert_eq!(ws.on_disk(&ws.src), vec!["a.png", "b.png"]);
    assert_eq!(names(&engine), vec!["a.png", "b.png"]);
    assert_eq!(script.shown, vec!["cats - a.png", "cats - b.png"]);
    assert!(
        script.notices.iter().any(|n| n.starts_with("Could not move a.png")),
        "{:?}",
        script.notices
    );
}

// =============================================================================
// Navigation
// =============================================================================

#[test]
fn back_clamps_and_restart_rewinds() {
    let ws = Workspace::new();
    ws.image("a.png").image("b.png");
    let mut engine = ws.engine();

    let mut script = Script::default().keys(&[
        key('b'), // at a: no-op
        key('s'),
        key('b'), // back to a
        key('s'),
        key('0'), // restart at a
        key('s'),
        key('s'),
    ]);
    let report = engine.run(&mut script).unwrap();

    assert_eq!(report.end, SessionEnd::Completed);
    let shown: Vec<_> = script.shown.iter().map(|t| t.trim_start_matches("cats - ")).collect();
    assert_eq!(shown, vec!["a.png", "a.png", "b.png", "a.png", "b.png", "a.png", "b.png"]);
    assert_eq!(ws.on_disk(&ws.src), vec!["a.png", "b.png"]);
}

#[test]
fn unbound_keys_are_ignored() {
    let ws = Workspace::new();
    ws.image("a.png");
    let mut engine = ws.engine();

    let mut script = Script::default().keys(&[key('q'), key('z'), key('S'), key('s')]);
    let report = engine.run(&mut script).unwrap();

    assert_eq!(report.kept, 1);
    assert_eq!(script.shown.len(), 1);
}

#[test]
fn directories_are_skipped_not_deleted() {
    let ws = Workspace::new();
    ws.image("b.png");
    fs::create_dir(ws.src.join("a_dir")).unwrap();
    let mut engine = ws.engine();

    let mut script = Script::default().keys(&[key('s')]);
    let report = engine.run(&mut script).unwrap();

    assert_eq!(report.skipped_dirs, 1);
    assert!(ws.src.join("a_dir").is_dir());
    assert!(script.questions.is_empty());
    assert_eq!(names(&engine), vec!["a_dir", "b.png"]);
}

#[test]
fn file_removed_behind_the_engines_back_is_dropped() {
    let ws = Workspace::new();
    ws.image("a.png").image("b.png").image("c.png");
    let mut engine = ws.engine();

    let mut script = Script::default().keys(&[key('s'), key('s')]);
    script.vanish_on_show = vec![("a.png".into(), ws.src.join("b.png"))];
    let report = engine.run(&mut script).unwrap();

    assert_eq!(report.end, SessionEnd::Completed);
    assert_eq!(names(&engine), vec!["a.png", "c.png"]);
    assert!(script.questions.is_empty());
}

// =============================================================================
// Decode / display failures and resource release
// =============================================================================

#[test]
fn decode_failure_prompts_then_deletes() {
    let ws = Workspace::new();
    ws.image("a.png").image("b.png");
    let mut engine = ws.engine();

    let mut script = Script::default()
        .keys(&[key('s')])
        .answers(&[Confirmation::Proceed]);
    script.decode_fail.insert("a.png".into());
    let report = engine.run(&mut script).unwrap();

    assert_eq!(report.rejected, 1);
    assert_eq!(ws.on_disk(&ws.src), vec!["b.png"]);
    assert!(script.questions[0].contains("could not be loaded"));
}

#[test]
fn display_failure_declined_exits_without_deleting() {
    let ws = Workspace::new();
    ws.image("a.png");
    let mut engine = ws.engine();

    let mut script = Script::default().answers(&[Confirmation::Abort]);
    script.display_fail.insert("a.png".into());
    let report = engine.run(&mut script).unwrap();

    assert_eq!(report.end, SessionEnd::Declined);
    assert_eq!(ws.on_disk(&ws.src), vec!["a.png"]);
}

#[test]
fn every_window_is_closed() {
    let ws = Workspace::new();
    ws.image("a.png").image("b.png").image("c.png").image("d.png");
    fs::create_dir_all(&ws.wrong).unwrap();
    fs::write(ws.wrong.join("b.png"), b"old").unwrap();
    let mut engine = ws.engine();

    let mut script = Script::default()
        .keys(&[key('s'), key('m'), key('d'), key('b'), esc()])
        .answers(&[Confirmation::Abort]);
    engine.run(&mut script).unwrap();

    assert_eq!(script.next_window, 5);
    assert!(script.open.is_empty());
    assert_eq!(script.close_all_calls, 1);
}

#[test]
fn running_out_of_input_is_an_error_but_still_closes_windows() {
    let ws = Workspace::new();
    ws.image("a.png");
    let mut engine = ws.engine();

    let mut script = Script::default();
    assert!(engine.run(&mut script).is_err());
    assert!(script.open.is_empty());
    assert_eq!(script.close_all_calls, 1);
    assert_eq!(ws.on_disk(&ws.src), vec!["a.png"]);
}

// =============================================================================
// Progress
// =============================================================================

#[test]
fn milestone_notice_every_n_files() {
    let ws = Workspace::new();
    for name in ["a.png", "b.png", "c.png", "d.png", "e.png"] {
        ws.image(name);
    }
    let mut options = ws.options();
    options.milestone_interval = 2;
    let mut engine = TriageEngine::new(options).unwrap();

    let mut script = Script::default().keys(&[key('s'); 5]);
    engine.run(&mut script).unwrap();

    let milestones: Vec<_> = script
        .notices
        .iter()
        .filter(|n| n.starts_with("Milestone"))
        .collect();
    assert_eq!(milestones.len(), 2);
    assert!(milestones[1].contains("-> 4 <-"));
}

#[test]
fn revisited_files_are_counted_once() {
    let ws = Workspace::new();
    ws.image("a.png").image("b.png");
    let mut options = ws.options();
    options.milestone_interval = 1;
    let mut engine = TriageEngine::new(options).unwrap();

    let mut script =
        Script::default().keys(&[key('s'), key('b'), key('s'), key('b'), key('s'), key('s')]);
    let report = engine.run(&mut script).unwrap();

    assert_eq!(report.kept, 2);
    assert_eq!(report.remaining, 2);
    let milestones: Vec<_> = script
        .notices
        .iter()
        .filter(|n| n.starts_with("Milestone"))
        .collect();
    assert_eq!(milestones.len(), 2);
    assert!(milestones[1].contains("-> 2 <-"));
}

#[test]
fn keeping_then_deleting_counts_the_file_once() {
    let ws = Workspace::new();
    ws.image("a.png").image("b.png");
    let mut options = ws.options();
    options.milestone_interval = 1;
    let mut engine = TriageEngine::new(options).unwrap();

    // keep a, back to a, delete a, keep b
    let mut script = Script::default().keys(&[key('s'), key('b'), key('d'), key('s')]);
    let report = engine.run(&mut script).unwrap();

    assert_eq!(report.kept, 1);
    assert_eq!(report.deleted, 1);
    assert_eq!(ws.on_disk(&ws.src), vec!["b.png"]);
    assert_eq!(
        script.notices.iter().filter(|n| n.starts_with("Milestone")).count(),
        2
    );
}

#[test]
fn milestone_zero_disables_notices() {
    let ws = Workspace::new();
    ws.image("a.png").image("b.png");
    let mut options = ws.options();
    options.milestone_interval = 0;
    let mut engine = TriageEngine::new(options).unwrap();

    let mut script = Script::default().keys(&[key('s'), key('s')]);
    engine.run(&mut script).unwrap();
    assert!(!script.notices.iter().any(|n| n.starts_with("Milestone")));
}
