//! Debounced live editing of the two script sources.
//!
//! Raw edit events (every keystroke, every file save) land in a pending
//! buffer; only after a quiet period does the pending text become a committed
//! source that the simulation recompiles against. The init and update sources
//! debounce independently. All timer state is explicit and owned here, so
//! disposing the controller cancels everything outstanding.

use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Quiet period before an edit is committed.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(3000);

#[derive(Debug, Default)]
struct Pending {
    text: Option<String>,
    deadline: Option<Instant>,
}

impl Pending {
    fn edit(&mut self, text: String, deadline: Instant) {
        self.text = Some(text);
        self.deadline = Some(deadline);
    }

    fn poll(&mut self, now: Instant) -> Option<String> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.text.take()
            }
            _ => None,
        }
    }

    fn cancel(&mut self) {
        self.text = None;
        self.deadline = None;
    }
}

/// Sources that finished their quiet period in one poll.
#[derive(Debug, Default, PartialEq)]
pub struct Committed {
    pub init: Option<String>,
    pub update: Option<String>,
}

impl Committed {
    pub fn is_empty(&self) -> bool {
        self.init.is_none() && self.update.is_none()
    }
}

/// Debounce controller for the init and update source buffers.
#[derive(Debug)]
pub struct LiveEdit {
    delay: Duration,
    init: Pending,
    update: Pending,
}

impl LiveEdit {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            init: Pending::default(),
            update: Pending::default(),
        }
    }

    /// Record a raw edit to the init source; restarts its quiet period.
    pub fn edit_init(&mut self, text: impl Into<String>, now: Instant) {
        self.init.edit(text.into(), now + self.delay);
    }

    /// Record a raw edit to the update source; restarts its quiet period.
    pub fn edit_update(&mut self, text: impl Into<String>, now: Instant) {
        self.update.edit(text.into(), now + self.delay);
    }

    /// Collect sources whose quiet period has elapsed. Each committed source
    /// is yielded exactly once, carrying the text of the last edit.
    pub fn poll(&mut self, now: Instant) -> Committed {
        Committed {
            init: self.init.poll(now),
            update: self.update.poll(now),
        }
    }

    /// Drop all pending edits (teardown path).
    pub fn cancel(&mut self) {
        self.init.cancel();
        self.update.cancel();
    }

    pub fn has_pending(&self) -> bool {
        self.init.deadline.is_some() || self.update.deadline.is_some()
    }
}

impl Default for LiveEdit {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

/// Contents read from the watched script files in one poll.
#[derive(Debug, Default)]
pub struct FileEdits {
    pub init: Option<String>,
    pub update: Option<String>,
}

/// Polls two script files and reports changed contents as raw edit events.
///
/// This is the demo binary's stand-in for a textarea: save the file and the
/// new text flows through the same debounce as any other edit. Read failures
/// (file mid-save, editor swap files) are skipped silently and retried on the
/// next poll.
#[derive(Debug)]
pub struct ScriptFiles {
    init_path: Option<PathBuf>,
    update_path: Option<PathBuf>,
    poll_interval: Duration,
    next_poll: Option<Instant>,
    last_init: Option<String>,
    last_update: Option<String>,
}

impl ScriptFiles {
    /// Watch the given paths, baselining on their current contents.
    pub fn new(init_path: Option<PathBuf>, update_path: Option<PathBuf>) -> Self {
        let last_init = init_path.as_deref().and_then(|p| std::fs::read_to_string(p).ok());
        let last_update = update_path.as_deref().and_then(|p| std::fs::read_to_string(p).ok());
        Self {
            init_path,
            update_path,
            poll_interval: Duration::from_millis(250),
            next_poll: None,
            last_init,
            last_update,
        }
    }

    /// The contents found at construction, used as the session's starting
    /// sources.
    pub fn baseline(&self) -> (Option<&str>, Option<&str>) {
        (self.last_init.as_deref(), self.last_update.as_deref())
    }

    pub fn watches_anything(&self) -> bool {
        self.init_path.is_some() || self.update_path.is_some()
    }

    /// Re-read the watched files if the poll interval has elapsed and report
    /// any changed contents.
    pub fn poll(&mut self, now: Instant) -> FileEdits {
        match self.next_poll {
            Some(next) if now < next => return FileEdits::default(),
            _ => self.next_poll = Some(now + self.poll_interval),
        }
        FileEdits {
            init: changed(self.init_path.as_deref(), &mut self.last_init),
            update: changed(self.update_path.as_deref(), &mut self.last_update),
        }
    }
}

fn changed(path: Option<&std::path::Path>, last: &mut Option<String>) -> Option<String> {
    let path = path?;
    let text = std::fs::read_to_string(path).ok()?;
    if last.as_deref() == Some(text.as_str()) {
        return None;
    }
    *last = Some(text.clone());
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_no_commit_before_quiet_period() {
        let start = Instant::now();
        let mut edits = LiveEdit::new(ms(3000));
        edits.edit_update("a", start);
        assert!(edits.poll(start + ms(2999)).is_empty());
        assert_eq!(edits.poll(start + ms(3000)).update.as_deref(), Some("a"));
    }

    #[test]
    fn test_rapid_edits_coalesce_to_last_text() {
        let start = Instant::now();
        let mut edits = LiveEdit::new(ms(3000));
        for (i, text) in ["a", "ab", "abc", "abcd"].iter().enumerate() {
            edits.edit_update(*text, start + ms(i as u64 * 500));
        }
        // Mid-edit: nothing commits, the deadline keeps moving.
        assert!(edits.poll(start + ms(3000)).is_empty());
        // One commit, carrying the final text.
        let committed = edits.poll(start + ms(1500 + 3000));
        assert_eq!(committed.update.as_deref(), Some("abcd"));
        assert!(committed.init.is_none());
        // Yielded exactly once.
        assert!(edits.poll(start + ms(10_000)).is_empty());
    }

    #[test]
    fn test_init_and_update_debounce_independently() {
        let start = Instant::now();
        let mut edits = LiveEdit::new(ms(1000));
        edits.edit_init("seed", start);
        edits.edit_update("move", start + ms(800));

        let committed = edits.poll(start + ms(1000));
        assert_eq!(committed.init.as_deref(), Some("seed"));
        assert!(committed.update.is_none());

        let committed = edits.poll(start + ms(1800));
        assert_eq!(committed.update.as_deref(), Some("move"));
    }

    #[test]
    fn test_cancel_drops_pending() {
        let start = Instant::now();
        let mut edits = LiveEdit::new(ms(1000));
        edits.edit_init("seed", start);
        assert!(edits.has_pending());
        edits.cancel();
        assert!(!edits.has_pending());
        assert!(edits.poll(start + ms(5000)).is_empty());
    }

    #[test]
    fn test_script_files_report_changes_once() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("scriptdust_test_{}.rhai", std::process::id()));
        std::fs::write(&path, "one").unwrap();

        let mut files = ScriptFiles::new(Some(path.clone()), None);
        assert_eq!(files.baseline().0, Some("one"));

        let start = Instant::now();
        // Unchanged file: no edit event.
        assert!(files.poll(start).init.is_none());

        std::fs::write(&path, "two").unwrap();
        let edit = files.poll(start + ms(300)).init;
        assert_eq!(edit.as_deref(), Some("two"));
        // Reported once, then quiet again.
        assert!(files.poll(start + ms(600)).init.is_none());

        std::fs::remove_file(&path).ok();
    }
}
