//! The shared editor buffer lifecycle.
//!
//! An [`EditorBuffer`] is a single slot: at most one file is open in it at a
//! time. The open file's live content and pristine snapshot sit behind a
//! mutex shared with the autosave worker, so a foreground edit and a
//! background save never interleave.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use uesh_types::config::EditorSettings;
use uesh_types::error::{Result, UeshError};
use uesh_types::kind::EditorKind;

use crate::autosave::AutosaveWorker;

/// Content an editor buffer can hold.
pub trait BufferContent: Clone + PartialEq + Send + 'static {
    /// Serialization options that travel with the buffer (and autosave).
    type Format: Clone + Default + Send + 'static;

    /// The editor kind this content belongs to.
    const KIND: EditorKind;

    /// Decode the raw contents of a backing file.
    fn decode(bytes: &[u8]) -> Result<Self>;

    /// Encode for writing back to the backing file.
    fn encode(&self, format: &Self::Format) -> Result<Vec<u8>>;

    /// The content of a cleared buffer.
    fn empty() -> Self;

    /// Serialization options implied by a backing file's raw contents,
    /// adopted on open. `None` keeps the buffer's current format.
    fn detect_format(_bytes: &[u8]) -> Option<Self::Format> {
        None
    }
}

/// Autosave configuration of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutosaveSettings {
    pub enabled: bool,
    pub interval: Duration,
}

impl Default for AutosaveSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            interval: Duration::from_secs(60),
        }
    }
}

impl From<&EditorSettings> for AutosaveSettings {
    fn from(settings: &EditorSettings) -> Self {
        Self {
            enabled: settings.autosave,
            interval: settings.autosave_interval(),
        }
    }
}

/// Lifecycle state of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    Closed,
    OpenClean,
    OpenDirty,
}

/// A file currently open in a buffer.
pub(crate) struct OpenFile<C> {
    path: PathBuf,
    stream: File,
    pub(crate) live: C,
    pristine: C,
}

/// State shared between the foreground and the autosave worker.
pub(crate) struct Slot<C: BufferContent> {
    pub(crate) open: Option<OpenFile<C>>,
    pub(crate) format: C::Format,
}

impl<C: BufferContent> Slot<C> {
    /// Write the live content to the backing stream and refresh the snapshot.
    pub(crate) fn save(&mut self, clear_after: bool) -> Result<()> {
        let file = self.open.as_mut().ok_or_else(not_open::<C>)?;
        let bytes = file.live.encode(&self.format)?;
        file.stream.set_len(0)?;
        file.stream.rewind()?;
        file.stream.write_all(&bytes)?;
        file.stream.flush()?;
        file.pristine = file.live.clone();
        if clear_after {
            file.live = C::empty();
        }
        log::debug!(
            "saved {} bytes to {} ({} buffer)",
            bytes.len(),
            file.path.display(),
            C::KIND
        );
        Ok(())
    }
}

/// Lock a slot, recovering the data if a previous holder panicked.
pub(crate) fn lock_slot<C: BufferContent>(slot: &Mutex<Slot<C>>) -> MutexGuard<'_, Slot<C>> {
    slot.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
        log::warn!("{} buffer lock was poisoned; recovering", C::KIND);
        poisoned.into_inner()
    })
}

fn not_open<C: BufferContent>() -> UeshError {
    UeshError::InvalidState(format!("no {} buffer is open", C::KIND))
}

/// A single-slot editor buffer with dirty tracking and optional autosave.
pub struct EditorBuffer<C: BufferContent> {
    slot: Arc<Mutex<Slot<C>>>,
    autosave: AutosaveSettings,
    worker: Option<AutosaveWorker>,
}

impl<C: BufferContent> EditorBuffer<C> {
    /// Create a closed buffer.
    pub fn new(autosave: AutosaveSettings) -> Self {
        Self::with_format(autosave, C::Format::default())
    }

    /// Create a closed buffer with explicit serialization options.
    pub fn with_format(autosave: AutosaveSettings, format: C::Format) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot { open: None, format })),
            autosave,
            worker: None,
        }
    }

    pub fn kind(&self) -> EditorKind {
        C::KIND
    }

    fn lock(&self) -> MutexGuard<'_, Slot<C>> {
        lock_slot(&self.slot)
    }

    /// Open `path`, loading its content as both live and pristine.
    ///
    /// A buffer that is already open is closed first and its unsaved edits
    /// are discarded.
    pub fn open(&mut self, path: &Path) -> Result<()> {
        if self.is_open() {
            log::info!(
                "{} buffer already open; discarding it before opening {}",
                C::KIND,
                path.display()
            );
            self.close()?;
        }

        let mut stream = OpenOptions::new().read(true).write(true).open(path)?;
        let mut bytes = Vec::new();
        stream.read_to_end(&mut bytes)?;
        let content = C::decode(&bytes)?;
        let detected = C::detect_format(&bytes);

        let mut slot = self.lock();
        if let Some(format) = detected {
            slot.format = format;
        }
        slot.open = Some(OpenFile {
            path: path.to_path_buf(),
            stream,
            live: content.clone(),
            pristine: content,
        });
        drop(slot);
        log::info!("opened {} in the {} editor", path.display(), C::KIND);

        self.start_worker();
        Ok(())
    }

    fn start_worker(&mut self) {
        if !self.autosave.enabled {
            return;
        }
        match AutosaveWorker::spawn(Arc::clone(&self.slot), self.autosave.interval) {
            Ok(worker) => self.worker = Some(worker),
            Err(e) => log::warn!("{} autosave disabled: {e}", C::KIND),
        }
    }

    fn stop_worker(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.stop();
        }
    }

    /// Close the buffer, stopping autosave before the stream is released.
    pub fn close(&mut self) -> Result<()> {
        if !self.is_open() {
            return Err(not_open::<C>());
        }
        self.stop_worker();
        let released = self.lock().open.take();
        if let Some(file) = released {
            log::info!("closed {} ({} editor)", file.path.display(), C::KIND);
        }
        Ok(())
    }

    /// Persist the live content. With `clear_after`, the live content is
    /// emptied once the snapshot has been refreshed.
    pub fn save(&self, clear_after: bool) -> Result<()> {
        self.lock().save(clear_after)
    }

    pub fn is_open(&self) -> bool {
        self.lock().open.is_some()
    }

    /// Whether the live content differs from the pristine snapshot.
    /// A closed buffer is never dirty.
    pub fn is_dirty(&self) -> bool {
        self.lock()
            .open
            .as_ref()
            .is_some_and(|f| f.live != f.pristine)
    }

    pub fn state(&self) -> BufferState {
        let slot = self.lock();
        match &slot.open {
            None => BufferState::Closed,
            Some(f) if f.live != f.pristine => BufferState::OpenDirty,
            Some(_) => BufferState::OpenClean,
        }
    }

    /// Path of the open file.
    pub fn path(&self) -> Option<PathBuf> {
        self.lock().open.as_ref().map(|f| f.path.clone())
    }

    /// Run `f` against the live content.
    pub fn read<R>(&self, f: impl FnOnce(&C) -> R) -> Result<R> {
        let slot = self.lock();
        let file = slot.open.as_ref().ok_or_else(not_open::<C>)?;
        Ok(f(&file.live))
    }

    /// A copy of the live content.
    pub fn content(&self) -> Result<C> {
        self.read(C::clone)
    }

    /// Run a mutation against the live content. The mutation must validate
    /// its inputs before touching the content, so an `Err` leaves the
    /// buffer unchanged.
    pub fn mutate<R>(&self, f: impl FnOnce(&mut C) -> Result<R>) -> Result<R> {
        let mut slot = self.lock();
        let file = slot.open.as_mut().ok_or_else(not_open::<C>)?;
        f(&mut file.live)
    }

    /// Replace the live content with an empty one.
    pub fn clear(&self) -> Result<()> {
        self.mutate(|c| {
            *c = C::empty();
            Ok(())
        })
    }

    pub fn format(&self) -> C::Format {
        self.lock().format.clone()
    }

    pub fn set_format(&self, format: C::Format) {
        self.lock().format = format;
    }

    pub fn autosave(&self) -> AutosaveSettings {
        self.autosave
    }

    /// Change the autosave settings, restarting the worker if a file is open.
    pub fn set_autosave(&mut self, settings: AutosaveSettings) {
        self.stop_worker();
        self.autosave = settings;
        if self.is_open() {
            self.start_worker();
        }
    }

    /// Whether an autosave worker is currently running.
    pub fn autosave_running(&self) -> bool {
        self.worker.is_some()
    }
}

impl<C: BufferContent> Drop for EditorBuffer<C> {
    fn drop(&mut self) {
        self.stop_worker();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal content type for lifecycle tests.
    #[derive(Debug, Clone, PartialEq)]
    struct Raw(Vec<u8>);

    impl BufferContent for Raw {
        type Format = ();
        const KIND: EditorKind = EditorKind::Hex;

        fn decode(bytes: &[u8]) -> Result<Self> {
            Ok(Self(bytes.to_vec()))
        }

        fn encode(&self, _format: &()) -> Result<Vec<u8>> {
            Ok(self.0.clone())
        }

        fn empty() -> Self {
            Self(Vec::new())
        }
    }

    fn temp_file(content: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content).unwrap();
        f.flush().unwrap();
        f
    }

    fn buffer() -> EditorBuffer<Raw> {
        EditorBuffer::new(AutosaveSettings::default())
    }

    #[test]
    fn starts_closed() {
        let buf = buffer();
        assert_eq!(buf.state(), BufferState::Closed);
        assert!(!buf.is_dirty());
        assert!(buf.path().is_none());
    }

    #[test]
    fn open_is_clean() {
        let file = temp_file(b"abc");
        let mut buf = buffer();
        buf.open(file.path()).unwrap();
        assert_eq!(buf.state(), BufferState::OpenClean);
        assert_eq!(buf.content().unwrap(), Raw(b"abc".to_vec()));
    }

    #[test]
    fn open_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut buf = buffer();
        let err = buf.open(&dir.path().join("missing.bin")).unwrap_err();
        assert!(matches!(err, UeshError::Io(_)));
        assert!(!buf.is_open());
    }

    #[test]
    fn mutation_makes_dirty_and_save_cleans() {
        let file = temp_file(b"abc");
        let mut buf = buffer();
        buf.open(file.path()).unwrap();
        buf.mutate(|c| {
            c.0.push(b'd');
            Ok(())
        })
        .unwrap();
        assert_eq!(buf.state(), BufferState::OpenDirty);
        buf.save(false).unwrap();
        assert_eq!(buf.state(), BufferState::OpenClean);
        assert_eq!(std::fs::read(file.path()).unwrap(), b"abcd");
    }

    #[test]
    fn save_truncates_shorter_content() {
        let file = temp_file(b"abcdef");
        let mut buf = buffer();
        buf.open(file.path()).unwrap();
        buf.mutate(|c| {
            c.0.truncate(2);
            Ok(())
        })
        .unwrap();
        buf.save(false).unwrap();
        assert_eq!(std::fs::read(file.path()).unwrap(), b"ab");
    }

    #[test]
    fn save_and_clear_empties_live_content() {
        let file = temp_file(b"abc");
        let mut buf = buffer();
        buf.open(file.path()).unwrap();
        buf.save(true).unwrap();
        assert_eq!(buf.content().unwrap(), Raw(Vec::new()));
        assert_eq!(std::fs::read(file.path()).unwrap(), b"abc");
        // The snapshot still holds the saved content.
        assert!(buf.is_dirty());
    }

    #[test]
    fn failed_mutation_leaves_content() {
        let file = temp_file(b"abc");
        let mut buf = buffer();
        buf.open(file.path()).unwrap();
        let result: Result<()> = buf.mutate(|_| Err(UeshError::OutOfRange("nope".into())));
        assert!(result.is_err());
        assert!(!buf.is_dirty());
    }

    #[test]
    fn close_releases_and_requires_open() {
        let file = temp_file(b"abc");
        let mut buf = buffer();
        assert!(matches!(buf.close(), Err(UeshError::InvalidState(_))));
        buf.open(file.path()).unwrap();
        buf.close().unwrap();
        assert_eq!(buf.state(), BufferState::Closed);
        assert!(matches!(buf.content(), Err(UeshError::InvalidState(_))));
        assert!(matches!(buf.save(false), Err(UeshError::InvalidState(_))));
    }

    #[test]
    fn reopening_discards_unsaved_edits() {
        let first = temp_file(b"one");
        let second = temp_file(b"two");
        let mut buf = buffer();
        buf.open(first.path()).unwrap();
        buf.clear().unwrap();
        buf.open(second.path()).unwrap();
        assert_eq!(buf.path().unwrap(), second.path());
        assert!(!buf.is_dirty());
        assert_eq!(std::fs::read(first.path()).unwrap(), b"one");
    }

    #[test]
    fn autosave_worker_follows_open_and_close() {
        let file = temp_file(b"abc");
        let mut buf = EditorBuffer::<Raw>::new(AutosaveSettings {
            enabled: true,
            interval: Duration::from_secs(3600),
        });
        assert!(!buf.autosave_running());
        buf.open(file.path()).unwrap();
        assert!(buf.autosave_running());
        buf.close().unwrap();
        assert!(!buf.autosave_running());
    }

    #[test]
    fn set_autosave_restarts_only_when_open() {
        let file = temp_file(b"abc");
        let mut buf = buffer();
        let on = AutosaveSettings {
            enabled: true,
            interval: Duration::from_secs(3600),
        };
        buf.set_autosave(on);
        assert!(!buf.autosave_running());
        buf.open(file.path()).unwrap();
        assert!(buf.autosave_running());
        buf.set_autosave(AutosaveSettings::default());
        assert!(!buf.autosave_running());
    }
}
