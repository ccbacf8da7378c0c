use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use tracing::{info, warn};
use ulid::Ulid;

use crate::checkout::CheckoutDraft;
use crate::limits::{DEFAULT_DRAFT_COMPACT_THRESHOLD, MAX_DRAFT_SNAPSHOT_BYTES};
use crate::reconcile::CheckoutError;

/// Explicit persistence for in-progress checkouts.
pub trait DraftStore: Send + Sync {
    fn save(&self, draft: &CheckoutDraft) -> Result<(), CheckoutError>;
    fn load(&self, id: Ulid) -> Result<Option<CheckoutDraft>, CheckoutError>;
    fn discard(&self, id: Ulid) -> Result<(), CheckoutError>;
}

fn storage_err(e: io::Error) -> CheckoutError {
    CheckoutError::Storage(e.to_string())
}

// ── In-memory ────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryDraftStore {
    drafts: DashMap<Ulid, CheckoutDraft>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }
}

impl DraftStore for MemoryDraftStore {
    fn save(&self, draft: &CheckoutDraft) -> Result<(), CheckoutError> {
        self.drafts.insert(draft.id, draft.clone());
        Ok(())
    }

    fn load(&self, id: Ulid) -> Result<Option<CheckoutDraft>, CheckoutError> {
        Ok(self.drafts.get(&id).map(|e| e.value().clone()))
    }

    fn discard(&self, id: Ulid) -> Result<(), CheckoutError> {
        self.drafts.remove(&id);
        Ok(())
    }
}

// ── File-backed snapshot log ─────────────────────────────────────

/// Encode a single snapshot to [len][bincode][crc32] format.
/// Returns the number of bytes written.
fn encode_snapshot(writer: &mut impl Write, draft: &CheckoutDraft) -> io::Result<u64> {
    let payload =
        bincode::serialize(draft).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    if payload.len() > MAX_DRAFT_SNAPSHOT_BYTES {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "snapshot too large"));
    }
    let len = payload.len() as u32;
    let crc = crc32fast::hash(&payload);
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(&payload)?;
    writer.write_all(&crc.to_le_bytes())?;
    Ok(8 + u64::from(len))
}

struct Replay {
    snapshots: Vec<CheckoutDraft>,
    /// Byte length of the intact prefix. Anything after it is a torn or corrupt tail.
    valid_len: u64,
}

/// Read every intact snapshot from a draft log.
/// Truncated/corrupt trailing entries are silently discarded.
fn replay(path: &Path) -> io::Result<Replay> {
    let mut replayed = Replay {
        snapshots: Vec::new(),
        valid_len: 0,
    };
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(replayed),
        Err(e) => return Err(e),
    };
    let mut reader = BufReader::new(file);

    loop {
        let mut len_buf = [0u8; 4];
        match reader.read_exact(&mut len_buf) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e),
        }
        let len = u32::from_le_bytes(len_buf) as usize;
        if len > MAX_DRAFT_SNAPSHOT_BYTES {
            break; // garbage length prefix
        }

        let mut payload = vec![0u8; len];
        match reader.read_exact(&mut payload) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break, // truncated
            Err(e) => return Err(e),
        }

        let mut crc_buf = [0u8; 4];
        match reader.read_exact(&mut crc_buf) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break, // truncated
            Err(e) => return Err(e),
        }
        if u32::from_le_bytes(crc_buf) != crc32fast::hash(&payload) {
            break;
        }

        match bincode::deserialize::<CheckoutDraft>(&payload) {
            Ok(draft) => {
                replayed.snapshots.push(draft);
                replayed.valid_len += 8 + len as u64;
            }
            Err(_) => break,
        }
    }

    Ok(replayed)
}

/// Write state of one draft's log. Held under a per-draft lock for the whole save.
#[derive(Default)]
struct DraftLog {
    appends: u64,
    /// Log length after our last successful write. `None` until verified.
    end: Option<u64>,
}

/// One append-only log per draft: `<dir>/<draft id>.draft`.
///
/// Every save appends a full snapshot and fsyncs; load returns the last
/// intact one. A torn tail left by a failed write is cut off before the
/// next append. After `compact_threshold` appends the log is rewritten to
/// hold only the latest snapshot (temp file + rename).
pub struct FileDraftStore {
    dir: PathBuf,
    compact_threshold: u64,
    logs: DashMap<Ulid, Arc<Mutex<DraftLog>>>,
}

impl FileDraftStore {
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            compact_threshold: DEFAULT_DRAFT_COMPACT_THRESHOLD,
            logs: DashMap::new(),
        })
    }

    pub fn with_compact_threshold(mut self, threshold: u64) -> Self {
        self.compact_threshold = threshold.max(1);
        self
    }

    pub fn path_for(&self, id: Ulid) -> PathBuf {
        self.dir.join(format!("{id}.draft"))
    }

    pub fn appends_since_compact(&self, id: Ulid) -> u64 {
        let Some(log) = self.logs.get(&id).map(|e| e.value().clone()) else {
            return 0;
        };
        log.lock().map(|l| l.appends).unwrap_or(0)
    }

    /// Shard guard is released before the caller locks the draft.
    fn log_for(&self, id: Ulid) -> Arc<Mutex<DraftLog>> {
        self.logs.entry(id).or_default().value().clone()
    }

    fn append(path: &Path, draft: &CheckoutDraft) -> io::Result<u64> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = BufWriter::new(file);
        let written = encode_snapshot(&mut writer, draft)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        Ok(written)
    }

    /// Write the latest snapshot to a temp file, fsync, and rename it over the log.
    fn compact(path: &Path, draft: &CheckoutDraft) -> io::Result<u64> {
        let tmp_path = path.with_extension("draft.tmp");
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        let written = encode_snapshot(&mut writer, draft)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        fs::rename(&tmp_path, path)?;
        Ok(written)
    }

    /// Make sure the log ends on an intact entry. Returns its length.
    fn repair(path: &Path, known_end: Option<u64>) -> io::Result<u64> {
        let on_disk = match fs::metadata(path) {
            Ok(m) => m.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => 0,
            Err(e) => return Err(e),
        };
        if known_end == Some(on_disk) {
            return Ok(on_disk);
        }
        let valid = replay(path)?.valid_len;
        if valid < on_disk {
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(valid)?;
            file.sync_all()?;
            warn!(
                "draft log {}: cut {} bytes of torn tail",
                path.display(),
                on_disk - valid
            );
        }
        Ok(valid)
    }

    fn write(&self, path: &Path, draft: &CheckoutDraft, log: &mut DraftLog) -> io::Result<()> {
        let end = Self::repair(path, log.end)?;
        log.end = None;
        let written = Self::append(path, draft)?;
        log.appends += 1;
        log.end = Some(end + written);

        if log.appends >= self.compact_threshold {
            log.end = None;
            let written = Self::compact(path, draft)?;
            log.appends = 0;
            log.end = Some(written);
            metrics::counter!(crate::observability::DRAFT_COMPACTIONS_TOTAL).increment(1);
            info!("compacted draft log {}", path.display());
        }
        Ok(())
    }
}

fn poisoned<T>(_: T) -> CheckoutError {
    CheckoutError::Storage("draft log lock poisoned".into())
}

impl DraftStore for FileDraftStore {
    fn save(&self, draft: &CheckoutDraft) -> Result<(), CheckoutError> {
        let path = self.path_for(draft.id);
        let entry = self.log_for(draft.id);
        let mut log = entry.lock().map_err(poisoned)?;
        self.write(&path, draft, &mut log).map_err(storage_err)
    }

    fn load(&self, id: Ulid) -> Result<Option<CheckoutDraft>, CheckoutError> {
        let mut replayed = replay(&self.path_for(id)).map_err(storage_err)?;
        Ok(replayed.snapshots.pop())
    }

    fn discard(&self, id: Ulid) -> Result<(), CheckoutError> {
        let entry = self.log_for(id);
        let mut log = entry.lock().map_err(poisoned)?;
        *log = DraftLog::default();
        let removed = match fs::remove_file(self.path_for(id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_err(e)),
        };
        drop(log);
        self.logs.remove(&id);
        removed
    }
}
