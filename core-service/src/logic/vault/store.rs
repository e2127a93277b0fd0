//! Proof Stores
//!
//! `MemoryProofStore` for tests and embedded hosts, `JsonlProofStore` for
//! local persistence (one JSON record per line, exams and proofs interleaved,
//! append-only until cleared).
//!
//! Every "insert if absent" runs under the store's write lock, so two
//! concurrent submissions for the same key cannot both land.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};

use super::error::VaultResult;
use super::types::{ExamMetadata, StoredProof, VaultRecord};

pub trait ProofStore: Send + Sync {
    /// Store `proof` unless its key is taken. Returns `false` if it was.
    fn insert_new(&self, proof: &StoredProof) -> VaultResult<bool>;

    fn get(&self, key: &str) -> VaultResult<Option<StoredProof>>;

    fn contains(&self, key: &str) -> VaultResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// All proofs, ordered by key
    fn list(&self) -> VaultResult<Vec<StoredProof>>;

    /// Remove every proof, returning how many were dropped. Exams stay.
    fn clear(&self) -> VaultResult<usize>;

    /// Register `exam` unless its id is taken. Returns `false` if it was.
    fn insert_exam(&self, exam: &ExamMetadata) -> VaultResult<bool>;

    /// Replace an existing registration
    fn update_exam(&self, exam: &ExamMetadata) -> VaultResult<()>;

    fn get_exam(&self, exam_id: &str) -> VaultResult<Option<ExamMetadata>>;

    /// All exams, ordered by id
    fn exams(&self) -> VaultResult<Vec<ExamMetadata>>;
}

#[derive(Debug, Default)]
struct Entries {
    exams: BTreeMap<String, ExamMetadata>,
    proofs: BTreeMap<String, StoredProof>,
}

impl Entries {
    fn apply(&mut self, record: VaultRecord) {
        match record {
            VaultRecord::Exam(exam) => {
                self.exams.insert(exam.exam_id.clone(), exam);
            }
            VaultRecord::Proof(proof) => {
                self.proofs.insert(proof.proof_key.clone(), proof);
            }
        }
    }
}

// ============================================================================
// IN-MEMORY
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryProofStore {
    entries: RwLock<Entries>,
}

impl MemoryProofStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProofStore for MemoryProofStore {
    fn insert_new(&self, proof: &StoredProof) -> VaultResult<bool> {
        let mut entries = self.entries.write();
        if entries.proofs.contains_key(&proof.proof_key) {
            return Ok(false);
        }
        entries.proofs.insert(proof.proof_key.clone(), proof.clone());
        Ok(true)
    }

    fn get(&self, key: &str) -> VaultResult<Option<StoredProof>> {
        Ok(self.entries.read().proofs.get(key).cloned())
    }

    fn list(&self) -> VaultResult<Vec<StoredProof>> {
        Ok(self.entries.read().proofs.values().cloned().collect())
    }

    fn clear(&self) -> VaultResult<usize> {
        let mut entries = self.entries.write();
        let count = entries.proofs.len();
        entries.proofs.clear();
        Ok(count)
    }

    fn insert_exam(&self, exam: &ExamMetadata) -> VaultResult<bool> {
        let mut entries = self.entries.write();
        if entries.exams.contains_key(&exam.exam_id) {
            return Ok(false);
        }
        entries.exams.insert(exam.exam_id.clone(), exam.clone());
        Ok(true)
    }

    fn update_exam(&self, exam: &ExamMetadata) -> VaultResult<()> {
        self.entries.write().exams.insert(exam.exam_id.clone(), exam.clone());
        Ok(())
    }

    fn get_exam(&self, exam_id: &str) -> VaultResult<Option<ExamMetadata>> {
        Ok(self.entries.read().exams.get(exam_id).cloned())
    }

    fn exams(&self) -> VaultResult<Vec<ExamMetadata>> {
        Ok(self.entries.read().exams.values().cloned().collect())
    }
}

// ============================================================================
// JSONL FILE
// ============================================================================

/// Lock order: `entries` before `file`
pub struct JsonlProofStore {
    path: PathBuf,
    entries: RwLock<Entries>,
    file: Mutex<Option<File>>,
}

impl JsonlProofStore {
    /// Open (or create) a store, replaying existing lines into memory.
    /// Later exam lines replace earlier ones (closing appends a new line).
    pub fn open(path: &Path) -> VaultResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut entries = Entries::default();
        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            for (line_no, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<VaultRecord>(&line) {
                    Ok(record) => entries.apply(record),
                    Err(e) => {
                        log::warn!("Skipping corrupt vault line {} in {:?}: {}", line_no + 1, path, e);
                    }
                }
            }
            log::info!(
                "Loaded {} exams and {} proofs from {:?}",
                entries.exams.len(),
                entries.proofs.len(),
                path
            );
        }

        Ok(Self {
            path: path.to_path_buf(),
            entries: RwLock::new(entries),
            file: Mutex::new(None),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Caller must hold the `entries` write lock
    fn append(&self, record: &VaultRecord) -> VaultResult<()> {
        let line = serde_json::to_string(record)?;

        let mut guard = self.file.lock();
        if guard.is_none() {
            *guard = Some(OpenOptions::new().create(true).append(true).open(&self.path)?);
        }
        if let Some(file) = guard.as_mut() {
            writeln!(file, "{}", line)?;
            file.flush()?;
        }
        Ok(())
    }
}

impl ProofStore for JsonlProofStore {
    fn insert_new(&self, proof: &StoredProof) -> VaultResult<bool> {
        let mut entries = self.entries.write();
        if entries.proofs.contains_key(&proof.proof_key) {
            return Ok(false);
        }
        self.append(&VaultRecord::Proof(proof.clone()))?;
        entries.proofs.insert(proof.proof_key.clone(), proof.clone());
        Ok(true)
    }

    fn get(&self, key: &str) -> VaultResult<Option<StoredProof>> {
        Ok(self.entries.read().proofs.get(key).cloned())
    }

    fn list(&self) -> VaultResult<Vec<StoredProof>> {
        Ok(self.entries.read().proofs.values().cloned().collect())
    }

    fn clear(&self) -> VaultResult<usize> {
        let mut entries = self.entries.write();
        let mut guard = self.file.lock();

        // Truncate and keep the exam registrations; the next append reopens
        *guard = None;
        let mut file = File::create(&self.path)?;
        for exam in entries.exams.values() {
            writeln!(file, "{}", serde_json::to_string(&VaultRecord::Exam(exam.clone()))?)?;
        }
        file.flush()?;

        let count = entries.proofs.len();
        entries.proofs.clear();
        log::info!("Cleared {} proofs from {:?}", count, self.path);
        Ok(count)
    }

    fn insert_exam(&self, exam: &ExamMetadata) -> VaultResult<bool> {
        let mut entries = self.entries.write();
        if entries.exams.contains_key(&exam.exam_id) {
            return Ok(false);
        }
        self.append(&VaultRecord::Exam(exam.clone()))?;
        entries.exams.insert(exam.exam_id.clone(), exam.clone());
        Ok(true)
    }

    fn update_exam(&self, exam: &ExamMetadata) -> VaultResult<()> {
        let mut entries = self.entries.write();
        self.append(&VaultRecord::Exam(exam.clone()))?;
        entries.exams.insert(exam.exam_id.clone(), exam.clone());
        Ok(())
    }

    fn get_exam(&self, exam_id: &str) -> VaultResult<Option<ExamMetadata>> {
        Ok(self.entries.read().exams.get(exam_id).cloned())
    }

    fn exams(&self) -> VaultResult<Vec<ExamMetadata>> {
        Ok(self.entries.read().exams.values().cloned().collect())
    }
}
