//! Clinic Queue Core Library
//!
//! Business core of a clinic front-desk dashboard: today's patient queue,
//! queue calls with a spoken announcement, arrival/departure stamps and the
//! doctor's consultation record.
//!
//! # Architecture
//!
//! ```text
//!   queue + employees collections           stats document (push)
//!               │                                   │
//!               ▼                                   ▼
//!        ┌──────────────────────────────────────────────────┐
//!        │ QueueStore   today's list, stats, called entry    │
//!        │              (single-writer async lock)           │
//!        └──────────────────────────────────────────────────┘
//!               ▲                                   ▲
//!               │ apply(update)                     │ open(entry)
//!        ┌──────┴───────────┐   save(draft)   ┌─────┴──────────────┐
//!        │ QueueController  │◀────────────────│ ConsultationForm   │
//!        │ call / time in / │                 │ draft + suggestions│
//!        │ time out / tick  │                 └────────────────────┘
//!        └──────┬───────────┘
//!               │ announce (fire and forget)
//!               ▼
//!           Announcer
//! ```
//!
//! # Modules
//!
//! - [`db`]: SQLite persistence for the document collections
//! - [`models`]: Domain types (QueueEntry, Employee, ConsultationData, Stats)
//! - [`store`]: Async document store seam with SQLite and in-memory backends
//! - [`queue`]: Queue store, visit state machine and clock
//! - [`consultation`]: Consultation draft, form and name suggestions
//! - [`config`]: Runtime configuration

pub mod config;
pub mod consultation;
pub mod db;
pub mod models;
pub mod queue;
pub mod store;
pub mod telemetry;

// Re-export commonly used types
pub use config::ClinicConfig;
pub use consultation::{ConsultationDraft, ConsultationForm, McChoice, ReferenceLists};
pub use db::Database;
pub use models::{
    ConsultationData, Diagnosis, Employee, MedicalCertificate, Medicine, QueueEntry, QueueStatus,
    QueuedPatient, ReferenceItem, ReferenceKind, Stats,
};
pub use queue::{CallOutcome, QueueController, QueueError, QueueStore};
pub use store::{DocumentStore, MemoryDocumentStore, SqliteDocumentStore};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use clinic_queue_announce::{Announcement, TracingAnnouncer, Utterance};
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;

use crate::queue::SystemClock;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum ClinicQueueError {
    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Runtime error: {0}")]
    RuntimeError(String),
}

impl From<QueueError> for ClinicQueueError {
    fn from(e: QueueError) -> Self {
        match e {
            QueueError::Persistence(err) => ClinicQueueError::PersistenceError(err.to_string()),
            QueueError::Validation(msg) => ClinicQueueError::ValidationError(msg),
            QueueError::NotFound(id) => ClinicQueueError::NotFound(id),
        }
    }
}

impl From<store::StoreError> for ClinicQueueError {
    fn from(e: store::StoreError) -> Self {
        QueueError::from(e).into()
    }
}

impl From<db::DbError> for ClinicQueueError {
    fn from(e: db::DbError) -> Self {
        ClinicQueueError::PersistenceError(e.to_string())
    }
}

impl From<config::ConfigError> for ClinicQueueError {
    fn from(e: config::ConfigError) -> Self {
        ClinicQueueError::ConfigError(e.to_string())
    }
}

impl From<std::io::Error> for ClinicQueueError {
    fn from(e: std::io::Error) -> Self {
        ClinicQueueError::RuntimeError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for ClinicQueueError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        ClinicQueueError::RuntimeError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Install the log subscriber. Returns `false` if one was already installed.
#[uniffi::export]
pub fn init_logging(filter: Option<String>) -> bool {
    telemetry::init_logging(filter.as_deref().unwrap_or(config::DEFAULT_LOG_FILTER))
}

/// Open or create a clinic database at the given path. The path is used as
/// given; `CLINIC_QUEUE_DB` only overrides paths read from a config file.
#[uniffi::export]
pub fn open_clinic(path: String) -> Result<Arc<ClinicQueueCore>, ClinicQueueError> {
    let config = ClinicConfig {
        database_path: path,
        ..ClinicConfig::default()
    };
    let db = Database::open(&config.database_path)?;
    ClinicQueueCore::start(config, db)
}

/// Open a clinic from a JSON config file. Installs the log subscriber with
/// the configured `log_filter` unless one is already installed.
#[uniffi::export]
pub fn open_clinic_with_config(config_path: String) -> Result<Arc<ClinicQueueCore>, ClinicQueueError> {
    let config = ClinicConfig::from_json_file(&config_path)?;
    telemetry::init_logging(&config.log_filter);
    let db = Database::open(&config.database_path)?;
    ClinicQueueCore::start(config, db)
}

/// Create an in-memory clinic (for testing).
#[uniffi::export]
pub fn open_clinic_in_memory() -> Result<Arc<ClinicQueueCore>, ClinicQueueError> {
    let db = Database::open_in_memory()?;
    ClinicQueueCore::start(ClinicConfig::default(), db)
}

/// Suggest names from an arbitrary list.
#[uniffi::export]
pub fn suggest_names(query: String, reference: Vec<String>) -> Vec<String> {
    consultation::suggest(&query, &reference)
}

// =========================================================================
// Main API Object
// =========================================================================

/// Queue dashboard handle for FFI. Calls block on an owned runtime.
#[derive(uniffi::Object)]
pub struct ClinicQueueCore {
    runtime: Runtime,
    store: Arc<SqliteDocumentStore>,
    controller: QueueController,
    form: Mutex<ConsultationForm>,
    references: Mutex<ReferenceLists>,
    suggestion_limit: usize,
    background: Vec<JoinHandle<()>>,
}

impl ClinicQueueCore {
    fn start(config: ClinicConfig, db: Database) -> Result<Arc<Self>, ClinicQueueError> {
        config.validate()?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        let store = Arc::new(SqliteDocumentStore::new(db, config.stats_document_id.clone())?);
        let shared: Arc<dyn DocumentStore> = store.clone();
        let queue = Arc::new(QueueStore::new(shared, Arc::new(SystemClock)));
        let controller = QueueController::new(
            Arc::clone(&queue),
            Arc::new(TracingAnnouncer),
            config.announcer.clone(),
        );

        runtime.block_on(queue.load_today())?;
        let references = runtime.block_on(ReferenceLists::load(store.as_ref()))?;

        let background = {
            let _guard = runtime.enter();
            vec![
                queue.spawn_periodic_reload(config.reload_interval()),
                queue.spawn_stats_listener(),
            ]
        };

        tracing::info!(database = %config.database_path, "Clinic queue started");

        Ok(Arc::new(Self {
            runtime,
            store,
            controller,
            form: Mutex::new(ConsultationForm::new()),
            references: Mutex::new(references),
            suggestion_limit: config.suggestion_limit,
            background,
        }))
    }

    fn queue(&self) -> &QueueStore {
        self.controller.queue()
    }
}

impl Drop for ClinicQueueCore {
    fn drop(&mut self) {
        for task in &self.background {
            task.abort();
        }
    }
}

#[uniffi::export]
impl ClinicQueueCore {
    // =========================================================================
    // Queue Operations
    // =========================================================================

    /// Reload today's list from the database.
    pub fn load_today(&self) -> Result<Vec<FfiQueuedPatient>, ClinicQueueError> {
        let patients = self.runtime.block_on(self.queue().load_today())?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    /// Today's list as last loaded.
    pub fn today(&self) -> Vec<FfiQueuedPatient> {
        let patients = self.runtime.block_on(self.queue().today());
        patients.into_iter().map(|p| p.into()).collect()
    }

    pub fn stats(&self) -> FfiStats {
        self.runtime.block_on(self.queue().stats()).into()
    }

    pub fn called_patient(&self) -> Option<FfiQueuedPatient> {
        self.runtime.block_on(self.queue().called()).map(|p| p.into())
    }

    /// Call the lowest-numbered waiting patient.
    pub fn call_next(&self) -> Result<FfiCallOutcome, ClinicQueueError> {
        let outcome = self.runtime.block_on(self.controller.call_next())?;
        Ok(outcome.into())
    }

    pub fn repeat_call(&self) -> Result<FfiCallOutcome, ClinicQueueError> {
        let outcome = self.runtime.block_on(self.controller.repeat_call())?;
        Ok(outcome.into())
    }

    pub fn time_in(&self, entry_id: String) -> Result<FfiQueuedPatient, ClinicQueueError> {
        let patient = self.runtime.block_on(self.controller.time_in(&entry_id))?;
        Ok(patient.into())
    }

    pub fn time_out(&self, entry_id: String) -> Result<FfiQueuedPatient, ClinicQueueError> {
        let patient = self.runtime.block_on(self.controller.time_out(&entry_id))?;
        Ok(patient.into())
    }

    /// Mark complete without a consultation record.
    pub fn tick(&self, entry_id: String) -> Result<FfiQueuedPatient, ClinicQueueError> {
        let patient = self.runtime.block_on(self.controller.tick(&entry_id))?;
        Ok(patient.into())
    }

    // =========================================================================
    // Consultation Operations
    // =========================================================================

    /// Open a fresh draft, discarding any draft already open.
    pub fn open_consultation(
        &self,
        entry_id: String,
    ) -> Result<FfiConsultationDraft, ClinicQueueError> {
        let mut form = self.form.lock()?;
        let draft = self
            .runtime
            .block_on(form.open(self.queue(), &entry_id))?;
        Ok(draft.clone().into())
    }

    pub fn consultation_draft(&self) -> Result<Option<FfiConsultationDraft>, ClinicQueueError> {
        let form = self.form.lock()?;
        Ok(form.draft().cloned().map(|d| d.into()))
    }

    /// Replace the open draft's contents.
    pub fn update_consultation(&self, draft: FfiConsultationDraft) -> Result<(), ClinicQueueError> {
        let mut form = self.form.lock()?;
        form.replace(draft.into())?;
        Ok(())
    }

    /// Save the open draft and complete the visit.
    pub fn save_consultation(&self) -> Result<FfiQueuedPatient, ClinicQueueError> {
        let mut form = self.form.lock()?;
        let patient = self.runtime.block_on(form.save(&self.controller))?;
        Ok(patient.into())
    }

    /// Discard the open draft.
    pub fn close_consultation(&self) -> Result<(), ClinicQueueError> {
        self.form.lock()?.close();
        Ok(())
    }

    // =========================================================================
    // Reference List Operations
    // =========================================================================

    /// Reload both reference lists used for suggestions.
    pub fn reload_reference_lists(&self) -> Result<(), ClinicQueueError> {
        let lists = self
            .runtime
            .block_on(ReferenceLists::load(self.store.as_ref()))?;
        *self.references.lock()? = lists;
        Ok(())
    }

    pub fn suggest(
        &self,
        kind: FfiReferenceKind,
        query: String,
    ) -> Result<Vec<String>, ClinicQueueError> {
        let references = self.references.lock()?;
        Ok(references.suggest(kind.into(), &query, self.suggestion_limit))
    }

    pub fn list_reference_items(
        &self,
        kind: FfiReferenceKind,
    ) -> Result<Vec<FfiReferenceItem>, ClinicQueueError> {
        let items = self
            .runtime
            .block_on(self.store.list_reference(kind.into()))?;
        Ok(items.into_iter().map(|i| i.into()).collect())
    }

    /// Add a name to a reference list. Blank names are rejected.
    pub fn add_reference_item(
        &self,
        kind: FfiReferenceKind,
        name: String,
    ) -> Result<FfiReferenceItem, ClinicQueueError> {
        let item = self.runtime.block_on(consultation::add_reference_item(
            self.store.as_ref(),
            kind.into(),
            &name,
        ))?;
        Ok(item.into())
    }

    pub fn rename_reference_item(
        &self,
        kind: FfiReferenceKind,
        id: String,
        name: String,
    ) -> Result<(), ClinicQueueError> {
        self.runtime.block_on(consultation::rename_reference_item(
            self.store.as_ref(),
            kind.into(),
            &id,
            &name,
        ))?;
        Ok(())
    }

    pub fn delete_reference_item(
        &self,
        kind: FfiReferenceKind,
        id: String,
    ) -> Result<(), ClinicQueueError> {
        self.runtime.block_on(consultation::delete_reference_item(
            self.store.as_ref(),
            kind.into(),
            &id,
        ))?;
        Ok(())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiQueueStatus {
    Waiting,
    InConsultation,
    Completed,
}

impl From<QueueStatus> for FfiQueueStatus {
    fn from(status: QueueStatus) -> Self {
        match status {
            QueueStatus::Waiting => FfiQueueStatus::Waiting,
            QueueStatus::InConsultation => FfiQueueStatus::InConsultation,
            QueueStatus::Completed => FfiQueueStatus::Completed,
        }
    }
}

/// FFI-safe row of today's list.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiQueuedPatient {
    pub entry_id: String,
    pub queue_number: String,
    pub employee_id: String,
    pub name: String,
    pub gender: String,
    pub age: Option<u32>,
    pub status: FfiQueueStatus,
    pub time_in: Option<String>,
    pub time_out: Option<String>,
    pub consultation: Option<FfiConsultationData>,
}

impl From<QueuedPatient> for FfiQueuedPatient {
    fn from(queued: QueuedPatient) -> Self {
        Self {
            entry_id: queued.entry.id,
            queue_number: queued.entry.queue_number,
            employee_id: queued.entry.employee_id,
            name: queued.patient.name,
            gender: queued.patient.gender,
            age: queued.patient.age,
            status: queued.entry.status.into(),
            time_in: queued.entry.time_in,
            time_out: queued.entry.time_out,
            consultation: queued.entry.consultation.map(|c| c.into()),
        }
    }
}

/// FFI-safe saved consultation.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiConsultationData {
    pub diagnoses: Vec<String>,
    pub medicines: Vec<FfiMedicine>,
    pub notes: String,
    pub mc_start: Option<String>,
    pub mc_end: Option<String>,
    pub amount: String,
}

impl From<ConsultationData> for FfiConsultationData {
    fn from(data: ConsultationData) -> Self {
        let (mc_start, mc_end) = match data.mc {
            Some(mc) => (Some(mc.start), Some(mc.end)),
            None => (None, None),
        };
        Self {
            diagnoses: data.diagnoses.into_iter().map(|d| d.name).collect(),
            medicines: data.medicines.into_iter().map(|m| m.into()).collect(),
            notes: data.notes,
            mc_start,
            mc_end,
            amount: data.amount,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicine {
    pub name: String,
    pub dosage: String,
}

impl From<Medicine> for FfiMedicine {
    fn from(medicine: Medicine) -> Self {
        Self {
            name: medicine.name,
            dosage: medicine.dosage,
        }
    }
}

impl From<FfiMedicine> for Medicine {
    fn from(medicine: FfiMedicine) -> Self {
        Medicine {
            name: medicine.name,
            dosage: medicine.dosage,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiMcChoice {
    Unset,
    Yes,
    No,
}

impl From<McChoice> for FfiMcChoice {
    fn from(choice: McChoice) -> Self {
        match choice {
            McChoice::Unset => FfiMcChoice::Unset,
            McChoice::Yes => FfiMcChoice::Yes,
            McChoice::No => FfiMcChoice::No,
        }
    }
}

impl From<FfiMcChoice> for McChoice {
    fn from(choice: FfiMcChoice) -> Self {
        match choice {
            FfiMcChoice::Unset => McChoice::Unset,
            FfiMcChoice::Yes => McChoice::Yes,
            FfiMcChoice::No => McChoice::No,
        }
    }
}

/// FFI-safe consultation draft.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiConsultationDraft {
    pub entry_id: String,
    pub diagnoses: Vec<String>,
    pub medicines: Vec<FfiMedicine>,
    pub notes: String,
    pub mc: FfiMcChoice,
    pub mc_start: String,
    pub mc_end: String,
    pub amount: String,
}

impl From<ConsultationDraft> for FfiConsultationDraft {
    fn from(draft: ConsultationDraft) -> Self {
        Self {
            entry_id: draft.entry_id,
            diagnoses: draft.diagnoses.into_iter().map(|d| d.name).collect(),
            medicines: draft.medicines.into_iter().map(|m| m.into()).collect(),
            notes: draft.notes,
            mc: draft.mc.into(),
            mc_start: draft.mc_start,
            mc_end: draft.mc_end,
            amount: draft.amount,
        }
    }
}

impl From<FfiConsultationDraft> for ConsultationDraft {
    fn from(draft: FfiConsultationDraft) -> Self {
        ConsultationDraft {
            entry_id: draft.entry_id,
            diagnoses: draft
                .diagnoses
                .into_iter()
                .map(|name| Diagnosis { name })
                .collect(),
            medicines: draft.medicines.into_iter().map(|m| m.into()).collect(),
            notes: draft.notes,
            mc: draft.mc.into(),
            mc_start: draft.mc_start,
            mc_end: draft.mc_end,
            amount: draft.amount,
        }
    }
}

/// FFI-safe dashboard statistics.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiStats {
    pub new_patients: u32,
    pub completed_appointments: u32,
    pub pending_appointments: u32,
    pub avg_waiting_time: String,
}

impl From<Stats> for FfiStats {
    fn from(stats: Stats) -> Self {
        Self {
            new_patients: stats.new_patients,
            completed_appointments: stats.completed_appointments,
            pending_appointments: stats.pending_appointments,
            avg_waiting_time: stats.avg_waiting_time,
        }
    }
}

/// FFI-safe announcement plan: play `chime`, then speak each utterance in
/// order.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCallOutcome {
    pub patient: FfiQueuedPatient,
    pub chime: String,
    pub utterances: Vec<FfiUtterance>,
}

impl From<CallOutcome> for FfiCallOutcome {
    fn from(outcome: CallOutcome) -> Self {
        let Announcement {
            chime, utterances, ..
        } = outcome.announcement;
        Self {
            patient: outcome.patient.into(),
            chime,
            utterances: utterances.into_iter().map(|u| u.into()).collect(),
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiUtterance {
    pub text: String,
    pub locale: String,
    pub rate: f32,
}

impl From<Utterance> for FfiUtterance {
    fn from(utterance: Utterance) -> Self {
        Self {
            text: utterance.text,
            locale: utterance.locale,
            rate: utterance.rate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiReferenceKind {
    Diagnosis,
    Medicine,
}

impl From<FfiReferenceKind> for ReferenceKind {
    fn from(kind: FfiReferenceKind) -> Self {
        match kind {
            FfiReferenceKind::Diagnosis => ReferenceKind::Diagnosis,
            FfiReferenceKind::Medicine => ReferenceKind::Medicine,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReferenceItem {
    pub id: String,
    pub name: String,
}

impl From<ReferenceItem> for FfiReferenceItem {
    fn from(item: ReferenceItem) -> Self {
        Self {
            id: item.id,
            name: item.name,
        }
    }
}
