//! Per-user hunting session, driven by a single `update` function.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::csv_codec::ExportShape;
use crate::gateway::GatewayError;
use crate::patterns::sample_bugs;
use crate::record::Record;

#[derive(Debug)]
pub struct InFlight {
    pub generation: u64,
    pub cancel: CancellationToken,
}

#[derive(Debug)]
pub struct SessionState {
    pub batch: Vec<Record>,
    pub index: usize,
    /// Analysis revealed for the record at `index`.
    pub active: Option<Record>,
    /// Records revealed from the current batch, unique by id, in reveal order.
    pub hunted: Vec<Record>,
    pub in_flight: Option<InFlight>,
    pub last_error: Option<String>,
    next_generation: u64,
}

#[derive(Debug)]
pub enum Action {
    Next,
    Prev,
    /// Reveal the current record, submitting the batch first if needed.
    Hunt,
    /// Replace the batch, e.g. with stubs decoded from an upload.
    Load(Vec<Record>),
    Completed {
        generation: u64,
        result: Result<Vec<Record>, GatewayError>,
    },
    /// Back to the built-in examples.
    Reset,
}

/// Work the caller must perform after an update.
#[derive(Debug)]
pub enum Effect {
    None,
    Submit {
        generation: u64,
        records: Vec<Record>,
        cancel: CancellationToken,
    },
}

impl Default for SessionState {
    fn default() -> Self {
        Self::with_batch(sample_bugs())
    }
}

impl SessionState {
    pub fn with_batch(batch: Vec<Record>) -> Self {
        Self {
            batch,
            index: 0,
            active: None,
            hunted: Vec::new(),
            in_flight: None,
            last_error: None,
            next_generation: 1,
        }
    }

    pub fn current(&self) -> Option<&Record> {
        self.batch.get(self.index)
    }

    pub fn is_hunting(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Records to export. The results layout always covers the whole batch;
    /// the session layout covers what was revealed, or the batch if nothing was.
    pub fn export_records(&self, shape: ExportShape) -> &[Record] {
        match shape {
            ExportShape::Session if !self.hunted.is_empty() => &self.hunted,
            _ => &self.batch,
        }
    }

    pub fn update(&mut self, action: Action) -> Effect {
        match action {
            Action::Next => {
                if !self.batch.is_empty() {
                    self.index = (self.index + 1) % self.batch.len();
                }
                self.active = None;
                Effect::None
            }
            Action::Prev => {
                if !self.batch.is_empty() {
                    self.index = self
                        .index
                        .checked_sub(1)
                        .unwrap_or(self.batch.len() - 1);
                }
                self.active = None;
                Effect::None
            }
            Action::Hunt => self.hunt(),
            Action::Load(batch) => {
                self.cancel_in_flight();
                info!(count = batch.len(), "session batch loaded");
                self.batch = batch;
                self.index = 0;
                self.active = None;
                self.hunted.clear();
                self.last_error = None;
                Effect::None
            }
            Action::Reset => {
                self.cancel_in_flight();
                let next_generation = self.next_generation;
                *self = Self::default();
                self.next_generation = next_generation;
                Effect::None
            }
            Action::Completed { generation, result } => {
                self.complete(generation, result);
                Effect::None
            }
        }
    }

    fn hunt(&mut self) -> Effect {
        let Some(current) = self.current().cloned() else {
            return Effect::None;
        };
        if current.is_analyzed() {
            self.reveal(current);
            return Effect::None;
        }

        self.cancel_in_flight();
        let generation = self.next_generation;
        self.next_generation += 1;
        let cancel = CancellationToken::new();
        self.in_flight = Some(InFlight {
            generation,
            cancel: cancel.clone(),
        });
        self.active = None;
        self.last_error = None;
        debug!(generation, count = self.batch.len(), "submission started");

        Effect::Submit {
            generation,
            records: self.batch.clone(),
            cancel,
        }
    }

    fn complete(&mut self, generation: u64, result: Result<Vec<Record>, GatewayError>) {
        let current_generation = self.in_flight.as_ref().map(|f| f.generation);
        if current_generation != Some(generation) {
            debug!(generation, ?current_generation, "discarding stale submission result");
            return;
        }
        self.in_flight = None;

        match result {
            Ok(analyzed) => {
                info!(
                    generation,
                    count = analyzed.len(),
                    batch = self.batch.len(),
                    "analysis batch applied"
                );
                // Positional: records without a counterpart stay as they were.
                for (slot, record) in self.batch.iter_mut().zip(analyzed) {
                    *slot = record;
                }
                self.hunted.clear();
                match self.current().cloned() {
                    Some(current) if current.is_analyzed() => self.reveal(current),
                    _ => self.active = None,
                }
            }
            Err(err) => {
                warn!(generation, reason = ?err.reason(), error = %err, "analysis failed, keeping previous batch");
                self.last_error = Some(err.user_message());
            }
        }
    }

    fn reveal(&mut self, record: Record) {
        match self.hunted.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record.clone(),
            None => self.hunted.push(record.clone()),
        }
        self.active = Some(record);
    }

    fn cancel_in_flight(&mut self) {
        if let Some(flight) = self.in_flight.take() {
            debug!(generation = flight.generation, "cancelling in-flight submission");
            flight.cancel.cancel();
        }
    }
}
