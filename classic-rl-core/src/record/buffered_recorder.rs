use super::{Record, RecordStorage, RecordValue, Recorder};

/// Buffered recorder.
///
/// Written records and aggregated records produced on [`Recorder::flush`] are kept
/// in memory, in order. This is used in tests and for inspecting evaluation runs.
#[derive(Default)]
pub struct BufferedRecorder {
    buf: Vec<Record>,
    storage: RecordStorage,
}

impl BufferedRecorder {
    /// Construct the recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an iterator over the records.
    pub fn iter(&self) -> std::slice::Iter<Record> {
        self.buf.iter()
    }

    /// Returns the number of records in the buffer.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if no record has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl Recorder for BufferedRecorder {
    fn write(&mut self, record: Record) {
        self.buf.push(record);
    }

    fn store(&mut self, record: Record) {
        self.storage.store(record);
    }

    fn flush(&mut self, step: i64) {
        if self.storage.is_empty() {
            return;
        }
        let mut record = self.storage.aggregate();
        record.insert("step", RecordValue::Scalar(step as _));
        self.buf.push(record);
    }
}
