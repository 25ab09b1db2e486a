use super::Record;

/// Writes a record to an output destination with [`Recorder::write`].
pub trait Recorder {
    /// Write a record to the [`Recorder`].
    fn write(&mut self, record: Record);

    /// Store the record, to be aggregated on [`Recorder::flush`].
    fn store(&mut self, record: Record);

    /// Writes values aggregated from the stored records.
    ///
    /// `step` is attached to the written values, the trainer gives the episode index.
    fn flush(&mut self, step: i64);
}
