pub mod event_reader;
pub mod intent_writer;
