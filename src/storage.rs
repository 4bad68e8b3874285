pub mod batch;
pub use batch::{Report, Summary, scan};

pub mod export;
pub use export::Exporter;

pub mod gpml;
pub use gpml::{ConverterError, GpmlVersion, GpmlWriter, ReadError, WriteError};
