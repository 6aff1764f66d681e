/// Errors reported while running a target script.
///
/// The scripts themselves never validate register values or retry; everything
/// here either comes from the host interface or from malformed input handed to
/// the crate.
#[derive(Debug, thiserror::Error, docsplay::Display)]
pub enum Error {
    /// The host debug interface failed to {operation}.
    #[ignore_extra_doc_attributes]
    ///
    /// This wraps whatever the host reported, e.g. an unresponsive target or a
    /// dropped connection. It is never caught inside the crate.
    Interface {
        operation: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// {0:#010x} is not an MRC or MCR instruction encoding.
    InvalidCoprocessorEncoding(u32),

    /// {size:#x} bytes at {base:#010x} is not a testable memory range.
    #[ignore_extra_doc_attributes]
    ///
    /// The range has to hold at least one section and end within the 32-bit
    /// address space.
    InvalidMemoryRange { base: u32, size: u32 },

    /// Unknown target script '{0}'.
    UnknownScript(String),
}

impl Error {
    /// Wrap a host interface error, naming the operation that failed.
    pub fn interface(
        operation: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Error::Interface {
            operation: operation.into(),
            source: source.into(),
        }
    }
}
