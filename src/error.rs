use crate::bindings;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HsaError>;

#[derive(Debug, Error)]
pub enum HsaError {
    #[error("Failed to load runtime library {library}: {reason}")]
    LibraryLoad { library: String, reason: String },

    #[error("Runtime library {library} does not export {symbol}: {reason}")]
    SymbolNotFound {
        library: String,
        symbol: String,
        reason: String,
    },

    #[error("No agent with kernel dispatch support found")]
    AgentNotFound,

    #[error("Required memory region not found: {0}")]
    MemoryRegionNotFound(&'static str),

    #[error("Queue creation failed: {0}")]
    QueueCreationFailed(String),

    #[error("Queue entered the error state: {0}")]
    QueueFault(String),

    #[error("Memory allocation failed: {0}")]
    MemoryAllocationFailed(String),

    #[error("Kernel not found: {0}")]
    KernelNotFound(String),

    #[error("More than one kernel in executable {0}; a kernel name is required")]
    AmbiguousKernel(String),

    #[error("Timed out after {elapsed_ms} ms: {what}")]
    Timeout { what: String, elapsed_ms: u128 },

    #[error("Not applicable on this device: {0}")]
    NotApplicable(String),

    #[error("Dispatch {0} was already executed")]
    AlreadyExecuted(String),

    #[error("Kernel argument of {size} bytes at offset {offset} exceeds kernarg segment of {capacity} bytes")]
    KernargOverflow {
        offset: usize,
        size: usize,
        capacity: usize,
    },

    #[error("Key already in use: {0}")]
    DuplicateKey(String),

    #[error("No value stored under {0}")]
    MissingValue(String),

    #[error("Value under {key} is not {expected}")]
    WrongKind { key: String, expected: &'static str },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid agent: {0}")]
    InvalidAgent(String),

    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    #[error("Invalid allocation: {0}")]
    InvalidAllocation(String),

    #[error("Invalid signal: {0}")]
    InvalidSignal(String),

    #[error("Invalid queue: {0}")]
    InvalidQueue(String),

    #[error("Invalid code object: {0}")]
    InvalidCodeObject(String),

    #[error("Invalid executable: {0}")]
    InvalidExecutable(String),

    #[error("Invalid ISA: {0}")]
    InvalidIsa(String),

    #[error("Invalid symbol name: {0}")]
    InvalidSymbolName(String),

    #[error("Frozen executable: {0}")]
    FrozenExecutable(String),

    #[error("Incompatible arguments: {0}")]
    IncompatibleArguments(String),

    #[error("Out of resources: {0}")]
    OutOfResources(String),

    #[error("Runtime not initialized: {0}")]
    NotInitialized(String),

    #[error("Finalization failed: {0}")]
    FinalizationFailed(String),

    #[error("Image format unsupported: {0}")]
    ImageFormatUnsupported(String),

    #[error("Fatal HSA error: {0}")]
    Fatal(String),

    #[error("HSA error {status:#x}: {description}")]
    HsaStatus { status: u32, description: String },
}

impl HsaError {
    /// Maps a native status code onto an error; `description` is the
    /// runtime's own text for the code.
    pub fn from_status(status: bindings::hsa_status_t, description: String) -> Self {
        match status {
            bindings::hsa_status_t_HSA_STATUS_ERROR_INVALID_ARGUMENT => {
                Self::InvalidArgument(description)
            }
            bindings::hsa_status_t_HSA_STATUS_ERROR_INVALID_QUEUE_CREATION => {
                Self::QueueCreationFailed(description)
            }
            bindings::hsa_status_t_HSA_STATUS_ERROR_INVALID_ALLOCATION => {
                Self::InvalidAllocation(description)
            }
            bindings::hsa_status_t_HSA_STATUS_ERROR_INVALID_AGENT => {
                Self::InvalidAgent(description)
            }
            bindings::hsa_status_t_HSA_STATUS_ERROR_INVALID_REGION => {
                Self::InvalidRegion(description)
            }
            bindings::hsa_status_t_HSA_STATUS_ERROR_INVALID_SIGNAL => {
                Self::InvalidSignal(description)
            }
            bindings::hsa_status_t_HSA_STATUS_ERROR_INVALID_QUEUE => {
                Self::InvalidQueue(description)
            }
            bindings::hsa_status_t_HSA_STATUS_ERROR_OUT_OF_RESOURCES => {
                Self::OutOfResources(description)
            }
            bindings::hsa_status_t_HSA_STATUS_ERROR_NOT_INITIALIZED => {
                Self::NotInitialized(description)
            }
            bindings::hsa_status_t_HSA_STATUS_ERROR_INVALID_CODE_OBJECT => {
                Self::InvalidCodeObject(description)
            }
            bindings::hsa_status_t_HSA_STATUS_ERROR_INVALID_EXECUTABLE => {
                Self::InvalidExecutable(description)
            }
            bindings::hsa_status_t_HSA_STATUS_ERROR_FROZEN_EXECUTABLE => {
                Self::FrozenExecutable(description)
            }
            bindings::hsa_status_t_HSA_STATUS_ERROR_INVALID_SYMBOL_NAME => {
                Self::InvalidSymbolName(description)
            }
            bindings::hsa_status_t_HSA_STATUS_ERROR_INCOMPATIBLE_ARGUMENTS => {
                Self::IncompatibleArguments(description)
            }
            bindings::hsa_status_t_HSA_STATUS_ERROR_INVALID_ISA
            | bindings::hsa_status_t_HSA_STATUS_ERROR_INVALID_ISA_NAME => {
                Self::InvalidIsa(description)
            }
            bindings::hsa_ext_status_t_HSA_EXT_STATUS_ERROR_FINALIZATION_FAILED => {
                Self::FinalizationFailed(description)
            }
            bindings::hsa_ext_status_t_HSA_EXT_STATUS_ERROR_IMAGE_FORMAT_UNSUPPORTED => {
                Self::ImageFormatUnsupported(description)
            }
            bindings::hsa_status_t_HSA_STATUS_ERROR_FATAL => Self::Fatal(description),
            _ => Self::HsaStatus {
                status,
                description,
            },
        }
    }

    pub fn from_status_with_context(
        status: bindings::hsa_status_t,
        description: String,
        context: &str,
    ) -> Self {
        Self::from_status(status, format!("{}: {}", context, description))
    }

    /// True for the conditions that mark a test as skipped rather than failed.
    pub fn is_not_applicable(&self) -> bool {
        matches!(self, Self::NotApplicable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_status_maps_to_variant() {
        let err = HsaError::from_status(
            bindings::hsa_status_t_HSA_STATUS_ERROR_OUT_OF_RESOURCES,
            "no memory".into(),
        );
        assert!(matches!(err, HsaError::OutOfResources(ref s) if s == "no memory"));
    }

    #[test]
    fn unknown_status_keeps_code() {
        let err = HsaError::from_status(0x4242, "vendor".into());
        assert_eq!(err.to_string(), "HSA error 0x4242: vendor");
    }

    #[test]
    fn context_prefixes_description() {
        let err = HsaError::from_status_with_context(
            bindings::hsa_status_t_HSA_STATUS_ERROR_INVALID_ARGUMENT,
            "bad".into(),
            "hsa_queue_create",
        );
        assert_eq!(err.to_string(), "Invalid argument: hsa_queue_create: bad");
    }
}
