//! Buffer sizing from a memory budget

use super::options::MIN_BUFFER_SIZE;

/// Memory profile for different deployment sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryProfile {
    /// Small pods (< 512MB): 16 KiB output buffer
    Low,
    /// Medium pods (512MB-1GB): 32 KiB output buffer
    Medium,
    /// Large pods (> 1GB): 64 KiB output buffer (default)
    High,
    /// Explicit buffer size
    Custom { buffer_size: usize },
}

impl MemoryProfile {
    /// Create a profile from a memory limit in MB
    pub fn from_memory_mb(memory_mb: usize) -> Self {
        if memory_mb < 512 {
            MemoryProfile::Low
        } else if memory_mb < 1024 {
            MemoryProfile::Medium
        } else {
            MemoryProfile::High
        }
    }

    /// Detect from the MEMORY_LIMIT_MB environment variable
    pub fn from_env() -> Self {
        std::env::var("MEMORY_LIMIT_MB")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .map(Self::from_memory_mb)
            .unwrap_or(MemoryProfile::High)
    }

    /// Output buffer size for this profile. Custom sizes below the document
    /// minimum are raised to it.
    pub fn buffer_size(&self) -> usize {
        match *self {
            MemoryProfile::Low => 16 * 1024,
            MemoryProfile::Medium => 32 * 1024,
            MemoryProfile::High => 64 * 1024,
            MemoryProfile::Custom { buffer_size } => {
                if buffer_size < MIN_BUFFER_SIZE {
                    log::warn!(
                        "Buffer size {} raised to the minimum of {} bytes",
                        buffer_size,
                        MIN_BUFFER_SIZE
                    );
                }
                buffer_size.max(MIN_BUFFER_SIZE)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_profile_from_mb() {
        assert!(matches!(
            MemoryProfile::from_memory_mb(256),
            MemoryProfile::Low
        ));
        assert!(matches!(
            MemoryProfile::from_memory_mb(768),
            MemoryProfile::Medium
        ));
        assert!(matches!(
            MemoryProfile::from_memory_mb(2048),
            MemoryProfile::High
        ));
    }

    #[test]
    fn test_buffer_sizes() {
        assert!(MemoryProfile::Low.buffer_size() < MemoryProfile::High.buffer_size());
        assert_eq!(
            MemoryProfile::Custom { buffer_size: 10 }.buffer_size(),
            MIN_BUFFER_SIZE
        );
        assert_eq!(
            MemoryProfile::Custom { buffer_size: 100_000 }.buffer_size(),
            100_000
        );
    }
}
