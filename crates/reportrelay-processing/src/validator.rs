use reportrelay_core::ValidationMode;
use std::fmt;
use std::io::{self, Read};

/// Default upper bound for a report (10 MiB).
pub const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;
/// Records inspected by the structural check.
pub const MAX_SCANNED_RECORDS: usize = 100;
/// Longest field accepted by the structural check, in bytes.
pub const MAX_FIELD_LENGTH: usize = 10_000;
/// Widest record accepted by the structural check.
pub const MAX_COLUMNS: usize = 100;

const PADDING_MIN_LENGTH: usize = 1_000;
const RECORD_DELIMITER: u8 = b',';

/// Leading bytes of executable formats that must never be relayed.
const EXECUTABLE_SIGNATURES: &[(&[u8], &str)] = &[
    (b"\x7fELF", "ELF"),
    (b"MZ", "PE"),
    (b"\xfe\xed\xfa\xce", "Mach-O"),
    (b"\xfe\xed\xfa\xcf", "Mach-O"),
    (b"\xce\xfa\xed\xfe", "Mach-O"),
    (b"\xcf\xfa\xed\xfe", "Mach-O"),
];

/// Family a blacklisted pattern belongs to; reported with the rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternCategory {
    ScriptInjection,
    CommandInjection,
    FilesystemProbe,
    SqlInjection,
    CodeInjection,
}

impl fmt::Display for PatternCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PatternCategory::ScriptInjection => "script injection",
            PatternCategory::CommandInjection => "command injection",
            PatternCategory::FilesystemProbe => "filesystem probing",
            PatternCategory::SqlInjection => "SQL injection",
            PatternCategory::CodeInjection => "server-side code injection",
        };
        f.write_str(name)
    }
}

// Matched against the lower-cased content, so every entry is lower case.
const BLACKLIST: &[(PatternCategory, &[&str])] = &[
    (
        PatternCategory::ScriptInjection,
        &[
            "<script",
            "javascript:",
            "vbscript:",
            "onload=",
            "onerror=",
            "<iframe",
            "<object",
            "<embed",
        ],
    ),
    (
        PatternCategory::CommandInjection,
        &[
            "`", "&&", "||", "|", ";", ">", "<", "$((", "/bin/bash", "/bin/sh", "bash -c", "sh -c",
            "eval ", "exec(", "rm -rf", "chmod", "chown", "sudo", "wget", "curl", "nc ", "ssh ",
            "scp ",
        ],
    ),
    (
        PatternCategory::FilesystemProbe,
        &["/etc/passwd", "/etc/shadow", "/proc/", "../../", "/root/", "/home/"],
    ),
    (
        PatternCategory::SqlInjection,
        &[
            "union select",
            "drop table",
            "insert into",
            "delete from",
            "update set",
            "create table",
            "alter table",
        ],
    ),
    (
        PatternCategory::CodeInjection,
        &["<?php", "<?=", "system(", "shell_exec(", "passthru(", "popen("],
    ),
];

/// Why a report was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectionReason {
    #[error("File too large: exceeds {max} bytes")]
    FileTooLarge { max: usize },

    #[error("Empty file")]
    EmptyFile,

    #[error("Executable file signature detected ({0})")]
    ExecutableSignature(&'static str),

    #[error("Potentially dangerous content ({category}): contains '{pattern}'")]
    DangerousPattern {
        category: PatternCategory,
        pattern: &'static str,
    },

    #[error("Malformed record {record}: {message}")]
    MalformedRecord { record: usize, message: String },

    #[error("Too many columns in record {record}: {columns} (max: {max})")]
    TooManyColumns {
        record: usize,
        columns: usize,
        max: usize,
    },

    #[error("Field too long in record {record}: {length} bytes (max: {max})")]
    FieldTooLong {
        record: usize,
        length: usize,
        max: usize,
    },

    #[error("Suspicious padding in record {record}: field is mostly one repeated character")]
    RepeatedPadding { record: usize },
}

/// Verdict of the content safety check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Accepted,
    Rejected(RejectionReason),
}

impl ValidationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationOutcome::Accepted)
    }

    pub fn into_result(self) -> Result<(), RejectionReason> {
        match self {
            ValidationOutcome::Accepted => Ok(()),
            ValidationOutcome::Rejected(reason) => Err(reason),
        }
    }
}

/// Heuristic screen for report files.
///
/// A best-effort blacklist: it keeps obviously hostile payloads away from the
/// remote endpoint but is not a security boundary. Checks run in a fixed
/// order and stop at the first failure:
///
/// 1. size bound
/// 2. emptiness
/// 3. executable signature
/// 4. case-insensitive pattern blacklist over the whole content
/// 5. record structure (only in [`ValidationMode::Strict`])
#[derive(Debug, Clone)]
pub struct ContentValidator {
    max_file_size: usize,
    mode: ValidationMode,
}

impl Default for ContentValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILE_SIZE, ValidationMode::Standard)
    }
}

impl ContentValidator {
    pub fn new(max_file_size: usize, mode: ValidationMode) -> Self {
        Self {
            max_file_size,
            mode,
        }
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    /// Read at most one byte more than the size cap.
    ///
    /// The extra byte is what lets [`validate_bytes`](Self::validate_bytes)
    /// tell an oversized stream from one exactly at the cap.
    pub fn read_limited<R: Read>(&self, reader: R) -> io::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        reader
            .take(self.max_file_size as u64 + 1)
            .read_to_end(&mut buffer)?;
        Ok(buffer)
    }

    /// Validate a stream. Rewinding the stream before any later read is up to the caller.
    pub fn validate<R: Read>(&self, reader: R) -> io::Result<ValidationOutcome> {
        let content = self.read_limited(reader)?;
        Ok(self.validate_bytes(&content))
    }

    pub fn validate_bytes(&self, content: &[u8]) -> ValidationOutcome {
        match self.check(content) {
            Ok(()) => ValidationOutcome::Accepted,
            Err(reason) => ValidationOutcome::Rejected(reason),
        }
    }

    fn check(&self, content: &[u8]) -> Result<(), RejectionReason> {
        if content.len() > self.max_file_size {
            return Err(RejectionReason::FileTooLarge {
                max: self.max_file_size,
            });
        }

        if content.is_empty() {
            return Err(RejectionReason::EmptyFile);
        }

        check_signature(content)?;
        check_patterns(content)?;

        if self.mode == ValidationMode::Strict {
            check_records(content)?;
        }

        Ok(())
    }
}

fn check_signature(content: &[u8]) -> Result<(), RejectionReason> {
    match EXECUTABLE_SIGNATURES
        .iter()
        .find(|(magic, _)| content.starts_with(magic))
    {
        Some((_, format)) => Err(RejectionReason::ExecutableSignature(format)),
        None => Ok(()),
    }
}

fn check_patterns(content: &[u8]) -> Result<(), RejectionReason> {
    let lowered = String::from_utf8_lossy(content).to_lowercase();

    for (category, patterns) in BLACKLIST {
        if let Some(pattern) = patterns.iter().find(|p| lowered.contains(**p)) {
            return Err(RejectionReason::DangerousPattern {
                category: *category,
                pattern: *pattern,
            });
        }
    }

    Ok(())
}

fn check_records(content: &[u8]) -> Result<(), RejectionReason> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(RECORD_DELIMITER)
        .from_reader(content);

    for (index, result) in reader.byte_records().take(MAX_SCANNED_RECORDS).enumerate() {
        let record_number = index + 1;
        let record = result.map_err(|e| RejectionReason::MalformedRecord {
            record: record_number,
            message: e.to_string(),
        })?;

        if record.len() > MAX_COLUMNS {
            return Err(RejectionReason::TooManyColumns {
                record: record_number,
                columns: record.len(),
                max: MAX_COLUMNS,
            });
        }

        for field in record.iter() {
            if field.len() > MAX_FIELD_LENGTH {
                return Err(RejectionReason::FieldTooLong {
                    record: record_number,
                    length: field.len(),
                    max: MAX_FIELD_LENGTH,
                });
            }

            if is_repeated_padding(field) {
                return Err(RejectionReason::RepeatedPadding {
                    record: record_number,
                });
            }
        }
    }

    Ok(())
}

/// Long field made (> 90%) of its first byte repeated.
fn is_repeated_padding(field: &[u8]) -> bool {
    if field.len() <= PADDING_MIN_LENGTH {
        return false;
    }
    let first = field[0];
    let repeated = field.iter().filter(|&&b| b == first).count();
    repeated > field.len() * 9 / 10
}
