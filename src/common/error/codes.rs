//! The CMIS error code taxonomy.
//!
//! Codes are partitioned into three ranges: basic errors (connection,
//! authentication, repository discovery) that the CMIS domain model does not
//! cover, the general exceptions of the domain model (section 2.2.1.4.1) and
//! the CMIS specific exceptions (section 2.2.1.4.2).

use std::fmt;

/// Range a code falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Basic,
    General,
    Specific,
}

/// A CMIS error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    NoReturn = 0,
    Connection = 1,
    ProxyAuthentication = 2,
    Unauthorized = 3,
    NoRootFolderFound = 4,
    NoRepositoryFound = 5,

    InvalidArgument = 256,
    ObjectNotFound = 257,
    NotSupported = 258,
    PermissionDenied = 259,
    Runtime = 260,

    Constraint = 512,
    ContentAlreadyExists = 513,
    FilterNotValid = 514,
    NameConstraintViolation = 515,
    Storage = 516,
    StreamNotSupported = 517,
    UpdateConflict = 518,
    Versioning = 519,
}

impl ErrorCode {
    pub const BASIC_MINIMUM: u16 = 0;
    pub const BASIC_MAXIMUM: u16 = 255;
    pub const GENERAL_MINIMUM: u16 = 256;
    pub const GENERAL_MAXIMUM: u16 = 511;
    pub const SPECIFIC_MINIMUM: u16 = 512;
    pub const SPECIFIC_MAXIMUM: u16 = 1023;

    /// Numeric value of the code.
    #[inline]
    pub fn value(self) -> u16 {
        self as u16
    }

    pub fn category(self) -> ErrorCategory {
        match self.value() {
            Self::BASIC_MINIMUM..=Self::BASIC_MAXIMUM => ErrorCategory::Basic,
            Self::GENERAL_MINIMUM..=Self::GENERAL_MAXIMUM => ErrorCategory::General,
            _ => ErrorCategory::Specific,
        }
    }

    /// Look a code up by its numeric value.
    pub fn from_value(value: u16) -> Option<Self> {
        let code = match value {
            0 => Self::NoReturn,
            1 => Self::Connection,
            2 => Self::ProxyAuthentication,
            3 => Self::Unauthorized,
            4 => Self::NoRootFolderFound,
            5 => Self::NoRepositoryFound,
            256 => Self::InvalidArgument,
            257 => Self::ObjectNotFound,
            258 => Self::NotSupported,
            259 => Self::PermissionDenied,
            260 => Self::Runtime,
            512 => Self::Constraint,
            513 => Self::ContentAlreadyExists,
            514 => Self::FilterNotValid,
            515 => Self::NameConstraintViolation,
            516 => Self::Storage,
            517 => Self::StreamNotSupported,
            518 => Self::UpdateConflict,
            519 => Self::Versioning,
            _ => return None,
        };
        Some(code)
    }

    /// Map a CMIS exception name, as carried in AtomPub fault bodies, to a code.
    ///
    /// Matching is case-insensitive and accepts both `objectNotFound` and the
    /// `CmisObjectNotFoundException` spelling used by Java servers.
    pub fn from_exception_name(name: &str) -> Option<Self> {
        let lowered = name.to_ascii_lowercase();
        let key = lowered
            .trim_start_matches("cmis")
            .trim_end_matches("exception");
        let code = match key {
            "invalidargument" => Self::InvalidArgument,
            "objectnotfound" => Self::ObjectNotFound,
            "notsupported" => Self::NotSupported,
            "permissiondenied" => Self::PermissionDenied,
            "runtime" => Self::Runtime,
            "constraint" => Self::Constraint,
            "contentalreadyexists" => Self::ContentAlreadyExists,
            "filternotvalid" => Self::FilterNotValid,
            "nameconstraintviolation" => Self::NameConstraintViolation,
            "storage" => Self::Storage,
            "streamnotsupported" => Self::StreamNotSupported,
            "updateconflict" => Self::UpdateConflict,
            "versioning" => Self::Versioning,
            _ => return None,
        };
        Some(code)
    }

    /// Human readable description of the code.
    pub fn description(self) -> &'static str {
        match self {
            Self::NoReturn => "Unknown Error",
            Self::Connection => "Connection Error",
            Self::ProxyAuthentication => "Proxy Authentication Error",
            Self::Unauthorized => "Unauthorized access error",
            Self::NoRootFolderFound => "Root Folder Not Found Error",
            Self::NoRepositoryFound => "Repository Not Found Error",
            Self::InvalidArgument => "Invalid Argument Error",
            Self::ObjectNotFound => "Object Not Found Error",
            Self::NotSupported => "Not supported Error",
            Self::PermissionDenied => "Permission Denied Error",
            Self::Runtime => "Runtime Error",
            Self::Constraint => "Constraint Error",
            Self::ContentAlreadyExists => "Content Already Exists Error",
            Self::FilterNotValid => "Filter Not Valid Error",
            Self::NameConstraintViolation => "Name Constraint Violation Error",
            Self::Storage => "Storage Error",
            Self::StreamNotSupported => "Stream Not Supported Error",
            Self::UpdateConflict => "Update Conflict Error",
            Self::Versioning => "Versioning Error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.value())
    }
}
