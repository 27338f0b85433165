use std::error::Error;
use std::fmt::{Display, Formatter, Result};

#[macro_export]
macro_rules! create_bouquet_error {
    ($kind:expr, $($arg:tt)*) => {
        $crate::error::BouquetError::new($kind, format!($($arg)*))
    };
}

pub use create_bouquet_error;

#[macro_export]
macro_rules! input_err {
    ($($arg:tt)*) => {
        $crate::create_bouquet_error!($crate::error::BouquetErrorKind::Input, $($arg)*)
    };
}

pub use input_err;

#[macro_export]
macro_rules! artifact_err {
    ($($arg:tt)*) => {
        $crate::create_bouquet_error!($crate::error::BouquetErrorKind::Artifact, $($arg)*)
    };
}

pub use artifact_err;

#[macro_export]
macro_rules! network_err {
    ($($arg:tt)*) => {
        $crate::create_bouquet_error!($crate::error::BouquetErrorKind::Network, $($arg)*)
    };
}

pub use network_err;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BouquetErrorKind {
    // unreadable playlist, aborts before any artifact mutation
    Input,
    // failure writing bouquets, index or registry
    Artifact,
    // download or reload failure, per-item recoverable
    Network,
}

#[derive(Debug)]
pub struct BouquetError {
    pub kind: BouquetErrorKind,
    pub message: String,
}

impl BouquetError {
    pub const fn new(kind: BouquetErrorKind, message: String) -> Self {
        Self { kind, message }
    }
}

impl Display for BouquetError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "{}", self.message)
    }
}

impl Error for BouquetError {}
