mod file_utils;
mod logging;
mod request;

pub use self::file_utils::*;
pub use self::logging::*;
pub use self::request::*;

#[macro_export]
macro_rules! exit {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
        std::process::exit(1);
    }};
}

pub use exit;
