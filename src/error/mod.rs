mod bouquet_error;

pub use self::bouquet_error::*;
