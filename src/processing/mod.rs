pub mod category;
pub mod ident;
pub mod parser;
pub mod picon;
pub mod pipeline;
