mod parsed_args;
mod parser;


pub use parsed_args::ParsedArgs;
pub use parser::parse_args;
