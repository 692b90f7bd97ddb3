pub(crate) mod common;

mod exit_codes;
mod modes;
